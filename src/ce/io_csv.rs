// Primitives for reading CSV files.

use std::collections::HashMap;

use crate::ce::{io_common::make_default_id, *};

pub fn read_csv_rows(path: &str) -> BCeResult<Vec<ParsedRow>> {
    let default_id = make_default_id(path);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let header: Vec<String> = rdr
        .headers()
        .context(CsvOpenSnafu { path })?
        .iter()
        .map(|s| s.trim().to_string())
        .collect();
    debug!("read_csv_rows: header: {:?}", header);

    let mut res: Vec<ParsedRow> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        let cells: HashMap<String, String> = header
            .iter()
            .cloned()
            .zip(line.iter().map(|s| s.trim().to_string()))
            .collect();
        debug!("read_csv_rows: lineno: {:?} row: {:?}", lineno, cells);
        res.push(ParsedRow {
            id: default_id(lineno),
            lineno,
            cells,
        });
    }
    Ok(res)
}

/// Reads the list of registered names, keyed by canonical participant id.
pub fn read_csv_roster(
    path: &str,
    id_column: &str,
    name_column: &str,
) -> BCeResult<Vec<RosterEntry>> {
    let rows = read_csv_rows(path)?;
    let mut res: Vec<RosterEntry> = Vec::new();
    for row in rows.iter() {
        let raw_id = row
            .cells
            .get(id_column)
            .context(MissingColumnSnafu { column: id_column, path })?;
        let participant_id =
            normalize_participant_id(raw_id).context(InvalidParticipantIdSnafu {
                row_id: row.id.clone(),
                content: raw_id.clone(),
            })?;
        let name = row
            .cells
            .get(name_column)
            .context(MissingColumnSnafu { column: name_column, path })?
            .clone();
        res.push(RosterEntry {
            participant_id,
            name,
        });
    }
    debug!("read_csv_roster: {} entries", res.len());
    Ok(res)
}
