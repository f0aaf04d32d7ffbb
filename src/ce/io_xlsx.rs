use calamine::DataType;
use std::collections::HashMap;

use crate::ce::{io_common::make_default_id, *};

pub fn read_xlsx_rows(path: &str, worksheet: Option<&str>) -> BCeResult<Vec<ParsedRow>> {
    let default_id = make_default_id(path);
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let range_o = match worksheet {
        Some(name) => workbook.worksheet_range(name),
        None => workbook.worksheet_range_at(0),
    };
    let wrange = range_o
        .context(EmptyExcelSnafu {
            path,
            worksheet: worksheet.unwrap_or("<first>"),
        })?
        .context(OpeningExcelSnafu { path })?;

    let mut iter = wrange.rows();
    let header_cells = iter.next().context(EmptyExcelSnafu {
        path,
        worksheet: worksheet.unwrap_or("<first>"),
    })?;
    let mut header: Vec<String> = Vec::new();
    for cell in header_cells.iter() {
        header.push(read_cell(cell, 1)?);
    }
    debug!("read_xlsx_rows: header: {:?}", header);

    let mut res: Vec<ParsedRow> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let lineno = idx + 2;
        let mut cells: HashMap<String, String> = HashMap::new();
        for (name, cell) in header.iter().zip(row.iter()) {
            cells.insert(name.clone(), read_cell(cell, lineno)?);
        }
        // Fully blank rows are an artifact of the export.
        if cells.values().all(|v| v.is_empty()) {
            debug!("read_xlsx_rows: skipping blank line {}", lineno);
            continue;
        }
        debug!("read_xlsx_rows: lineno: {:?} row: {:?}", lineno, cells);
        res.push(ParsedRow {
            id: default_id(lineno),
            lineno,
            cells,
        });
    }
    Ok(res)
}

fn read_cell(cell: &DataType, lineno: usize) -> CeResult<String> {
    match cell {
        DataType::String(s) => Ok(s.trim().to_string()),
        DataType::Empty => Ok("".to_string()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Float(f) if f.is_finite() && f.fract() == 0.0 => Ok(format!("{}", *f as i64)),
        DataType::Float(f) => Ok(f.to_string()),
        DataType::Bool(b) => Ok(b.to_string()),
        _ => ExcelWrongCellTypeSnafu {
            lineno: lineno as u64,
            content: format!("{:?}", cell),
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(read_cell(&DataType::Float(3.0), 2).unwrap(), "3");
        assert_eq!(read_cell(&DataType::Float(2.5), 2).unwrap(), "2.5");
        assert_eq!(read_cell(&DataType::Int(100), 2).unwrap(), "100");
        assert_eq!(
            read_cell(&DataType::String(" Lee, Dreams ".to_string()), 2).unwrap(),
            "Lee, Dreams"
        );
        assert_eq!(read_cell(&DataType::Empty, 2).unwrap(), "");
        assert!(read_cell(&DataType::DateTime(44000.5), 7).is_err());
    }

    fn fixture() -> String {
        format!(
            "{}/tests/data/xlsx_survey/survey.xlsx",
            env!("CARGO_MANIFEST_DIR")
        )
    }

    #[test]
    fn rows_skip_blank_lines() {
        let rows = read_xlsx_rows(&fixture(), Some("Responses")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].lineno, 2);
        assert_eq!(rows[0].id, "survey.xlsx-00000002");
        assert_eq!(rows[0].cells.get("ParticipantID"), Some(&"1".to_string()));
        assert_eq!(
            rows[0].cells.get("PresentationID"),
            Some(&"Lee, Dreams and memory".to_string())
        );
        assert_eq!(rows[0].cells.get("Progress"), Some(&"100".to_string()));
        // Line 3 is blank.
        assert_eq!(rows[1].lineno, 4);
        assert_eq!(rows[1].cells.get("ResponseId"), Some(&"R_02".to_string()));

        // The first worksheet is the default.
        assert_eq!(read_xlsx_rows(&fixture(), None).unwrap(), rows);
    }

    #[test]
    fn unknown_worksheet() {
        let res = read_xlsx_rows(&fixture(), Some("Sheet9"));
        assert!(matches!(
            res.map_err(|e| *e),
            Err(CeError::EmptyExcel { .. })
        ));
    }

    #[test]
    fn missing_file() {
        let res = read_xlsx_rows("/nonexistent/survey.xlsx", None);
        assert!(matches!(
            res.map_err(|e| *e),
            Err(CeError::OpeningExcel { .. })
        ));
    }
}
