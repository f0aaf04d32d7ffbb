// Writers for the credits table, the status matrix and the run summary.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::ce::*;

fn csv_to_string(rows: &[Vec<String>], path: &str) -> CeResult<String> {
    let mut wtr = csv::WriterBuilder::new().from_writer(vec![]);
    for r in rows.iter() {
        wtr.write_record(r).context(WritingCsvSnafu { path })?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| e.into_error())
        .context(WritingOutputSnafu { path })?;
    Ok(String::from_utf8_lossy(&bytes).to_string())
}

/// The credits of every participant.
///
/// With a roster, the names are added. Registry participants missing from the
/// roster get the sentinel label, roster participants missing from the
/// registry get zero credits.
pub fn render_credits(
    totals: &[ParticipantCredit],
    roster: Option<&[RosterEntry]>,
    na_label: &str,
) -> CeResult<String> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    match roster {
        None => {
            rows.push(vec!["participant_id".to_string(), "n_credits".to_string()]);
            for t in totals.iter() {
                rows.push(vec![t.participant_id.clone(), t.credits.to_string()]);
            }
        }
        Some(entries) => {
            let names: HashMap<&str, &str> = entries
                .iter()
                .map(|e| (e.participant_id.as_str(), e.name.as_str()))
                .collect();
            rows.push(vec![
                "participant_id".to_string(),
                "name".to_string(),
                "n_credits".to_string(),
            ]);
            for t in totals.iter() {
                let name = names.get(t.participant_id.as_str()).cloned().unwrap_or(na_label);
                rows.push(vec![
                    t.participant_id.clone(),
                    name.to_string(),
                    t.credits.to_string(),
                ]);
            }
            let mut roster_only: BTreeMap<&str, &str> = BTreeMap::new();
            for e in entries.iter() {
                if !totals.iter().any(|t| t.participant_id == e.participant_id) {
                    roster_only.insert(e.participant_id.as_str(), e.name.as_str());
                }
            }
            if !roster_only.is_empty() {
                warn!(
                    "In the roster but not in the participant registry: {:?}",
                    roster_only.keys().collect::<Vec<_>>()
                );
            }
            for (pid, name) in roster_only.iter() {
                rows.push(vec![pid.to_string(), name.to_string(), 0.0_f64.to_string()]);
            }
        }
    }
    csv_to_string(&rows, "credits table")
}

/// One row per presentation, one column per participant. Empty cells are
/// neither signed nor evaluated.
pub fn render_matrix(matrix: &StatusMatrix) -> CeResult<String> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut header = vec!["session_id".to_string(), "presenter_name".to_string()];
    header.extend(matrix.participants().iter().cloned());
    rows.push(header);
    for p in matrix.presentations() {
        let mut row = vec![p.session_id.clone(), p.presenter.clone()];
        for pid in matrix.participants() {
            let cell = match matrix.status(p, pid) {
                Some(CellStatus::Neither) | None => "".to_string(),
                Some(s) => s.score().to_string(),
            };
            row.push(cell);
        }
        rows.push(row);
    }
    csv_to_string(&rows, "status matrix")
}

fn grid_symbol(status: CellStatus) -> char {
    match status {
        CellStatus::SignedAndEvaluated => '#',
        CellStatus::SignedOnly => '+',
        CellStatus::EvaluatedOnly => '!',
        CellStatus::Neither => '.',
    }
}

/// A text rendering of the matrix: participants as rows, presentations as
/// columns.
pub fn render_grid(matrix: &StatusMatrix) -> String {
    let mut res = String::new();
    res.push_str("Legend: # signed and evaluated, + signed but no evaluation, ! evaluated but no signature\n\n");
    for (idx, p) in matrix.presentations().iter().enumerate() {
        res.push_str(&format!("{:>4}  {}  {}\n", idx + 1, p.session_id, p.presenter));
    }
    res.push('\n');
    let width = matrix
        .participants()
        .iter()
        .map(|p| p.len())
        .max()
        .unwrap_or(0);
    for pid in matrix.participants() {
        let cells: Vec<String> = matrix
            .presentations()
            .iter()
            .map(|p| {
                grid_symbol(matrix.status(p, pid).unwrap_or(CellStatus::Neither)).to_string()
            })
            .collect();
        res.push_str(&format!("{:<width$}  {}\n", pid, cells.join(" "), width = width));
    }
    res
}

fn diagnostics_to_json(d: &Diagnostics) -> JSValue {
    let duplicates: Vec<JSValue> = d
        .duplicate_submissions
        .iter()
        .map(|x| json!({"participantId": x.participant_id, "presenter": x.presenter, "count": x.count}))
        .collect();
    let mismatches: Vec<JSValue> = d
        .mismatches
        .iter()
        .map(|m| {
            json!({
                "participantId": m.participant_id,
                "surveyedOnly": m.surveyed_only,
                "signedOnly": m.signed_only
            })
        })
        .collect();
    let unknown_sessions: Vec<JSValue> = d
        .unknown_sessions
        .iter()
        .map(|u| json!({"participantId": u.participant_id, "sessionId": u.session_id}))
        .collect();
    json!({
        "duplicateSubmissions": duplicates,
        "mismatches": mismatches,
        "unknownSessions": unknown_sessions,
        "didNothing": d.participation.did_nothing,
        "signedSheetOnly": d.participation.signed_sheet_only,
        "surveyOnly": d.participation.survey_only,
    })
}

pub fn build_summary_js(config: &RunConfig, rec: &Reconciliation) -> JSValue {
    let c = OutputConfig {
        report: config.output_settings.report_name.clone(),
        participants: rec.index.participants().len(),
        presentations: rec.index.presentations().len(),
        fingerprint: rec.fingerprint(),
    };
    let counts = rec.matrix.status_counts();
    let count_of = |s: CellStatus| counts.get(&s).cloned().unwrap_or(0);
    let results: Vec<JSValue> = rec
        .totals
        .iter()
        .map(|t| {
            json!({
                "participantId": t.participant_id,
                "credits": t.credits,
                "sessions": t.sessions_credited
            })
        })
        .collect();
    json!({
        "config": c,
        "statuses": {
            "signedAndEvaluated": count_of(CellStatus::SignedAndEvaluated),
            "signedOnly": count_of(CellStatus::SignedOnly),
            "evaluatedOnly": count_of(CellStatus::EvaluatedOnly),
        },
        "results": results,
        "diagnostics": diagnostics_to_json(&rec.diagnostics),
    })
}

/// Writes the content to the file, or to the standard output for `stdout`.
pub fn write_output(path: &Path, contents: &str) -> BCeResult<()> {
    if path.as_os_str() == "stdout" {
        println!("{}", contents);
        return Ok(());
    }
    let p = path.display().to_string();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context(WritingOutputSnafu { path: p.clone() })?;
        }
    }
    info!("Writing {:?}", p);
    fs::write(path, contents).context(WritingOutputSnafu { path: p })?;
    Ok(())
}
