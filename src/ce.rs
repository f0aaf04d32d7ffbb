use log::{debug, info, warn};

use ce_credits::*;
use snafu::prelude::*;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Reader, Xlsx};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::ce::config_reader::*;
use crate::ce::io_common::{normalize_code, normalize_participant_id, normalize_session_id, presenter_key};

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_registry;
mod io_xlsx;
mod report;

#[derive(Debug, Snafu)]
pub enum CeError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No data found in worksheet {worksheet} of {path}"))]
    EmptyExcel { path: String, worksheet: String },
    #[snafu(display("Unexpected cell content at line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON content of {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error reading file {path}"))]
    ReadingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error serializing the JSON content of {path}"))]
    SerializingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Column {column:?} not found in {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("{row_id}: cannot read participant identifier {content:?}"))]
    InvalidParticipantId { row_id: String, content: String },
    #[snafu(display("Cannot read session identifier {content:?}"))]
    InvalidSessionId { content: String },
    #[snafu(display("{row_id}: no label for presentation code {content:?}"))]
    MissingPresentationLabel { row_id: String, content: String },
    #[snafu(display("{row_id}: cannot find a presenter name in {content:?}"))]
    InvalidPresentation { row_id: String, content: String },
    #[snafu(display("Survey provider not implemented: {provider:?}"))]
    UnknownProvider { provider: String },
    #[snafu(display("Reconciliation failed: {source}"))]
    Reconciliation { source: ReconcileError },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing CSV content for {path}"))]
    WritingCsv { source: csv::Error, path: String },
    #[snafu(display("Cannot find the current directory"))]
    CurrentDir { source: std::io::Error },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Missing argument {name} (required without --config)"))]
    MissingArgument { name: String },
    #[snafu(display("Difference detected between the computed credits and the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type CeResult<T> = Result<T, CeError>;
pub type BCeResult<T> = Result<T, Box<CeError>>;

/// A row of a survey export, as parsed by the readers.
/// This is before applying the completeness rules and normalizing the identifiers.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedRow {
    pub id: String,
    pub lineno: usize,
    /// Column name -> cell content, trimmed.
    pub cells: HashMap<String, String>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RosterEntry {
    pub participant_id: String,
    pub name: String,
}

fn read_survey_rows(root: &Path, source: &SurveySource) -> BCeResult<Vec<ParsedRow>> {
    let p: PathBuf = root.join(&source.file_path);
    let p2 = p.display().to_string();
    info!("Attempting to read survey file {:?}", p2);
    match source.provider.as_str() {
        "csv" => io_csv::read_csv_rows(&p2),
        "xlsx" => io_xlsx::read_xlsx_rows(&p2, source.excel_worksheet_name.as_deref()),
        x => Err(Box::new(CeError::UnknownProvider {
            provider: x.to_string(),
        })),
    }
}

fn normalize_id_list(ids: &[String], row_id: &str) -> BCeResult<Vec<String>> {
    let mut res: Vec<String> = Vec::new();
    for raw in ids.iter() {
        res.push(
            normalize_participant_id(raw).context(InvalidParticipantIdSnafu {
                row_id,
                content: raw.clone(),
            })?,
        );
    }
    Ok(res)
}

/// Turns the rows of one export into survey responses: completeness rules,
/// identifier normalization, aliases, exclusions and presenter keys.
fn validate_rows(
    rows: &[ParsedRow],
    source: &SurveySource,
    path: &str,
) -> BCeResult<Vec<SurveyResponse>> {
    let mut aliases: HashMap<String, String> = HashMap::new();
    for (from, to) in source.participant_aliases.iter().flatten() {
        let l = normalize_id_list(&[from.clone(), to.clone()], "participantAliases")?;
        aliases.insert(l[0].clone(), l[1].clone());
    }
    let excluded: HashSet<String> = normalize_id_list(
        source.exclude_participants.as_deref().unwrap_or(&[]),
        "excludeParticipants",
    )?
    .into_iter()
    .collect();
    let labels: Option<HashMap<String, String>> = source.presentation_labels.as_ref().map(|l| {
        l.iter()
            .map(|(code, name)| (normalize_code(code), name.clone()))
            .collect()
    });

    let mut res: Vec<SurveyResponse> = Vec::new();
    let mut num_incomplete = 0;
    let mut num_excluded = 0;
    for row in rows.iter() {
        if !source.is_complete(row) {
            debug!("validate_rows: {}: incomplete, skipping", row.id);
            num_incomplete += 1;
            continue;
        }

        let raw_pid = row
            .cells
            .get(&source.participant_column)
            .context(MissingColumnSnafu {
                column: source.participant_column.as_str(),
                path,
            })?;
        let pid = normalize_participant_id(raw_pid).context(InvalidParticipantIdSnafu {
            row_id: row.id.clone(),
            content: raw_pid.clone(),
        })?;
        let pid = aliases.get(&pid).cloned().unwrap_or(pid);
        if excluded.contains(&pid) {
            debug!("validate_rows: {}: participant {} excluded", row.id, pid);
            num_excluded += 1;
            continue;
        }

        let raw_presentation = row
            .cells
            .get(&source.presentation_column)
            .context(MissingColumnSnafu {
                column: source.presentation_column.as_str(),
                path,
            })?;
        let display_name: String = match &labels {
            None => raw_presentation.clone(),
            Some(l) => l
                .get(&normalize_code(raw_presentation))
                .cloned()
                .context(MissingPresentationLabelSnafu {
                    row_id: row.id.clone(),
                    content: raw_presentation.clone(),
                })?,
        };
        let presenter = presenter_key(&display_name).context(InvalidPresentationSnafu {
            row_id: row.id.clone(),
            content: display_name.clone(),
        })?;

        let response_id = source
            .response_id_column
            .as_ref()
            .and_then(|c| row.cells.get(c))
            .filter(|s| !s.is_empty())
            .cloned()
            .unwrap_or_else(|| row.id.clone());
        debug!(
            "validate_rows: {}: participant {} evaluated {}",
            response_id, pid, presenter
        );
        res.push(SurveyResponse {
            participant_id: pid,
            presenter,
            response_id: Some(response_id),
        });
    }
    info!(
        "{}: {} responses kept, {} incomplete, {} excluded",
        path,
        res.len(),
        num_incomplete,
        num_excluded
    );
    Ok(res)
}

fn read_roster(root: &Path, registries: &RegistrySources) -> BCeResult<Option<Vec<RosterEntry>>> {
    match &registries.roster_path {
        None => Ok(None),
        Some(p) => {
            let path = root.join(p).display().to_string();
            info!("Attempting to read roster file {:?}", path);
            let entries = io_csv::read_csv_roster(
                &path,
                registries
                    .roster_id_column
                    .as_deref()
                    .unwrap_or(SurveySource::DEFAULT_PARTICIPANT_COLUMN),
                registries.roster_name_column.as_deref().unwrap_or("Name"),
            )?;
            Ok(Some(entries))
        }
    }
}

fn output_path(root: &Path, settings: &OutputSettings, file: &str) -> PathBuf {
    if file == "stdout" {
        return PathBuf::from(file);
    }
    let dir = match &settings.output_directory {
        Some(d) => root.join(d),
        None => root.to_path_buf(),
    };
    dir.join(file)
}

/// Runs one report: Load -> Validate -> Build Index -> Classify -> Aggregate -> Export.
///
/// The paths of the configuration are relative to `root`.
pub fn run_report(
    config: &RunConfig,
    root: &Path,
    check_reference_path: Option<String>,
) -> BCeResult<Reconciliation> {
    info!("config: {:?}", config);
    let rules = config.credit_rules()?;

    let sessions = io_registry::read_sessions(
        &root.join(&config.registries.sessions_path).display().to_string(),
    )?;
    let participants = io_registry::read_participants(
        &root.join(&config.registries.participants_path).display().to_string(),
    )?;
    let registry = Registry::new(sessions, participants).context(ReconciliationSnafu {})?;

    if config.survey_sources.is_empty() {
        warn!("No survey source configured: every signed session counts as not evaluated");
    }
    let mut responses: Vec<SurveyResponse> = Vec::new();
    for source in config.survey_sources.iter() {
        let rows = read_survey_rows(root, source)?;
        let mut source_responses = validate_rows(&rows, source, &source.file_path)?;
        responses.append(&mut source_responses);
    }

    let rec = reconcile(&registry, &responses, &rules).context(ReconciliationSnafu {})?;
    rec.diagnostics.report();
    info!("Fingerprint of the results: {}", rec.fingerprint());

    let settings = &config.output_settings;
    let roster = read_roster(root, &config.registries)?;
    let credits_csv = report::render_credits(
        &rec.totals,
        roster.as_deref(),
        settings.na_label.as_deref().unwrap_or("n/a"),
    )?;
    match &settings.credits_file {
        Some(f) => report::write_output(&output_path(root, settings, f), &credits_csv)?,
        None => println!("credits:\n{}", credits_csv),
    }
    if let Some(f) = &settings.matrix_file {
        let matrix_csv = report::render_matrix(&rec.matrix)?;
        report::write_output(&output_path(root, settings, f), &matrix_csv)?;
    }
    if let Some(f) = &settings.grid_file {
        let grid = report::render_grid(&rec.matrix);
        report::write_output(&output_path(root, settings, f), &grid)?;
    }
    if let Some(f) = &settings.summary_file {
        let summary_js = report::build_summary_js(config, &rec);
        let pretty = serde_json::to_string_pretty(&summary_js).context(SerializingJsonSnafu {
            path: f.as_str(),
        })?;
        report::write_output(&output_path(root, settings, f), &pretty)?;
    }

    // The reference credits, if provided for comparison
    if let Some(reference_p) = check_reference_path {
        let reference = read_reference(&reference_p)?;
        let computed = normalize_table(&credits_csv);
        if reference != computed {
            warn!("Found differences with the reference credits table");
            print_diff(reference.as_str(), computed.as_str(), "\n");
            return Err(Box::new(CeError::ReferenceMismatch { path: reference_p }));
        }
        info!("The credits match the reference {:?}", reference_p);
    }

    Ok(rec)
}

fn absolute(cwd: &Path, p: &str) -> String {
    if p == "stdout" {
        p.to_string()
    } else {
        cwd.join(p).display().to_string()
    }
}

/// Builds the run from the command line: either a configuration file with
/// some overrides, or the registries and a survey file given directly.
pub fn run_report_cli(args: &Args) -> BCeResult<Reconciliation> {
    let cwd = std::env::current_dir().context(CurrentDirSnafu {})?;
    let (mut config, root): (RunConfig, PathBuf) = match &args.config {
        Some(p) => {
            let config = read_config(p)?;
            let root = Path::new(p)
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root)
        }
        None => {
            let sessions = args
                .sessions
                .clone()
                .context(MissingArgumentSnafu { name: "--sessions" })?;
            let participants = args
                .participants
                .clone()
                .context(MissingArgumentSnafu {
                    name: "--participants",
                })?;
            if args.input.is_none() {
                return Err(Box::new(CeError::MissingArgument {
                    name: "--input".to_string(),
                }));
            }
            let config = RunConfig {
                output_settings: OutputSettings {
                    report_name: "cecredits".to_string(),
                    output_directory: None,
                    credits_file: None,
                    matrix_file: None,
                    grid_file: None,
                    summary_file: None,
                    na_label: None,
                },
                registries: RegistrySources {
                    sessions_path: sessions,
                    participants_path: participants,
                    roster_path: None,
                    roster_id_column: None,
                    roster_name_column: None,
                },
                survey_sources: vec![],
                rules: None,
            };
            (config, cwd.clone())
        }
    };

    if let Some(p) = &args.sessions {
        config.registries.sessions_path = absolute(&cwd, p);
    }
    if let Some(p) = &args.participants {
        config.registries.participants_path = absolute(&cwd, p);
    }
    if let Some(p) = &args.input {
        let mut source = config
            .survey_sources
            .first()
            .cloned()
            .unwrap_or_else(|| SurveySource::from_path(p, None));
        source.file_path = absolute(&cwd, p);
        if let Some(t) = &args.input_type {
            source.provider = t.clone();
        }
        config.survey_sources = vec![source];
    }
    if let Some(w) = &args.excel_worksheet_name {
        for source in config.survey_sources.iter_mut() {
            source.excel_worksheet_name = Some(w.clone());
        }
    }
    if let Some(p) = &args.out {
        config.output_settings.credits_file = Some(absolute(&cwd, p));
    }
    if let Some(p) = &args.matrix_out {
        config.output_settings.matrix_file = Some(absolute(&cwd, p));
    }

    run_report(&config, &root, args.reference.as_ref().map(|p| absolute(&cwd, p)))
}
