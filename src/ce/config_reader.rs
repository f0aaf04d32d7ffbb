use crate::ce::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::collections::BTreeMap;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "reportName")]
    pub report_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "creditsFile")]
    pub credits_file: Option<String>,
    #[serde(rename = "matrixFile")]
    pub matrix_file: Option<String>,
    #[serde(rename = "gridFile")]
    pub grid_file: Option<String>,
    #[serde(rename = "summaryFile")]
    pub summary_file: Option<String>,
    #[serde(rename = "naLabel")]
    pub na_label: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub report: String,
    pub participants: usize,
    pub presentations: usize,
    pub fingerprint: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySources {
    #[serde(rename = "sessionsPath")]
    pub sessions_path: String,
    #[serde(rename = "participantsPath")]
    pub participants_path: String,
    #[serde(rename = "rosterPath")]
    pub roster_path: Option<String>,
    #[serde(rename = "rosterIdColumn")]
    pub roster_id_column: Option<String>,
    #[serde(rename = "rosterNameColumn")]
    pub roster_name_column: Option<String>,
}

/// A row is complete when the value of the column is one of the values.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ColumnRule {
    pub column: String,
    pub values: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveySource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "participantColumn")]
    pub participant_column: String,
    #[serde(rename = "presentationColumn")]
    pub presentation_column: String,
    #[serde(rename = "responseIdColumn")]
    pub response_id_column: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    /// Survey codes to presentation display names ("LastName, Title").
    #[serde(rename = "presentationLabels")]
    pub presentation_labels: Option<BTreeMap<String, String>>,
    pub completeness: Option<Vec<ColumnRule>>,
    #[serde(rename = "excludeParticipants")]
    pub exclude_participants: Option<Vec<String>>,
    #[serde(rename = "participantAliases")]
    pub participant_aliases: Option<BTreeMap<String, String>>,
}

impl SurveySource {
    pub const DEFAULT_PARTICIPANT_COLUMN: &'static str = "ParticipantID";
    pub const DEFAULT_PRESENTATION_COLUMN: &'static str = "PresentationID";

    pub fn from_path(file_path: &str, provider: Option<String>) -> SurveySource {
        SurveySource {
            provider: provider.unwrap_or_else(|| "csv".to_string()),
            file_path: file_path.to_string(),
            participant_column: SurveySource::DEFAULT_PARTICIPANT_COLUMN.to_string(),
            presentation_column: SurveySource::DEFAULT_PRESENTATION_COLUMN.to_string(),
            response_id_column: None,
            excel_worksheet_name: None,
            presentation_labels: None,
            completeness: None,
            exclude_participants: None,
            participant_aliases: None,
        }
    }

    /// Applies the completeness rules. Without rules, every row is complete.
    pub fn is_complete(&self, row: &ParsedRow) -> bool {
        self.completeness.iter().flatten().all(|rule| {
            row.cells
                .get(&rule.column)
                .map(|v| {
                    let v = normalize_code(v);
                    rule.values.iter().any(|x| normalize_code(x) == v)
                })
                .unwrap_or(false)
        })
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ReportRules {
    #[serde(rename = "minutesPerCredit")]
    _minutes_per_credit: Option<JSValue>,
}

impl ReportRules {
    pub fn minutes_per_credit(&self) -> CeResult<f64> {
        match &self._minutes_per_credit {
            None => Ok(CreditRules::DEFAULT_RULES.minutes_per_credit),
            Some(x) => match read_js_number(x) {
                Some(m) if m > 0.0 => Ok(m),
                _ => whatever!("minutesPerCredit must be a positive number, got {}", x),
            },
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub registries: RegistrySources,
    #[serde(rename = "surveySources")]
    pub survey_sources: Vec<SurveySource>,
    pub rules: Option<ReportRules>,
}

impl RunConfig {
    pub fn credit_rules(&self) -> CeResult<CreditRules> {
        let minutes_per_credit = match &self.rules {
            Some(r) => r.minutes_per_credit()?,
            None => CreditRules::DEFAULT_RULES.minutes_per_credit,
        };
        Ok(CreditRules { minutes_per_credit })
    }
}

pub fn read_config(path: &str) -> BCeResult<RunConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: RunConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

/// Reads a reference credits table. Line endings and trailing spaces are
/// normalized to ensure stability.
pub fn read_reference(path: &str) -> BCeResult<String> {
    let contents = fs::read_to_string(path).context(ReadingFileSnafu { path })?;
    Ok(normalize_table(&contents))
}

pub fn normalize_table(contents: &str) -> String {
    let lines: Vec<&str> = contents
        .lines()
        .map(|l| l.trim_end())
        .filter(|l| !l.is_empty())
        .collect();
    lines.join("\n")
}

fn read_js_number(x: &JSValue) -> Option<f64> {
    match x {
        JSValue::Number(n) => n.as_f64(),
        JSValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
