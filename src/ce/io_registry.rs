// Readers for the registries maintained by hand between runs.

use serde::Deserialize;
use serde_json::Value as JSValue;
use std::collections::BTreeMap;

use crate::ce::*;

#[derive(PartialEq, Debug, Clone, Deserialize)]
struct SessionRecord {
    #[serde(alias = "duration")]
    length: f64,
    #[serde(default)]
    presenters: Vec<String>,
}

#[derive(PartialEq, Debug, Clone, Deserialize)]
struct ParticipantRecord {
    sessions_signed: Option<Vec<JSValue>>,
    sessions_attended: Option<Vec<JSValue>>,
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &str) -> BCeResult<T> {
    info!("Attempting to read registry file {:?}", path);
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let res: T = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(res)
}

fn js_to_string(x: &JSValue) -> String {
    match x {
        JSValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn read_sessions(path: &str) -> BCeResult<Vec<Session>> {
    let records: BTreeMap<String, SessionRecord> = read_json_file(path)?;
    let mut res: Vec<Session> = Vec::new();
    for (key, record) in records.into_iter() {
        let id = normalize_session_id(&key).context(InvalidSessionIdSnafu {
            content: key.clone(),
        })?;
        let presenters: Vec<String> = record
            .presenters
            .iter()
            .map(|p| p.trim().to_string())
            .collect();
        debug!(
            "read_sessions: {}: {} minutes, presenters {:?}",
            id, record.length, presenters
        );
        res.push(Session {
            id,
            duration_minutes: record.length,
            presenters,
        });
    }
    res.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(res)
}

pub fn read_participants(path: &str) -> BCeResult<Vec<Participant>> {
    let records: BTreeMap<String, ParticipantRecord> = read_json_file(path)?;
    let mut res: Vec<Participant> = Vec::new();
    for (key, record) in records.into_iter() {
        let id = normalize_participant_id(&key).context(InvalidParticipantIdSnafu {
            row_id: path,
            content: key.clone(),
        })?;
        let sessions_signed: Option<Vec<String>> = match record.sessions_signed {
            None => None,
            Some(l) => {
                let mut sessions: Vec<String> = Vec::new();
                for x in l.iter() {
                    let raw = js_to_string(x);
                    sessions.push(
                        normalize_session_id(&raw).context(InvalidSessionIdSnafu { content: raw })?,
                    );
                }
                Some(sessions)
            }
        };
        let sessions_attended: Option<Vec<String>> = record
            .sessions_attended
            .map(|l| l.iter().map(js_to_string).collect());
        res.push(Participant {
            id,
            sessions_signed,
            sessions_attended,
        });
    }
    res.sort_by(|a, b| a.id.cmp(&b.id));
    debug!("read_participants: {} participants", res.len());
    Ok(res)
}
