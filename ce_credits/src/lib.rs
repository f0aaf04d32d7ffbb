mod config;
pub mod builder;
pub mod manual;

use log::{debug, info, warn};

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

pub use crate::config::*;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct PresentationIdx(usize);

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct ParticipantIdx(usize);

/// The session and participant registries, validated at construction.
///
/// Sessions and participants are kept sorted by identifier, which fixes the
/// order of every derived output.
#[derive(PartialEq, Debug, Clone)]
pub struct Registry {
    sessions: Vec<Session>,
    participants: Vec<Participant>,
}

impl Registry {
    pub fn new(
        sessions: Vec<Session>,
        participants: Vec<Participant>,
    ) -> Result<Registry, ReconcileError> {
        let mut sessions = sessions;
        let mut participants = participants;
        sessions.sort_by(|a, b| a.id.cmp(&b.id));
        participants.sort_by(|a, b| a.id.cmp(&b.id));

        let mut session_ids: HashSet<&str> = HashSet::new();
        for s in sessions.iter() {
            if !session_ids.insert(s.id.as_str()) {
                return Err(ReconcileError::DuplicateSession {
                    session_id: s.id.clone(),
                });
            }
            if !s.duration_minutes.is_finite() || s.duration_minutes < 0.0 {
                return Err(ReconcileError::InvalidDuration {
                    session_id: s.id.clone(),
                    minutes: s.duration_minutes,
                });
            }
            let mut presenters: HashSet<&str> = HashSet::new();
            for p in s.presenters.iter() {
                if !presenters.insert(p.as_str()) {
                    return Err(ReconcileError::DuplicatePresenter {
                        session_id: s.id.clone(),
                        presenter: p.clone(),
                    });
                }
            }
        }

        let mut participant_ids: HashSet<&str> = HashSet::new();
        for p in participants.iter() {
            if !participant_ids.insert(p.id.as_str()) {
                return Err(ReconcileError::DuplicateParticipant {
                    participant_id: p.id.clone(),
                });
            }
        }

        debug!(
            "Registry::new: {} sessions, {} participants",
            sessions.len(),
            participants.len()
        );
        Ok(Registry {
            sessions,
            participants,
        })
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn session(&self, session_id: &str) -> Option<&Session> {
        self.sessions
            .binary_search_by(|s| s.id.as_str().cmp(session_id))
            .ok()
            .map(|idx| &self.sessions[idx])
    }

    pub fn participant(&self, participant_id: &str) -> Option<&Participant> {
        self.participants
            .binary_search_by(|p| p.id.as_str().cmp(participant_id))
            .ok()
            .map(|idx| &self.participants[idx])
    }
}

/// The canonical identifiers that a reconciliation must cover.
///
/// It is always derived from the registries, never from the surveys.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Index {
    presentations: Vec<PresentationId>,
    participants: Vec<String>,
    presenter_names: BTreeSet<String>,
}

impl Index {
    /// All the (session, presenter) pairs, sessions in identifier order and
    /// presenters in program order.
    pub fn presentations(&self) -> &[PresentationId] {
        &self.presentations
    }

    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    pub fn contains_presenter(&self, presenter: &str) -> bool {
        self.presenter_names.contains(presenter)
    }

    pub fn contains_participant(&self, participant_id: &str) -> bool {
        self.participants
            .binary_search_by(|p| p.as_str().cmp(participant_id))
            .is_ok()
    }
}

pub fn build_index(registry: &Registry) -> Index {
    let mut presentations: Vec<PresentationId> = Vec::new();
    for s in registry.sessions() {
        for presenter in s.presenters.iter() {
            presentations.push(PresentationId {
                session_id: s.id.clone(),
                presenter: presenter.clone(),
            });
        }
    }
    let presenter_names: BTreeSet<String> =
        presentations.iter().map(|p| p.presenter.clone()).collect();
    let participants: Vec<String> = registry.participants().iter().map(|p| p.id.clone()).collect();
    debug!(
        "build_index: {} presentations, {} presenters, {} participants",
        presentations.len(),
        presenter_names.len(),
        participants.len()
    );
    Index {
        presentations,
        participants,
        presenter_names,
    }
}

/// Checks that every survey refers to a known presenter and a known participant.
///
/// The first offending response is reported.
pub fn validate_responses(index: &Index, responses: &[SurveyResponse]) -> Result<(), ReconcileError> {
    for r in responses.iter() {
        if !index.contains_presenter(&r.presenter) {
            return Err(ReconcileError::UnknownPresenter {
                presenter: r.presenter.clone(),
                participant_id: r.participant_id.clone(),
            });
        }
        if !index.contains_participant(&r.participant_id) {
            return Err(ReconcileError::UnknownParticipant {
                participant_id: r.participant_id.clone(),
            });
        }
    }
    Ok(())
}

/// A sparse (presentation x participant) matrix of statuses.
///
/// Only the pairs that are not `Neither` are stored. Every pair of the index
/// still has exactly one status.
#[derive(PartialEq, Debug, Clone)]
pub struct StatusMatrix {
    presentations: Vec<PresentationId>,
    participants: Vec<String>,
    presentation_pos: HashMap<PresentationId, PresentationIdx>,
    participant_pos: HashMap<String, ParticipantIdx>,
    cells: BTreeMap<(PresentationIdx, ParticipantIdx), CellStatus>,
}

impl StatusMatrix {
    fn new(index: &Index) -> StatusMatrix {
        StatusMatrix {
            presentations: index.presentations.clone(),
            participants: index.participants.clone(),
            presentation_pos: index
                .presentations
                .iter()
                .enumerate()
                .map(|(idx, p)| (p.clone(), PresentationIdx(idx)))
                .collect(),
            participant_pos: index
                .participants
                .iter()
                .enumerate()
                .map(|(idx, p)| (p.clone(), ParticipantIdx(idx)))
                .collect(),
            cells: BTreeMap::new(),
        }
    }

    pub fn presentations(&self) -> &[PresentationId] {
        &self.presentations
    }

    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    /// The status of a pair, or `None` if either identifier is not indexed.
    pub fn status(&self, presentation: &PresentationId, participant_id: &str) -> Option<CellStatus> {
        let pidx = self.presentation_pos.get(presentation)?;
        let qidx = self.participant_pos.get(participant_id)?;
        Some(self.status_at(*pidx, *qidx))
    }

    fn status_at(&self, pidx: PresentationIdx, qidx: ParticipantIdx) -> CellStatus {
        self.cells
            .get(&(pidx, qidx))
            .cloned()
            .unwrap_or(CellStatus::Neither)
    }

    /// The stored statuses of one presentation (a row), in participant order.
    pub fn by_presentation(&self, presentation: &PresentationId) -> Option<Vec<(&str, CellStatus)>> {
        let pidx = *self.presentation_pos.get(presentation)?;
        let row = self
            .cells
            .range((pidx, ParticipantIdx(0))..=(pidx, ParticipantIdx(usize::MAX)))
            .map(|((_, qidx), status)| (self.participants[qidx.0].as_str(), *status))
            .collect();
        Some(row)
    }

    /// The stored statuses of one participant (a column), in presentation order.
    pub fn by_participant(&self, participant_id: &str) -> Option<Vec<(&PresentationId, CellStatus)>> {
        let qidx = *self.participant_pos.get(participant_id)?;
        let col = self
            .presentations
            .iter()
            .enumerate()
            .filter_map(|(idx, p)| match self.status_at(PresentationIdx(idx), qidx) {
                CellStatus::Neither => None,
                s => Some((p, s)),
            })
            .collect();
        Some(col)
    }

    /// All the stored cells, ordered by presentation then participant.
    pub fn filled_cells(&self) -> impl Iterator<Item = (&PresentationId, &str, CellStatus)> + '_ {
        self.cells.iter().map(|((pidx, qidx), status)| {
            (
                &self.presentations[pidx.0],
                self.participants[qidx.0].as_str(),
                *status,
            )
        })
    }

    pub fn num_filled(&self) -> usize {
        self.cells.len()
    }

    /// Counts the stored cells of each status.
    pub fn status_counts(&self) -> BTreeMap<CellStatus, usize> {
        let mut res: BTreeMap<CellStatus, usize> = BTreeMap::new();
        for status in self.cells.values() {
            *res.entry(*status).or_insert(0) += 1;
        }
        res
    }
}

/// Classifies every (presentation, participant) pair of the index.
///
/// The responses are expected to have been checked with `validate_responses`.
pub fn build_status_matrix(
    registry: &Registry,
    index: &Index,
    responses: &[SurveyResponse],
) -> StatusMatrix {
    let mut evaluations: HashMap<&str, HashSet<&str>> = HashMap::new();
    for r in responses.iter() {
        evaluations
            .entry(r.participant_id.as_str())
            .or_insert_with(HashSet::new)
            .insert(r.presenter.as_str());
    }
    let no_evaluations: HashSet<&str> = HashSet::new();

    let mut matrix = StatusMatrix::new(index);
    for (qidx, pid) in index.participants.iter().enumerate() {
        let signed_off: HashSet<&str> = registry
            .participant(pid)
            .and_then(|p| p.sessions_signed.as_ref())
            .map(|l| l.iter().map(|s| s.as_str()).collect())
            .unwrap_or_default();
        let evaluated = evaluations.get(pid.as_str()).unwrap_or(&no_evaluations);

        for (pidx, presentation) in index.presentations.iter().enumerate() {
            let signed = signed_off.contains(presentation.session_id.as_str());
            let is_evaluated = evaluated.contains(presentation.presenter.as_str());
            match CellStatus::from_flags(signed, is_evaluated) {
                CellStatus::Neither => {}
                status => {
                    matrix
                        .cells
                        .insert((PresentationIdx(pidx), ParticipantIdx(qidx)), status);
                }
            }
        }
    }
    debug!("build_status_matrix: {} cells filled", matrix.num_filled());
    matrix
}

/// Converts the statuses into credits for every participant of the matrix.
///
/// A session is credited when at least one of its presentations is signed
/// for the participant. Participants without credits get an explicit zero.
pub fn compute_credits(
    registry: &Registry,
    matrix: &StatusMatrix,
    rules: &CreditRules,
) -> Vec<ParticipantCredit> {
    // The rows of each session in the matrix.
    let session_rows: Vec<(&Session, Vec<PresentationIdx>)> = registry
        .sessions()
        .iter()
        .map(|s| {
            let rows = s
                .presenters
                .iter()
                .filter_map(|presenter| {
                    matrix
                        .presentation_pos
                        .get(&PresentationId {
                            session_id: s.id.clone(),
                            presenter: presenter.clone(),
                        })
                        .cloned()
                })
                .collect();
            (s, rows)
        })
        .collect();

    let mut res: Vec<ParticipantCredit> = Vec::new();
    for (qidx, pid) in matrix.participants.iter().enumerate() {
        let mut credits = 0.0;
        let mut sessions_credited: Vec<String> = Vec::new();
        for (session, rows) in session_rows.iter() {
            let best: u8 = rows
                .iter()
                .map(|pidx| matrix.status_at(*pidx, ParticipantIdx(qidx)).score())
                .max()
                .unwrap_or(0);
            if best >= CellStatus::SignedOnly.score() {
                credits += rules.session_weight(session);
                sessions_credited.push(session.id.clone());
            }
        }
        debug!(
            "compute_credits: {}: {} credits from {:?}",
            pid, credits, sessions_credited
        );
        res.push(ParticipantCredit {
            participant_id: pid.clone(),
            credits,
            sessions_credited,
        });
    }
    res
}

/// Looks for the anomalies that do not prevent the credits from being computed.
pub fn collect_diagnostics(registry: &Registry, responses: &[SurveyResponse]) -> Diagnostics {
    let mut submissions: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for r in responses.iter() {
        *submissions
            .entry((r.participant_id.as_str(), r.presenter.as_str()))
            .or_insert(0) += 1;
    }
    let duplicate_submissions: Vec<DuplicateSubmission> = submissions
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|((pid, presenter), count)| DuplicateSubmission {
            participant_id: pid.to_string(),
            presenter: presenter.to_string(),
            count: *count,
        })
        .collect();

    let mut surveyed_by: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    for (pid, presenter) in submissions.keys() {
        surveyed_by.entry(*pid).or_default().insert(*presenter);
    }

    let mut mismatches: Vec<ParticipantMismatch> = Vec::new();
    let mut unknown_sessions: Vec<UnknownSignedSession> = Vec::new();
    let mut participation = ParticipationGaps::default();
    for p in registry.participants() {
        for sid in p.sessions_signed.iter().flatten() {
            if registry.session(sid).is_none() {
                unknown_sessions.push(UnknownSignedSession {
                    participant_id: p.id.clone(),
                    session_id: sid.clone(),
                });
            }
        }

        let surveyed = surveyed_by.remove(p.id.as_str()).unwrap_or_default();
        let signed_presenters: BTreeSet<&str> = p
            .sessions_signed
            .iter()
            .flatten()
            .filter_map(|sid| registry.session(sid))
            .flat_map(|s| s.presenters.iter().map(|x| x.as_str()))
            .collect();

        let surveyed_only: Vec<String> = surveyed
            .difference(&signed_presenters)
            .map(|s| s.to_string())
            .collect();
        let signed_only: Vec<String> = signed_presenters
            .difference(&surveyed)
            .map(|s| s.to_string())
            .collect();
        if !surveyed_only.is_empty() || !signed_only.is_empty() {
            mismatches.push(ParticipantMismatch {
                participant_id: p.id.clone(),
                surveyed_only,
                signed_only,
            });
        }

        let has_sheet = p.sessions_signed.is_some() || p.sessions_attended.is_some();
        match (has_sheet, !surveyed.is_empty()) {
            (false, false) => participation.did_nothing.push(p.id.clone()),
            (true, false) => participation.signed_sheet_only.push(p.id.clone()),
            (false, true) => participation.survey_only.push(p.id.clone()),
            (true, true) => {}
        }
    }

    Diagnostics {
        duplicate_submissions,
        mismatches,
        unknown_sessions,
        participation,
    }
}

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.duplicate_submissions.is_empty()
            && self.mismatches.is_empty()
            && self.unknown_sessions.is_empty()
            && self.participation == ParticipationGaps::default()
    }

    /// Logs all the anomalies at once.
    pub fn report(&self) {
        if self.is_empty() {
            info!("No anomaly found between surveys and signatures");
            return;
        }
        for d in self.duplicate_submissions.iter() {
            warn!(
                "Participant {} submitted {} surveys for {}",
                d.participant_id, d.count, d.presenter
            );
        }
        for m in self.mismatches.iter() {
            if !m.surveyed_only.is_empty() {
                warn!(
                    "Participant {} did a survey for {:?} and did not get them signed",
                    m.participant_id, m.surveyed_only
                );
            }
            if !m.signed_only.is_empty() {
                warn!(
                    "Participant {} got a signature for {:?} and did not do the survey",
                    m.participant_id, m.signed_only
                );
            }
        }
        for u in self.unknown_sessions.iter() {
            warn!(
                "Participant {} was signed off for session {} which is not in the session registry",
                u.participant_id, u.session_id
            );
        }
        let gaps = &self.participation;
        if !gaps.did_nothing.is_empty() {
            warn!(
                "Registered but no signed sheet and no survey: {:?}",
                gaps.did_nothing
            );
        }
        if !gaps.signed_sheet_only.is_empty() {
            warn!(
                "Turned in a signed sheet but no survey: {:?}",
                gaps.signed_sheet_only
            );
        }
        if !gaps.survey_only.is_empty() {
            warn!(
                "Submitted surveys but no signed sheet: {:?}",
                gaps.survey_only
            );
        }
    }
}

/// Everything derived from one run.
#[derive(PartialEq, Debug, Clone)]
pub struct Reconciliation {
    pub index: Index,
    pub matrix: StatusMatrix,
    pub totals: Vec<ParticipantCredit>,
    pub diagnostics: Diagnostics,
}

impl Reconciliation {
    pub fn credits(&self, participant_id: &str) -> Option<f64> {
        self.totals
            .iter()
            .find(|t| t.participant_id == participant_id)
            .map(|t| t.credits)
    }

    /// A SHA-256 digest of the matrix and of the exact bits of the totals.
    pub fn fingerprint(&self) -> String {
        let mut buf = String::new();
        for (presentation, pid, status) in self.matrix.filled_cells() {
            buf.push_str(&format!(
                "cell\t{}\t{}\t{}\t{}\n",
                presentation.session_id,
                presentation.presenter,
                pid,
                status.score()
            ));
        }
        for t in self.totals.iter() {
            buf.push_str(&format!(
                "total\t{}\t{:016x}\n",
                t.participant_id,
                t.credits.to_bits()
            ));
        }
        sha256::digest(buf)
    }
}

/// Runs the full reconciliation: validation, index, classification, credits
/// and diagnostics.
///
/// Arguments:
/// * `registry` the validated sessions and participants
/// * `responses` the cleaned survey responses
/// * `rules` how durations convert into credits
pub fn reconcile(
    registry: &Registry,
    responses: &[SurveyResponse],
    rules: &CreditRules,
) -> Result<Reconciliation, ReconcileError> {
    info!(
        "Reconciling {:?} survey responses against {:?} sessions and {:?} participants, rules: {:?}",
        responses.len(),
        registry.sessions().len(),
        registry.participants().len(),
        rules
    );
    let index = build_index(registry);
    validate_responses(&index, responses)?;

    let matrix = build_status_matrix(registry, &index, responses);
    info!("Status counts: {:?}", matrix.status_counts());

    let totals = compute_credits(registry, &matrix, rules);
    let diagnostics = collect_diagnostics(registry, responses);

    Ok(Reconciliation {
        index,
        matrix,
        totals,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::builder::Builder;
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn pres(session_id: &str, presenter: &str) -> PresentationId {
        PresentationId {
            session_id: session_id.to_string(),
            presenter: presenter.to_string(),
        }
    }

    #[test]
    fn classification_is_total_and_monotonic() {
        for signed in [false, true] {
            for evaluated in [false, true] {
                let s = CellStatus::from_flags(signed, evaluated);
                assert_eq!(s.is_signed(), signed);
                assert_eq!(s.is_evaluated(), evaluated);
                assert_eq!(s == CellStatus::SignedAndEvaluated, signed && evaluated);
                if signed {
                    assert!(s.score() >= 2);
                }
                if evaluated {
                    assert_eq!(s.score() % 2, 1);
                }
            }
        }
        assert!(CellStatus::Neither < CellStatus::EvaluatedOnly);
        assert!(CellStatus::EvaluatedOnly < CellStatus::SignedOnly);
        assert!(CellStatus::SignedOnly < CellStatus::SignedAndEvaluated);
    }

    #[test]
    fn one_session_two_presenters() {
        init();
        let res = Builder::new(&CreditRules::DEFAULT_RULES)
            .session("ses-001", 60.0, &["Lee", "Patel"])
            .participant("pid-001", &["ses-001"])
            .response("pid-001", "Lee")
            .reconcile()
            .unwrap();
        assert_eq!(
            res.matrix.status(&pres("ses-001", "Lee"), "pid-001"),
            Some(CellStatus::SignedAndEvaluated)
        );
        assert_eq!(
            res.matrix.status(&pres("ses-001", "Patel"), "pid-001"),
            Some(CellStatus::SignedOnly)
        );
        assert_eq!(res.credits("pid-001"), Some(1.0));
        assert_eq!(res.totals[0].sessions_credited, vec!["ses-001".to_string()]);
    }

    #[test]
    fn ninety_minutes_is_one_and_a_half() {
        let res = Builder::new(&CreditRules::DEFAULT_RULES)
            .session("ses-001", 90.0, &["Lee"])
            .session("ses-002", 60.0, &["Kim"])
            .participant("pid-001", &["ses-001"])
            .reconcile()
            .unwrap();
        assert_eq!(res.credits("pid-001"), Some(1.5));
    }

    #[test]
    fn explicit_zero_without_sign_off() {
        let res = Builder::new(&CreditRules::DEFAULT_RULES)
            .session("ses-001", 60.0, &["Lee"])
            .participant("pid-001", &["ses-001"])
            .participant("pid-002", &[])
            .participant_without_sheet("pid-003")
            .response("pid-003", "Lee")
            .reconcile()
            .unwrap();
        assert_eq!(res.totals.len(), 3);
        assert_eq!(res.credits("pid-002"), Some(0.0));
        // Evaluated but not signed does not give credits.
        assert_eq!(res.credits("pid-003"), Some(0.0));
        assert_eq!(
            res.matrix.status(&pres("ses-001", "Lee"), "pid-003"),
            Some(CellStatus::EvaluatedOnly)
        );
        assert_eq!(
            res.matrix.status(&pres("ses-001", "Lee"), "pid-002"),
            Some(CellStatus::Neither)
        );
    }

    #[test]
    fn session_counted_once() {
        let res = Builder::new(&CreditRules::DEFAULT_RULES)
            .session("ses-001", 120.0, &["Lee", "Patel"])
            .participant("pid-001", &["ses-001"])
            .participant("pid-002", &["ses-001"])
            .response("pid-001", "Lee")
            .response("pid-002", "Patel")
            .reconcile()
            .unwrap();
        assert_eq!(res.credits("pid-001"), Some(2.0));
        assert_eq!(res.credits("pid-002"), Some(2.0));
    }

    #[test]
    fn empty_sessions_give_nothing() {
        let res = Builder::new(&CreditRules::DEFAULT_RULES)
            .session("ses-001", 60.0, &[])
            .session("ses-002", 0.0, &["Lee"])
            .session("ses-003", 30.0, &["Kim"])
            .participant("pid-001", &["ses-001", "ses-002", "ses-003"])
            .reconcile()
            .unwrap();
        assert_eq!(res.credits("pid-001"), Some(0.5));
        assert_eq!(res.index.presentations().len(), 2);
    }

    #[test]
    fn unknown_presenter_fails() {
        let res = Builder::new(&CreditRules::DEFAULT_RULES)
            .session("ses-001", 60.0, &["Lee"])
            .participant("pid-001", &["ses-001"])
            .response("pid-001", "Smith")
            .reconcile();
        assert_eq!(
            res,
            Err(ReconcileError::UnknownPresenter {
                presenter: "Smith".to_string(),
                participant_id: "pid-001".to_string()
            })
        );
    }

    #[test]
    fn unknown_participant_fails() {
        let res = Builder::new(&CreditRules::DEFAULT_RULES)
            .session("ses-001", 60.0, &["Lee"])
            .participant("pid-001", &["ses-001"])
            .response("pid-009", "Lee")
            .reconcile();
        assert_eq!(
            res,
            Err(ReconcileError::UnknownParticipant {
                participant_id: "pid-009".to_string()
            })
        );
    }

    #[test]
    fn registry_validation() {
        let dup_presenter = Builder::new(&CreditRules::DEFAULT_RULES)
            .session("ses-001", 60.0, &["Lee", "Lee"])
            .registry();
        assert!(matches!(
            dup_presenter,
            Err(ReconcileError::DuplicatePresenter { .. })
        ));

        // A signature for a session missing from the registry is reported,
        // the other sessions are still credited.
        let unknown_session = Builder::new(&CreditRules::DEFAULT_RULES)
            .session("ses-001", 60.0, &["Lee"])
            .participant("pid-001", &["ses-001", "ses-009"])
            .reconcile()
            .unwrap();
        assert_eq!(unknown_session.credits("pid-001"), Some(1.0));
        assert_eq!(
            unknown_session.diagnostics.unknown_sessions,
            vec![UnknownSignedSession {
                participant_id: "pid-001".to_string(),
                session_id: "ses-009".to_string(),
            }]
        );
        assert!(!unknown_session.diagnostics.is_empty());

        let negative = Builder::new(&CreditRules::DEFAULT_RULES)
            .session("ses-001", -5.0, &["Lee"])
            .registry();
        assert!(matches!(
            negative,
            Err(ReconcileError::InvalidDuration { .. })
        ));

        let dup_session = Builder::new(&CreditRules::DEFAULT_RULES)
            .session("ses-001", 60.0, &["Lee"])
            .session("ses-001", 60.0, &["Kim"])
            .registry();
        assert!(matches!(
            dup_session,
            Err(ReconcileError::DuplicateSession { .. })
        ));
    }

    #[test]
    fn registry_lookups() {
        let registry = Builder::new(&CreditRules::DEFAULT_RULES)
            .session("ses-003", 30.0, &["Kim"])
            .session("ses-001", 60.0, &["Lee"])
            .session("ses-002", 45.0, &["Patel"])
            .participant("pid-002", &[])
            .participant_without_sheet("pid-001")
            .registry()
            .unwrap();
        let ids: Vec<&str> = registry.sessions().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["ses-001", "ses-002", "ses-003"]);
        assert_eq!(
            registry.session("ses-002").map(|s| s.duration_minutes),
            Some(45.0)
        );
        assert_eq!(
            registry.session("ses-003").map(|s| s.presenters.clone()),
            Some(vec!["Kim".to_string()])
        );
        assert!(registry.session("ses-004").is_none());
        assert!(registry.participant("pid-001").is_some());
        assert!(registry.participant("pid-003").is_none());
    }

    #[test]
    fn same_presenter_in_two_sessions() {
        // Presenters are matched by name only: both talks count as evaluated.
        let res = Builder::new(&CreditRules::DEFAULT_RULES)
            .session("ses-001", 60.0, &["Lee"])
            .session("ses-002", 60.0, &["Lee"])
            .participant("pid-001", &["ses-002"])
            .response("pid-001", "Lee")
            .reconcile()
            .unwrap();
        assert_eq!(
            res.matrix.status(&pres("ses-001", "Lee"), "pid-001"),
            Some(CellStatus::EvaluatedOnly)
        );
        assert_eq!(res.credits("pid-001"), Some(1.0));
    }

    #[test]
    fn matrix_rows_and_columns() {
        let res = Builder::new(&CreditRules::DEFAULT_RULES)
            .session("ses-001", 60.0, &["Lee", "Patel"])
            .session("ses-002", 60.0, &["Kim"])
            .participant("pid-001", &["ses-001"])
            .participant("pid-002", &["ses-002"])
            .response("pid-001", "Patel")
            .response("pid-002", "Lee")
            .reconcile()
            .unwrap();
        let m = &res.matrix;
        assert_eq!(m.num_filled(), 4);
        assert_eq!(
            m.by_presentation(&pres("ses-001", "Lee")),
            Some(vec![
                ("pid-001", CellStatus::SignedOnly),
                ("pid-002", CellStatus::EvaluatedOnly)
            ])
        );
        let col = m.by_participant("pid-002").unwrap();
        assert_eq!(col.len(), 2);
        assert_eq!(col[0], (&pres("ses-001", "Lee"), CellStatus::EvaluatedOnly));
        assert_eq!(col[1], (&pres("ses-002", "Kim"), CellStatus::SignedOnly));
        assert_eq!(m.by_participant("pid-404"), None);
        assert_eq!(m.status(&pres("ses-009", "Lee"), "pid-001"), None);
        assert_eq!(m.status_counts().get(&CellStatus::SignedOnly), Some(&2));
    }

    #[test]
    fn diagnostics_are_collected() {
        init();
        let res = Builder::new(&CreditRules::DEFAULT_RULES)
            .session("ses-001", 60.0, &["Lee", "Patel"])
            .session("ses-002", 60.0, &["Kim"])
            .participant("pid-001", &["ses-001"])
            .participant("pid-002", &[])
            .participant_without_sheet("pid-003")
            .participant_without_sheet("pid-004")
            .response("pid-001", "Lee")
            .response("pid-001", "Lee")
            .response("pid-001", "Kim")
            .response("pid-003", "Kim")
            .reconcile()
            .unwrap();
        let d = &res.diagnostics;
        assert_eq!(
            d.duplicate_submissions,
            vec![DuplicateSubmission {
                participant_id: "pid-001".to_string(),
                presenter: "Lee".to_string(),
                count: 2
            }]
        );
        assert_eq!(d.mismatches.len(), 2);
        assert_eq!(d.mismatches[0].participant_id, "pid-001");
        assert_eq!(d.mismatches[0].surveyed_only, vec!["Kim".to_string()]);
        assert_eq!(d.mismatches[0].signed_only, vec!["Patel".to_string()]);
        assert_eq!(d.mismatches[1].participant_id, "pid-003");
        assert_eq!(d.participation.did_nothing, vec!["pid-004".to_string()]);
        assert_eq!(d.participation.signed_sheet_only, vec!["pid-002".to_string()]);
        assert_eq!(d.participation.survey_only, vec!["pid-003".to_string()]);
        // Duplicates do not add credits.
        assert_eq!(res.credits("pid-001"), Some(1.0));
        assert!(!d.is_empty());
        d.report();
    }

    #[test]
    fn reconciliation_is_idempotent() {
        let builder = Builder::new(&CreditRules::DEFAULT_RULES)
            .session("ses-002", 45.0, &["Kim"])
            .session("ses-001", 90.0, &["Lee", "Patel"])
            .participant("pid-002", &["ses-001", "ses-002"])
            .participant("pid-001", &["ses-001"])
            .response("pid-001", "Lee")
            .response("pid-002", "Kim");
        let r1 = builder.reconcile().unwrap();
        let r2 = builder.reconcile().unwrap();
        assert_eq!(r1, r2);
        assert_eq!(r1.fingerprint(), r2.fingerprint());
        assert_eq!(r1.fingerprint().len(), 64);
        assert_eq!(r1.credits("pid-002"), Some(2.25));
        // Registry order is by identifier.
        assert_eq!(r1.totals[0].participant_id, "pid-001");
        assert_eq!(r1.index.presentations()[0], pres("ses-001", "Lee"));
    }
}
