pub use crate::config::*;
use crate::{reconcile, Reconciliation, Registry};

/// A builder for assembling the registries and the surveys of a run.
///
/// The identifiers are taken as given: they should already be in their
/// canonical form.
///
/// ```
/// use ce_credits::builder::Builder;
/// use ce_credits::{CreditRules, ReconcileError};
///
/// let res = Builder::new(&CreditRules::DEFAULT_RULES)
///     .session("ses-001", 60.0, &["Lee", "Patel"])
///     .participant("pid-001", &["ses-001"])
///     .response("pid-001", "Lee")
///     .reconcile()?;
///
/// assert_eq!(res.credits("pid-001"), Some(1.0));
/// # Ok::<(), ReconcileError>(())
/// ```
#[derive(PartialEq, Debug, Clone)]
pub struct Builder {
    pub(crate) _rules: CreditRules,
    pub(crate) _sessions: Vec<Session>,
    pub(crate) _participants: Vec<Participant>,
    pub(crate) _responses: Vec<SurveyResponse>,
}

impl Builder {
    pub fn new(rules: &CreditRules) -> Builder {
        Builder {
            _rules: rules.clone(),
            _sessions: Vec::new(),
            _participants: Vec::new(),
            _responses: Vec::new(),
        }
    }

    pub fn session(mut self, id: &str, duration_minutes: f64, presenters: &[&str]) -> Builder {
        self._sessions.push(Session {
            id: id.to_string(),
            duration_minutes,
            presenters: presenters.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    /// Adds a participant who turned in a signed sheet, possibly empty.
    pub fn participant(mut self, id: &str, sessions_signed: &[&str]) -> Builder {
        self._participants.push(Participant {
            id: id.to_string(),
            sessions_signed: Some(sessions_signed.iter().map(|s| s.to_string()).collect()),
            sessions_attended: None,
        });
        self
    }

    pub fn participant_without_sheet(mut self, id: &str) -> Builder {
        self._participants.push(Participant {
            id: id.to_string(),
            sessions_signed: None,
            sessions_attended: None,
        });
        self
    }

    pub fn response(mut self, participant_id: &str, presenter: &str) -> Builder {
        self.add_response(&SurveyResponse {
            participant_id: participant_id.to_string(),
            presenter: presenter.to_string(),
            response_id: None,
        });
        self
    }

    pub fn add_response(&mut self, response: &SurveyResponse) {
        self._responses.push(response.clone());
    }

    pub fn registry(&self) -> Result<Registry, ReconcileError> {
        Registry::new(self._sessions.clone(), self._participants.clone())
    }

    pub fn reconcile(&self) -> Result<Reconciliation, ReconcileError> {
        let registry = self.registry()?;
        reconcile(&registry, &self._responses, &self._rules)
    }
}
