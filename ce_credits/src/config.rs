// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// A scheduled block of presentations. It is the unit of attendance sign-off
/// and of credit weighting.
#[derive(PartialEq, Debug, Clone)]
pub struct Session {
    /// The canonical identifier, for example `ses-001`.
    pub id: String,
    pub duration_minutes: f64,
    /// The presenters of this session, in the order of the program.
    pub presenters: Vec<String>,
}

/// A registered participant, as recorded from the signature sheets.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Participant {
    /// The canonical identifier, for example `pid-001`.
    pub id: String,
    /// The sessions this participant got signed off for.
    /// `None` if the participant did not turn in a signed sheet.
    pub sessions_signed: Option<Vec<String>>,
    /// Free-form attendance data. It only matters for the participation
    /// diagnostics, not for the credits.
    pub sessions_attended: Option<Vec<String>>,
}

/// One submitted evaluation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SurveyResponse {
    pub participant_id: String,
    /// The presenter key (last name) extracted from the presentation.
    pub presenter: String,
    /// The identifier of the row in the survey export, if known.
    pub response_id: Option<String>,
}

// ******** Output data structures *********

/// A single talk, identified by its session and its presenter.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct PresentationId {
    pub session_id: String,
    pub presenter: String,
}

impl Display for PresentationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.session_id, self.presenter)
    }
}

/// The reconciliation status of a (presentation, participant) pair.
///
/// The variants are ordered by completeness: a signed pair always scores
/// at least 2 and an evaluated pair always has an odd score.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum CellStatus {
    /// Neither signed off nor evaluated. Never stored in the matrix.
    Neither,
    /// Evaluated, but nobody signed the participant into the session.
    EvaluatedOnly,
    /// Signed off, but no survey was submitted for this presentation.
    SignedOnly,
    SignedAndEvaluated,
}

impl CellStatus {
    pub fn from_flags(signed: bool, evaluated: bool) -> CellStatus {
        match (signed, evaluated) {
            (true, true) => CellStatus::SignedAndEvaluated,
            (true, false) => CellStatus::SignedOnly,
            (false, true) => CellStatus::EvaluatedOnly,
            (false, false) => CellStatus::Neither,
        }
    }

    pub fn score(&self) -> u8 {
        match self {
            CellStatus::Neither => 0,
            CellStatus::EvaluatedOnly => 1,
            CellStatus::SignedOnly => 2,
            CellStatus::SignedAndEvaluated => 3,
        }
    }

    pub fn is_signed(&self) -> bool {
        self.score() >= 2
    }

    pub fn is_evaluated(&self) -> bool {
        self.score() % 2 == 1
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct ParticipantCredit {
    pub participant_id: String,
    pub credits: f64,
    /// The sessions that contributed to the credits, in registry order.
    pub sessions_credited: Vec<String>,
}

/// A participant who submitted more than one survey for the same presenter.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DuplicateSubmission {
    pub participant_id: String,
    pub presenter: String,
    pub count: usize,
}

/// The presenters for which the surveys and the signatures of a participant
/// disagree.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParticipantMismatch {
    pub participant_id: String,
    /// Surveyed, but no signature for any session of this presenter.
    pub surveyed_only: Vec<String>,
    /// Signed for the session, but no survey for this presenter.
    pub signed_only: Vec<String>,
}

/// A signature for a session that is not in the session registry. It never
/// matches a presentation, so it earns nothing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct UnknownSignedSession {
    pub participant_id: String,
    pub session_id: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ParticipationGaps {
    /// Registered, but no signed sheet and no survey.
    pub did_nothing: Vec<String>,
    /// Turned in a signed sheet, but no survey.
    pub signed_sheet_only: Vec<String>,
    /// Submitted surveys, but no signed sheet.
    pub survey_only: Vec<String>,
}

/// The non-fatal anomalies found during a reconciliation.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Diagnostics {
    pub duplicate_submissions: Vec<DuplicateSubmission>,
    pub mismatches: Vec<ParticipantMismatch>,
    pub unknown_sessions: Vec<UnknownSignedSession>,
    pub participation: ParticipationGaps,
}

/// Errors that prevent the reconciliation from completing successfully.
#[derive(PartialEq, Debug, Clone)]
pub enum ReconcileError {
    /// A survey names a presenter that is not part of any session.
    UnknownPresenter {
        presenter: String,
        participant_id: String,
    },
    /// A survey was submitted by somebody who is not registered.
    UnknownParticipant { participant_id: String },
    DuplicateSession { session_id: String },
    DuplicateParticipant { participant_id: String },
    /// Two presenters of the same session share the same key.
    DuplicatePresenter {
        session_id: String,
        presenter: String,
    },
    InvalidDuration { session_id: String, minutes: f64 },
}

impl Error for ReconcileError {}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileError::UnknownPresenter {
                presenter,
                participant_id,
            } => write!(
                f,
                "participant {} evaluated presenter {:?} who is not listed in any session",
                participant_id, presenter
            ),
            ReconcileError::UnknownParticipant { participant_id } => write!(
                f,
                "participant {} submitted a survey but is not in the participant registry",
                participant_id
            ),
            ReconcileError::DuplicateSession { session_id } => {
                write!(f, "session {} is registered twice", session_id)
            }
            ReconcileError::DuplicateParticipant { participant_id } => {
                write!(f, "participant {} is registered twice", participant_id)
            }
            ReconcileError::DuplicatePresenter {
                session_id,
                presenter,
            } => write!(
                f,
                "presenter key {:?} appears more than once in session {}",
                presenter, session_id
            ),
            ReconcileError::InvalidDuration {
                session_id,
                minutes,
            } => write!(f, "session {} has an invalid duration: {}", session_id, minutes),
        }
    }
}

// ********* Configuration **********

#[derive(PartialEq, Debug, Clone)]
pub struct CreditRules {
    /// The number of minutes that make one credit.
    pub minutes_per_credit: f64,
}

impl CreditRules {
    pub const DEFAULT_RULES: CreditRules = CreditRules {
        minutes_per_credit: 60.0,
    };

    pub fn session_weight(&self, session: &Session) -> f64 {
        if self.minutes_per_credit > 0.0 {
            session.duration_minutes / self.minutes_per_credit
        } else {
            0.0
        }
    }
}
