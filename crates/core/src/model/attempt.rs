use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::SessionId;
use crate::model::session::SessionStatus;

/// Maximum number of guesses allowed in one session.
pub const MAX_ATTEMPTS: u32 = 6;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Reasons an attempt cannot be appended to a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("attempt limit of {limit} reached")]
    AttemptLimitExceeded { limit: u32 },

    #[error("session is closed ({status})")]
    SessionClosed { status: SessionStatus },

    #[error("attempt number {number} conflicts with existing attempts")]
    SequenceConflict { number: u32 },

    #[error("attempt number {number} is out of range 1..={MAX_ATTEMPTS}")]
    InvalidNumber { number: u32 },
}

//
// ─── SUBMITTED ANSWER ──────────────────────────────────────────────────────────
//

/// A graded guess that has not been attached to a session yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedAnswer {
    text: String,
    is_correct: bool,
}

impl SubmittedAnswer {
    #[must_use]
    pub fn new(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            text: text.into(),
            is_correct,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

/// One guess within a session, numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    session_id: SessionId,
    number: u32,
    answer: String,
    is_correct: bool,
    attempted_at: DateTime<Utc>,
}

impl Attempt {
    pub(crate) fn new_numbered(
        session_id: SessionId,
        number: u32,
        answer: SubmittedAnswer,
        attempted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            number,
            answer: answer.text,
            is_correct: answer.is_correct,
            attempted_at,
        }
    }

    /// Rehydrate an attempt from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::InvalidNumber` if `number` is outside `1..=MAX_ATTEMPTS`.
    pub fn from_persisted(
        session_id: SessionId,
        number: u32,
        answer: String,
        is_correct: bool,
        attempted_at: DateTime<Utc>,
    ) -> Result<Self, AttemptError> {
        if number == 0 || number > MAX_ATTEMPTS {
            return Err(AttemptError::InvalidNumber { number });
        }
        Ok(Self {
            session_id,
            number,
            answer,
            is_correct,
            attempted_at,
        })
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn number(&self) -> u32 {
        self.number
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    #[must_use]
    pub fn attempted_at(&self) -> DateTime<Utc> {
        self.attempted_at
    }
}
