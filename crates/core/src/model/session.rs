use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::{PlayerId, QuestionId, SessionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GameSessionError {
    #[error("session duration must be > 0")]
    InvalidDuration,

    #[error("end_at must be after started_at")]
    InvalidWindow,

    #[error("completed_at is before started_at")]
    CompletedBeforeStart,
}

/// Returned when completion is requested for a session that already has `completed_at`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("session already completed at {completed_at}")]
pub struct AlreadyCompletedError {
    pub completed_at: DateTime<Utc>,
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Derived state of a session. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    InProgress,
    Won,
    Lost,
    Abandoned,
}

impl SessionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::InProgress => "IN_PROGRESS",
            SessionStatus::Won => "WON",
            SessionStatus::Lost => "LOST",
            SessionStatus::Abandoned => "ABANDONED",
        }
    }

    /// Terminal states never transition again.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::InProgress)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── GAME SESSION ──────────────────────────────────────────────────────────────
//

/// One timed try at a question by a player.
///
/// `started_at` and `end_at` are fixed at creation. `completed_at` is stamped at most once
/// and `score` only changes together with it. Status is derived by
/// [`crate::session_clock::evaluate_status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    id: SessionId,
    player_id: PlayerId,
    question_id: QuestionId,
    started_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    score: i32,
}

impl GameSession {
    /// Start a new session at `now` that expires after `duration`.
    ///
    /// # Errors
    ///
    /// Returns `GameSessionError::InvalidDuration` if `duration` is not positive.
    pub fn start(
        id: SessionId,
        player_id: PlayerId,
        question_id: QuestionId,
        now: DateTime<Utc>,
        duration: Duration,
    ) -> Result<Self, GameSessionError> {
        if duration <= Duration::zero() {
            return Err(GameSessionError::InvalidDuration);
        }
        Ok(Self {
            id,
            player_id,
            question_id,
            started_at: now,
            end_at: now + duration,
            completed_at: None,
            score: 0,
        })
    }

    /// Rehydrate a session from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `GameSessionError` if the timestamps violate the session invariants.
    pub fn from_persisted(
        id: SessionId,
        player_id: PlayerId,
        question_id: QuestionId,
        started_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
        score: i32,
    ) -> Result<Self, GameSessionError> {
        if end_at <= started_at {
            return Err(GameSessionError::InvalidWindow);
        }
        if completed_at.is_some_and(|at| at < started_at) {
            return Err(GameSessionError::CompletedBeforeStart);
        }
        Ok(Self {
            id,
            player_id,
            question_id,
            started_at,
            end_at,
            completed_at,
            score,
        })
    }

    /// Returns the same session under the id assigned by storage.
    #[must_use]
    pub fn with_id(mut self, id: SessionId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn end_at(&self) -> DateTime<Utc> {
        self.end_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn score(&self) -> i32 {
        self.score
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Time left before the deadline, zero once it has passed.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.end_at - now).max(Duration::zero())
    }

    /// Stamp `completed_at`, optionally replacing the score.
    ///
    /// A `now` earlier than `started_at` is clamped so the stored value keeps
    /// `completed_at >= started_at`.
    pub(crate) fn stamp_completion(
        &mut self,
        now: DateTime<Utc>,
        score: Option<i32>,
    ) -> Result<(), AlreadyCompletedError> {
        if let Some(completed_at) = self.completed_at {
            return Err(AlreadyCompletedError { completed_at });
        }
        self.completed_at = Some(now.max(self.started_at));
        if let Some(score) = score {
            self.score = score;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn ids() -> (SessionId, PlayerId, QuestionId) {
        (SessionId::new(1), PlayerId::new(2), QuestionId::new(3))
    }

    #[test]
    fn start_fixes_the_window() {
        let (sid, pid, qid) = ids();
        let now = fixed_now();
        let session = GameSession::start(sid, pid, qid, now, Duration::seconds(60)).unwrap();
        assert_eq!(session.started_at(), now);
        assert_eq!(session.end_at(), now + Duration::seconds(60));
        assert_eq!(session.completed_at(), None);
        assert_eq!(session.score(), 0);
        assert_eq!(session.remaining(now + Duration::seconds(90)), Duration::zero());
    }

    #[test]
    fn zero_duration_is_rejected() {
        let (sid, pid, qid) = ids();
        let err = GameSession::start(sid, pid, qid, fixed_now(), Duration::zero()).unwrap_err();
        assert_eq!(err, GameSessionError::InvalidDuration);
    }

    #[test]
    fn persisted_invariants_are_checked() {
        let (sid, pid, qid) = ids();
        let now = fixed_now();
        assert_eq!(
            GameSession::from_persisted(sid, pid, qid, now, now, None, 0).unwrap_err(),
            GameSessionError::InvalidWindow
        );
        assert_eq!(
            GameSession::from_persisted(
                sid,
                pid,
                qid,
                now,
                now + Duration::seconds(60),
                Some(now - Duration::seconds(1)),
                0,
            )
            .unwrap_err(),
            GameSessionError::CompletedBeforeStart
        );
    }

    #[test]
    fn completion_is_stamped_once() {
        let (sid, pid, qid) = ids();
        let now = fixed_now();
        let mut session = GameSession::start(sid, pid, qid, now, Duration::seconds(60)).unwrap();
        session
            .stamp_completion(now + Duration::seconds(5), Some(40))
            .unwrap();

        let err = session
            .stamp_completion(now + Duration::seconds(10), Some(0))
            .unwrap_err();
        assert_eq!(err.completed_at, now + Duration::seconds(5));
        assert_eq!(session.completed_at(), Some(now + Duration::seconds(5)));
        assert_eq!(session.score(), 40);
    }

    #[test]
    fn status_strings_are_screaming_case() {
        assert_eq!(SessionStatus::InProgress.to_string(), "IN_PROGRESS");
        assert!(SessionStatus::Abandoned.is_terminal());
        assert!(!SessionStatus::InProgress.is_terminal());
    }
}
