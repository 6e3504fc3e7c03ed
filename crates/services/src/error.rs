//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{
    AlreadyCompletedError, AttemptError, GameSessionError, PlayerError, QuestionError, QuestionId,
};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `GameService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GameError {
    #[error("question {0} is not active")]
    QuestionInactive(QuestionId),
    #[error("no active question matches the requested category and difficulty")]
    NoQuestions,
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    AlreadyCompleted(#[from] AlreadyCompletedError),
    #[error(transparent)]
    Session(#[from] GameSessionError),
    #[error(transparent)]
    Answer(#[from] QuestionError),
    #[error(transparent)]
    Storage(StorageError),
}

impl GameError {
    /// True when a concurrent submission won the attempt number twice in a row.
    #[must_use]
    pub fn is_sequence_conflict(&self) -> bool {
        matches!(self, GameError::Attempt(AttemptError::SequenceConflict { .. }))
    }
}

// Session rule violations reported by storage surface as their domain variant.
impl From<StorageError> for GameError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Attempt(e) => GameError::Attempt(e),
            StorageError::AlreadyCompleted(e) => GameError::AlreadyCompleted(e),
            other => GameError::Storage(other),
        }
    }
}

/// Errors emitted by `PlayerService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlayerServiceError {
    #[error(transparent)]
    Player(#[from] PlayerError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("question {0} is not available")]
    Unavailable(QuestionId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Invalid game configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("session length must be between {min} and {max} seconds, got {seconds}")]
    SessionLength { seconds: u32, min: u32, max: u32 },
    #[error("{var} is not a number: {raw}")]
    InvalidNumber { var: &'static str, raw: String },
    #[error("{var} is not a boolean: {raw}")]
    InvalidFlag { var: &'static str, raw: String },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_rule_violations_keep_their_domain_variant() {
        let err: GameError =
            StorageError::Attempt(AttemptError::SequenceConflict { number: 3 }).into();
        assert!(err.is_sequence_conflict());

        let err: GameError = StorageError::NotFound.into();
        assert!(matches!(err, GameError::Storage(StorageError::NotFound)));
    }
}
