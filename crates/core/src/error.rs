use thiserror::Error;

use crate::model::{
    AlreadyCompletedError, AttemptError, CategoryError, GameSessionError, PlayerError,
    QuestionError, TrophyError,
};

/// Umbrella error for callers that do not care which domain rule failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    AlreadyCompleted(#[from] AlreadyCompletedError),
    #[error(transparent)]
    Session(#[from] GameSessionError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Player(#[from] PlayerError),
    #[error(transparent)]
    Trophy(#[from] TrophyError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MAX_ATTEMPTS;

    #[test]
    fn rule_errors_convert_into_the_umbrella() {
        let err: Error = AttemptError::AttemptLimitExceeded {
            limit: MAX_ATTEMPTS,
        }
        .into();
        assert!(matches!(err, Error::Attempt(_)));
        assert_eq!(err.to_string(), AttemptError::AttemptLimitExceeded { limit: 6 }.to_string());
    }
}
