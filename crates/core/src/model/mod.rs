mod attempt;
mod category;
mod ids;
mod localized;
mod player;
mod question;
mod session;
mod trophy;

pub use attempt::{Attempt, AttemptError, SubmittedAnswer, MAX_ATTEMPTS};
pub use category::{Category, CategoryError, CategoryKind};
pub use ids::{CategoryId, ParseIdError, PlayerId, QuestionId, SessionId};
pub use localized::{Language, LocalizedText, ParseLanguageError};
pub use player::{Player, PlayerError, PlayerStats, XP_PER_LEVEL};
pub use question::{Difficulty, Question, QuestionDraft, QuestionError, MAX_ANSWER_LEN};
pub use session::{AlreadyCompletedError, GameSession, GameSessionError, SessionStatus};
pub use trophy::{RequirementType, Trophy, TrophyError};
