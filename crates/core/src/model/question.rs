use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::attempt::SubmittedAnswer;
use crate::model::category::CategoryKind;
use crate::model::ids::QuestionId;
use crate::model::localized::LocalizedText;

/// Longest accepted answer, for both the stored solution and player guesses.
pub const MAX_ANSWER_LEN: usize = 100;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("answer cannot be empty")]
    EmptyAnswer,

    #[error("answer is too long: {len} > {MAX_ANSWER_LEN}")]
    AnswerTooLong { len: usize },

    #[error("questions cannot be filed under the random category")]
    RandomCategory,

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),

    #[error("updated_at is before created_at")]
    InvalidTimeRange,
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
        Difficulty::Expert,
    ];

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Difficulty::Beginner => "BEGINNER",
            Difficulty::Intermediate => "INTERMEDIATE",
            Difficulty::Advanced => "ADVANCED",
            Difficulty::Expert => "EXPERT",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
            Difficulty::Expert => "Expert",
        };
        f.write_str(label)
    }
}

impl FromStr for Difficulty {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| QuestionError::UnknownDifficulty(s.to_owned()))
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Unvalidated question input, as authored in the seed catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub category: CategoryKind,
    pub difficulty: Difficulty,
    pub text: LocalizedText,
    pub code_snippet: Option<String>,
    pub answer: String,
    pub hint: LocalizedText,
    pub explanation: LocalizedText,
}

impl QuestionDraft {
    /// Validate the draft and assign it an id.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text or answer is empty, the answer is too long,
    /// or the category is the random pseudo-category.
    pub fn validate(self, id: QuestionId, now: DateTime<Utc>) -> Result<Question, QuestionError> {
        Question::from_persisted(
            id,
            self.category,
            self.difficulty,
            self.text,
            self.code_snippet,
            self.answer,
            self.hint,
            self.explanation,
            true,
            now,
            now,
        )
    }
}

/// A single quiz question with its expected answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    category: CategoryKind,
    difficulty: Difficulty,
    text: LocalizedText,
    code_snippet: Option<String>,
    answer: String,
    hint: LocalizedText,
    explanation: LocalizedText,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Question {
    /// Rehydrate a question from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if any field violates the question invariants.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: QuestionId,
        category: CategoryKind,
        difficulty: Difficulty,
        text: LocalizedText,
        code_snippet: Option<String>,
        answer: String,
        hint: LocalizedText,
        explanation: LocalizedText,
        is_active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, QuestionError> {
        if category.is_random() {
            return Err(QuestionError::RandomCategory);
        }
        if text.is_blank() {
            return Err(QuestionError::EmptyText);
        }
        let answer = answer.trim().to_owned();
        if answer.is_empty() {
            return Err(QuestionError::EmptyAnswer);
        }
        let len = answer.chars().count();
        if len > MAX_ANSWER_LEN {
            return Err(QuestionError::AnswerTooLong { len });
        }
        if updated_at < created_at {
            return Err(QuestionError::InvalidTimeRange);
        }
        let code_snippet = code_snippet.filter(|s| !s.trim().is_empty());

        Ok(Self {
            id,
            category,
            difficulty,
            text,
            code_snippet,
            answer,
            hint,
            explanation,
            is_active,
            created_at,
            updated_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn category(&self) -> CategoryKind {
        self.category
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn text(&self) -> &LocalizedText {
        &self.text
    }

    #[must_use]
    pub fn code_snippet(&self) -> Option<&str> {
        self.code_snippet.as_deref()
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    #[must_use]
    pub fn hint(&self) -> &LocalizedText {
        &self.hint
    }

    #[must_use]
    pub fn explanation(&self) -> &LocalizedText {
        &self.explanation
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn set_active(&mut self, active: bool, now: DateTime<Utc>) {
        self.is_active = active;
        self.updated_at = now.max(self.created_at);
    }

    /// Normalized form of the expected answer (trimmed, lowercase).
    #[must_use]
    pub fn normalized_answer(&self) -> String {
        normalize(&self.answer)
    }

    /// Compare a raw guess against the expected answer, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn is_correct(&self, guess: &str) -> bool {
        normalize(guess) == self.normalized_answer()
    }

    /// Grade a raw guess into an answer ready to be appended to a session.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyAnswer` or `QuestionError::AnswerTooLong` for unusable guesses.
    pub fn grade(&self, guess: &str) -> Result<SubmittedAnswer, QuestionError> {
        let text = guess.trim();
        if text.is_empty() {
            return Err(QuestionError::EmptyAnswer);
        }
        let len = text.chars().count();
        if len > MAX_ANSWER_LEN {
            return Err(QuestionError::AnswerTooLong { len });
        }
        Ok(SubmittedAnswer::new(text, self.is_correct(text)))
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn draft(answer: &str) -> QuestionDraft {
        QuestionDraft {
            category: CategoryKind::Python,
            difficulty: Difficulty::Beginner,
            text: LocalizedText::new("What keyword defines a function?", "哪個關鍵字定義函數？"),
            code_snippet: Some("def greet():\n    print(\"Hello\")".into()),
            answer: answer.into(),
            hint: LocalizedText::english("Short for define"),
            explanation: LocalizedText::default(),
        }
    }

    #[test]
    fn grading_ignores_case_and_whitespace() {
        let q = draft("Model").validate(QuestionId::new(1), fixed_now()).unwrap();
        assert!(q.is_correct("  model "));
        assert!(q.is_correct("MODEL"));
        assert!(!q.is_correct("models"));

        let graded = q.grade(" MODEL ").unwrap();
        assert_eq!(graded.text(), "MODEL");
        assert!(graded.is_correct());
    }

    #[test]
    fn rejects_blank_and_oversized_answers() {
        let err = draft("   ").validate(QuestionId::new(1), fixed_now()).unwrap_err();
        assert_eq!(err, QuestionError::EmptyAnswer);

        let q = draft("def").validate(QuestionId::new(1), fixed_now()).unwrap();
        assert_eq!(q.grade(" ").unwrap_err(), QuestionError::EmptyAnswer);
        let err = q.grade(&"x".repeat(101)).unwrap_err();
        assert_eq!(err, QuestionError::AnswerTooLong { len: 101 });
    }

    #[test]
    fn random_category_is_not_a_home_for_questions() {
        let mut d = draft("def");
        d.category = CategoryKind::Random;
        assert_eq!(
            d.validate(QuestionId::new(1), fixed_now()).unwrap_err(),
            QuestionError::RandomCategory
        );
    }

    #[test]
    fn difficulty_parses_codes() {
        assert_eq!("advanced".parse::<Difficulty>().unwrap(), Difficulty::Advanced);
        assert!("legendary".parse::<Difficulty>().is_err());
    }
}
