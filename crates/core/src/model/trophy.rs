use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::model::localized::LocalizedText;

const MAX_CODE_LEN: usize = 50;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TrophyError {
    #[error("trophy code must be 1..={MAX_CODE_LEN} chars of A-Z, 0-9 or '_': {0:?}")]
    InvalidCode(String),

    #[error("trophy name cannot be empty")]
    EmptyName,

    #[error("unknown requirement type: {0}")]
    UnknownRequirement(String),
}

/// What kind of progress unlocks a trophy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RequirementType {
    #[default]
    Level,
    CategoryMaster,
}

impl RequirementType {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            RequirementType::Level => "LEVEL",
            RequirementType::CategoryMaster => "CATEGORY_MASTER",
        }
    }
}

impl FromStr for RequirementType {
    type Err = TrophyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "LEVEL" => Ok(RequirementType::Level),
            "CATEGORY_MASTER" => Ok(RequirementType::CategoryMaster),
            other => Err(TrophyError::UnknownRequirement(other.to_owned())),
        }
    }
}

/// An achievement in the trophy catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trophy {
    code: String,
    requirement: RequirementType,
    name: LocalizedText,
    description: LocalizedText,
}

impl Trophy {
    /// # Errors
    ///
    /// Returns `TrophyError` if the code is malformed or the name is blank.
    pub fn new(
        code: impl Into<String>,
        requirement: RequirementType,
        name: LocalizedText,
        description: LocalizedText,
    ) -> Result<Self, TrophyError> {
        let code = code.into();
        let valid = !code.is_empty()
            && code.len() <= MAX_CODE_LEN
            && code
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_');
        if !valid {
            return Err(TrophyError::InvalidCode(code));
        }
        if name.is_blank() {
            return Err(TrophyError::EmptyName);
        }
        Ok(Self {
            code,
            requirement,
            name,
            description,
        })
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn requirement(&self) -> RequirementType {
        self.requirement
    }

    #[must_use]
    pub fn name(&self) -> &LocalizedText {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &LocalizedText {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_must_be_upper_snake() {
        let name = LocalizedText::english("First Victory");
        assert!(Trophy::new("FIRST_WIN", RequirementType::Level, name.clone(), name.clone()).is_ok());
        assert!(matches!(
            Trophy::new("first-win", RequirementType::Level, name.clone(), name),
            Err(TrophyError::InvalidCode(_))
        ));
    }

    #[test]
    fn requirement_codes_parse() {
        assert_eq!(
            "CATEGORY_MASTER".parse::<RequirementType>().unwrap(),
            RequirementType::CategoryMaster
        );
        assert!("STREAK".parse::<RequirementType>().is_err());
    }
}
