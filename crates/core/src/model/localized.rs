use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported language code: {0}")]
pub struct ParseLanguageError(pub String);

/// Languages the quiz content is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    /// Traditional Chinese.
    Zh,
}

impl Language {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ParseLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en-gb" => Ok(Language::En),
            "zh" | "zh-hant" | "zh-tw" | "zh-hk" => Ok(Language::Zh),
            _ => Err(ParseLanguageError(s.to_owned())),
        }
    }
}

/// Bilingual text. English is always present; Chinese falls back to English.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zh: Option<String>,
}

impl LocalizedText {
    #[must_use]
    pub fn new(en: impl Into<String>, zh: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            zh: Some(zh.into()),
        }
    }

    #[must_use]
    pub fn english(en: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            zh: None,
        }
    }

    /// Returns the text for `language`, or the English text if no usable translation exists.
    #[must_use]
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::En => &self.en,
            Language::Zh => match self.zh.as_deref() {
                Some(text) if !text.trim().is_empty() => text,
                _ => &self.en,
            },
        }
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.en.trim().is_empty()
    }

    /// Encode for storage as a JSON object keyed by language code.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode the JSON object written by [`LocalizedText::to_json`].
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if the payload is not a valid object.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
