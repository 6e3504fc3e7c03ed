use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::CategoryId;
use crate::model::localized::LocalizedText;

const MAX_ICON_CLASS_LEN: usize = 50;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CategoryError {
    #[error("unknown category code: {0}")]
    UnknownKind(String),

    #[error("icon class is too long: {len} > {MAX_ICON_CLASS_LEN}")]
    IconClassTooLong { len: usize },
}

/// The fixed set of question categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoryKind {
    Html,
    Python,
    Django,
    JavaScript,
    Css,
    /// Pseudo-category: draw from every category.
    Random,
    Custom,
}

impl CategoryKind {
    pub const ALL: [CategoryKind; 7] = [
        CategoryKind::Html,
        CategoryKind::Python,
        CategoryKind::Django,
        CategoryKind::JavaScript,
        CategoryKind::Css,
        CategoryKind::Random,
        CategoryKind::Custom,
    ];

    /// Stable storage code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            CategoryKind::Html => "HTML",
            CategoryKind::Python => "PYTHON",
            CategoryKind::Django => "DJANGO",
            CategoryKind::JavaScript => "JS",
            CategoryKind::Css => "CSS",
            CategoryKind::Random => "RANDOM",
            CategoryKind::Custom => "CUSTOM",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            CategoryKind::Html => "HTML",
            CategoryKind::Python => "Python",
            CategoryKind::Django => "Django",
            CategoryKind::JavaScript => "JavaScript",
            CategoryKind::Css => "CSS",
            CategoryKind::Random => "Random",
            CategoryKind::Custom => "Custom",
        }
    }

    #[must_use]
    pub fn is_random(self) -> bool {
        matches!(self, CategoryKind::Random)
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CategoryKind {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryKind::ALL
            .into_iter()
            .find(|kind| kind.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CategoryError::UnknownKind(s.to_owned()))
    }
}

/// A question category shown on the category picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    id: CategoryId,
    kind: CategoryKind,
    description: LocalizedText,
    icon_class: String,
    order: u32,
}

impl Category {
    /// # Errors
    ///
    /// Returns `CategoryError::IconClassTooLong` if the icon class exceeds 50 characters.
    pub fn new(
        id: CategoryId,
        kind: CategoryKind,
        description: LocalizedText,
        icon_class: impl Into<String>,
        order: u32,
    ) -> Result<Self, CategoryError> {
        let icon_class = icon_class.into().trim().to_owned();
        let len = icon_class.chars().count();
        if len > MAX_ICON_CLASS_LEN {
            return Err(CategoryError::IconClassTooLong { len });
        }
        Ok(Self {
            id,
            kind,
            description,
            icon_class,
            order,
        })
    }

    #[must_use]
    pub fn id(&self) -> CategoryId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> CategoryKind {
        self.kind
    }

    #[must_use]
    pub fn description(&self) -> &LocalizedText {
        &self.description
    }

    #[must_use]
    pub fn icon_class(&self) -> &str {
        &self.icon_class
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Sort key used for listing: display order, then code.
    #[must_use]
    pub fn sort_key(&self) -> (u32, &'static str) {
        (self.order, self.kind.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_codes_round_trip() {
        for kind in CategoryKind::ALL {
            assert_eq!(kind.code().parse::<CategoryKind>().unwrap(), kind);
        }
        assert_eq!("js".parse::<CategoryKind>().unwrap(), CategoryKind::JavaScript);
        assert!("RUST".parse::<CategoryKind>().is_err());
    }

    #[test]
    fn rejects_long_icon_class() {
        let err = Category::new(
            CategoryId::new(1),
            CategoryKind::Html,
            LocalizedText::english("HTML"),
            "x".repeat(51),
            1,
        )
        .unwrap_err();
        assert_eq!(err, CategoryError::IconClassTooLong { len: 51 });
    }
}
