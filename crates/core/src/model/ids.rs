use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for parsing an ID from a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            #[must_use]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            #[must_use]
            pub fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<u64>().map(Self::new).map_err(|_| ParseIdError {
                    kind: stringify!($name),
                })
            }
        }
    };
}

numeric_id!(
    /// Identifier of a timed game session.
    SessionId
);
numeric_id!(
    /// Identifier of a player.
    PlayerId
);
numeric_id!(
    /// Identifier of a quiz question.
    QuestionId
);
numeric_id!(
    /// Identifier of a question category.
    CategoryId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_display_and_parse() {
        let id = SessionId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!("42".parse::<SessionId>().unwrap(), id);
    }

    #[test]
    fn debug_includes_type_name() {
        assert_eq!(format!("{:?}", PlayerId::new(7)), "PlayerId(7)");
    }

    #[test]
    fn parse_error_names_the_kind() {
        let err = "nope".parse::<QuestionId>().unwrap_err();
        assert_eq!(err.to_string(), "failed to parse QuestionId from string");
    }

    #[test]
    fn category_id_rejects_negative() {
        assert!("-1".parse::<CategoryId>().is_err());
    }
}
