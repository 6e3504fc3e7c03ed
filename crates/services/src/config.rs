use chrono::Duration;

use crate::error::SettingsError;

pub const DEFAULT_SESSION_SECONDS: u32 = 60;
pub const MIN_SESSION_SECONDS: u32 = 5;
pub const MAX_SESSION_SECONDS: u32 = 3600;

const SESSION_SECONDS_VAR: &str = "QUIZ_SESSION_SECONDS";
const AUTO_COMPLETE_VAR: &str = "QUIZ_AUTO_COMPLETE";

/// Tunables for a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSettings {
    session_seconds: u32,
    auto_complete: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            session_seconds: DEFAULT_SESSION_SECONDS,
            auto_complete: true,
        }
    }
}

impl GameSettings {
    /// # Errors
    ///
    /// Returns `SettingsError::SessionLength` if `session_seconds` is outside
    /// `MIN_SESSION_SECONDS..=MAX_SESSION_SECONDS`.
    pub fn new(session_seconds: u32, auto_complete: bool) -> Result<Self, SettingsError> {
        if !(MIN_SESSION_SECONDS..=MAX_SESSION_SECONDS).contains(&session_seconds) {
            return Err(SettingsError::SessionLength {
                seconds: session_seconds,
                min: MIN_SESSION_SECONDS,
                max: MAX_SESSION_SECONDS,
            });
        }
        Ok(Self {
            session_seconds,
            auto_complete,
        })
    }

    /// Read `QUIZ_SESSION_SECONDS` and `QUIZ_AUTO_COMPLETE`, defaulting unset values.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if a variable is set but malformed or out of range.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like `from_env`, reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if a variable is set but malformed or out of range.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let defaults = Self::default();

        let session_seconds = match lookup(SESSION_SECONDS_VAR) {
            Some(raw) if !raw.trim().is_empty() => {
                raw.trim()
                    .parse::<u32>()
                    .map_err(|_| SettingsError::InvalidNumber {
                        var: SESSION_SECONDS_VAR,
                        raw: raw.clone(),
                    })?
            }
            _ => defaults.session_seconds,
        };

        let auto_complete = match lookup(AUTO_COMPLETE_VAR) {
            Some(raw) if !raw.trim().is_empty() => parse_flag(&raw).ok_or_else(|| {
                SettingsError::InvalidFlag {
                    var: AUTO_COMPLETE_VAR,
                    raw: raw.clone(),
                }
            })?,
            _ => defaults.auto_complete,
        };

        Self::new(session_seconds, auto_complete)
    }

    #[must_use]
    pub fn session_seconds(&self) -> u32 {
        self.session_seconds
    }

    #[must_use]
    pub fn session_duration(&self) -> Duration {
        Duration::seconds(i64::from(self.session_seconds))
    }

    /// Complete the session as soon as an attempt is correct or the last one is used.
    #[must_use]
    pub fn auto_complete(&self) -> bool {
        self.auto_complete
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
