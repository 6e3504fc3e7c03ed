use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::PlayerId;

/// Experience needed per player level.
pub const XP_PER_LEVEL: u32 = 100;

const MAX_DISPLAY_NAME_LEN: usize = 150;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlayerError {
    #[error("display name cannot be empty")]
    EmptyName,

    #[error("display name is too long: {len} > {MAX_DISPLAY_NAME_LEN}")]
    NameTooLong { len: usize },

    #[error("player level must be >= 1")]
    InvalidLevel,

    #[error("updated_at is before created_at")]
    InvalidTimeRange,
}

/// A person playing the quiz. Identity and authentication live elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    id: PlayerId,
    display_name: String,
    created_at: DateTime<Utc>,
}

impl Player {
    /// # Errors
    ///
    /// Returns `PlayerError` if the display name is empty or too long.
    pub fn new(
        id: PlayerId,
        display_name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, PlayerError> {
        let display_name = display_name.into().trim().to_owned();
        if display_name.is_empty() {
            return Err(PlayerError::EmptyName);
        }
        let len = display_name.chars().count();
        if len > MAX_DISPLAY_NAME_LEN {
            return Err(PlayerError::NameTooLong { len });
        }
        Ok(Self {
            id,
            display_name,
            created_at,
        })
    }

    #[must_use]
    pub fn with_id(mut self, id: PlayerId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn id(&self) -> PlayerId {
        self.id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Statistics every new player starts with.
    #[must_use]
    pub fn initial_stats(&self) -> PlayerStats {
        PlayerStats {
            player_id: self.id,
            player_level: 1,
            experience_points: 0,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Aggregate progression for a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStats {
    player_id: PlayerId,
    player_level: u32,
    experience_points: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PlayerStats {
    /// # Errors
    ///
    /// Returns `PlayerError` if the level is zero or the timestamps are inverted.
    pub fn from_persisted(
        player_id: PlayerId,
        player_level: u32,
        experience_points: u32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, PlayerError> {
        if player_level == 0 {
            return Err(PlayerError::InvalidLevel);
        }
        if updated_at < created_at {
            return Err(PlayerError::InvalidTimeRange);
        }
        Ok(Self {
            player_id,
            player_level,
            experience_points,
            created_at,
            updated_at,
        })
    }

    #[must_use]
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    #[must_use]
    pub fn player_level(&self) -> u32 {
        self.player_level
    }

    #[must_use]
    pub fn experience_points(&self) -> u32 {
        self.experience_points
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Add experience and recompute the level. Returns true if the level went up.
    pub fn award(&mut self, points: u32, now: DateTime<Utc>) -> bool {
        let before = self.player_level;
        self.experience_points = self.experience_points.saturating_add(points);
        self.player_level = 1_u32.saturating_add(self.experience_points / XP_PER_LEVEL);
        self.updated_at = now.max(self.created_at);
        self.player_level > before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn new_player_starts_at_level_one() {
        let player = Player::new(PlayerId::new(1), "  ada ", fixed_now()).unwrap();
        assert_eq!(player.display_name(), "ada");
        let stats = player.initial_stats();
        assert_eq!(stats.player_level(), 1);
        assert_eq!(stats.experience_points(), 0);
    }

    #[test]
    fn award_levels_up_every_hundred_points() {
        let player = Player::new(PlayerId::new(1), "ada", fixed_now()).unwrap();
        let mut stats = player.initial_stats();
        assert!(!stats.award(60, fixed_now()));
        assert!(stats.award(50, fixed_now()));
        assert_eq!(stats.experience_points(), 110);
        assert_eq!(stats.player_level(), 2);
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(
            Player::new(PlayerId::new(1), "   ", fixed_now()).unwrap_err(),
            PlayerError::EmptyName
        );
    }
}
