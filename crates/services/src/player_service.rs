use std::sync::Arc;

use quiz_core::model::{Player, PlayerId, PlayerStats};
use storage::repository::PlayerRepository;

use crate::Clock;
use crate::error::PlayerServiceError;

/// Player registration and progress lookups.
#[derive(Clone)]
pub struct PlayerService {
    clock: Clock,
    players: Arc<dyn PlayerRepository>,
}

impl PlayerService {
    #[must_use]
    pub fn new(clock: Clock, players: Arc<dyn PlayerRepository>) -> Self {
        Self { clock, players }
    }

    /// Register a player; level-one statistics are created with it.
    ///
    /// # Errors
    ///
    /// Returns `PlayerServiceError::Player` for an invalid name and
    /// `PlayerServiceError::Storage` if persistence fails.
    pub async fn register(
        &self,
        display_name: &str,
    ) -> Result<(Player, PlayerStats), PlayerServiceError> {
        let draft = Player::new(PlayerId::new(0), display_name, self.clock.now())?;
        let (player, stats) = self.players.register_player(&draft).await?;
        tracing::info!(player_id = player.id().value(), "player registered");
        Ok((player, stats))
    }

    /// # Errors
    ///
    /// Returns `PlayerServiceError::Storage` if the player does not exist.
    pub async fn player(&self, id: PlayerId) -> Result<Player, PlayerServiceError> {
        Ok(self.players.get_player(id).await?)
    }

    /// # Errors
    ///
    /// Returns `PlayerServiceError::Storage` if the player does not exist.
    pub async fn stats(&self, id: PlayerId) -> Result<PlayerStats, PlayerServiceError> {
        Ok(self.players.get_stats(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::PlayerError;
    use quiz_core::time::fixed_now;
    use storage::repository::{InMemoryRepository, StorageError};

    fn service() -> PlayerService {
        PlayerService::new(
            Clock::fixed(fixed_now()),
            Arc::new(InMemoryRepository::new()),
        )
    }

    #[tokio::test]
    async fn registration_creates_stats() {
        let svc = service();
        let (player, stats) = svc.register("Ada").await.unwrap();
        assert_eq!(stats.player_id(), player.id());

        let stored = svc.stats(player.id()).await.unwrap();
        assert_eq!(stored.player_level(), 1);
        assert_eq!(stored.experience_points(), 0);
        assert_eq!(svc.player(player.id()).await.unwrap().display_name(), "Ada");
    }

    #[tokio::test]
    async fn blank_names_are_rejected() {
        let err = service().register("   ").await.unwrap_err();
        assert!(matches!(err, PlayerServiceError::Player(PlayerError::EmptyName)));
    }

    #[tokio::test]
    async fn unknown_player_has_no_stats() {
        let err = service().stats(PlayerId::new(7)).await.unwrap_err();
        assert!(matches!(err, PlayerServiceError::Storage(StorageError::NotFound)));
    }
}
