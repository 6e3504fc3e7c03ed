use quiz_core::model::{Player, PlayerId, PlayerStats};

use super::{
    SqliteRepository,
    mapping::{db_err, id_i64, map_player_row, map_stats_row},
};
use crate::repository::{PlayerRepository, StorageError};

#[async_trait::async_trait]
impl PlayerRepository for SqliteRepository {
    async fn register_player(
        &self,
        player: &Player,
    ) -> Result<(Player, PlayerStats), StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let res = sqlx::query(
            r"
                INSERT INTO players (display_name, created_at)
                VALUES (?1, ?2)
            ",
        )
        .bind(player.display_name())
        .bind(player.created_at())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let id = u64::try_from(res.last_insert_rowid())
            .map_err(|_| StorageError::Serialization("player id sign overflow".into()))?;
        let player = player.clone().with_id(PlayerId::new(id));
        let stats = player.initial_stats();

        sqlx::query(
            r"
                INSERT INTO player_stats (
                    player_id, player_level, experience_points, created_at, updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(id_i64("player_id", id)?)
        .bind(i64::from(stats.player_level()))
        .bind(i64::from(stats.experience_points()))
        .bind(stats.created_at())
        .bind(stats.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        tracing::debug!(player_id = id, "registered player");
        Ok((player, stats))
    }

    async fn get_player(&self, id: PlayerId) -> Result<Player, StorageError> {
        let row = sqlx::query("SELECT id, display_name, created_at FROM players WHERE id = ?1")
            .bind(id_i64("player_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or(StorageError::NotFound)?;
        map_player_row(&row)
    }

    async fn get_stats(&self, id: PlayerId) -> Result<PlayerStats, StorageError> {
        let row = sqlx::query(
            r"
                SELECT player_id, player_level, experience_points, created_at, updated_at
                FROM player_stats
                WHERE player_id = ?1
            ",
        )
        .bind(id_i64("player_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(StorageError::NotFound)?;
        map_stats_row(&row)
    }
}
