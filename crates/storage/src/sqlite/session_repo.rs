use chrono::{DateTime, Utc};
use quiz_core::model::{
    AlreadyCompletedError, Attempt, AttemptError, PlayerId, SessionId, XP_PER_LEVEL,
};
use sqlx::{Row, SqliteConnection};

use super::{
    SqliteRepository,
    mapping::{db_err, id_i64, is_write_race, map_attempt_row, map_session_row, map_stats_row},
};
use crate::repository::{
    CompletionRecord, GameSessionRepository, NewSessionRecord, SessionSnapshot, StorageError,
    recheck_append, settle_completion,
};

/// Session mutators take the write lock when they begin, so the rules they re-check
/// cannot go stale before the write.
const BEGIN_WRITE: &str = "BEGIN IMMEDIATE";

async fn fetch_snapshot(
    conn: &mut SqliteConnection,
    id: SessionId,
) -> Result<SessionSnapshot, StorageError> {
    let sid = id_i64("session_id", id.value())?;

    let row = sqlx::query(
        r"
            SELECT id, player_id, question_id, started_at, end_at, completed_at, score
            FROM game_sessions
            WHERE id = ?1
        ",
    )
    .bind(sid)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_err)?
    .ok_or(StorageError::NotFound)?;
    let session = map_session_row(&row)?;

    let rows = sqlx::query(
        r"
            SELECT session_id, attempt_number, user_answer, is_correct, attempted_at
            FROM attempts
            WHERE session_id = ?1
            ORDER BY attempt_number ASC
        ",
    )
    .bind(sid)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;

    let mut attempts = Vec::with_capacity(rows.len());
    for row in rows {
        attempts.push(map_attempt_row(&row)?);
    }

    Ok(SessionSnapshot { session, attempts })
}

#[async_trait::async_trait]
impl GameSessionRepository for SqliteRepository {
    async fn create_session(&self, record: NewSessionRecord) -> Result<SessionId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO game_sessions (player_id, question_id, started_at, end_at, score)
                VALUES (?1, ?2, ?3, ?4, 0)
            ",
        )
        .bind(id_i64("player_id", record.player_id.value())?)
        .bind(id_i64("question_id", record.question_id.value())?)
        .bind(record.started_at)
        .bind(record.end_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = u64::try_from(res.last_insert_rowid())
            .map_err(|_| StorageError::Serialization("session id sign overflow".into()))?;
        Ok(SessionId::new(id))
    }

    async fn load_session(&self, id: SessionId) -> Result<SessionSnapshot, StorageError> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        fetch_snapshot(&mut conn, id).await
    }

    async fn append_attempt(&self, attempt: &Attempt) -> Result<(), StorageError> {
        let race = |e: sqlx::Error| {
            if is_write_race(&e) {
                StorageError::Attempt(AttemptError::SequenceConflict {
                    number: attempt.number(),
                })
            } else {
                db_err(e)
            }
        };

        let mut tx = self.pool.begin_with(BEGIN_WRITE).await.map_err(race)?;
        let snapshot = fetch_snapshot(&mut tx, attempt.session_id()).await?;
        recheck_append(&snapshot, attempt)?;

        // Losing the write lock past the busy timeout or hitting the unique
        // (session_id, attempt_number) key both mean the number is stale.
        sqlx::query(
            r"
                INSERT INTO attempts (
                    session_id, attempt_number, user_answer, is_correct, attempted_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(id_i64("session_id", attempt.session_id().value())?)
        .bind(i64::from(attempt.number()))
        .bind(attempt.answer())
        .bind(attempt.is_correct())
        .bind(attempt.attempted_at())
        .execute(&mut *tx)
        .await
        .map_err(race)?;

        tx.commit().await.map_err(race)?;

        Ok(())
    }

    async fn complete_session(
        &self,
        id: SessionId,
        completed_at: DateTime<Utc>,
    ) -> Result<CompletionRecord, StorageError> {
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await.map_err(db_err)?;
        let mut snapshot = fetch_snapshot(&mut tx, id).await?;
        let pid = id_i64("player_id", snapshot.session.player_id().value())?;

        let row = sqlx::query(
            r"
                SELECT player_id, player_level, experience_points, created_at, updated_at
                FROM player_stats
                WHERE player_id = ?1
            ",
        )
        .bind(pid)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or(StorageError::NotFound)?;
        let mut stats = map_stats_row(&row)?;

        let (status, xp_awarded) = settle_completion(&mut snapshot, completed_at)?;

        let res = sqlx::query(
            r"
                UPDATE game_sessions
                SET completed_at = ?2, score = ?3
                WHERE id = ?1 AND completed_at IS NULL
            ",
        )
        .bind(id_i64("session_id", id.value())?)
        .bind(snapshot.session.completed_at())
        .bind(i64::from(snapshot.session.score()))
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            tx.rollback().await.map_err(db_err)?;
            let current = self.load_session(id).await?.session;
            let completed_at = current.completed_at().ok_or(StorageError::Conflict)?;
            return Err(AlreadyCompletedError { completed_at }.into());
        }

        let mut leveled_up = false;
        if xp_awarded > 0 {
            leveled_up = stats.award(xp_awarded, completed_at);
            sqlx::query(
                r"
                    UPDATE player_stats
                    SET experience_points = experience_points + ?2,
                        player_level = 1 + (experience_points + ?2) / ?3,
                        updated_at = ?4
                    WHERE player_id = ?1
                ",
            )
            .bind(pid)
            .bind(i64::from(xp_awarded))
            .bind(i64::from(XP_PER_LEVEL))
            .bind(stats.updated_at())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        tracing::debug!(
            session_id = id.value(),
            status = status.as_str(),
            xp_awarded,
            "completion stamped"
        );
        Ok(CompletionRecord {
            snapshot,
            status,
            xp_awarded,
            stats,
            leveled_up,
        })
    }

    async fn list_sessions_for_player(
        &self,
        player_id: PlayerId,
        limit: u32,
    ) -> Result<Vec<SessionSnapshot>, StorageError> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        let rows = sqlx::query(
            r"
                SELECT id
                FROM game_sessions
                WHERE player_id = ?1
                ORDER BY started_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(id_i64("player_id", player_id.value())?)
        .bind(i64::from(limit))
        .fetch_all(&mut *conn)
        .await
        .map_err(db_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: i64 = row.try_get("id").map_err(db_err)?;
            let id = u64::try_from(raw)
                .map_err(|_| StorageError::Serialization("session id sign overflow".into()))?;
            out.push(fetch_snapshot(&mut conn, SessionId::new(id)).await?);
        }
        Ok(out)
    }
}
