use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY,
            kind TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL,
            icon_class TEXT NOT NULL,
            display_order INTEGER NOT NULL CHECK (display_order >= 0)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS questions (
            id INTEGER PRIMARY KEY,
            category TEXT NOT NULL,
            difficulty TEXT NOT NULL,
            question_text TEXT NOT NULL,
            code_snippet TEXT,
            answer TEXT NOT NULL,
            hint_text TEXT NOT NULL,
            explanation TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (category) REFERENCES categories(kind) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS players (
            id INTEGER PRIMARY KEY,
            display_name TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS player_stats (
            player_id INTEGER PRIMARY KEY,
            player_level INTEGER NOT NULL CHECK (player_level >= 1),
            experience_points INTEGER NOT NULL CHECK (experience_points >= 0),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (player_id) REFERENCES players(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS game_sessions (
            id INTEGER PRIMARY KEY,
            player_id INTEGER NOT NULL,
            question_id INTEGER NOT NULL,
            started_at TEXT NOT NULL,
            end_at TEXT NOT NULL,
            completed_at TEXT,
            score INTEGER NOT NULL DEFAULT 0,
            CHECK (end_at > started_at),
            FOREIGN KEY (player_id) REFERENCES players(id) ON DELETE CASCADE,
            FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS attempts (
            id INTEGER PRIMARY KEY,
            session_id INTEGER NOT NULL,
            attempt_number INTEGER NOT NULL CHECK (attempt_number BETWEEN 1 AND 6),
            user_answer TEXT NOT NULL,
            is_correct INTEGER NOT NULL,
            attempted_at TEXT NOT NULL,
            UNIQUE (session_id, attempt_number),
            FOREIGN KEY (session_id) REFERENCES game_sessions(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS trophies (
            code TEXT PRIMARY KEY,
            requirement_type TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT NOT NULL
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_questions_category_difficulty_active
            ON questions (category, difficulty, is_active);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_questions_created
            ON questions (created_at);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_game_sessions_player_started
            ON game_sessions (player_id, started_at);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_game_sessions_end_at
            ON game_sessions (end_at);
    ",
];

/// Runs versioned migrations recorded in `schema_migrations`.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
        ",
    )
    .execute(pool)
    .await?;

    // Version 1: catalog, players, sessions and attempts.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        for statement in SCHEMA_V1.iter().copied() {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(version = 1, "applied schema migration");
    }

    Ok(())
}
