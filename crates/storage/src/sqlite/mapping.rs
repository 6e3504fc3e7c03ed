use chrono::{DateTime, Utc};
use quiz_core::model::{
    Attempt, Category, CategoryId, CategoryKind, Difficulty, GameSession, LocalizedText, Player,
    PlayerId, PlayerStats, Question, QuestionId, RequirementType, SessionId, Trophy,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Map a driver error; constraint violations become `Conflict`.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::RowNotFound => StorageError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() || db.is_foreign_key_violation() => {
            StorageError::Conflict
        }
        _ => StorageError::Connection(e.to_string()),
    }
}

/// True if a write lost against a concurrent writer (duplicate key or stale snapshot).
pub(crate) fn is_write_race(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => {
            db.is_unique_violation()
                // SQLITE_BUSY, SQLITE_BUSY_SNAPSHOT
                || db.code().is_some_and(|code| matches!(&*code, "5" | "517"))
        }
        _ => false,
    }
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn i32_from_i64(field: &'static str, v: i64) -> Result<i32, StorageError> {
    i32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn localized_to_json(text: &LocalizedText) -> Result<String, StorageError> {
    text.to_json().map_err(ser)
}

fn localized_column(row: &SqliteRow, column: &str) -> Result<LocalizedText, StorageError> {
    let raw: String = row.try_get(column).map_err(ser)?;
    LocalizedText::from_json(&raw).map_err(ser)
}

pub(crate) fn map_session_row(row: &SqliteRow) -> Result<GameSession, StorageError> {
    let id = i64_to_u64("id", row.try_get::<i64, _>("id").map_err(ser)?)?;
    let player = i64_to_u64("player_id", row.try_get::<i64, _>("player_id").map_err(ser)?)?;
    let question = i64_to_u64(
        "question_id",
        row.try_get::<i64, _>("question_id").map_err(ser)?,
    )?;
    let started_at: DateTime<Utc> = row.try_get("started_at").map_err(ser)?;
    let end_at: DateTime<Utc> = row.try_get("end_at").map_err(ser)?;
    let completed_at: Option<DateTime<Utc>> = row.try_get("completed_at").map_err(ser)?;
    let score = i32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;

    GameSession::from_persisted(
        SessionId::new(id),
        PlayerId::new(player),
        QuestionId::new(question),
        started_at,
        end_at,
        completed_at,
        score,
    )
    .map_err(ser)
}

pub(crate) fn map_attempt_row(row: &SqliteRow) -> Result<Attempt, StorageError> {
    let session = i64_to_u64("session_id", row.try_get::<i64, _>("session_id").map_err(ser)?)?;
    let number = u32_from_i64(
        "attempt_number",
        row.try_get::<i64, _>("attempt_number").map_err(ser)?,
    )?;
    Attempt::from_persisted(
        SessionId::new(session),
        number,
        row.try_get("user_answer").map_err(ser)?,
        row.try_get("is_correct").map_err(ser)?,
        row.try_get("attempted_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_category_row(row: &SqliteRow) -> Result<Category, StorageError> {
    let id = i64_to_u64("id", row.try_get::<i64, _>("id").map_err(ser)?)?;
    let kind: CategoryKind = row
        .try_get::<String, _>("kind")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let order = u32_from_i64(
        "display_order",
        row.try_get::<i64, _>("display_order").map_err(ser)?,
    )?;
    Category::new(
        CategoryId::new(id),
        kind,
        localized_column(row, "description")?,
        row.try_get::<String, _>("icon_class").map_err(ser)?,
        order,
    )
    .map_err(ser)
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let id = i64_to_u64("id", row.try_get::<i64, _>("id").map_err(ser)?)?;
    let category: CategoryKind = row
        .try_get::<String, _>("category")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let difficulty: Difficulty = row
        .try_get::<String, _>("difficulty")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;

    Question::from_persisted(
        QuestionId::new(id),
        category,
        difficulty,
        localized_column(row, "question_text")?,
        row.try_get("code_snippet").map_err(ser)?,
        row.try_get("answer").map_err(ser)?,
        localized_column(row, "hint_text")?,
        localized_column(row, "explanation")?,
        row.try_get("is_active").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_player_row(row: &SqliteRow) -> Result<Player, StorageError> {
    let id = i64_to_u64("id", row.try_get::<i64, _>("id").map_err(ser)?)?;
    Player::new(
        PlayerId::new(id),
        row.try_get::<String, _>("display_name").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_stats_row(row: &SqliteRow) -> Result<PlayerStats, StorageError> {
    let id = i64_to_u64("player_id", row.try_get::<i64, _>("player_id").map_err(ser)?)?;
    PlayerStats::from_persisted(
        PlayerId::new(id),
        u32_from_i64(
            "player_level",
            row.try_get::<i64, _>("player_level").map_err(ser)?,
        )?,
        u32_from_i64(
            "experience_points",
            row.try_get::<i64, _>("experience_points").map_err(ser)?,
        )?,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_trophy_row(row: &SqliteRow) -> Result<Trophy, StorageError> {
    let requirement: RequirementType = row
        .try_get::<String, _>("requirement_type")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    Trophy::new(
        row.try_get::<String, _>("code").map_err(ser)?,
        requirement,
        localized_column(row, "name")?,
        localized_column(row, "description")?,
    )
    .map_err(ser)
}
