use quiz_core::model::Trophy;

use super::{
    SqliteRepository,
    mapping::{db_err, localized_to_json, map_trophy_row},
};
use crate::repository::{StorageError, TrophyRepository};

#[async_trait::async_trait]
impl TrophyRepository for SqliteRepository {
    async fn ensure_trophy(&self, trophy: &Trophy) -> Result<bool, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO trophies (code, requirement_type, name, description)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(code) DO NOTHING
            ",
        )
        .bind(trophy.code())
        .bind(trophy.requirement().code())
        .bind(localized_to_json(trophy.name())?)
        .bind(localized_to_json(trophy.description())?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_trophies(&self) -> Result<Vec<Trophy>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT code, requirement_type, name, description
                FROM trophies
                ORDER BY json_extract(name, '$.en') ASC, code ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_trophy_row(&row)?);
        }
        Ok(out)
    }
}
