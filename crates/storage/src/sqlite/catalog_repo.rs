use quiz_core::model::{Category, CategoryId, Question, QuestionId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{db_err, id_i64, localized_to_json, map_category_row, map_question_row, ser},
};
use crate::repository::{CatalogRepository, QuestionFilter, StorageError};

const QUESTION_COLUMNS: &str = r"
    id, category, difficulty, question_text, code_snippet, answer,
    hint_text, explanation, is_active, created_at, updated_at
";

fn row_id(row: &sqlx::sqlite::SqliteRow) -> Result<u64, StorageError> {
    let raw: i64 = row.try_get("id").map_err(ser)?;
    u64::try_from(raw).map_err(|_| StorageError::Serialization(format!("invalid id: {raw}")))
}

#[async_trait::async_trait]
impl CatalogRepository for SqliteRepository {
    async fn ensure_category(
        &self,
        category: &Category,
    ) -> Result<(CategoryId, bool), StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO categories (kind, description, icon_class, display_order)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(kind) DO NOTHING
            ",
        )
        .bind(category.kind().code())
        .bind(localized_to_json(category.description())?)
        .bind(category.icon_class())
        .bind(i64::from(category.order()))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let created = res.rows_affected() > 0;
        let row = sqlx::query("SELECT id FROM categories WHERE kind = ?1")
            .bind(category.kind().code())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok((CategoryId::new(row_id(&row)?), created))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, kind, description, icon_class, display_order
                FROM categories
                ORDER BY display_order ASC, kind ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_category_row(&row)?);
        }
        Ok(out)
    }

    async fn ensure_question(
        &self,
        question: &Question,
    ) -> Result<(QuestionId, bool), StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let existing = sqlx::query(
            r"
                SELECT id
                FROM questions
                WHERE category = ?1
                  AND difficulty = ?2
                  AND answer = ?3
                  AND json_extract(question_text, '$.en') = ?4
                LIMIT 1
            ",
        )
        .bind(question.category().code())
        .bind(question.difficulty().code())
        .bind(question.answer())
        .bind(question.text().en.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        if let Some(row) = existing {
            return Ok((QuestionId::new(row_id(&row)?), false));
        }

        let res = sqlx::query(
            r"
                INSERT INTO questions (
                    category, difficulty, question_text, code_snippet, answer,
                    hint_text, explanation, is_active, created_at, updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(question.category().code())
        .bind(question.difficulty().code())
        .bind(localized_to_json(question.text())?)
        .bind(question.code_snippet())
        .bind(question.answer())
        .bind(localized_to_json(question.hint())?)
        .bind(localized_to_json(question.explanation())?)
        .bind(question.is_active())
        .bind(question.created_at())
        .bind(question.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        let id = u64::try_from(res.last_insert_rowid())
            .map_err(|_| StorageError::Serialization("question id sign overflow".into()))?;
        Ok((QuestionId::new(id), true))
    }

    async fn update_question(&self, question: &Question) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
                UPDATE questions
                SET category = ?2,
                    difficulty = ?3,
                    question_text = ?4,
                    code_snippet = ?5,
                    answer = ?6,
                    hint_text = ?7,
                    explanation = ?8,
                    is_active = ?9,
                    updated_at = ?10
                WHERE id = ?1
            ",
        )
        .bind(id_i64("question_id", question.id().value())?)
        .bind(question.category().code())
        .bind(question.difficulty().code())
        .bind(localized_to_json(question.text())?)
        .bind(question.code_snippet())
        .bind(question.answer())
        .bind(localized_to_json(question.hint())?)
        .bind(localized_to_json(question.explanation())?)
        .bind(question.is_active())
        .bind(question.updated_at())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Question, StorageError> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_i64("question_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or(StorageError::NotFound)?;
        map_question_row(&row)
    }

    async fn list_questions(&self, filter: QuestionFilter) -> Result<Vec<Question>, StorageError> {
        let mut sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE 1 = 1");

        let category = filter.category.filter(|c| !c.is_random());
        let mut bind_index = 1;
        if category.is_some() {
            sql.push_str(" AND category = ?");
            sql.push_str(&bind_index.to_string());
            bind_index += 1;
        }
        if filter.difficulty.is_some() {
            sql.push_str(" AND difficulty = ?");
            sql.push_str(&bind_index.to_string());
            bind_index += 1;
        }
        if filter.active_only {
            sql.push_str(" AND is_active = 1");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");
        sql.push_str(" LIMIT ?");
        sql.push_str(&bind_index.to_string());

        let mut query = sqlx::query(&sql);
        if let Some(category) = category {
            query = query.bind(category.code());
        }
        if let Some(difficulty) = filter.difficulty {
            query = query.bind(difficulty.code());
        }
        query = query.bind(i64::from(filter.limit));

        let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_question_row(&row)?);
        }
        Ok(out)
    }

    async fn clear_catalog(&self) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        // questions cascade to sessions and attempts
        for statement in [
            "DELETE FROM questions",
            "DELETE FROM categories",
            "DELETE FROM trophies",
        ] {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }
}
