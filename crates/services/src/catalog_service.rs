//! Read-only catalog views rendered in one language.

use std::sync::Arc;

use serde::Serialize;

use quiz_core::model::{
    Category, CategoryKind, Difficulty, Language, Question, QuestionId, RequirementType, Trophy,
};
use storage::repository::{CatalogRepository, QuestionFilter, StorageError, TrophyRepository};

use crate::error::CatalogError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryView {
    pub kind: CategoryKind,
    pub label: &'static str,
    pub description: String,
    pub icon_class: String,
    pub order: u32,
}

impl CategoryView {
    fn render(category: &Category, language: Language) -> Self {
        Self {
            kind: category.kind(),
            label: category.kind().label(),
            description: category.description().get(language).to_owned(),
            icon_class: category.icon_class().to_owned(),
            order: category.order(),
        }
    }
}

/// A question as shown to a player. The expected answer is never included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub id: QuestionId,
    pub category: CategoryKind,
    pub difficulty: Difficulty,
    pub text: String,
    pub code_snippet: Option<String>,
    pub hint: String,
    pub explanation: String,
}

impl QuestionView {
    fn render(question: &Question, language: Language) -> Self {
        Self {
            id: question.id(),
            category: question.category(),
            difficulty: question.difficulty(),
            text: question.text().get(language).to_owned(),
            code_snippet: question.code_snippet().map(str::to_owned),
            hint: question.hint().get(language).to_owned(),
            explanation: question.explanation().get(language).to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrophyView {
    pub code: String,
    pub requirement: RequirementType,
    pub name: String,
    pub description: String,
}

impl TrophyView {
    fn render(trophy: &Trophy, language: Language) -> Self {
        Self {
            code: trophy.code().to_owned(),
            requirement: trophy.requirement(),
            name: trophy.name().get(language).to_owned(),
            description: trophy.description().get(language).to_owned(),
        }
    }
}

#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogRepository>,
    trophies: Arc<dyn TrophyRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogRepository>, trophies: Arc<dyn TrophyRepository>) -> Self {
        Self { catalog, trophies }
    }

    /// Categories in display order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` on storage failures.
    pub async fn categories(&self, language: Language) -> Result<Vec<CategoryView>, CatalogError> {
        let categories = self.catalog.list_categories().await?;
        Ok(categories
            .iter()
            .map(|c| CategoryView::render(c, language))
            .collect())
    }

    /// An active question.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Unavailable` if the question is missing or retired.
    pub async fn question(
        &self,
        id: QuestionId,
        language: Language,
    ) -> Result<QuestionView, CatalogError> {
        let question = match self.catalog.get_question(id).await {
            Ok(q) if q.is_active() => q,
            Ok(_) | Err(StorageError::NotFound) => return Err(CatalogError::Unavailable(id)),
            Err(err) => return Err(err.into()),
        };
        Ok(QuestionView::render(&question, language))
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Storage` on storage failures.
    pub async fn questions(
        &self,
        filter: QuestionFilter,
        language: Language,
    ) -> Result<Vec<QuestionView>, CatalogError> {
        let questions = self.catalog.list_questions(filter).await?;
        Ok(questions
            .iter()
            .map(|q| QuestionView::render(q, language))
            .collect())
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Storage` on storage failures.
    pub async fn trophies(&self, language: Language) -> Result<Vec<TrophyView>, CatalogError> {
        let trophies = self.trophies.list_trophies().await?;
        Ok(trophies
            .iter()
            .map(|t| TrophyView::render(t, language))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;
    use storage::repository::Storage;
    use storage::seed;

    async fn seeded() -> CatalogService {
        let storage = Storage::in_memory();
        seed::load_seed(&storage, fixed_now(), false).await.unwrap();
        CatalogService::new(storage.catalog, storage.trophies)
    }

    #[tokio::test]
    async fn categories_render_in_the_requested_language() {
        let svc = seeded().await;
        let en = svc.categories(Language::En).await.unwrap();
        let zh = svc.categories(Language::Zh).await.unwrap();
        assert_eq!(en[0].kind, CategoryKind::Html);
        assert_eq!(en[0].description, "HTML markup and semantic web");
        assert_eq!(zh[0].description, "HTML 標記語言與語意網路");
    }

    #[tokio::test]
    async fn question_views_never_carry_the_answer() {
        let svc = seeded().await;
        let filter = QuestionFilter {
            category: Some(CategoryKind::Python),
            difficulty: Some(Difficulty::Advanced),
            ..QuestionFilter::default()
        };
        let views = svc.questions(filter, Language::En).await.unwrap();
        assert_eq!(views.len(), 1);

        let json = serde_json::to_value(&views[0]).unwrap();
        assert!(json.get("answer").is_none());
        assert_eq!(json["difficulty"], "Advanced");
    }

    #[tokio::test]
    async fn missing_question_is_unavailable() {
        let svc = seeded().await;
        let err = svc
            .question(QuestionId::new(9_999), Language::En)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Unavailable(_)));
    }
}
