use std::sync::Arc;

use storage::repository::CategoryRepository;
use trivia_core::model::{Category, CategoryId, Locale};

use crate::error::QuizServiceError;

/// Read-only access to the category tree for menus.
#[derive(Clone)]
pub struct CatalogService {
    categories: Arc<dyn CategoryRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(categories: Arc<dyn CategoryRepository>) -> Self {
        Self { categories }
    }

    /// Categories without a parent, in display order.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` on repository failures.
    pub async fn top_level(&self, locale: Locale) -> Result<Vec<Category>, QuizServiceError> {
        Ok(self.categories.top_level_categories(locale).await?)
    }

    /// Direct children of `parent_id`, in display order.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` on repository failures.
    pub async fn subcategories(
        &self,
        parent_id: &CategoryId,
        locale: Locale,
    ) -> Result<Vec<Category>, QuizServiceError> {
        Ok(self.categories.subcategories(parent_id, locale).await?)
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::UnknownCategory` if no such category exists.
    pub async fn category(
        &self,
        id: &CategoryId,
        locale: Locale,
    ) -> Result<Category, QuizServiceError> {
        self.categories
            .get_category(id, locale)
            .await?
            .ok_or_else(|| QuizServiceError::UnknownCategory(id.clone()))
    }
}
