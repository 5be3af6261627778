use std::sync::Arc;

use storage::repository::{CategoryRepository, QuestionRepository, Storage};

use crate::Clock;
use crate::catalog_service::CatalogService;
use crate::content_client::{ContentApiClient, ContentApiConfig};
use crate::error::AppServicesError;
use crate::quiz::{QuizLoopService, ResultsHandoff};
use crate::settings_service::SettingsService;

/// Assembles host-facing services over one storage backend.
///
/// When a content API is configured it serves questions and categories;
/// preferences always stay in local storage.
#[derive(Clone)]
pub struct AppServices {
    quiz_loop: Arc<QuizLoopService>,
    catalog: Arc<CatalogService>,
    settings: Arc<SettingsService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        content: Option<ContentApiConfig>,
        clock: Clock,
        handoff: Arc<dyn ResultsHandoff>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, content, clock, handoff))
    }

    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        content: Option<ContentApiConfig>,
        clock: Clock,
        handoff: Arc<dyn ResultsHandoff>,
    ) -> Self {
        let (questions, categories): (Arc<dyn QuestionRepository>, Arc<dyn CategoryRepository>) =
            match content {
                Some(config) => {
                    tracing::info!(
                        base_url = %config.base_url,
                        dataset = %config.dataset,
                        "using remote content api"
                    );
                    let client = Arc::new(ContentApiClient::new(config));
                    let questions: Arc<dyn QuestionRepository> = client.clone();
                    let categories: Arc<dyn CategoryRepository> = client;
                    (questions, categories)
                }
                None => (
                    Arc::clone(&storage.questions),
                    Arc::clone(&storage.categories),
                ),
            };

        Self {
            quiz_loop: Arc::new(QuizLoopService::new(clock, questions, handoff)),
            catalog: Arc::new(CatalogService::new(categories)),
            settings: Arc::new(SettingsService::new(Arc::clone(&storage.preferences))),
        }
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings)
    }
}
