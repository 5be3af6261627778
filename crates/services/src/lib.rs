#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod content_client;
pub mod error;
pub mod quiz;
pub mod settings_service;

pub use trivia_core::Clock;

pub use app_services::AppServices;
pub use catalog_service::CatalogService;
pub use content_client::{ContentApiClient, ContentApiConfig};
pub use error::{AppServicesError, ContentApiError, QuizServiceError, SettingsServiceError};
pub use quiz::{
    AnswerRow, AnswerVariant, EmptyReason, NextAction, QuizLaunch, QuizLoopService, QuizRunner,
    QuizView, RecordingHandoff, ResultsHandoff,
};
pub use settings_service::{LOCALE_KEY, SettingsService};
