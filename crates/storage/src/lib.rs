#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    CategoryRepository, ContentWriter, InMemoryRepository, PreferencesRepository,
    QuestionRepository, Storage, StorageError,
};
