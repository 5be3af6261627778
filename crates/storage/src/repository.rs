use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use trivia_core::model::{
    Category, CategoryDocument, CategoryId, Locale, Question, QuestionDocument, QuestionId,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid document: {0}")]
    Invalid(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Source of playable questions for a category.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// All questions of a category, resolved for `locale`.
    ///
    /// Questions without their own time limit inherit the category's.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the source cannot be read.
    async fn questions_for_category(
        &self,
        category_id: &CategoryId,
        locale: Locale,
    ) -> Result<Vec<Question>, StorageError>;
}

/// Read access to the category tree.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Categories without a parent, ordered by display order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the source cannot be read.
    async fn top_level_categories(&self, locale: Locale) -> Result<Vec<Category>, StorageError>;

    /// Direct children of `parent_id`, ordered by display order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the source cannot be read.
    async fn subcategories(
        &self,
        parent_id: &CategoryId,
        locale: Locale,
    ) -> Result<Vec<Category>, StorageError>;

    /// Fetch a single category.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the source cannot be read.
    async fn get_category(
        &self,
        id: &CategoryId,
        locale: Locale,
    ) -> Result<Option<Category>, StorageError>;
}

/// Write access used by seeding and content sync.
#[async_trait]
pub trait ContentWriter: Send + Sync {
    /// Insert or replace a category document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Invalid` for documents that fail validation and
    /// `StorageError::Conflict` if the parent is unknown.
    async fn upsert_category(&self, category: &CategoryDocument) -> Result<(), StorageError>;

    /// Insert or replace a question document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Invalid` for documents that fail validation and
    /// `StorageError::Conflict` if the category is unknown.
    async fn upsert_question(&self, question: &QuestionDocument) -> Result<(), StorageError>;
}

/// Small key/value store for player preferences.
#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn get_preference(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on write failures.
    async fn set_preference(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

//
// ─── SHARED HELPERS ────────────────────────────────────────────────────────────
//

/// Reject documents that cannot be played in the fallback locale.
pub(crate) fn check_question(doc: &QuestionDocument) -> Result<(), StorageError> {
    doc.localize(Locale::FALLBACK)
        .map(|_| ())
        .map_err(|err| StorageError::Invalid(format!("question {}: {err}", doc.id)))
}

pub(crate) fn check_category(doc: &CategoryDocument) -> Result<(), StorageError> {
    doc.localize(Locale::FALLBACK)
        .map(|_| ())
        .map_err(|err| StorageError::Invalid(format!("category {}: {err}", doc.id)))
}

pub(crate) fn localize_question(
    doc: &QuestionDocument,
    locale: Locale,
    category_limit: Option<u32>,
) -> Result<Question, StorageError> {
    doc.localize(locale)
        .map(|question| question.inherit_time_limit(category_limit))
        .map_err(|err| StorageError::Serialization(format!("question {}: {err}", doc.id)))
}

pub(crate) fn localize_category(
    doc: &CategoryDocument,
    locale: Locale,
) -> Result<Category, StorageError> {
    doc.localize(locale)
        .map_err(|err| StorageError::Serialization(format!("category {}: {err}", doc.id)))
}

fn sort_categories(categories: &mut [Category]) {
    categories.sort_by(|left, right| {
        left.order()
            .cmp(&right.order())
            .then_with(|| left.id().cmp(right.id()))
    });
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    categories: Arc<Mutex<HashMap<CategoryId, CategoryDocument>>>,
    questions: Arc<Mutex<HashMap<QuestionId, QuestionDocument>>>,
    preferences: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn category_docs(&self) -> Result<Vec<CategoryDocument>, StorageError> {
        let guard = self
            .categories
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.values().cloned().collect())
    }

    fn localized_categories(
        &self,
        locale: Locale,
        filter: impl Fn(&CategoryDocument) -> bool,
    ) -> Result<Vec<Category>, StorageError> {
        let mut categories = self
            .category_docs()?
            .iter()
            .filter(|doc| filter(doc))
            .map(|doc| localize_category(doc, locale))
            .collect::<Result<Vec<_>, _>>()?;
        sort_categories(&mut categories);
        Ok(categories)
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn questions_for_category(
        &self,
        category_id: &CategoryId,
        locale: Locale,
    ) -> Result<Vec<Question>, StorageError> {
        let category_limit = {
            let guard = self
                .categories
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            guard.get(category_id).and_then(|doc| doc.time_limit_secs)
        };

        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut docs: Vec<&QuestionDocument> = guard
            .values()
            .filter(|doc| &doc.category_id == category_id)
            .collect();
        docs.sort_by(|left, right| left.id.cmp(&right.id));

        Ok(docs
            .into_iter()
            .filter_map(|doc| match localize_question(doc, locale, category_limit) {
                Ok(question) => Some(question),
                Err(err) => {
                    tracing::warn!(question_id = %doc.id, error = %err, "skipping invalid question");
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryRepository {
    async fn top_level_categories(&self, locale: Locale) -> Result<Vec<Category>, StorageError> {
        self.localized_categories(locale, |doc| doc.parent_id.is_none())
    }

    async fn subcategories(
        &self,
        parent_id: &CategoryId,
        locale: Locale,
    ) -> Result<Vec<Category>, StorageError> {
        self.localized_categories(locale, |doc| doc.parent_id.as_ref() == Some(parent_id))
    }

    async fn get_category(
        &self,
        id: &CategoryId,
        locale: Locale,
    ) -> Result<Option<Category>, StorageError> {
        let guard = self
            .categories
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .get(id)
            .map(|doc| localize_category(doc, locale))
            .transpose()
    }
}

#[async_trait]
impl ContentWriter for InMemoryRepository {
    async fn upsert_category(&self, category: &CategoryDocument) -> Result<(), StorageError> {
        check_category(category)?;
        let mut guard = self
            .categories
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if let Some(parent) = category.parent_id.as_ref() {
            if !guard.contains_key(parent) {
                return Err(StorageError::Conflict(format!("unknown parent category {parent}")));
            }
        }
        guard.insert(category.id.clone(), category.clone());
        Ok(())
    }

    async fn upsert_question(&self, question: &QuestionDocument) -> Result<(), StorageError> {
        check_question(question)?;
        let known_category = self
            .categories
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .contains_key(&question.category_id);
        if !known_category {
            return Err(StorageError::Conflict(format!(
                "unknown category {}",
                question.category_id
            )));
        }

        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(question.id.clone(), question.clone());
        Ok(())
    }
}

#[async_trait]
impl PreferencesRepository for InMemoryRepository {
    async fn get_preference(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .preferences
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set_preference(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .preferences
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub content: Arc<dyn ContentWriter>,
    pub preferences: Arc<dyn PreferencesRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            questions: Arc::new(repo.clone()),
            categories: Arc::new(repo.clone()),
            content: Arc::new(repo.clone()),
            preferences: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trivia_core::model::{AnswerDocument, AnswerKey, LocalizedText};

    fn category(id: &str, parent: Option<&str>, order: i32) -> CategoryDocument {
        CategoryDocument {
            id: CategoryId::new(id),
            title: LocalizedText::en(format!("Title {id}")).with(Locale::Es, format!("Título {id}")),
            slug: id.to_string(),
            description: None,
            parent_id: parent.map(CategoryId::new),
            color: None,
            icon: None,
            order,
            time_limit_secs: Some(30),
            image_url: None,
        }
    }

    fn question(id: &str, category_id: &str, limit: Option<u32>) -> QuestionDocument {
        QuestionDocument {
            id: QuestionId::new(id),
            category_id: CategoryId::new(category_id),
            text: LocalizedText::en("What is a ristretto?").with(Locale::Es, "¿Qué es un ristretto?"),
            answers: vec![
                AnswerDocument {
                    key: AnswerKey::new("a"),
                    text: LocalizedText::en("A short espresso"),
                },
                AnswerDocument {
                    key: AnswerKey::new("b"),
                    text: LocalizedText::en("A long espresso"),
                },
            ],
            correct_answer_index: 0,
            explanation: None,
            image_url: None,
            time_limit_secs: limit,
        }
    }

    #[tokio::test]
    async fn lists_categories_in_display_order() {
        let repo = InMemoryRepository::new();
        repo.upsert_category(&category("brewing", None, 2)).await.unwrap();
        repo.upsert_category(&category("intro", None, 1)).await.unwrap();
        repo.upsert_category(&category("pour-over", Some("brewing"), 0))
            .await
            .unwrap();

        let top = repo.top_level_categories(Locale::Es).await.unwrap();
        let ids: Vec<_> = top.iter().map(|c| c.id().as_str()).collect();
        assert_eq!(ids, ["intro", "brewing"]);
        assert_eq!(top[0].title(), "Título intro");

        let children = repo
            .subcategories(&CategoryId::new("brewing"), Locale::En)
            .await
            .unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].parent_id(), Some(&CategoryId::new("brewing")));
    }

    #[tokio::test]
    async fn questions_inherit_category_time_limit() {
        let repo = InMemoryRepository::new();
        repo.upsert_category(&category("brewing", None, 0)).await.unwrap();
        repo.upsert_question(&question("q1", "brewing", None)).await.unwrap();
        repo.upsert_question(&question("q2", "brewing", Some(12))).await.unwrap();

        let questions = repo
            .questions_for_category(&CategoryId::new("brewing"), Locale::Es)
            .await
            .unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].time_limit_secs(), 30);
        assert_eq!(questions[1].time_limit_secs(), 12);
        assert_eq!(questions[0].text(), "¿Qué es un ristretto?");
    }

    #[tokio::test]
    async fn skips_questions_that_fail_to_localize() {
        let repo = InMemoryRepository::new();
        repo.upsert_category(&category("brewing", None, 0)).await.unwrap();
        repo.upsert_question(&question("q1", "brewing", None)).await.unwrap();

        let mut broken = question("q0", "brewing", None);
        broken.answers.truncate(1);
        repo.questions
            .lock()
            .unwrap()
            .insert(broken.id.clone(), broken);

        let questions = repo
            .questions_for_category(&CategoryId::new("brewing"), Locale::En)
            .await
            .unwrap();
        let ids: Vec<_> = questions.iter().map(|q| q.id().as_str()).collect();
        assert_eq!(ids, ["q1"]);
    }

    #[tokio::test]
    async fn unknown_category_yields_no_questions() {
        let repo = InMemoryRepository::new();
        let questions = repo
            .questions_for_category(&CategoryId::new("missing"), Locale::En)
            .await
            .unwrap();
        assert!(questions.is_empty());
    }

    #[tokio::test]
    async fn rejects_invalid_and_orphan_documents() {
        let repo = InMemoryRepository::new();
        let err = repo
            .upsert_question(&question("q1", "nowhere", None))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));

        repo.upsert_category(&category("brewing", None, 0)).await.unwrap();
        let mut broken = question("q2", "brewing", None);
        broken.correct_answer_index = 5;
        let err = repo.upsert_question(&broken).await.unwrap_err();
        assert!(matches!(err, StorageError::Invalid(_)));

        let err = repo
            .upsert_category(&category("orphan", Some("ghost"), 0))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[tokio::test]
    async fn preferences_round_trip() {
        let repo = InMemoryRepository::new();
        assert_eq!(repo.get_preference("app.locale").await.unwrap(), None);
        repo.set_preference("app.locale", "es").await.unwrap();
        assert_eq!(
            repo.get_preference("app.locale").await.unwrap().as_deref(),
            Some("es")
        );
    }
}
