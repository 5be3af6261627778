//! HTTP question source backed by a headless CMS query endpoint.
//!
//! Queries are GROQ documents sent to `{base_url}/data/query/{dataset}` with
//! `$`-prefixed JSON parameters. Text fields are resolved server-side for the
//! requested locale with an English fallback, so records arrive flat. The
//! response body is a `{ "result": ... }` envelope.

use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use storage::repository::{CategoryRepository, QuestionRepository, StorageError};
use trivia_core::model::{
    Category, CategoryDocument, CategoryId, Locale, LocalizedText, Question, QuestionDraft,
    QuestionId,
};

use crate::error::ContentApiError;

const CATEGORY_FIELDS: &str = r#"
    _id,
    "title": coalesce(title[_key == $locale][0].value, title[_key == "en"][0].value),
    "slug": slug.current,
    "description": coalesce(description[_key == $locale][0].value, description[_key == "en"][0].value),
    parent-> { _id },
    color,
    icon,
    order,
    image { asset-> { url } },
    timeLimit
"#;

const QUESTION_FIELDS: &str = r#"
    _id,
    "text": coalesce(text[_key == $locale][0].value, text[_key == "en"][0].value),
    category-> { _id, timeLimit },
    "answers": answers[] {
        _key,
        "text": coalesce(text[_key == $locale][0].value, text[_key == "en"][0].value)
    },
    correctAnswerIndex,
    "explanation": coalesce(explanation[_key == $locale][0].value, explanation[_key == "en"][0].value),
    image { asset-> { url } },
    timeLimit
"#;

fn categories_query() -> String {
    format!(r#"*[_type == "category" && !defined(parent)] | order(order asc) {{{CATEGORY_FIELDS}}}"#)
}

fn subcategories_query() -> String {
    format!(
        r#"*[_type == "category" && parent._ref == $parentId] | order(order asc) {{{CATEGORY_FIELDS}}}"#
    )
}

fn category_by_id_query() -> String {
    format!(r#"*[_type == "category" && _id == $categoryId][0] {{{CATEGORY_FIELDS}}}"#)
}

fn questions_query() -> String {
    format!(r#"*[_type == "question" && category._ref == $categoryId] | order(_id asc) {{{QUESTION_FIELDS}}}"#)
}

#[derive(Clone, Debug)]
pub struct ContentApiConfig {
    pub base_url: String,
    pub dataset: String,
}

impl ContentApiConfig {
    /// Read `TRIVIA_CONTENT_URL` and `TRIVIA_CONTENT_DATASET` (default
    /// `production`). Returns `None` when no URL is configured.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("TRIVIA_CONTENT_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let dataset = env::var("TRIVIA_CONTENT_DATASET")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "production".into());
        Some(Self { base_url, dataset })
    }

    fn query_url(&self) -> String {
        format!(
            "{}/data/query/{}",
            self.base_url.trim_end_matches('/'),
            self.dataset
        )
    }
}

#[derive(Clone)]
pub struct ContentApiClient {
    client: Client,
    config: ContentApiConfig,
}

impl ContentApiClient {
    #[must_use]
    pub fn new(config: ContentApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ContentApiError> {
        let pairs = query_pairs(query, params)?;
        let response = self
            .client
            .get(self.config.query_url())
            .query(&pairs)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ContentApiError::HttpStatus(response.status()));
        }

        let body = response.text().await?;
        decode_envelope(&body)
    }

    /// Top-level categories ordered by display order.
    ///
    /// # Errors
    ///
    /// Returns `ContentApiError` when the request fails or the body is malformed.
    pub async fn fetch_categories(&self, locale: Locale) -> Result<Vec<Category>, ContentApiError> {
        let records: Vec<CategoryRecord> = self
            .query(&categories_query(), &[("locale", locale.code())])
            .await?;
        Ok(categories_from_records(records, locale))
    }

    /// Direct children of `parent_id`.
    ///
    /// # Errors
    ///
    /// Returns `ContentApiError` when the request fails or the body is malformed.
    pub async fn fetch_subcategories(
        &self,
        parent_id: &CategoryId,
        locale: Locale,
    ) -> Result<Vec<Category>, ContentApiError> {
        let records: Vec<CategoryRecord> = self
            .query(
                &subcategories_query(),
                &[("locale", locale.code()), ("parentId", parent_id.as_str())],
            )
            .await?;
        Ok(categories_from_records(records, locale))
    }

    /// # Errors
    ///
    /// Returns `ContentApiError` when the request fails or the body is malformed.
    pub async fn fetch_category(
        &self,
        id: &CategoryId,
        locale: Locale,
    ) -> Result<Option<Category>, ContentApiError> {
        let record: Option<CategoryRecord> = self
            .query(
                &category_by_id_query(),
                &[("locale", locale.code()), ("categoryId", id.as_str())],
            )
            .await?;
        Ok(record.and_then(|record| record.into_category(locale)))
    }

    /// Every valid question of a category. Invalid records are skipped.
    ///
    /// # Errors
    ///
    /// Returns `ContentApiError` when the request fails or the body is malformed.
    pub async fn fetch_questions(
        &self,
        category_id: &CategoryId,
        locale: Locale,
    ) -> Result<Vec<Question>, ContentApiError> {
        let records: Vec<QuestionRecord> = self
            .query(
                &questions_query(),
                &[("locale", locale.code()), ("categoryId", category_id.as_str())],
            )
            .await?;
        Ok(questions_from_records(category_id, records))
    }
}

#[async_trait]
impl QuestionRepository for ContentApiClient {
    async fn questions_for_category(
        &self,
        category_id: &CategoryId,
        locale: Locale,
    ) -> Result<Vec<Question>, StorageError> {
        Ok(self.fetch_questions(category_id, locale).await?)
    }
}

#[async_trait]
impl CategoryRepository for ContentApiClient {
    async fn top_level_categories(&self, locale: Locale) -> Result<Vec<Category>, StorageError> {
        Ok(self.fetch_categories(locale).await?)
    }

    async fn subcategories(
        &self,
        parent_id: &CategoryId,
        locale: Locale,
    ) -> Result<Vec<Category>, StorageError> {
        Ok(self.fetch_subcategories(parent_id, locale).await?)
    }

    async fn get_category(
        &self,
        id: &CategoryId,
        locale: Locale,
    ) -> Result<Option<Category>, StorageError> {
        Ok(self.fetch_category(id, locale).await?)
    }
}

/// Query string for one request: the GROQ document plus each parameter as
/// `$name=<json value>`.
fn query_pairs(query: &str, params: &[(&str, &str)]) -> Result<Vec<(String, String)>, ContentApiError> {
    let mut pairs: Vec<(String, String)> = vec![("query".into(), query.to_string())];
    for (name, value) in params {
        let encoded = serde_json::to_string(value).map_err(ContentApiError::EncodeParams)?;
        pairs.push((format!("${name}"), encoded));
    }
    Ok(pairs)
}

//
// ─── WIRE RECORDS ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: T,
}

fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T, ContentApiError> {
    let envelope: Envelope<T> = serde_json::from_str(body).map_err(ContentApiError::Decode)?;
    Ok(envelope.result)
}

#[derive(Debug, Deserialize)]
struct Reference {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default, rename = "timeLimit")]
    time_limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CategoryRecord {
    #[serde(rename = "_id")]
    id: String,
    title: Option<String>,
    slug: Option<String>,
    description: Option<String>,
    parent: Option<Reference>,
    color: Option<String>,
    icon: Option<String>,
    order: Option<i32>,
    image: Option<ImageRecord>,
    #[serde(rename = "timeLimit")]
    time_limit: Option<u32>,
}

impl CategoryRecord {
    fn into_category(self, locale: Locale) -> Option<Category> {
        let localized = |value: Option<String>| value.map(|v| LocalizedText::new().with(locale, v));
        let id = self.id;
        let document = CategoryDocument {
            id: CategoryId::new(id.clone()),
            title: localized(self.title).unwrap_or_default(),
            slug: self.slug.unwrap_or_else(|| id.clone()),
            description: localized(self.description),
            parent_id: self.parent.map(|parent| CategoryId::new(parent.id)),
            color: self.color,
            icon: self.icon,
            order: self.order.unwrap_or_default(),
            time_limit_secs: self.time_limit,
            image_url: self.image.and_then(ImageRecord::into_url),
        };
        match document.localize(locale) {
            Ok(category) => Some(category),
            Err(err) => {
                tracing::warn!(category_id = %id, error = %err, "skipping invalid category record");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnswerRecord {
    #[serde(rename = "_key")]
    key: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageAsset {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageRecord {
    asset: Option<ImageAsset>,
}

impl ImageRecord {
    fn into_url(self) -> Option<String> {
        self.asset.and_then(|asset| asset.url)
    }
}

#[derive(Debug, Deserialize)]
struct QuestionRecord {
    #[serde(rename = "_id")]
    id: String,
    text: Option<String>,
    category: Option<Reference>,
    #[serde(default)]
    answers: Option<Vec<AnswerRecord>>,
    #[serde(rename = "correctAnswerIndex")]
    correct_answer_index: Option<usize>,
    explanation: Option<String>,
    image: Option<ImageRecord>,
    #[serde(default, rename = "timeLimit")]
    time_limit: Option<u32>,
}

impl QuestionRecord {
    fn into_question(self, category_id: &CategoryId) -> Option<Question> {
        let id = self.id;
        let category_limit = self.category.as_ref().and_then(|c| c.time_limit);
        let mut draft = QuestionDraft::new(
            QuestionId::new(id.clone()),
            category_id.clone(),
            self.text.unwrap_or_default(),
        );
        for answer in self.answers.unwrap_or_default() {
            draft = draft.answer(answer.key, answer.text.unwrap_or_default());
        }
        draft = draft.correct(self.correct_answer_index.unwrap_or(usize::MAX));
        if let Some(explanation) = self.explanation {
            draft = draft.explanation(explanation);
        }
        if let Some(url) = self.image.and_then(ImageRecord::into_url) {
            draft = draft.image_url(url);
        }
        if let Some(limit) = self.time_limit {
            draft = draft.time_limit_secs(limit);
        }

        match draft.validate() {
            Ok(question) => Some(question.inherit_time_limit(category_limit)),
            Err(err) => {
                tracing::warn!(question_id = %id, error = %err, "skipping invalid question record");
                None
            }
        }
    }
}

fn categories_from_records(records: Vec<CategoryRecord>, locale: Locale) -> Vec<Category> {
    records
        .into_iter()
        .filter_map(|record| record.into_category(locale))
        .collect()
}

fn questions_from_records(category_id: &CategoryId, records: Vec<QuestionRecord>) -> Vec<Question> {
    records
        .into_iter()
        .filter_map(|record| record.into_question(category_id))
        .collect()
}
