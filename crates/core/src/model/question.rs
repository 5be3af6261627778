use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::ids::{AnswerKey, CategoryId, QuestionId};
use crate::model::locale::{Locale, LocalizedText};

/// Countdown used when neither the question nor its category sets one.
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 20;
pub const MIN_ANSWERS: usize = 2;
pub const MAX_ANSWERS: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("question needs between 2 and 4 answers, got {len}")]
    AnswerCount { len: usize },

    #[error("answer {index} has no text")]
    EmptyAnswer { index: usize },

    #[error("correct answer index {index} is out of range for {len} answers")]
    CorrectAnswerOutOfRange { index: usize, len: usize },

    #[error("invalid image url: {raw}")]
    InvalidImageUrl { raw: String },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// One answer option as shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    key: AnswerKey,
    text: String,
}

impl Answer {
    #[must_use]
    pub fn key(&self) -> &AnswerKey {
        &self.key
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A playable question, already resolved to a single locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    category_id: CategoryId,
    text: String,
    answers: Vec<Answer>,
    correct_answer_index: usize,
    explanation: Option<String>,
    image_url: Option<Url>,
    time_limit_secs: Option<u32>,
}

/// Unvalidated question input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub category_id: CategoryId,
    pub text: String,
    pub answers: Vec<(AnswerKey, String)>,
    pub correct_answer_index: usize,
    pub explanation: Option<String>,
    pub image_url: Option<String>,
    pub time_limit_secs: Option<u32>,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(id: QuestionId, category_id: CategoryId, text: impl Into<String>) -> Self {
        Self {
            id,
            category_id,
            text: text.into(),
            answers: Vec::new(),
            correct_answer_index: 0,
            explanation: None,
            image_url: None,
            time_limit_secs: None,
        }
    }

    #[must_use]
    pub fn answer(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.answers.push((AnswerKey::new(key), text.into()));
        self
    }

    #[must_use]
    pub fn correct(mut self, index: usize) -> Self {
        self.correct_answer_index = index;
        self
    }

    #[must_use]
    pub fn explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    #[must_use]
    pub fn image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn time_limit_secs(mut self, secs: u32) -> Self {
        self.time_limit_secs = Some(secs);
        self
    }

    /// Validate the draft into a playable question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the text is blank, the answer count is outside
    /// 2..=4, an answer is blank, the correct index is out of range, or the image
    /// reference is not a valid URL.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }

        let len = self.answers.len();
        if !(MIN_ANSWERS..=MAX_ANSWERS).contains(&len) {
            return Err(QuestionError::AnswerCount { len });
        }

        let mut answers = Vec::with_capacity(len);
        for (index, (key, text)) in self.answers.into_iter().enumerate() {
            let text = text.trim().to_string();
            if text.is_empty() {
                return Err(QuestionError::EmptyAnswer { index });
            }
            answers.push(Answer { key, text });
        }

        if self.correct_answer_index >= len {
            return Err(QuestionError::CorrectAnswerOutOfRange {
                index: self.correct_answer_index,
                len,
            });
        }

        let image_url = match normalize_optional(self.image_url) {
            Some(raw) => Some(Url::parse(&raw).map_err(|_| QuestionError::InvalidImageUrl { raw })?),
            None => None,
        };

        Ok(Question {
            id: self.id,
            category_id: self.category_id,
            text,
            answers,
            correct_answer_index: self.correct_answer_index,
            explanation: normalize_optional(self.explanation),
            image_url,
            time_limit_secs: self.time_limit_secs,
        })
    }
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn category_id(&self) -> &CategoryId {
        &self.category_id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    #[must_use]
    pub fn correct_answer_index(&self) -> usize {
        self.correct_answer_index
    }

    #[must_use]
    pub fn is_correct(&self, answer_index: usize) -> bool {
        answer_index == self.correct_answer_index
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn image_url(&self) -> Option<&Url> {
        self.image_url.as_ref()
    }

    /// Configured limit, if the question sets one.
    #[must_use]
    pub fn configured_time_limit(&self) -> Option<u32> {
        self.time_limit_secs
    }

    /// Seconds the player gets for this question.
    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs.unwrap_or(DEFAULT_TIME_LIMIT_SECS)
    }

    /// Use `fallback` as the limit when the question does not set its own.
    #[must_use]
    pub fn inherit_time_limit(mut self, fallback: Option<u32>) -> Self {
        if self.time_limit_secs.is_none() {
            self.time_limit_secs = fallback;
        }
        self
    }
}

//
// ─── DOCUMENT ──────────────────────────────────────────────────────────────────
//

/// Localized answer option as authored in the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerDocument {
    pub key: AnswerKey,
    pub text: LocalizedText,
}

/// Localized question as authored in the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDocument {
    pub id: QuestionId,
    pub category_id: CategoryId,
    pub text: LocalizedText,
    pub answers: Vec<AnswerDocument>,
    pub correct_answer_index: usize,
    #[serde(default)]
    pub explanation: Option<LocalizedText>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub time_limit_secs: Option<u32>,
}

impl QuestionDocument {
    /// Resolve every text for `locale` (English fallback) and validate.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the resolved question is invalid.
    pub fn localize(&self, locale: Locale) -> Result<Question, QuestionError> {
        let resolve = |text: &LocalizedText| text.resolve(locale).unwrap_or_default().to_string();

        QuestionDraft {
            id: self.id.clone(),
            category_id: self.category_id.clone(),
            text: resolve(&self.text),
            answers: self
                .answers
                .iter()
                .map(|answer| (answer.key.clone(), resolve(&answer.text)))
                .collect(),
            correct_answer_index: self.correct_answer_index,
            explanation: self.explanation.as_ref().map(resolve),
            image_url: self.image_url.clone(),
            time_limit_secs: self.time_limit_secs,
        }
        .validate()
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuestionDraft {
        QuestionDraft::new(
            QuestionId::new("q-1"),
            CategoryId::new("brewing"),
            "Ideal brew temperature?",
        )
        .answer("a", "70 °C")
        .answer("b", "92 °C")
        .answer("c", "100 °C")
        .correct(1)
    }

    #[test]
    fn validates_and_defaults_time_limit() {
        let question = draft().validate().unwrap();
        assert_eq!(question.answers().len(), 3);
        assert!(question.is_correct(1));
        assert_eq!(question.time_limit_secs(), DEFAULT_TIME_LIMIT_SECS);
        assert_eq!(question.configured_time_limit(), None);
    }

    #[test]
    fn rejects_correct_index_out_of_range() {
        let err = draft().correct(3).validate().unwrap_err();
        assert_eq!(err, QuestionError::CorrectAnswerOutOfRange { index: 3, len: 3 });
    }

    #[test]
    fn rejects_answer_counts_outside_bounds() {
        let one = QuestionDraft::new(QuestionId::new("q"), CategoryId::new("c"), "Q")
            .answer("a", "only");
        assert_eq!(one.validate().unwrap_err(), QuestionError::AnswerCount { len: 1 });

        let five = draft().answer("d", "4").answer("e", "5");
        assert_eq!(five.validate().unwrap_err(), QuestionError::AnswerCount { len: 5 });
    }

    #[test]
    fn rejects_blank_text_and_answers() {
        let mut blank = draft();
        blank.text = "   ".into();
        assert_eq!(blank.validate().unwrap_err(), QuestionError::EmptyText);

        let blank_answer = draft().answer("d", " ");
        assert_eq!(
            blank_answer.validate().unwrap_err(),
            QuestionError::EmptyAnswer { index: 3 }
        );
    }

    #[test]
    fn rejects_bad_image_url_and_ignores_blank() {
        let err = draft().image_url("not a url").validate().unwrap_err();
        assert!(matches!(err, QuestionError::InvalidImageUrl { .. }));

        let question = draft().image_url("  ").validate().unwrap();
        assert!(question.image_url().is_none());
    }

    #[test]
    fn inherits_category_time_limit_only_when_unset() {
        let inherited = draft().validate().unwrap().inherit_time_limit(Some(30));
        assert_eq!(inherited.time_limit_secs(), 30);

        let own = draft()
            .time_limit_secs(10)
            .validate()
            .unwrap()
            .inherit_time_limit(Some(30));
        assert_eq!(own.time_limit_secs(), 10);
    }

    #[test]
    fn document_localizes_with_fallback() {
        let doc = QuestionDocument {
            id: QuestionId::new("q-2"),
            category_id: CategoryId::new("sensory"),
            text: LocalizedText::en("Which taste is acidity?").with(Locale::Es, "¿Qué sabor es la acidez?"),
            answers: vec![
                AnswerDocument {
                    key: AnswerKey::new("a"),
                    text: LocalizedText::en("Sour").with(Locale::Es, "Ácido"),
                },
                AnswerDocument {
                    key: AnswerKey::new("b"),
                    text: LocalizedText::en("Bitter"),
                },
            ],
            correct_answer_index: 0,
            explanation: Some(LocalizedText::en("Acidity reads as brightness.")),
            image_url: None,
            time_limit_secs: Some(15),
        };

        let question = doc.localize(Locale::Es).unwrap();
        assert_eq!(question.text(), "¿Qué sabor es la acidez?");
        assert_eq!(question.answers()[0].text(), "Ácido");
        assert_eq!(question.answers()[1].text(), "Bitter");
        assert_eq!(question.explanation(), Some("Acidity reads as brightness."));
        assert_eq!(question.time_limit_secs(), 15);
    }

    #[test]
    fn document_without_any_text_fails() {
        let doc = QuestionDocument {
            id: QuestionId::new("q-3"),
            category_id: CategoryId::new("sensory"),
            text: LocalizedText::new(),
            answers: Vec::new(),
            correct_answer_index: 0,
            explanation: None,
            image_url: None,
            time_limit_secs: None,
        };
        assert_eq!(doc.localize(Locale::En).unwrap_err(), QuestionError::EmptyText);
    }
}
