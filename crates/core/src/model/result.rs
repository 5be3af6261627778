use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::CategoryId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizResultError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("a finished quiz has at least one question")]
    NoQuestions,

    #[error("correct answers ({correct}) exceed total questions ({total})")]
    CountMismatch { correct: u32, total: u32 },
}

/// Final tally of a finished play-through, handed to the results surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizResult {
    category_id: CategoryId,
    score: u32,
    total: u32,
    correct: u32,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

/// Coarse verdict shown next to the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultRating {
    Amazing,
    GreatJob,
    GoodEffort,
    KeepPracticing,
}

impl ResultRating {
    #[must_use]
    pub fn for_accuracy(percent: u32) -> Self {
        match percent {
            80.. => Self::Amazing,
            60..=79 => Self::GreatJob,
            40..=59 => Self::GoodEffort,
            _ => Self::KeepPracticing,
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Amazing => "Amazing!",
            Self::GreatJob => "Great job!",
            Self::GoodEffort => "Good effort!",
            Self::KeepPracticing => "Keep practicing!",
        }
    }

    #[must_use]
    pub fn emoji(self) -> &'static str {
        match self {
            Self::Amazing => "🏆",
            Self::GreatJob => "⭐",
            Self::GoodEffort => "👍",
            Self::KeepPracticing => "💪",
        }
    }
}

impl QuizResult {
    /// Build a result, checking that the counts and timestamps line up.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError` if `total` is zero, `correct > total`, or the
    /// time range is inverted.
    pub fn new(
        category_id: CategoryId,
        score: u32,
        total: u32,
        correct: u32,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, QuizResultError> {
        if completed_at < started_at {
            return Err(QuizResultError::InvalidTimeRange);
        }
        if total == 0 {
            return Err(QuizResultError::NoQuestions);
        }
        if correct > total {
            return Err(QuizResultError::CountMismatch { correct, total });
        }
        Ok(Self {
            category_id,
            score,
            total,
            correct,
            started_at,
            completed_at,
        })
    }

    /// Tally produced by a finished session, whose counts hold by construction.
    pub(crate) fn tallied(
        category_id: CategoryId,
        score: u32,
        total: u32,
        correct: u32,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            category_id,
            score,
            total,
            correct,
            started_at,
            completed_at: completed_at.max(started_at),
        }
    }

    #[must_use]
    pub fn category_id(&self) -> &CategoryId {
        &self.category_id
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn wrong(&self) -> u32 {
        self.total.saturating_sub(self.correct)
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Share of correct answers, rounded half up to a whole percent.
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let correct = u64::from(self.correct.min(self.total));
        let total = u64::from(self.total);
        u32::try_from((correct * 200 + total) / (total * 2)).unwrap_or(100)
    }

    #[must_use]
    pub fn rating(&self) -> ResultRating {
        ResultRating::for_accuracy(self.accuracy_percent())
    }
}
