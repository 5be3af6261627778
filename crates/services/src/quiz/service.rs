use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use storage::repository::QuestionRepository;
use trivia_core::model::{CategoryId, Locale};
use trivia_core::session::QuizSession;

use super::handoff::ResultsHandoff;
use super::runner::QuizRunner;
use crate::Clock;

/// Why a launch produced no playable session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// The source answered with no valid questions.
    NoQuestions,
    /// The source could not be read; details are logged.
    SourceUnavailable,
}

/// Outcome of starting a quiz for a category.
#[derive(Debug)]
pub enum QuizLaunch {
    Empty(EmptyReason),
    Ready(QuizRunner),
}

impl QuizLaunch {
    #[must_use]
    pub fn into_runner(self) -> Option<QuizRunner> {
        match self {
            QuizLaunch::Ready(runner) => Some(runner),
            QuizLaunch::Empty(_) => None,
        }
    }
}

/// Fetches a category's questions and starts playable sessions over them.
///
/// "Play again" is another `start_session` call with the same category: the
/// questions are fetched, selected and shuffled anew.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
    handoff: Arc<dyn ResultsHandoff>,
    seed: Option<u64>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        handoff: Arc<dyn ResultsHandoff>,
    ) -> Self {
        Self {
            clock,
            questions,
            handoff,
            seed: None,
        }
    }

    /// Use a fixed shuffle seed; every launch then selects the same order.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Load, select and start a session for `category_id`.
    ///
    /// A failing source and an empty category both end in `QuizLaunch::Empty`;
    /// the reason tells them apart.
    pub async fn start_session(&self, category_id: &CategoryId, locale: Locale) -> QuizLaunch {
        let source = match self.questions.questions_for_category(category_id, locale).await {
            Ok(source) => source,
            Err(err) => {
                tracing::warn!(category_id = %category_id, error = %err, "question source unavailable");
                return QuizLaunch::Empty(EmptyReason::SourceUnavailable);
            }
        };

        let started = match self.seed {
            Some(seed) => QuizSession::start(
                category_id.clone(),
                &source,
                &mut StdRng::seed_from_u64(seed),
                self.clock,
            ),
            None => QuizSession::start(category_id.clone(), &source, &mut rand::rng(), self.clock),
        };
        match started {
            Ok(session) => {
                tracing::info!(
                    session_id = %session.id(),
                    category_id = %category_id,
                    available = source.len(),
                    total = session.total(),
                    "quiz started"
                );
                QuizLaunch::Ready(QuizRunner::new(session, Arc::clone(&self.handoff)))
            }
            Err(err) => {
                tracing::info!(category_id = %category_id, error = %err, "no questions to play");
                QuizLaunch::Empty(EmptyReason::NoQuestions)
            }
        }
    }
}
