use std::sync::Mutex;

use trivia_core::model::QuizResult;

/// Destination for a finished session's result, e.g. a results screen.
pub trait ResultsHandoff: Send + Sync {
    fn hand_off(&self, result: &QuizResult);
}

/// Keeps every handed-off result in memory.
#[derive(Debug, Default)]
pub struct RecordingHandoff {
    results: Mutex<Vec<QuizResult>>,
}

impl RecordingHandoff {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn results(&self) -> Vec<QuizResult> {
        self.results
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn last(&self) -> Option<QuizResult> {
        self.results
            .lock()
            .ok()
            .and_then(|guard| guard.last().cloned())
    }
}

impl ResultsHandoff for RecordingHandoff {
    fn hand_off(&self, result: &QuizResult) {
        if let Ok(mut guard) = self.results.lock() {
            guard.push(result.clone());
        }
    }
}
