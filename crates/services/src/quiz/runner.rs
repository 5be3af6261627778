use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use trivia_core::model::QuizResult;
use trivia_core::session::{
    Advance, AnswerOutcome, QuizPhase, QuizSession, TickOutcome, TimerToken,
};

use super::handoff::ResultsHandoff;
use super::view::QuizView;

/// Countdown resolution.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Single slot for the task that emits countdown ticks.
///
/// Arming aborts the previous task before spawning the next, so at most one
/// ticker exists per runner.
struct Ticker {
    task: Option<JoinHandle<()>>,
    period: Duration,
}

impl Ticker {
    fn new(period: Duration) -> Self {
        Self { task: None, period }
    }

    fn arm(&mut self, token: TimerToken, ticks: mpsc::UnboundedSender<TimerToken>) {
        self.cancel();
        let period = self.period;
        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if ticks.send(token).is_err() {
                    break;
                }
            }
        }));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Drives one `QuizSession` in real time for a hosting screen.
///
/// Ticks and player input are applied through `&mut self`, so a host that
/// awaits `next_tick` alongside its input source in one `select!` loop never
/// applies them concurrently. Dropping the runner stops the countdown.
pub struct QuizRunner {
    session: QuizSession,
    ticker: Ticker,
    ticks_tx: mpsc::UnboundedSender<TimerToken>,
    ticks_rx: mpsc::UnboundedReceiver<TimerToken>,
    handoff: Arc<dyn ResultsHandoff>,
    result: Option<QuizResult>,
}

impl QuizRunner {
    /// Start ticking the session's first question.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn new(session: QuizSession, handoff: Arc<dyn ResultsHandoff>) -> Self {
        Self::with_period(session, handoff, TICK_PERIOD)
    }

    /// Like `new` with a custom tick period.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn with_period(
        session: QuizSession,
        handoff: Arc<dyn ResultsHandoff>,
        period: Duration,
    ) -> Self {
        let (ticks_tx, ticks_rx) = mpsc::unbounded_channel();
        let mut runner = Self {
            session,
            ticker: Ticker::new(period),
            ticks_tx,
            ticks_rx,
            handoff,
            result: None,
        };
        if let Some(token) = runner.session.live_timer() {
            runner.ticker.arm(token, runner.ticks_tx.clone());
        }
        runner
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.session.phase()
    }

    #[must_use]
    pub fn view(&self) -> Option<QuizView> {
        QuizView::from_session(&self.session)
    }

    /// Result of the finished session, once handed off.
    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    /// Whether a ticker task is currently live.
    #[must_use]
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    pub fn submit_answer(&mut self, answer_index: usize) -> Option<AnswerOutcome> {
        let outcome = self.session.submit_answer(answer_index)?;
        self.ticker.cancel();
        tracing::debug!(
            session_id = %self.session.id(),
            question_index = self.session.current_index(),
            answer_index,
            correct = outcome.correct,
            points = outcome.points,
            "answer submitted"
        );
        Some(outcome)
    }

    /// Wait for the next tick of the live countdown and apply it.
    ///
    /// Stale ticks are dropped and waiting continues; stays pending while no
    /// countdown is live. Cancel-safe.
    pub async fn next_tick(&mut self) -> TickOutcome {
        while let Some(token) = self.ticks_rx.recv().await {
            match self.session.tick(token) {
                TickOutcome::Ignored => {}
                TickOutcome::TimedOut => {
                    self.ticker.cancel();
                    tracing::debug!(
                        session_id = %self.session.id(),
                        question_index = self.session.current_index(),
                        "question timed out"
                    );
                    return TickOutcome::TimedOut;
                }
                counted @ TickOutcome::Counted { .. } => return counted,
            }
        }
        std::future::pending().await
    }

    /// Move past the revealed question; on the last one, hand the result off.
    pub fn advance(&mut self) -> Option<Advance> {
        let advance = self.session.advance()?;
        match &advance {
            Advance::Next { timer, .. } => {
                self.ticker.arm(*timer, self.ticks_tx.clone());
            }
            Advance::Finished(result) => {
                self.ticker.cancel();
                tracing::info!(
                    session_id = %self.session.id(),
                    category_id = %result.category_id(),
                    score = result.score(),
                    correct = result.correct(),
                    total = result.total(),
                    "quiz finished"
                );
                self.handoff.hand_off(result);
                self.result = Some(result.clone());
            }
        }
        Some(advance)
    }

    /// Leave the quiz; the countdown stops for good.
    pub fn close(&mut self) {
        self.session.close();
        self.ticker.cancel();
    }
}

impl std::fmt::Debug for QuizRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizRunner")
            .field("session", &self.session)
            .field("ticking", &self.is_ticking())
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}
