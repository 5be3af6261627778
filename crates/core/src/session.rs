use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;

use crate::error::QuizError;
use crate::model::{CategoryId, Question, QuizResult, SessionId};
use crate::scoring::points_for;
use crate::selection::select_questions;
use crate::time::Clock;

//
// ─── TIMER SLOT ────────────────────────────────────────────────────────────────
//

/// Identifies one armed countdown.
///
/// A tick is only applied when it carries the token of the live timer, so
/// ticks from a cancelled or superseded countdown are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    question_index: usize,
    generation: u64,
}

impl TimerToken {
    #[must_use]
    pub fn question_index(&self) -> usize {
        self.question_index
    }
}

/// Single-slot countdown owner; arming always replaces the previous token.
#[derive(Debug, Default)]
struct QuestionTimer {
    live: Option<TimerToken>,
    generation: u64,
}

impl QuestionTimer {
    fn arm(&mut self, question_index: usize) -> TimerToken {
        self.generation += 1;
        let token = TimerToken {
            question_index,
            generation: self.generation,
        };
        self.live = Some(token);
        token
    }

    fn cancel(&mut self) {
        self.live = None;
    }

    fn is_live(&self, token: TimerToken) -> bool {
        self.live == Some(token)
    }
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Where the session is in its per-question cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    /// Countdown running, waiting for an answer.
    Active { index: usize },
    /// Outcome shown; waiting for `advance`.
    Revealed { index: usize },
    /// Last question acknowledged and results produced.
    Terminated,
}

/// Result of an accepted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub answer_index: usize,
    pub correct: bool,
    pub points: u32,
    pub time_remaining: u32,
}

/// Effect of delivering a timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Stale or cancelled timer; nothing changed.
    Ignored,
    /// One second elapsed.
    Counted { time_remaining: u32 },
    /// Countdown hit zero with no answer; the question is now revealed.
    TimedOut,
}

/// Effect of `advance` on a revealed question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the next question with a freshly armed timer.
    Next { index: usize, timer: TimerToken },
    /// The last question was acknowledged.
    Finished(QuizResult),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One play-through of a category.
///
/// Owns the selected questions, the countdown slot and the running tally.
/// All mutation goes through `submit_answer`, `tick` and `advance`; calls that
/// do not fit the current phase are no-ops returning `None` / `Ignored`.
pub struct QuizSession {
    id: SessionId,
    category_id: CategoryId,
    questions: Vec<Question>,
    current: usize,
    selected: Option<usize>,
    revealed: bool,
    time_remaining: u32,
    score: u32,
    correct_count: u32,
    timer: QuestionTimer,
    clock: Clock,
    started_at: DateTime<Utc>,
}

impl QuizSession {
    /// Select and shuffle questions from `source`, then enter the first one.
    ///
    /// Selection happens exactly once here; the order is kept for the whole
    /// session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Empty` when `source` has no questions.
    pub fn start<R: Rng + ?Sized>(
        category_id: CategoryId,
        source: &[Question],
        rng: &mut R,
        clock: Clock,
    ) -> Result<Self, QuizError> {
        let questions = select_questions(source, rng);
        Self::with_questions(category_id, questions, clock)
    }

    /// Start a session over an already selected, ordered question list.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Empty` when `questions` is empty.
    pub fn with_questions(
        category_id: CategoryId,
        questions: Vec<Question>,
        clock: Clock,
    ) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::Empty);
        }

        let mut session = Self {
            id: SessionId::random(),
            category_id,
            questions,
            current: 0,
            selected: None,
            revealed: false,
            time_remaining: 0,
            score: 0,
            correct_count: 0,
            timer: QuestionTimer::default(),
            clock,
            started_at: clock.now(),
        };
        session.enter_current();
        Ok(session)
    }

    fn enter_current(&mut self) -> TimerToken {
        self.selected = None;
        self.revealed = false;
        self.time_remaining = self.questions[self.current].time_limit_secs();
        self.timer.arm(self.current)
    }

    fn reveal(&mut self) {
        self.timer.cancel();
        self.revealed = true;
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn category_id(&self) -> &CategoryId {
        &self.category_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// 0-based position; equals `total()` once terminated.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    #[must_use]
    pub fn selected_answer_index(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.current >= self.questions.len()
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        if self.is_terminated() {
            QuizPhase::Terminated
        } else if self.revealed {
            QuizPhase::Revealed {
                index: self.current,
            }
        } else {
            QuizPhase::Active {
                index: self.current,
            }
        }
    }

    /// Token of the countdown currently allowed to tick, if any.
    #[must_use]
    pub fn live_timer(&self) -> Option<TimerToken> {
        self.timer.live
    }

    /// Answer the current question.
    ///
    /// Returns `None` without touching state when the question is already
    /// revealed, an answer was already chosen, the session is over, or the
    /// index does not name an answer.
    pub fn submit_answer(&mut self, answer_index: usize) -> Option<AnswerOutcome> {
        if self.revealed || self.selected.is_some() {
            return None;
        }
        let question = self.questions.get(self.current)?;
        if answer_index >= question.answers().len() {
            return None;
        }

        let correct = question.is_correct(answer_index);
        let time_remaining = self.time_remaining;
        let points = points_for(correct, time_remaining);

        self.reveal();
        self.selected = Some(answer_index);
        self.score = self.score.saturating_add(points);
        if correct {
            self.correct_count += 1;
        }

        Some(AnswerOutcome {
            answer_index,
            correct,
            points,
            time_remaining,
        })
    }

    /// Apply one elapsed second from the countdown identified by `token`.
    pub fn tick(&mut self, token: TimerToken) -> TickOutcome {
        if !self.timer.is_live(token) || self.revealed || self.is_terminated() {
            return TickOutcome::Ignored;
        }

        if self.time_remaining <= 1 {
            self.time_remaining = 0;
            self.reveal();
            TickOutcome::TimedOut
        } else {
            self.time_remaining -= 1;
            TickOutcome::Counted {
                time_remaining: self.time_remaining,
            }
        }
    }

    /// Move past a revealed question.
    ///
    /// Returns `None` unless the current question is revealed.
    pub fn advance(&mut self) -> Option<Advance> {
        if !self.revealed || self.is_terminated() {
            return None;
        }

        if self.is_last_question() {
            self.timer.cancel();
            self.current = self.questions.len();
            return Some(Advance::Finished(self.result()));
        }

        self.current += 1;
        let timer = self.enter_current();
        Some(Advance::Next {
            index: self.current,
            timer,
        })
    }

    /// Stop the countdown for good, e.g. when the player leaves the screen.
    pub fn close(&mut self) {
        self.timer.cancel();
    }

    fn result(&self) -> QuizResult {
        let total = u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
        QuizResult::tallied(
            self.category_id.clone(),
            self.score,
            total,
            self.correct_count,
            self.started_at,
            self.clock.now(),
        )
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("category_id", &self.category_id)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("selected", &self.selected)
            .field("revealed", &self.revealed)
            .field("time_remaining", &self.time_remaining)
            .field("score", &self.score)
            .field("correct_count", &self.correct_count)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionDraft, QuestionId};
    use crate::time::{fixed_clock, fixed_now};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn question(id: &str, correct: usize, limit: Option<u32>) -> Question {
        let mut draft = QuestionDraft::new(QuestionId::new(id), CategoryId::new("brewing"), "Q?")
            .answer("a", "A")
            .answer("b", "B")
            .answer("c", "C")
            .correct(correct);
        draft.time_limit_secs = limit;
        draft.validate().unwrap()
    }

    fn session(limits: &[Option<u32>]) -> QuizSession {
        let questions = limits
            .iter()
            .enumerate()
            .map(|(i, limit)| question(&format!("q{i}"), 0, *limit))
            .collect();
        QuizSession::with_questions(CategoryId::new("brewing"), questions, fixed_clock()).unwrap()
    }

    fn tick_n(session: &mut QuizSession, n: usize) {
        for _ in 0..n {
            let token = session.live_timer().unwrap();
            session.tick(token);
        }
    }

    #[test]
    fn empty_source_is_rejected_before_any_timer_exists() {
        let mut rng = StdRng::seed_from_u64(9);
        let err = QuizSession::start(CategoryId::new("none"), &[], &mut rng, fixed_clock())
            .unwrap_err();
        assert_eq!(err, QuizError::Empty);
    }

    #[test]
    fn start_selects_at_most_fifteen_and_enters_first_question() {
        let source: Vec<_> = (0..20).map(|i| question(&format!("q{i}"), 0, None)).collect();
        let mut rng = StdRng::seed_from_u64(3);
        let session =
            QuizSession::start(CategoryId::new("brewing"), &source, &mut rng, fixed_clock())
                .unwrap();

        assert_eq!(session.total(), 15);
        assert_eq!(session.phase(), QuizPhase::Active { index: 0 });
        assert_eq!(session.time_remaining(), 20);
        assert_eq!(session.started_at(), fixed_now());
        assert!(session.live_timer().is_some());
    }

    #[test]
    fn correct_answer_scores_with_time_bonus() {
        let mut s = session(&[Some(20)]);
        tick_n(&mut s, 5);
        let outcome = s.submit_answer(0).unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.time_remaining, 15);
        assert_eq!(outcome.points, 250);
        assert_eq!(s.score(), 250);
        assert_eq!(s.correct_count(), 1);
        assert_eq!(s.phase(), QuizPhase::Revealed { index: 0 });
        assert!(s.live_timer().is_none());
    }

    #[test]
    fn wrong_answer_scores_nothing() {
        let mut s = session(&[None]);
        let outcome = s.submit_answer(2).unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.points, 0);
        assert_eq!(s.score(), 0);
        assert_eq!(s.correct_count(), 0);
        assert_eq!(s.selected_answer_index(), Some(2));
    }

    #[test]
    fn second_submission_is_a_noop() {
        let mut s = session(&[None]);
        s.submit_answer(1).unwrap();
        let before = (s.score(), s.correct_count(), s.selected_answer_index());

        assert!(s.submit_answer(0).is_none());
        assert!(s.submit_answer(1).is_none());
        assert_eq!((s.score(), s.correct_count(), s.selected_answer_index()), before);
    }

    #[test]
    fn out_of_range_answer_is_ignored() {
        let mut s = session(&[None]);
        assert!(s.submit_answer(3).is_none());
        assert!(!s.is_revealed());
        assert_eq!(s.selected_answer_index(), None);
        assert!(s.live_timer().is_some());
    }

    #[test]
    fn countdown_times_out_without_selection() {
        let mut s = session(&[Some(3)]);
        let token = s.live_timer().unwrap();
        assert_eq!(s.tick(token), TickOutcome::Counted { time_remaining: 2 });
        assert_eq!(s.tick(token), TickOutcome::Counted { time_remaining: 1 });
        assert_eq!(s.tick(token), TickOutcome::TimedOut);

        assert!(s.is_revealed());
        assert_eq!(s.time_remaining(), 0);
        assert_eq!(s.selected_answer_index(), None);
        assert_eq!(s.score(), 0);
        assert!(s.submit_answer(0).is_none());
    }

    #[test]
    fn no_tick_is_observed_after_reveal() {
        let mut s = session(&[Some(20)]);
        let token = s.live_timer().unwrap();
        s.tick(token);
        s.submit_answer(1).unwrap();

        for _ in 0..30 {
            assert_eq!(s.tick(token), TickOutcome::Ignored);
        }
        assert_eq!(s.time_remaining(), 19);
    }

    #[test]
    fn stale_tick_cannot_touch_next_question() {
        let mut s = session(&[Some(20), Some(20)]);
        let first = s.live_timer().unwrap();
        s.submit_answer(0).unwrap();

        let Some(Advance::Next { index, timer }) = s.advance() else {
            panic!("expected next question");
        };
        assert_eq!(index, 1);
        assert_ne!(first, timer);
        assert_eq!(timer.question_index(), 1);

        assert_eq!(s.tick(first), TickOutcome::Ignored);
        assert_eq!(s.time_remaining(), 20);
        assert!(!s.is_revealed());

        assert_eq!(s.tick(timer), TickOutcome::Counted { time_remaining: 19 });
    }

    #[test]
    fn advance_requires_reveal() {
        let mut s = session(&[None, None]);
        assert!(s.advance().is_none());
        assert_eq!(s.current_index(), 0);
    }

    #[test]
    fn advance_resets_per_question_state() {
        let mut s = session(&[Some(5), Some(12)]);
        s.submit_answer(2).unwrap();
        s.advance().unwrap();

        assert_eq!(s.phase(), QuizPhase::Active { index: 1 });
        assert_eq!(s.selected_answer_index(), None);
        assert_eq!(s.time_remaining(), 12);
    }

    #[test]
    fn three_correct_answers_hand_off_expected_tally() {
        let mut s = session(&[Some(20), Some(20), Some(0)]);

        assert_eq!(s.submit_answer(0).unwrap().points, 300);
        s.advance().unwrap();

        tick_n(&mut s, 10);
        assert_eq!(s.time_remaining(), 10);
        assert_eq!(s.submit_answer(0).unwrap().points, 200);
        s.advance().unwrap();

        assert_eq!(s.time_remaining(), 0);
        assert_eq!(s.submit_answer(0).unwrap().points, 100);

        let Some(Advance::Finished(result)) = s.advance() else {
            panic!("expected results");
        };
        assert_eq!(result.score(), 600);
        assert_eq!(result.total(), 3);
        assert_eq!(result.correct(), 3);
        assert_eq!(result.category_id(), &CategoryId::new("brewing"));
        assert_eq!(s.phase(), QuizPhase::Terminated);
        assert!(s.current_question().is_none());
        assert!(s.advance().is_none());
        assert!(s.submit_answer(0).is_none());
    }

    #[test]
    fn zero_second_question_times_out_on_first_tick() {
        let mut s = session(&[Some(0)]);
        let token = s.live_timer().unwrap();
        assert_eq!(s.tick(token), TickOutcome::TimedOut);
        assert_eq!(s.time_remaining(), 0);
    }

    #[test]
    fn score_and_correct_count_never_decrease() {
        let mut rng = StdRng::seed_from_u64(42);
        let limits: Vec<_> = (0..10).map(|_| Some(20)).collect();
        let mut s = session(&limits);
        let mut last = (0, 0);

        while !s.is_terminated() {
            match rng.random_range(0..4) {
                0 => {
                    let _ = s.submit_answer(rng.random_range(0..4));
                }
                1 => {
                    if let Some(token) = s.live_timer() {
                        s.tick(token);
                    }
                }
                2 => {
                    let _ = s.advance();
                }
                _ => {
                    let _ = s.submit_answer(0);
                }
            }
            let now = (s.score(), s.correct_count());
            assert!(now.0 >= last.0 && now.1 >= last.1);
            last = now;
        }
    }

    #[test]
    fn close_cancels_live_timer() {
        let mut s = session(&[None]);
        let token = s.live_timer().unwrap();
        s.close();
        assert_eq!(s.tick(token), TickOutcome::Ignored);
        assert_eq!(s.time_remaining(), 20);
    }
}
