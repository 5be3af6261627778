use trivia_core::session::QuizSession;

const LABELS: [&str; 4] = ["A", "B", "C", "D"];

/// How an answer row should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerVariant {
    /// Not revealed yet; styled by position.
    Option(usize),
    Correct,
    /// The player's pick, and it was wrong.
    Incorrect,
    Dimmed,
}

impl AnswerVariant {
    #[must_use]
    pub fn for_answer(index: usize, revealed: bool, is_correct: bool, is_selected: bool) -> Self {
        if !revealed {
            AnswerVariant::Option(index)
        } else if is_correct {
            AnswerVariant::Correct
        } else if is_selected {
            AnswerVariant::Incorrect
        } else {
            AnswerVariant::Dimmed
        }
    }
}

/// Letter shown next to the answer at `index`.
#[must_use]
pub fn answer_label(index: usize) -> &'static str {
    LABELS.get(index).copied().unwrap_or("?")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    NextQuestion,
    SeeResults,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRow {
    pub label: &'static str,
    pub text: String,
    pub variant: AnswerVariant,
}

/// Snapshot of the quiz screen for a host to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizView {
    pub question_text: String,
    pub image_url: Option<String>,
    /// Only present once the question is revealed.
    pub explanation: Option<String>,
    /// 1-based.
    pub position: usize,
    pub total: usize,
    pub time_remaining: u32,
    pub answers: Vec<AnswerRow>,
    pub revealed: bool,
    pub score: u32,
    pub correct_count: u32,
    /// Only present once the question is revealed.
    pub next_action: Option<NextAction>,
}

impl QuizView {
    /// Build a view of the current question; `None` once the session has finished.
    #[must_use]
    pub fn from_session(session: &QuizSession) -> Option<Self> {
        let question = session.current_question()?;
        let revealed = session.is_revealed();
        let selected = session.selected_answer_index();

        let answers = question
            .answers()
            .iter()
            .enumerate()
            .map(|(index, answer)| AnswerRow {
                label: answer_label(index),
                text: answer.text().to_string(),
                variant: AnswerVariant::for_answer(
                    index,
                    revealed,
                    question.is_correct(index),
                    selected == Some(index),
                ),
            })
            .collect();

        let next_action = revealed.then(|| {
            if session.is_last_question() {
                NextAction::SeeResults
            } else {
                NextAction::NextQuestion
            }
        });

        Some(Self {
            question_text: question.text().to_string(),
            image_url: question.image_url().map(ToString::to_string),
            explanation: if revealed {
                question.explanation().map(str::to_string)
            } else {
                None
            },
            position: session.current_index() + 1,
            total: session.total(),
            time_remaining: session.time_remaining(),
            answers,
            revealed,
            score: session.score(),
            correct_count: session.correct_count(),
            next_action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trivia_core::model::{CategoryId, Question, QuestionDraft, QuestionId};
    use trivia_core::time::fixed_clock;

    fn question(id: &str) -> Question {
        QuestionDraft::new(QuestionId::new(id), CategoryId::new("beans"), "Which is a bean?")
            .answer("a", "Arabica")
            .answer("b", "Oolong")
            .answer("c", "Matcha")
            .correct(0)
            .explanation("Arabica is a coffee species.")
            .validate()
            .unwrap()
    }

    #[test]
    fn variants_follow_reveal_state() {
        assert_eq!(
            AnswerVariant::for_answer(2, false, true, true),
            AnswerVariant::Option(2)
        );
        assert_eq!(
            AnswerVariant::for_answer(0, true, true, false),
            AnswerVariant::Correct
        );
        assert_eq!(
            AnswerVariant::for_answer(1, true, false, true),
            AnswerVariant::Incorrect
        );
        assert_eq!(
            AnswerVariant::for_answer(3, true, false, false),
            AnswerVariant::Dimmed
        );
    }

    #[test]
    fn hides_explanation_until_revealed() {
        let mut session = trivia_core::session::QuizSession::with_questions(
            CategoryId::new("beans"),
            vec![question("q1"), question("q2")],
            fixed_clock(),
        )
        .unwrap();

        let view = QuizView::from_session(&session).unwrap();
        assert_eq!(view.position, 1);
        assert_eq!(view.total, 2);
        assert_eq!(view.explanation, None);
        assert_eq!(view.next_action, None);
        let labels: Vec<_> = view.answers.iter().map(|row| row.label).collect();
        assert_eq!(labels, ["A", "B", "C"]);

        session.submit_answer(1).unwrap();
        let view = QuizView::from_session(&session).unwrap();
        assert!(view.revealed);
        assert_eq!(view.explanation.as_deref(), Some("Arabica is a coffee species."));
        assert_eq!(view.next_action, Some(NextAction::NextQuestion));
        let variants: Vec<_> = view.answers.iter().map(|row| row.variant).collect();
        assert_eq!(
            variants,
            [AnswerVariant::Correct, AnswerVariant::Incorrect, AnswerVariant::Dimmed]
        );
    }

    #[test]
    fn last_question_offers_results_and_finished_session_has_no_view() {
        let mut session = trivia_core::session::QuizSession::with_questions(
            CategoryId::new("beans"),
            vec![question("q1")],
            fixed_clock(),
        )
        .unwrap();
        session.submit_answer(0).unwrap();
        let view = QuizView::from_session(&session).unwrap();
        assert_eq!(view.next_action, Some(NextAction::SeeResults));
        assert_eq!(view.score, 300);

        session.advance().unwrap();
        assert!(QuizView::from_session(&session).is_none());
    }
}
