mod handoff;
mod runner;
mod service;
mod view;

pub use handoff::{RecordingHandoff, ResultsHandoff};
pub use runner::{QuizRunner, TICK_PERIOD};
pub use service::{EmptyReason, QuizLaunch, QuizLoopService};
pub use view::{AnswerRow, AnswerVariant, NextAction, QuizView, answer_label};
