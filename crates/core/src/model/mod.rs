mod category;
mod ids;
mod locale;
mod question;
mod result;

pub use ids::{AnswerKey, CategoryId, EmptyIdError, QuestionId, SessionId};
pub use locale::{Locale, LocalizedText, UnsupportedLocale};

pub use category::{Category, CategoryDocument, CategoryError};
pub use question::{
    Answer, AnswerDocument, DEFAULT_TIME_LIMIT_SECS, MAX_ANSWERS, MIN_ANSWERS, Question,
    QuestionDocument, QuestionDraft, QuestionError,
};
pub use result::{QuizResult, QuizResultError, ResultRating};
