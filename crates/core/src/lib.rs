#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod scoring;
pub mod selection;
pub mod session;
pub mod time;

pub use error::QuizError;
pub use time::Clock;
