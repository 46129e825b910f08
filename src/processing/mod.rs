//! Request pipeline: validation, document extraction, summarization, speech, and quizzes.

mod cache;
mod quiz;
mod service;
pub mod types;

pub use service::{GatewayApi, GatewayService};
pub use types::{GatewayError, QuizError, QuizQuestion, UploadedDocument, ValidationError};
