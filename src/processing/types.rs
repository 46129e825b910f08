//! Request/result types and the error taxonomy shared by the gateway pipeline.

use crate::{extraction::ExtractionError, speech::TtsError, summarization::UpstreamError};
use thiserror::Error;

/// Input rejected before any document parsing or vendor call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Text was supplied but is blank after trimming.
    #[error("text must not be empty")]
    EmptyText,
    /// Neither a text field nor a file was supplied.
    #[error("provide either a 'text' field or a PDF file")]
    MissingInput,
    /// Both a text field and a file were supplied.
    #[error("provide either a 'text' field or a PDF file, not both")]
    AmbiguousInput,
    /// Body could not be decoded.
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    /// Body exceeded the request size limit before it could be read.
    #[error("request body exceeds the {limit} byte limit")]
    BodyTooLarge {
        /// Maximum accepted body size in bytes.
        limit: usize,
    },
}

impl ValidationError {
    /// Stable identifier used in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyText => "empty_text",
            Self::MissingInput => "missing_input",
            Self::AmbiguousInput => "ambiguous_input",
            Self::InvalidBody(_) => "invalid_body",
            Self::BodyTooLarge { .. } => "payload_too_large",
        }
    }
}

/// Quiz reply could not be turned into the expected question list.
#[derive(Debug, Error)]
pub enum QuizError {
    /// Reply was not a JSON array of questions.
    #[error("quiz reply was not valid JSON: {0}")]
    Malformed(String),
    /// Reply parsed but broke the quiz contract.
    #[error("quiz reply rejected: {0}")]
    Invalid(String),
}

/// Errors emitted by the gateway pipeline.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Caller supplied unusable input.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Uploaded document could not be turned into text.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// Summarization vendor call failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    /// Speech vendor call failed.
    #[error(transparent)]
    Speech(#[from] TtsError),
    /// Quiz generation produced an unusable reply.
    #[error(transparent)]
    Quiz(#[from] QuizError),
}

impl GatewayError {
    /// Stable identifier used in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(error) => error.kind(),
            Self::Extraction(error) => error.kind(),
            Self::Upstream(error) => error.kind(),
            Self::Speech(error) => error.kind(),
            Self::Quiz(QuizError::Malformed(_)) => "quiz_malformed",
            Self::Quiz(QuizError::Invalid(_)) => "quiz_invalid",
        }
    }
}

/// PDF upload handed over by the HTTP layer.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// Raw file bytes.
    pub bytes: Vec<u8>,
    /// Content type declared by the client for the file part.
    pub declared_mime_type: String,
    /// Original file name, if the client sent one.
    pub file_name: Option<String>,
}

/// One multiple-choice quiz question.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuizQuestion {
    /// Question text.
    pub question: String,
    /// Four answer options.
    pub options: Vec<String>,
    /// Correct option, identical to one entry in `options`.
    pub answer: String,
}
