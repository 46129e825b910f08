//! Adapter between the gateway's `{text}` contract and the hosted summarization API.
//!
//! The adapter builds one vendor payload per call ([`payload::UpstreamPayload`]), posts it with
//! bearer authorization through the shared retry/timeout transport, and reduces whichever reply
//! shape the vendor sends into a plain summary string ([`response::normalize`]).

pub mod payload;
pub mod response;

use crate::config::{ApiStyle, Config};
use crate::upstream::{self, RetryPolicy, SendError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;

pub use payload::{ChatMessage, UpstreamPayload, summary_prompt};
pub use response::UpstreamResponse;

const USER_AGENT: &str = "summary-gateway/summary";

/// Errors surfaced by the summarization vendor call.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Vendor answered with a non-success status.
    #[error("upstream returned {status}: {message}")]
    Http {
        /// HTTP status returned by the vendor.
        status: StatusCode,
        /// Vendor-supplied message, or the canonical reason when none was given.
        message: String,
    },
    /// Vendor answered successfully but no known reply shape carried text.
    #[error("unrecognized upstream response: {0}")]
    Shape(String),
    /// No response was received.
    #[error("upstream unreachable: {0}")]
    Transport(String),
    /// The call did not finish within the configured timeout.
    #[error("upstream request timed out")]
    Timeout,
    /// The HTTP client could not be constructed.
    #[error("failed to build upstream client: {0}")]
    Client(String),
}

impl UpstreamError {
    /// Stable identifier used in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http { .. } => "upstream_http_error",
            Self::Shape(_) => "upstream_shape_error",
            Self::Transport(_) => "upstream_transport_error",
            Self::Timeout => "upstream_timeout",
            Self::Client(_) => "upstream_client_error",
        }
    }
}

impl From<SendError> for UpstreamError {
    fn from(error: SendError) -> Self {
        match error {
            SendError::Timeout => Self::Timeout,
            SendError::Transport(message) => Self::Transport(message),
        }
    }
}

/// Successful summarization outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizeResult {
    /// Normalized summary text.
    pub summary_text: String,
}

/// Interface implemented by text-generation vendors.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Send a fully assembled prompt and return the normalized reply text.
    async fn generate(&self, prompt: String) -> Result<String, UpstreamError>;
}

/// Summarize `source_text` into `language`.
///
/// Callers must reject blank input first; this function always issues a vendor call.
pub async fn summarize(
    client: &dyn SummarizationClient,
    language: &str,
    source_text: &str,
) -> Result<SummarizeResult, UpstreamError> {
    let summary_text = client
        .generate(summary_prompt(language, source_text))
        .await?;
    Ok(SummarizeResult { summary_text })
}

/// HTTP client for the configured summarization vendor.
pub struct VendorSummarizationClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    style: ApiStyle,
    retry: RetryPolicy,
}

impl VendorSummarizationClient {
    /// Construct a client from the startup configuration.
    pub fn new(config: &Config) -> Result<Self, UpstreamError> {
        let http = upstream::build_http_client(USER_AGENT, config.upstream_timeout())
            .map_err(|error| UpstreamError::Client(error.to_string()))?;
        tracing::debug!(
            base_url = %config.summary_base_url,
            model = %config.summary_model,
            style = ?config.summary_api_style,
            "Initialized summarization client"
        );
        Ok(Self {
            http,
            base_url: config.summary_base_url.clone(),
            api_key: config.summary_api_key.clone(),
            model: config.summary_model.clone(),
            style: config.summary_api_style,
            retry: RetryPolicy::new(config.upstream_max_retries),
        })
    }

    fn endpoint(&self, payload: &UpstreamPayload) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            payload.endpoint_path()
        )
    }
}

#[async_trait]
impl SummarizationClient for VendorSummarizationClient {
    async fn generate(&self, prompt: String) -> Result<String, UpstreamError> {
        let payload = UpstreamPayload::new(self.style, &self.model, prompt);
        let endpoint = self.endpoint(&payload);

        let response = upstream::send_with_retry("summarization", self.retry, || {
            self.http
                .post(&endpoint)
                .bearer_auth(&self.api_key)
                .json(&payload)
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            let message = upstream::vendor_error_message(response).await;
            tracing::error!(%status, message = %message, "Summarization vendor rejected request");
            return Err(UpstreamError::Http { status, message });
        }

        let body = response.text().await.map_err(upstream::classify_error)?;

        response::normalize(&body).ok_or_else(|| {
            tracing::error!(body_len = body.len(), "Summarization reply had no usable text");
            UpstreamError::Shape("no text extracted".into())
        })
    }
}
