//! Outbound HTTP plumbing shared by the summarization and speech adapters.
//!
//! Every vendor call goes through [`send_with_retry`], which applies the configured per-attempt
//! timeout (baked into the [`reqwest::Client`]) and retries transient failures a bounded number of
//! times. Transient means: connection errors, timeouts, HTTP 429 and any 5xx. Other statuses are
//! handed back to the caller untouched so each adapter can map them into its own error type.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BODY_EXCERPT: usize = 300;

/// Bounded retry policy applied to each outbound call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for every subsequent retry.
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    /// Policy with the default backoff and the given retry budget.
    pub const fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_backoff: INITIAL_BACKOFF,
        }
    }

    /// Policy that never retries.
    pub const fn none() -> Self {
        Self::new(0)
    }

    fn delay_for(&self, retry: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }
}

/// Failure that prevented any HTTP response from being received.
#[derive(Debug)]
pub enum SendError {
    /// The attempt exceeded the configured timeout.
    Timeout,
    /// Connection, TLS or body transfer failed. The message never contains the request URL.
    Transport(String),
}

/// Build a client with the per-attempt timeout used for all vendor calls.
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
}

/// Send a request, retrying transient failures according to `policy`.
///
/// `build` is invoked once per attempt so each attempt gets a fresh request body. The final
/// response is returned whatever its status; only transport-level failures surface as errors.
pub async fn send_with_retry<F>(
    vendor: &'static str,
    policy: RetryPolicy,
    build: F,
) -> Result<Response, SendError>
where
    F: Fn() -> RequestBuilder,
{
    let mut retry = 0;
    loop {
        let outcome = build().send().await;
        let transient = match &outcome {
            Ok(response) => is_transient_status(response.status()),
            Err(_) => true,
        };

        if !transient || retry >= policy.max_retries {
            return outcome.map_err(classify_error);
        }

        retry += 1;
        let delay = policy.delay_for(retry);
        match &outcome {
            Ok(response) => tracing::warn!(
                vendor,
                status = %response.status(),
                retry,
                delay_ms = delay.as_millis() as u64,
                "Transient upstream status; retrying"
            ),
            Err(error) => tracing::warn!(
                vendor,
                error = %describe_error(error),
                retry,
                delay_ms = delay.as_millis() as u64,
                "Upstream request failed; retrying"
            ),
        }
        tokio::time::sleep(delay).await;
    }
}

/// Whether a status code is worth another attempt.
pub fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Map a reqwest failure (on send or while reading the body) to a URL-free [`SendError`].
pub fn classify_error(error: reqwest::Error) -> SendError {
    if error.is_timeout() {
        SendError::Timeout
    } else {
        SendError::Transport(describe_error(&error))
    }
}

// reqwest includes the full URL in its Display output, and the speech vendor takes its key as a
// query parameter.
fn describe_error(error: &reqwest::Error) -> String {
    let mut message = String::from("request failed");
    if error.is_connect() {
        message = String::from("connection failed");
    } else if error.is_body() || error.is_decode() {
        message = String::from("response body could not be read");
    }
    match std::error::Error::source(error) {
        Some(source) => format!("{message}: {source}"),
        None => message,
    }
}

/// Read a failing response and pull out the most useful vendor-supplied message.
pub async fn vendor_error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    extract_vendor_message(&body).unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unknown upstream error")
                .to_string()
        } else {
            truncate(trimmed, MAX_BODY_EXCERPT)
        }
    })
}

/// Look for `message`, `error.message`, or a string `error` field in a JSON error body.
pub fn extract_vendor_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let candidate = value
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| {
            value
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(Value::as_str)
        })
        .or_else(|| value.get("error").and_then(Value::as_str))?;
    let trimmed = candidate.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push('…');
    truncated
}
