//! Text-to-speech adapter for the hosted speech vendor.
//!
//! One request per call: the summary text as a single content part, audio-only output, and a
//! fixed prebuilt voice. The vendor answers with base64 audio in an `inlineData` part, which is
//! relayed unchanged together with its MIME type.

use crate::config::Config;
use crate::upstream::{self, RetryPolicy, SendError};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

const USER_AGENT: &str = "summary-gateway/speech";

/// Errors surfaced by the speech vendor call.
#[derive(Debug, Error)]
pub enum TtsError {
    /// Vendor answered with a non-success status.
    #[error("speech vendor returned {status}: {message}")]
    Http {
        /// HTTP status returned by the vendor.
        status: StatusCode,
        /// Vendor-supplied message.
        message: String,
    },
    /// Reply carried no audio payload.
    #[error("no audio returned")]
    NoAudio,
    /// No response was received.
    #[error("speech vendor unreachable: {0}")]
    Transport(String),
    /// The call did not finish within the configured timeout.
    #[error("speech request timed out")]
    Timeout,
    /// No credential was configured for the speech vendor.
    #[error("speech synthesis is not configured")]
    NotConfigured,
    /// The HTTP client could not be constructed.
    #[error("failed to build speech client: {0}")]
    Client(String),
}

impl TtsError {
    /// Stable identifier used in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http { .. } => "tts_http_error",
            Self::NoAudio => "tts_no_audio",
            Self::Transport(_) => "tts_transport_error",
            Self::Timeout => "tts_timeout",
            Self::NotConfigured => "tts_not_configured",
            Self::Client(_) => "tts_client_error",
        }
    }
}

impl From<SendError> for TtsError {
    fn from(error: SendError) -> Self {
        match error {
            SendError::Timeout => Self::Timeout,
            SendError::Transport(message) => Self::Transport(message),
        }
    }
}

/// Synthesized audio, still base64-encoded as the vendor returned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioResult {
    /// Base64-encoded audio bytes.
    pub audio_data: String,
    /// MIME type reported by the vendor (for example `audio/L16;codec=pcm;rate=24000`).
    pub mime_type: String,
}

/// Interface implemented by speech vendors.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Convert summary text into audio.
    async fn synthesize(&self, summary_text: &str) -> Result<AudioResult, TtsError>;
}

/// HTTP client for the `generateContent` speech endpoint.
pub struct VendorSpeechClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    voice: String,
    retry: RetryPolicy,
}

impl VendorSpeechClient {
    /// Build a client when a speech credential is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>, TtsError> {
        let Some(api_key) = config.tts_api_key.clone() else {
            tracing::info!("No speech credential configured; audio synthesis disabled");
            return Ok(None);
        };
        let http = upstream::build_http_client(USER_AGENT, config.upstream_timeout())
            .map_err(|error| TtsError::Client(error.to_string()))?;
        tracing::debug!(
            base_url = %config.tts_base_url,
            model = %config.tts_model,
            voice = %config.tts_voice,
            "Initialized speech client"
        );
        Ok(Some(Self {
            http,
            base_url: config.tts_base_url.clone(),
            api_key,
            model: config.tts_model.clone(),
            voice: config.tts_voice.clone(),
            retry: RetryPolicy::new(config.upstream_max_retries),
        }))
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

/// Build the `generateContent` body for `text` spoken by `voice`.
pub fn speech_payload(text: &str, voice: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": text }] }],
        "generationConfig": {
            "responseModalities": ["AUDIO"],
            "speechConfig": {
                "voiceConfig": {
                    "prebuiltVoiceConfig": { "voiceName": voice }
                }
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default, rename = "inlineData", alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType", alias = "mime_type")]
    mime_type: String,
    data: String,
}

/// Pull the first decodable inline audio part out of a `generateContent` reply.
pub fn extract_audio(body: &str) -> Result<AudioResult, TtsError> {
    let reply: GenerateContentResponse =
        serde_json::from_str(body).map_err(|_| TtsError::NoAudio)?;
    reply
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.inline_data)
                .find(|inline| !inline.data.is_empty() && STANDARD.decode(&inline.data).is_ok())
        })
        .map(|inline| AudioResult {
            audio_data: inline.data,
            mime_type: inline.mime_type,
        })
        .ok_or(TtsError::NoAudio)
}

#[async_trait]
impl SpeechSynthesizer for VendorSpeechClient {
    async fn synthesize(&self, summary_text: &str) -> Result<AudioResult, TtsError> {
        let payload = speech_payload(summary_text, &self.voice);
        let endpoint = self.endpoint();

        let response = upstream::send_with_retry("speech", self.retry, || {
            self.http
                .post(&endpoint)
                .query(&[("key", self.api_key.as_str())])
                .json(&payload)
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            let message = upstream::vendor_error_message(response).await;
            tracing::error!(%status, message = %message, "Speech vendor rejected request");
            return Err(TtsError::Http { status, message });
        }

        let body = response.text().await.map_err(upstream::classify_error)?;
        let audio = extract_audio(&body)?;
        tracing::debug!(mime_type = %audio.mime_type, bytes = audio.audio_data.len(), "Audio synthesized");
        Ok(audio)
    }
}
