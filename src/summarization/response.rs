//! Normalization of the reply shapes the summarization vendor has been observed to return.
//!
//! Precedence is fixed: a top-level `text` field wins, then the first text part of
//! `message.content`, then `generations[0].text`. Blank candidates are skipped.

use serde::Deserialize;
use serde_json::Value;

/// Recognized reply shapes, already reduced to the candidate text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamResponse {
    /// `{ "text": "..." }`
    Text(String),
    /// `{ "message": { "content": [{ "type": "text", "text": "..." }] } }`
    MessageContent(String),
    /// `{ "generations": [{ "text": "..." }] }`
    Generations(String),
}

impl UpstreamResponse {
    /// Classify a decoded body, returning `None` when no shape carries usable text.
    ///
    /// Each field is read on its own, so a malformed lower-precedence field never hides a usable
    /// higher-precedence one.
    pub fn classify(body: RawResponse) -> Option<Self> {
        let RawResponse {
            text,
            message,
            generations,
        } = body;

        if let Some(text) = non_blank(text.and_then(string_value)) {
            return Some(Self::Text(text));
        }
        let message_text = message
            .and_then(|value| serde_json::from_value::<RawMessage>(value).ok())
            .and_then(|message| message.content)
            .and_then(MessageContent::first_text);
        if let Some(text) = non_blank(message_text) {
            return Some(Self::MessageContent(text));
        }
        let generation_text = match generations {
            Some(Value::Array(items)) => items
                .into_iter()
                .next()
                .and_then(|item| serde_json::from_value::<RawGeneration>(item).ok())
                .and_then(|generation| generation.text),
            _ => None,
        };
        non_blank(generation_text).map(Self::Generations)
    }

    /// Trimmed summary text.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) | Self::MessageContent(text) | Self::Generations(text) => text,
        }
    }
}

/// Superset of every field we know how to read from a vendor reply, left untyped until
/// classification.
#[derive(Debug, Default, Deserialize)]
pub struct RawResponse {
    #[serde(default)]
    text: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    generations: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    content: Option<MessageContent>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Parts(Vec<Value>),
    Plain(String),
}

impl MessageContent {
    fn first_text(self) -> Option<String> {
        match self {
            Self::Plain(text) => Some(text),
            Self::Parts(parts) => parts
                .into_iter()
                .filter_map(|part| serde_json::from_value::<ContentPart>(part).ok())
                .find_map(|part| non_blank(part.text)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawGeneration {
    #[serde(default)]
    text: Option<String>,
}

fn string_value(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        _ => None,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Decode and normalize a raw JSON body into summary text.
pub fn normalize(body: &str) -> Option<String> {
    let raw: RawResponse = serde_json::from_str(body).ok()?;
    UpstreamResponse::classify(raw).map(UpstreamResponse::into_text)
}
