//! Request payloads for the supported summarization API families.

use crate::config::ApiStyle;
use serde::Serialize;

const COMPLETION_MAX_TOKENS: u32 = 300;
const COMPLETION_TEMPERATURE: f32 = 0.2;

/// Single chat turn sent to the vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// Conversation role (`user` for every request we build).
    pub role: &'static str,
    /// Prompt text.
    pub content: String,
}

/// Wire payload for one upstream call, keyed by API family.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UpstreamPayload {
    /// Chat-style request carrying a `messages` array.
    Chat {
        /// Model identifier.
        model: String,
        /// Conversation turns; always exactly one user message.
        messages: Vec<ChatMessage>,
    },
    /// Completion-style request carrying a bare `prompt`.
    Completion {
        /// Model identifier.
        model: String,
        /// Prompt text.
        prompt: String,
        /// Upper bound on generated tokens.
        max_tokens: u32,
        /// Sampling temperature.
        temperature: f32,
    },
}

impl UpstreamPayload {
    /// Build the payload for `style` around a fully assembled prompt.
    pub fn new(style: ApiStyle, model: &str, prompt: String) -> Self {
        match style {
            ApiStyle::Chat => Self::Chat {
                model: model.to_string(),
                messages: vec![ChatMessage {
                    role: "user",
                    content: prompt,
                }],
            },
            ApiStyle::Completion => Self::Completion {
                model: model.to_string(),
                prompt,
                max_tokens: COMPLETION_MAX_TOKENS,
                temperature: COMPLETION_TEMPERATURE,
            },
        }
    }

    /// Path segment appended to the vendor base URL.
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            Self::Chat { .. } => "chat",
            Self::Completion { .. } => "generate",
        }
    }
}

/// Instruction-prefixed prompt for summarizing `source_text` into `language`.
pub fn summary_prompt(language: &str, source_text: &str) -> String {
    format!(
        "Summarize the following text in {language}:\n\n{}",
        source_text.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_payload_has_single_user_message() {
        let prompt = summary_prompt("Spanish", "  The quick brown fox.  \n");
        let payload = UpstreamPayload::new(ApiStyle::Chat, "command-r-plus", prompt);

        let UpstreamPayload::Chat { messages, .. } = &payload else {
            panic!("expected chat payload");
        };
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        assert_eq!(
            messages[0].content,
            "Summarize the following text in Spanish:\n\nThe quick brown fox."
        );
        assert_eq!(payload.endpoint_path(), "chat");
    }

    #[test]
    fn chat_payload_serializes_only_messages_field() {
        let payload = UpstreamPayload::new(ApiStyle::Chat, "m", "hello".into());
        let value = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(
            value,
            json!({
                "model": "m",
                "messages": [{ "role": "user", "content": "hello" }]
            })
        );
        assert!(value.get("message").is_none());
    }

    #[test]
    fn completion_payload_uses_prompt_field() {
        let payload = UpstreamPayload::new(ApiStyle::Completion, "command", "hi".into());
        let value = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(value["prompt"], "hi");
        assert_eq!(value["max_tokens"], 300);
        assert_eq!(payload.endpoint_path(), "generate");
    }
}
