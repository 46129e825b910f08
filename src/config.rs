use serde::Deserialize;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_SUMMARY_BASE_URL: &str = "https://api.cohere.ai/v2";
const DEFAULT_SUMMARY_MODEL: &str = "command-r-plus";
const DEFAULT_SUMMARY_LANGUAGE: &str = "Spanish";
const DEFAULT_TTS_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
const DEFAULT_TTS_VOICE: &str = "Kore";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 1;
const DEFAULT_CACHE_CAPACITY: usize = 128;
/// Port used when neither `PORT` nor `SERVER_PORT` is set.
pub const DEFAULT_PORT: u16 = 10000;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the gateway, built once at startup and shared read-only.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Bearer credential for the summarization vendor.
    pub summary_api_key: String,
    /// Base URL of the summarization vendor (without the `/chat` suffix).
    pub summary_base_url: String,
    /// Which request family the summarization vendor expects.
    pub summary_api_style: ApiStyle,
    /// Model identifier sent with every summarization request.
    pub summary_model: String,
    /// Language the summary should be written in.
    pub summary_language: String,
    /// Optional key for the speech vendor; audio synthesis is disabled without it.
    pub tts_api_key: Option<String>,
    /// Base URL of the speech vendor's model collection.
    pub tts_base_url: String,
    /// Text-to-speech model identifier.
    pub tts_model: String,
    /// Prebuilt voice used for every synthesis request.
    pub tts_voice: String,
    /// Timeout applied to each outbound attempt, in seconds.
    pub upstream_timeout_secs: u64,
    /// Additional attempts allowed after a transient upstream failure.
    pub upstream_max_retries: u32,
    /// Maximum number of cached summaries (0 disables caching).
    pub summary_cache_capacity: usize,
    /// Port the HTTP server binds to.
    pub server_port: u16,
    /// Origins allowed by CORS; empty means any origin.
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

/// Request families understood by the summarization adapter.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApiStyle {
    /// `POST <base>/chat` with a `messages` array.
    Chat,
    /// `POST <base>/generate` with a single `prompt`.
    Completion,
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup, performing validation along the way.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let first_of = |keys: &[&str]| keys.iter().find_map(|key| get(*key));

        let summary_api_key = first_of(&["SUMMARY_API_KEY", "COHERE_API_KEY", "CO_API_KEY"])
            .ok_or_else(|| ConfigError::MissingVariable("SUMMARY_API_KEY".to_string()))?;

        Ok(Self {
            summary_api_key,
            summary_base_url: get("SUMMARY_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_SUMMARY_BASE_URL.to_string()),
            summary_api_style: get("SUMMARY_API_STYLE")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|()| ConfigError::InvalidValue("SUMMARY_API_STYLE".into()))
                })
                .transpose()?
                .unwrap_or(ApiStyle::Chat),
            summary_model: get("SUMMARY_MODEL")
                .unwrap_or_else(|| DEFAULT_SUMMARY_MODEL.to_string()),
            summary_language: get("SUMMARY_LANGUAGE")
                .unwrap_or_else(|| DEFAULT_SUMMARY_LANGUAGE.to_string()),
            tts_api_key: first_of(&["TTS_API_KEY", "GEMINI_API_KEY"]),
            tts_base_url: get("TTS_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_TTS_BASE_URL.to_string()),
            tts_model: get("TTS_MODEL").unwrap_or_else(|| DEFAULT_TTS_MODEL.to_string()),
            tts_voice: get("TTS_VOICE").unwrap_or_else(|| DEFAULT_TTS_VOICE.to_string()),
            upstream_timeout_secs: parse_or(
                "UPSTREAM_TIMEOUT_SECS",
                get("UPSTREAM_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT_SECS,
            )?,
            upstream_max_retries: parse_or(
                "UPSTREAM_MAX_RETRIES",
                get("UPSTREAM_MAX_RETRIES"),
                DEFAULT_MAX_RETRIES,
            )?,
            summary_cache_capacity: parse_or(
                "SUMMARY_CACHE_CAPACITY",
                get("SUMMARY_CACHE_CAPACITY"),
                DEFAULT_CACHE_CAPACITY,
            )?,
            server_port: match first_of(&["PORT", "SERVER_PORT"]) {
                Some(value) => value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PORT".into()))?,
                None => DEFAULT_PORT,
            },
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS")
                .map(|value| {
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty() && *origin != "*")
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    /// Timeout applied to every outbound attempt.
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs.max(1))
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    value
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
        .map(|parsed| parsed.unwrap_or(default))
}

impl std::str::FromStr for ApiStyle {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chat" => Ok(Self::Chat),
            "completion" | "generate" => Ok(Self::Completion),
            _ => Err(()),
        }
    }
}

// Keys stay out of logs and panic messages.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("summary_api_key", &"<redacted>")
            .field("summary_base_url", &self.summary_base_url)
            .field("summary_api_style", &self.summary_api_style)
            .field("summary_model", &self.summary_model)
            .field("summary_language", &self.summary_language)
            .field(
                "tts_api_key",
                &self.tts_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("tts_base_url", &self.tts_base_url)
            .field("tts_model", &self.tts_model)
            .field("tts_voice", &self.tts_voice)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("upstream_max_retries", &self.upstream_max_retries)
            .field("summary_cache_capacity", &self.summary_cache_capacity)
            .field("server_port", &self.server_port)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_credential_is_rejected() {
        let error = Config::from_lookup(lookup(&[("PORT", "8080")])).expect_err("missing key");
        assert!(matches!(error, ConfigError::MissingVariable(name) if name == "SUMMARY_API_KEY"));
    }

    #[test]
    fn blank_credential_counts_as_missing() {
        let error = Config::from_lookup(lookup(&[("SUMMARY_API_KEY", "   ")])).expect_err("blank");
        assert!(matches!(error, ConfigError::MissingVariable(_)));
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = Config::from_lookup(lookup(&[("CO_API_KEY", "secret")])).expect("config");
        assert_eq!(config.summary_api_key, "secret");
        assert_eq!(config.summary_api_style, ApiStyle::Chat);
        assert_eq!(config.summary_language, "Spanish");
        assert_eq!(config.server_port, DEFAULT_PORT);
        assert_eq!(config.upstream_timeout(), Duration::from_secs(30));
        assert_eq!(config.upstream_max_retries, 1);
        assert!(config.tts_api_key.is_none());
    }

    #[test]
    fn primary_key_wins_over_aliases() {
        let config = Config::from_lookup(lookup(&[
            ("SUMMARY_API_KEY", "primary"),
            ("COHERE_API_KEY", "alias"),
        ]))
        .expect("config");
        assert_eq!(config.summary_api_key, "primary");
    }

    #[test]
    fn invalid_port_is_reported() {
        let error = Config::from_lookup(lookup(&[("SUMMARY_API_KEY", "k"), ("PORT", "http")]))
            .expect_err("invalid port");
        assert!(matches!(error, ConfigError::InvalidValue(name) if name == "PORT"));
    }

    #[test]
    fn completion_style_is_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("SUMMARY_API_KEY", "k"),
            ("SUMMARY_API_STYLE", "Completion"),
        ]))
        .expect("config");
        assert_eq!(config.summary_api_style, ApiStyle::Completion);
    }

    #[test]
    fn debug_output_redacts_keys() {
        let config = Config::from_lookup(lookup(&[
            ("SUMMARY_API_KEY", "super-secret"),
            ("GEMINI_API_KEY", "tts-secret"),
        ]))
        .expect("config");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("tts-secret"));
    }

    #[test]
    fn cors_origins_are_split_and_wildcard_means_any() {
        let config = Config::from_lookup(lookup(&[
            ("SUMMARY_API_KEY", "k"),
            ("CORS_ALLOWED_ORIGINS", " https://app.example , ,http://localhost:5173"),
        ]))
        .expect("config");
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://app.example".to_string(), "http://localhost:5173".to_string()]
        );

        let permissive =
            Config::from_lookup(lookup(&[("SUMMARY_API_KEY", "k"), ("CORS_ALLOWED_ORIGINS", "*")]))
                .expect("config");
        assert!(permissive.cors_allowed_origins.is_empty());
    }
}
