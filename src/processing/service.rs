//! Gateway service coordinating validation, extraction, summarization, speech, and quizzes.

use crate::{
    config::Config,
    extraction::DocumentExtractor,
    metrics::{GatewayMetrics, MetricsSnapshot},
    processing::{
        cache::{SummaryCache, summary_key},
        quiz::{build_quiz_prompt, parse_quiz},
        types::{GatewayError, QuizQuestion, UploadedDocument, ValidationError},
    },
    speech::{AudioResult, SpeechSynthesizer, TtsError, VendorSpeechClient},
    summarization::{
        self, SummarizationClient, SummarizeResult, UpstreamError, VendorSummarizationClient,
    },
};
use async_trait::async_trait;
use std::sync::Arc;

/// Runs each request through `validate -> (extract) -> vendor call`.
///
/// The service owns long-lived handles to the vendor clients, the document extractor, the
/// summary cache, and the metrics registry. Construct it once near process start and share it
/// through an `Arc`; nothing here is mutated per request except the cache and counters.
pub struct GatewayService {
    summarizer: Arc<dyn SummarizationClient>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    extractor: DocumentExtractor,
    language: String,
    cache: SummaryCache,
    metrics: Arc<GatewayMetrics>,
}

/// Abstraction over the gateway pipeline used by the HTTP surface.
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// Summarize raw text.
    async fn summarize_text(&self, text: String) -> Result<SummarizeResult, GatewayError>;

    /// Extract text from an uploaded PDF and summarize it.
    async fn summarize_document(
        &self,
        document: UploadedDocument,
    ) -> Result<SummarizeResult, GatewayError>;

    /// Turn summary text into speech.
    async fn synthesize_audio(&self, summary_text: String) -> Result<AudioResult, GatewayError>;

    /// Build a multiple-choice quiz from summary text.
    async fn generate_quiz(
        &self,
        summary_text: String,
    ) -> Result<Vec<QuizQuestion>, GatewayError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl GatewayService {
    /// Build the service and its vendor clients from startup configuration.
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        tracing::info!("Initializing vendor clients");
        let summarizer: Arc<dyn SummarizationClient> =
            Arc::new(VendorSummarizationClient::new(config)?);
        let speech = VendorSpeechClient::from_config(config)?
            .map(|client| Arc::new(client) as Arc<dyn SpeechSynthesizer>);
        Ok(Self::from_parts(
            summarizer,
            speech,
            DocumentExtractor::default(),
            config,
        ))
    }

    /// Assemble a service from explicit collaborators.
    pub fn from_parts(
        summarizer: Arc<dyn SummarizationClient>,
        speech: Option<Arc<dyn SpeechSynthesizer>>,
        extractor: DocumentExtractor,
        config: &Config,
    ) -> Self {
        Self {
            summarizer,
            speech,
            extractor,
            language: config.summary_language.clone(),
            cache: SummaryCache::new(config.summary_cache_capacity),
            metrics: Arc::new(GatewayMetrics::new()),
        }
    }

    /// Summarize text after rejecting blank input; identical inputs are answered from cache.
    pub async fn summarize_text(&self, text: String) -> Result<SummarizeResult, GatewayError> {
        let source_text = require_text(&text)?;
        let key = summary_key(&self.language, source_text);
        if let Some(summary_text) = self.cache.get(&key) {
            self.metrics.record_cache_hit();
            tracing::info!(chars = source_text.chars().count(), "Summary served from cache");
            return Ok(SummarizeResult { summary_text });
        }

        tracing::info!(chars = source_text.chars().count(), "Requesting summary");
        let result = summarization::summarize(self.summarizer.as_ref(), &self.language, source_text)
            .await
            .inspect_err(|error| self.record_upstream_failure(error))?;

        self.metrics.record_summary();
        self.cache.insert(key, result.summary_text.clone());
        tracing::info!(
            summary_chars = result.summary_text.chars().count(),
            "Summary generated"
        );
        Ok(result)
    }

    /// Extract a PDF's text, then summarize it.
    pub async fn summarize_document(
        &self,
        document: UploadedDocument,
    ) -> Result<SummarizeResult, GatewayError> {
        let UploadedDocument {
            bytes,
            declared_mime_type,
            file_name,
        } = document;
        tracing::info!(
            file_name = file_name.as_deref().unwrap_or("<unnamed>"),
            bytes = bytes.len(),
            mime_type = %declared_mime_type,
            "Extracting document"
        );
        let text = self
            .extractor
            .extract_text(bytes, &declared_mime_type)
            .await
            .inspect_err(|error| tracing::warn!(error = %error, "Document extraction failed"))?;
        self.metrics.record_document();
        self.summarize_text(text).await
    }

    /// Synthesize speech for summary text.
    pub async fn synthesize_audio(
        &self,
        summary_text: String,
    ) -> Result<AudioResult, GatewayError> {
        let text = require_text(&summary_text)?;
        let speech = self.speech.as_ref().ok_or(TtsError::NotConfigured)?;
        let audio = speech.synthesize(text).await.inspect_err(|error| {
            self.metrics.record_upstream_failure();
            tracing::error!(error = %error, kind = error.kind(), "Speech synthesis failed");
        })?;
        self.metrics.record_audio();
        Ok(audio)
    }

    /// Generate a five-question quiz for summary text.
    pub async fn generate_quiz(
        &self,
        summary_text: String,
    ) -> Result<Vec<QuizQuestion>, GatewayError> {
        let text = require_text(&summary_text)?;
        let reply = self
            .summarizer
            .generate(build_quiz_prompt(&self.language, text))
            .await
            .inspect_err(|error| self.record_upstream_failure(error))?;
        let quiz = parse_quiz(&reply).inspect_err(|error| {
            tracing::error!(error = %error, "Quiz reply rejected");
        })?;
        self.metrics.record_quiz();
        Ok(quiz)
    }

    /// Return the current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn record_upstream_failure(&self, error: &UpstreamError) {
        self.metrics.record_upstream_failure();
        tracing::error!(error = %error, kind = error.kind(), "Summarization vendor call failed");
    }
}

fn require_text(text: &str) -> Result<&str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyText)
    } else {
        Ok(trimmed)
    }
}

#[async_trait]
impl GatewayApi for GatewayService {
    async fn summarize_text(&self, text: String) -> Result<SummarizeResult, GatewayError> {
        GatewayService::summarize_text(self, text).await
    }

    async fn summarize_document(
        &self,
        document: UploadedDocument,
    ) -> Result<SummarizeResult, GatewayError> {
        GatewayService::summarize_document(self, document).await
    }

    async fn synthesize_audio(&self, summary_text: String) -> Result<AudioResult, GatewayError> {
        GatewayService::synthesize_audio(self, summary_text).await
    }

    async fn generate_quiz(
        &self,
        summary_text: String,
    ) -> Result<Vec<QuizQuestion>, GatewayError> {
        GatewayService::generate_quiz(self, summary_text).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        GatewayService::metrics_snapshot(self)
    }
}
