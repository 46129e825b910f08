use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing gateway activity since startup.
#[derive(Default)]
pub struct GatewayMetrics {
    summaries_generated: AtomicU64,
    summary_cache_hits: AtomicU64,
    documents_extracted: AtomicU64,
    audio_synthesized: AtomicU64,
    quizzes_generated: AtomicU64,
    upstream_failures: AtomicU64,
}

impl GatewayMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a summary produced by the upstream vendor.
    pub fn record_summary(&self) {
        self.summaries_generated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a summary served from the cache.
    pub fn record_cache_hit(&self) {
        self.summary_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a document whose text was extracted.
    pub fn record_document(&self) {
        self.documents_extracted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful speech synthesis.
    pub fn record_audio(&self) {
        self.audio_synthesized.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a generated quiz.
    pub fn record_quiz(&self) {
        self.quizzes_generated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed vendor call (summarization or speech).
    pub fn record_upstream_failure(&self) {
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            summaries_generated: self.summaries_generated.load(Ordering::Relaxed),
            summary_cache_hits: self.summary_cache_hits.load(Ordering::Relaxed),
            documents_extracted: self.documents_extracted.load(Ordering::Relaxed),
            audio_synthesized: self.audio_synthesized.load(Ordering::Relaxed),
            quizzes_generated: self.quizzes_generated.load(Ordering::Relaxed),
            upstream_failures: self.upstream_failures.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of gateway counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Summaries returned by the vendor.
    pub summaries_generated: u64,
    /// Summaries answered from the in-memory cache.
    pub summary_cache_hits: u64,
    /// Uploaded documents successfully turned into text.
    pub documents_extracted: u64,
    /// Audio clips synthesized.
    pub audio_synthesized: u64,
    /// Quizzes generated.
    pub quizzes_generated: u64,
    /// Vendor calls that ended in an error.
    pub upstream_failures: u64,
}
