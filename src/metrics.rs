use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion and screening activity.
#[derive(Default)]
pub struct ScreeningMetrics {
    agents_built: AtomicU64,
    documents_ingested: AtomicU64,
    ingestion_failures: AtomicU64,
    evaluations_completed: AtomicU64,
    chat_turns: AtomicU64,
}

impl ScreeningMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed agent build along with its per-document outcomes.
    pub fn record_build(&self, ingested: u64, failures: u64) {
        self.agents_built.fetch_add(1, Ordering::Relaxed);
        self.documents_ingested.fetch_add(ingested, Ordering::Relaxed);
        self.ingestion_failures.fetch_add(failures, Ordering::Relaxed);
    }

    /// Record a completed one-shot tenant evaluation.
    pub fn record_evaluation(&self) {
        self.evaluations_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a chat question answered by a tenant agent.
    pub fn record_chat_turn(&self) {
        self.chat_turns.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            agents_built: self.agents_built.load(Ordering::Relaxed),
            documents_ingested: self.documents_ingested.load(Ordering::Relaxed),
            ingestion_failures: self.ingestion_failures.load(Ordering::Relaxed),
            evaluations_completed: self.evaluations_completed.load(Ordering::Relaxed),
            chat_turns: self.chat_turns.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of screening counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of tenant agents assembled since startup.
    pub agents_built: u64,
    /// Documents successfully ingested across all agent builds.
    pub documents_ingested: u64,
    /// Per-document ingestion failures reported alongside builds.
    pub ingestion_failures: u64,
    /// One-shot fitness evaluations completed.
    pub evaluations_completed: u64,
    /// Chat questions answered by tenant agents.
    pub chat_turns: u64,
}
