//! Tenant screening pipeline.
//!
//! Three cooperating pieces: the summarizer condenses raw documents, the assembler
//! feeds summaries (or raw video links) into per-tenant agents, and the evaluator
//! produces one-shot fitness verdicts. The service wires them to the store and the
//! chat gateway behind the [`ScreeningApi`] trait the HTTP layer consumes.

pub mod agent;
pub mod assembler;
pub mod cache;
pub mod evaluate;
pub mod sanitize;
pub mod service;
pub mod summarize;
pub mod types;

pub use agent::{Fragment, FragmentKind, TenantAgent};
pub use assembler::CorpusAssembler;
pub use cache::AgentCache;
pub use evaluate::TenantEvaluator;
pub use sanitize::sanitize_markdown;
pub use service::{BuildSummary, ScreeningApi, ScreeningService};
pub use summarize::{DocumentSummarizer, LlmSummarizer};
pub use types::{
    BuildReport, DataType, DocumentInfo, IngestionFailure, ScreeningError, YOUTUBE_URL_TAG,
};
