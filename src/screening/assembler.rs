//! Tenant corpus assembly.
//!
//! For one (address, tenant) pair, pulls every eligible text document out of the
//! store, branches on the `document_type` tag, and feeds either the raw video link or
//! a fresh summary into a new [`TenantAgent`]. A bad document is recorded and the
//! batch continues; only the initial listing call can abort the build.

use std::sync::Arc;

use tracing::{info, warn};

use crate::llm::ChatGateway;
use crate::storage::{DOCUMENT_TYPE_KEY, ObjectStore, tenant_prefix};

use super::agent::{FragmentKind, TenantAgent};
use super::summarize::DocumentSummarizer;
use super::types::{BuildReport, DataType, IngestionFailure, ScreeningError, YOUTUBE_URL_TAG};

/// Builds tenant agents from stored documents.
pub struct CorpusAssembler {
    store: Arc<dyn ObjectStore>,
    summarizer: Arc<dyn DocumentSummarizer>,
    gateway: Arc<dyn ChatGateway>,
}

enum IngestStatus {
    Ingested,
    SkippedUnsupported,
}

impl CorpusAssembler {
    /// Wires the assembler to its collaborators.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        summarizer: Arc<dyn DocumentSummarizer>,
        gateway: Arc<dyn ChatGateway>,
    ) -> Self {
        Self {
            store,
            summarizer,
            gateway,
        }
    }

    /// Assembles a fresh agent for the pair.
    ///
    /// An empty tenant namespace is legal and yields an empty agent. Per-document
    /// failures land in the report; the listing call failing aborts the build.
    pub async fn build(
        &self,
        address: &str,
        tenant: &str,
    ) -> Result<(TenantAgent, BuildReport), ScreeningError> {
        let display_name = tenant.replace('_', " ");
        let mut agent = TenantAgent::new(address, &display_name, Arc::clone(&self.gateway));
        let mut report = BuildReport::default();

        let documents = self.store.list_documents(address, tenant, true).await?;
        info!(
            prefix = %tenant_prefix(address, tenant),
            count = documents.len(),
            "assembling tenant corpus"
        );

        for entry in &documents {
            match self
                .ingest_document(&mut agent, &entry.key, &display_name, address)
                .await
            {
                Ok(IngestStatus::Ingested) => report.ingested += 1,
                Ok(IngestStatus::SkippedUnsupported) => report.skipped_unsupported += 1,
                Err(err) => {
                    warn!(key = %entry.key, error = %err, "document failed to ingest");
                    report.failures.push(IngestionFailure {
                        key: entry.key.clone(),
                        detail: err.to_string(),
                    });
                }
            }
        }

        info!(
            ingested = report.ingested,
            skipped = report.skipped_unsupported,
            failed = report.failures.len(),
            "tenant corpus assembled"
        );
        Ok((agent, report))
    }

    async fn ingest_document(
        &self,
        agent: &mut TenantAgent,
        key: &str,
        display_name: &str,
        address: &str,
    ) -> Result<IngestStatus, ScreeningError> {
        let metadata = self.store.get_metadata(key).await?;
        let document_type = metadata
            .get(DOCUMENT_TYPE_KEY)
            .map(|value| value.to_lowercase())
            .unwrap_or_default();

        let bytes = self.store.get_object(key).await?;
        let text = String::from_utf8(bytes).map_err(|_| ScreeningError::NotText {
            key: key.to_owned(),
        })?;

        if document_type == YOUTUBE_URL_TAG {
            agent.add(text.trim(), FragmentKind::VideoReference);
            return Ok(IngestStatus::Ingested);
        }

        let Some(data_type) = DataType::from_key(key) else {
            warn!(%key, "unsupported document type, skipping");
            return Ok(IngestStatus::SkippedUnsupported);
        };

        let summary = self
            .summarizer
            .summarize(&text, &document_type, display_name, address)
            .await?;
        agent.add(summary, FragmentKind::Summary(data_type));
        Ok(IngestStatus::Ingested)
    }
}
