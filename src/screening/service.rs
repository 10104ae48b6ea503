//! Screening service wiring the store, gateway, and pipeline components together.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::llm::{ChatGateway, ChunkStream, OpenAiChatGateway};
use crate::metrics::{MetricsSnapshot, ScreeningMetrics};
use crate::storage::{DOCUMENT_TYPE_KEY, ObjectStore, StoreService};

use super::assembler::CorpusAssembler;
use super::cache::AgentCache;
use super::evaluate::TenantEvaluator;
use super::summarize::{DocumentSummarizer, LlmSummarizer};
use super::types::{DataType, DocumentInfo, IngestionFailure, ScreeningError};

/// Result of an agent-build request.
#[derive(Debug, Serialize)]
pub struct BuildSummary {
    /// Whether the agent was served from cache (no documents fetched).
    pub cached: bool,
    /// Fragments the agent holds after the call.
    pub fragments: usize,
    /// Documents ingested by this build; zero on a cache hit.
    pub ingested: usize,
    /// Documents skipped for unrecognized extensions.
    pub skipped_unsupported: usize,
    /// Per-document failures from this build.
    pub failures: Vec<IngestionFailure>,
}

/// Operations the HTTP layer exposes.
#[async_trait]
pub trait ScreeningApi: Send + Sync {
    /// Creates a listing namespace for an address.
    async fn create_listing(&self, address: &str) -> Result<(), ScreeningError>;

    /// Enumerates listing addresses.
    async fn list_listings(&self) -> Result<Vec<String>, ScreeningError>;

    /// Enumerates tenants with documents under an address.
    async fn list_tenants(&self, address: &str) -> Result<Vec<String>, ScreeningError>;

    /// Lists a tenant's documents with download URLs.
    async fn list_documents(
        &self,
        address: &str,
        tenant: &str,
    ) -> Result<Vec<DocumentInfo>, ScreeningError>;

    /// Distinct document categories a tenant has uploaded, case-folded.
    async fn list_categories(
        &self,
        address: &str,
        tenant: &str,
    ) -> Result<Vec<String>, ScreeningError>;

    /// Ensures an agent exists for the pair, building one if needed.
    async fn build_agent(&self, address: &str, tenant: &str) -> Result<BuildSummary, ScreeningError>;

    /// Asks the tenant agent one question, streaming the answer.
    async fn chat(
        &self,
        address: &str,
        tenant: &str,
        question: &str,
    ) -> Result<ChunkStream, ScreeningError>;

    /// Evaluates the tenant's first document tagged with `category`.
    async fn evaluate(
        &self,
        address: &str,
        tenant: &str,
        category: &str,
    ) -> Result<String, ScreeningError>;

    /// Current counter values.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

/// Production [`ScreeningApi`] implementation.
pub struct ScreeningService {
    store: Arc<dyn ObjectStore>,
    assembler: CorpusAssembler,
    evaluator: TenantEvaluator,
    cache: AgentCache,
    metrics: ScreeningMetrics,
}

impl ScreeningService {
    /// Builds the service from process configuration.
    pub fn new() -> Result<Self, ScreeningError> {
        let store: Arc<dyn ObjectStore> = Arc::new(StoreService::new()?);
        let gateway: Arc<dyn ChatGateway> = Arc::new(OpenAiChatGateway::new()?);
        Ok(Self::with_components(store, gateway))
    }

    /// Builds the service over injected collaborators.
    pub fn with_components(store: Arc<dyn ObjectStore>, gateway: Arc<dyn ChatGateway>) -> Self {
        let summarizer: Arc<dyn DocumentSummarizer> =
            Arc::new(LlmSummarizer::new(Arc::clone(&gateway)));
        let assembler =
            CorpusAssembler::new(Arc::clone(&store), summarizer, Arc::clone(&gateway));
        let evaluator = TenantEvaluator::new(gateway);
        Self {
            store,
            assembler,
            evaluator,
            cache: AgentCache::new(),
            metrics: ScreeningMetrics::new(),
        }
    }

    async fn find_document_by_category(
        &self,
        address: &str,
        tenant: &str,
        category: &str,
    ) -> Result<Option<(String, String)>, ScreeningError> {
        let wanted = category.to_lowercase();
        let documents = self.store.list_documents(address, tenant, true).await?;
        for entry in documents {
            let metadata = self.store.get_metadata(&entry.key).await?;
            if let Some(tag) = metadata.get(DOCUMENT_TYPE_KEY) {
                let tag = tag.to_lowercase();
                if tag == wanted {
                    return Ok(Some((entry.key, tag)));
                }
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl ScreeningApi for ScreeningService {
    async fn create_listing(&self, address: &str) -> Result<(), ScreeningError> {
        self.store.create_listing(address).await?;
        info!(%address, "listing created");
        Ok(())
    }

    async fn list_listings(&self) -> Result<Vec<String>, ScreeningError> {
        Ok(self.store.list_listings().await?)
    }

    async fn list_tenants(&self, address: &str) -> Result<Vec<String>, ScreeningError> {
        Ok(self.store.list_tenants(address).await?)
    }

    async fn list_documents(
        &self,
        address: &str,
        tenant: &str,
    ) -> Result<Vec<DocumentInfo>, ScreeningError> {
        let entries = self.store.list_documents(address, tenant, false).await?;
        let mut documents = Vec::with_capacity(entries.len());
        for entry in entries {
            let metadata = self.store.get_metadata(&entry.key).await?;
            let document_type = metadata
                .get(DOCUMENT_TYPE_KEY)
                .map(|value| value.to_lowercase())
                .unwrap_or_default();
            let download_url = self.store.presigned_download_url(&entry.key)?;
            documents.push(DocumentInfo {
                data_type: DataType::from_key(&entry.key),
                key: entry.key,
                document_type,
                download_url,
            });
        }
        Ok(documents)
    }

    async fn list_categories(
        &self,
        address: &str,
        tenant: &str,
    ) -> Result<Vec<String>, ScreeningError> {
        let entries = self.store.list_documents(address, tenant, false).await?;
        let mut categories = std::collections::BTreeSet::new();
        for entry in entries {
            let metadata = self.store.get_metadata(&entry.key).await?;
            if let Some(tag) = metadata.get(DOCUMENT_TYPE_KEY)
                && !tag.is_empty()
            {
                categories.insert(tag.to_lowercase());
            }
        }
        Ok(categories.into_iter().collect())
    }

    async fn build_agent(&self, address: &str, tenant: &str) -> Result<BuildSummary, ScreeningError> {
        let (agent, report) = self
            .cache
            .get_or_build(address, tenant, || self.assembler.build(address, tenant))
            .await?;
        let summary = match report {
            Some(report) => {
                self.metrics
                    .record_build(report.ingested as u64, report.failures.len() as u64);
                BuildSummary {
                    cached: false,
                    fragments: agent.fragment_count(),
                    ingested: report.ingested,
                    skipped_unsupported: report.skipped_unsupported,
                    failures: report.failures,
                }
            }
            None => BuildSummary {
                cached: true,
                fragments: agent.fragment_count(),
                ingested: 0,
                skipped_unsupported: 0,
                failures: Vec::new(),
            },
        };
        Ok(summary)
    }

    async fn chat(
        &self,
        address: &str,
        tenant: &str,
        question: &str,
    ) -> Result<ChunkStream, ScreeningError> {
        let (agent, report) = self
            .cache
            .get_or_build(address, tenant, || self.assembler.build(address, tenant))
            .await?;
        if let Some(report) = report {
            self.metrics
                .record_build(report.ingested as u64, report.failures.len() as u64);
        }
        let stream = agent.chat(question).await?;
        self.metrics.record_chat_turn();
        Ok(stream)
    }

    async fn evaluate(
        &self,
        address: &str,
        tenant: &str,
        category: &str,
    ) -> Result<String, ScreeningError> {
        let Some((key, tag)) = self.find_document_by_category(address, tenant, category).await?
        else {
            return Err(ScreeningError::DocumentNotFound {
                category: category.to_owned(),
                tenant: tenant.to_owned(),
            });
        };

        let bytes = self.store.get_object(&key).await?;
        let text = String::from_utf8(bytes).map_err(|_| ScreeningError::NotText { key })?;

        let display_name = tenant.replace('_', " ");
        let display_type = tag.replace('_', " ");
        let verdict = self
            .evaluator
            .evaluate(&text, &display_type, &display_name, address)
            .await?;
        self.metrics.record_evaluation();
        Ok(verdict)
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::llm::{ChatMessage, LlmError};
    use crate::storage::{MetadataMap, ObjectEntry, StoreError, tenant_prefix};

    struct EchoGateway;

    #[async_trait]
    impl ChatGateway for EchoGateway {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _temperature: f32,
        ) -> Result<String, LlmError> {
            Ok(format!("reviewed: {}", messages[1].content.len()))
        }

        async fn complete_stream(
            &self,
            _messages: &[ChatMessage],
            _temperature: f32,
        ) -> Result<ChunkStream, LlmError> {
            let chunks: Vec<Result<String, LlmError>> = vec![Ok("streamed answer".to_owned())];
            Ok(Box::pin(futures_util::stream::iter(chunks)))
        }
    }

    #[derive(Default)]
    struct FakeStore {
        objects: Mutex<HashMap<String, (Vec<u8>, MetadataMap)>>,
    }

    impl FakeStore {
        fn with_document(self, key: &str, body: &[u8], document_type: &str) -> Self {
            let mut metadata = MetadataMap::new();
            metadata.insert(DOCUMENT_TYPE_KEY.to_owned(), document_type.to_owned());
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_owned(), (body.to_vec(), metadata));
            self
        }
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn list_listings(&self) -> Result<Vec<String>, StoreError> {
            Ok(vec!["12 Oak St".to_owned()])
        }

        async fn list_tenants(&self, _address: &str) -> Result<Vec<String>, StoreError> {
            Ok(vec!["ada_lovelace".to_owned()])
        }

        async fn list_documents(
            &self,
            address: &str,
            tenant: &str,
            text_only: bool,
        ) -> Result<Vec<ObjectEntry>, StoreError> {
            let prefix = tenant_prefix(address, tenant);
            let mut entries: Vec<ObjectEntry> = self
                .objects
                .lock()
                .unwrap()
                .iter()
                .filter(|(key, _)| {
                    key.starts_with(&prefix) && (!text_only || key.ends_with(".txt"))
                })
                .map(|(key, (bytes, _))| ObjectEntry {
                    key: key.clone(),
                    size: bytes.len() as u64,
                })
                .collect();
            entries.sort_by(|a, b| a.key.cmp(&b.key));
            Ok(entries)
        }

        async fn get_object(&self, key: &str) -> Result<Vec<u8>, StoreError> {
            self.objects
                .lock()
                .unwrap()
                .get(key)
                .map(|(bytes, _)| bytes.clone())
                .ok_or_else(|| StoreError::NotFound {
                    key: key.to_owned(),
                })
        }

        async fn get_metadata(&self, key: &str) -> Result<MetadataMap, StoreError> {
            self.objects
                .lock()
                .unwrap()
                .get(key)
                .map(|(_, metadata)| metadata.clone())
                .ok_or_else(|| StoreError::NotFound {
                    key: key.to_owned(),
                })
        }

        async fn put_object(
            &self,
            key: &str,
            bytes: Vec<u8>,
            metadata: &MetadataMap,
        ) -> Result<(), StoreError> {
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_owned(), (bytes, metadata.clone()));
            Ok(())
        }

        async fn create_listing(&self, address: &str) -> Result<(), StoreError> {
            let marker = crate::storage::listing_prefix(address);
            self.objects
                .lock()
                .unwrap()
                .insert(marker, (Vec::new(), MetadataMap::new()));
            Ok(())
        }

        fn presigned_download_url(&self, key: &str) -> Result<String, StoreError> {
            Ok(format!("https://store.test/{key}?signed"))
        }
    }

    fn service_with(store: FakeStore) -> ScreeningService {
        ScreeningService::with_components(Arc::new(store), Arc::new(EchoGateway))
    }

    #[tokio::test]
    async fn evaluate_matches_category_case_insensitively() {
        let store = FakeStore::default()
            .with_document(
                "listings/12 Oak St/ada_lovelace/stub.txt",
                b"income 4200",
                "Pay Stub",
            )
            .with_document(
                "listings/12 Oak St/ada_lovelace/ref.txt",
                b"good tenant",
                "Reference",
            );
        let service = service_with(store);

        let verdict = service
            .evaluate("12 Oak St", "ada_lovelace", "PAY STUB")
            .await
            .unwrap();
        assert!(verdict.starts_with("reviewed:"));
        assert_eq!(service.metrics_snapshot().evaluations_completed, 1);
    }

    #[tokio::test]
    async fn evaluate_without_matching_category_is_document_not_found() {
        let store = FakeStore::default().with_document(
            "listings/12 Oak St/ada_lovelace/ref.txt",
            b"good tenant",
            "Reference",
        );
        let service = service_with(store);

        let err = service
            .evaluate("12 Oak St", "ada_lovelace", "pay stub")
            .await
            .unwrap_err();
        assert!(matches!(err, ScreeningError::DocumentNotFound { .. }));
        assert_eq!(service.metrics_snapshot().evaluations_completed, 0);
    }

    struct CapturingGateway {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatGateway for CapturingGateway {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _temperature: f32,
        ) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(messages[1].content.clone());
            Ok("no red flags".into())
        }

        async fn complete_stream(
            &self,
            _messages: &[ChatMessage],
            _temperature: f32,
        ) -> Result<ChunkStream, LlmError> {
            unimplemented!("not exercised")
        }
    }

    #[tokio::test]
    async fn evaluate_prompt_reads_underscored_tags_naturally() {
        let store = FakeStore::default().with_document(
            "listings/12 Oak St/ada_lovelace/stub.txt",
            b"income 4200",
            "Pay_Stub",
        );
        let gateway = Arc::new(CapturingGateway {
            prompts: Mutex::new(Vec::new()),
        });
        let service =
            ScreeningService::with_components(Arc::new(store), Arc::clone(&gateway) as Arc<dyn ChatGateway>);

        service
            .evaluate("12 Oak St", "ada_lovelace", "pay_stub")
            .await
            .unwrap();

        let prompts = gateway.prompts.lock().unwrap();
        assert!(prompts[0].contains("document type pay stub"));
        assert!(!prompts[0].contains("pay_stub"));
    }

    #[tokio::test]
    async fn evaluate_rejects_undecodable_documents() {
        let store = FakeStore::default().with_document(
            "listings/12 Oak St/ada_lovelace/stub.txt",
            &[0xff, 0xfe, 0x80],
            "Pay Stub",
        );
        let service = service_with(store);

        let err = service
            .evaluate("12 Oak St", "ada_lovelace", "pay stub")
            .await
            .unwrap_err();
        assert!(matches!(err, ScreeningError::NotText { .. }));
    }

    #[tokio::test]
    async fn chat_builds_then_reuses_the_agent() {
        let store = FakeStore::default().with_document(
            "listings/12 Oak St/ada_lovelace/stub.txt",
            b"income 4200",
            "Pay Stub",
        );
        let service = service_with(store);

        service.chat("12 Oak St", "ada_lovelace", "hi").await.unwrap();
        service.chat("12 Oak St", "ada_lovelace", "hi again").await.unwrap();

        let snapshot = service.metrics_snapshot();
        assert_eq!(snapshot.chat_turns, 2);
        assert_eq!(snapshot.agents_built, 1);
        assert_eq!(snapshot.documents_ingested, 1);
    }

    #[tokio::test]
    async fn categories_are_distinct_and_case_folded() {
        let store = FakeStore::default()
            .with_document(
                "listings/12 Oak St/ada_lovelace/stub1.txt",
                b"income 4200",
                "Pay Stub",
            )
            .with_document(
                "listings/12 Oak St/ada_lovelace/stub2.txt",
                b"income 4300",
                "PAY STUB",
            )
            .with_document(
                "listings/12 Oak St/ada_lovelace/ref.txt",
                b"good tenant",
                "Reference",
            );
        let service = service_with(store);

        let categories = service
            .list_categories("12 Oak St", "ada_lovelace")
            .await
            .unwrap();
        assert_eq!(categories, vec!["pay stub".to_owned(), "reference".to_owned()]);
    }

    #[tokio::test]
    async fn document_listing_carries_types_and_urls() {
        let store = FakeStore::default().with_document(
            "listings/12 Oak St/ada_lovelace/stub.txt",
            b"income 4200",
            "Pay Stub",
        );
        let service = service_with(store);

        let documents = service
            .list_documents("12 Oak St", "ada_lovelace")
            .await
            .unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].document_type, "pay stub");
        assert_eq!(documents[0].data_type, Some(DataType::Text));
        assert!(documents[0].download_url.ends_with("?signed"));
    }
}
