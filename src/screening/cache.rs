//! Session cache of built tenant agents.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use super::agent::TenantAgent;
use super::types::{BuildReport, ScreeningError};

/// Keyed cache of agents per (address, tenant).
///
/// Builds run outside the lock, so two callers racing on the same key may both build;
/// the last insert wins. Build failures are never cached.
#[derive(Default)]
pub struct AgentCache {
    agents: Mutex<HashMap<(String, String), Arc<TenantAgent>>>,
}

impl AgentCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached agent for the pair, if any.
    pub async fn get(&self, address: &str, tenant: &str) -> Option<Arc<TenantAgent>> {
        let agents = self.agents.lock().await;
        agents.get(&(address.to_owned(), tenant.to_owned())).cloned()
    }

    /// Returns the cached agent, building and caching one on a miss.
    ///
    /// The report is `None` on a cache hit.
    pub async fn get_or_build<F, Fut>(
        &self,
        address: &str,
        tenant: &str,
        builder: F,
    ) -> Result<(Arc<TenantAgent>, Option<BuildReport>), ScreeningError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(TenantAgent, BuildReport), ScreeningError>>,
    {
        let key = (address.to_owned(), tenant.to_owned());
        if let Some(agent) = self.agents.lock().await.get(&key).cloned() {
            debug!(%address, %tenant, "agent cache hit");
            return Ok((agent, None));
        }

        let (agent, report) = builder().await?;
        let agent = Arc::new(agent);
        self.agents.lock().await.insert(key, Arc::clone(&agent));
        Ok((agent, Some(report)))
    }

    /// Drops the cached agent for the pair so the next access rebuilds it.
    pub async fn invalidate(&self, address: &str, tenant: &str) {
        let mut agents = self.agents.lock().await;
        agents.remove(&(address.to_owned(), tenant.to_owned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::llm::{ChatGateway, ChatMessage, ChunkStream, LlmError};
    use async_trait::async_trait;

    struct NullGateway;

    #[async_trait]
    impl ChatGateway for NullGateway {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _temperature: f32,
        ) -> Result<String, LlmError> {
            unimplemented!("not exercised")
        }

        async fn complete_stream(
            &self,
            _messages: &[ChatMessage],
            _temperature: f32,
        ) -> Result<ChunkStream, LlmError> {
            unimplemented!("not exercised")
        }
    }

    fn fresh_agent() -> TenantAgent {
        TenantAgent::new("12 Oak St", "ada", Arc::new(NullGateway))
    }

    #[tokio::test]
    async fn builds_once_then_serves_from_cache() {
        let cache = AgentCache::new();
        let builds = AtomicUsize::new(0);

        for round in 0..3 {
            let (agent, report) = cache
                .get_or_build("12 Oak St", "ada", || async {
                    builds.fetch_add(1, Ordering::SeqCst);
                    Ok((fresh_agent(), BuildReport::default()))
                })
                .await
                .unwrap();
            assert_eq!(agent.fragment_count(), 0);
            assert_eq!(report.is_some(), round == 0);
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn build_failures_are_not_cached() {
        let cache = AgentCache::new();

        let first = cache
            .get_or_build("12 Oak St", "ada", || async {
                Err(ScreeningError::NotText {
                    key: "k".to_owned(),
                })
            })
            .await;
        assert!(first.is_err());

        let second = cache
            .get_or_build("12 Oak St", "ada", || async {
                Ok((fresh_agent(), BuildReport::default()))
            })
            .await
            .unwrap();
        assert!(second.1.is_some());
    }

    #[tokio::test]
    async fn invalidate_forces_a_rebuild() {
        let cache = AgentCache::new();
        let build = || async { Ok((fresh_agent(), BuildReport::default())) };

        cache.get_or_build("12 Oak St", "ada", build).await.unwrap();
        cache.invalidate("12 Oak St", "ada").await;
        let (_, report) = cache.get_or_build("12 Oak St", "ada", build).await.unwrap();
        assert!(report.is_some());
    }

    #[tokio::test]
    async fn pairs_are_cached_independently() {
        let cache = AgentCache::new();
        let build = || async { Ok((fresh_agent(), BuildReport::default())) };

        cache.get_or_build("12 Oak St", "ada", build).await.unwrap();
        assert!(cache.get("12 Oak St", "ada").await.is_some());
        assert!(cache.get("12 Oak St", "grace").await.is_none());
        assert!(cache.get("9 Elm Ave", "ada").await.is_none());
    }
}
