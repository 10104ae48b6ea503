//! Document summarization through the chat gateway.
//!
//! Raw documents never enter an agent's context directly; each one is condensed into a
//! structured summary first. Prompt assembly is kept in pure functions so identical
//! inputs always produce identical requests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::llm::{ChatGateway, ChatMessage, LlmError};

use super::sanitize::sanitize_markdown;

const SUMMARIZER_ROLE: &str = "You are very detail oriented property management analyst, \
who carefully reads all details of an unstructured document and creates a structured \
document containing all key pieces of information that would be helpful for analyzing \
the tenant.";

/// Builds the deterministic message sequence for one summarization request.
pub(crate) fn build_summary_messages(
    document_text: &str,
    document_type: &str,
    tenant_name: &str,
    address: &str,
) -> Vec<ChatMessage> {
    let instruction = format!(
        "Based on the following messy document from {tenant_name}, who is applying for \
the property at {address}, with document type {document_type}, provide a summary of \
the document. Carefully report all key metrics. \
Do not provide your own commentary. Just summarize very carefully. Only include \
information that would be important for determining whether the tenant is a good fit \
for the rental property. Don't include anything about disclaimers or stuff like that. \
Here is the document:\n```\n{document_text}\n```"
    );
    vec![
        ChatMessage::system(SUMMARIZER_ROLE),
        ChatMessage::user(&instruction),
    ]
}

/// Condenses one document into a structured summary.
#[async_trait]
pub trait DocumentSummarizer: Send + Sync {
    /// Summarizes `document_text` for the given tenant and property context.
    async fn summarize(
        &self,
        document_text: &str,
        document_type: &str,
        tenant_name: &str,
        address: &str,
    ) -> Result<String, LlmError>;
}

/// [`DocumentSummarizer`] backed by the chat gateway, pinned to temperature zero.
pub struct LlmSummarizer {
    gateway: Arc<dyn ChatGateway>,
}

impl LlmSummarizer {
    /// Wraps a chat gateway.
    pub fn new(gateway: Arc<dyn ChatGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl DocumentSummarizer for LlmSummarizer {
    async fn summarize(
        &self,
        document_text: &str,
        document_type: &str,
        tenant_name: &str,
        address: &str,
    ) -> Result<String, LlmError> {
        let messages = build_summary_messages(document_text, document_type, tenant_name, address);
        let raw = self.gateway.complete(&messages, 0.0).await?;
        Ok(sanitize_markdown(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChunkStream;

    struct CannedGateway {
        reply: String,
    }

    #[async_trait]
    impl ChatGateway for CannedGateway {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _temperature: f32,
        ) -> Result<String, LlmError> {
            Ok(self.reply.clone())
        }

        async fn complete_stream(
            &self,
            _messages: &[ChatMessage],
            _temperature: f32,
        ) -> Result<ChunkStream, LlmError> {
            unimplemented!("not exercised")
        }
    }

    #[test]
    fn identical_inputs_build_identical_messages() {
        let a = build_summary_messages("text", "pay stub", "Ada Lovelace", "12 Oak St");
        let b = build_summary_messages("text", "pay stub", "Ada Lovelace", "12 Oak St");
        assert_eq!(a, b);
    }

    #[test]
    fn document_is_embedded_in_a_fenced_block() {
        let messages = build_summary_messages("monthly income 4200", "pay stub", "Ada", "12 Oak St");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert!(messages[1].content.contains("```\nmonthly income 4200\n```"));
        assert!(messages[1].content.contains("Ada"));
        assert!(messages[1].content.contains("12 Oak St"));
        assert!(messages[1].content.contains("pay stub"));
    }

    #[tokio::test]
    async fn summaries_are_sanitized() {
        let summarizer = LlmSummarizer::new(Arc::new(CannedGateway {
            reply: "Income: $4200 *verified*".into(),
        }));
        let summary = summarizer
            .summarize("doc", "pay stub", "Ada", "12 Oak St")
            .await
            .unwrap();
        assert_eq!(summary, "Income: \\$4200 \\*verified\\*");
    }
}
