//! Tenant-fit evaluation of a single document.

use std::sync::Arc;

use crate::llm::{ChatGateway, ChatMessage, LlmError};

use super::sanitize::sanitize_markdown;

pub(crate) fn build_evaluation_messages(
    document_text: &str,
    document_type: &str,
    tenant_name: &str,
    address: &str,
) -> Vec<ChatMessage> {
    let role = format!(
        "You are a critical property manager and are currently evaluating a prospective \
tenant named {tenant_name} for a rental property located at {address}. Your goal is to \
evaluate the tenant and determine whether they are a good fit for the property. Pay \
close attention to key metrics like credit score, income level and job stability. Be \
highly suspect of any red flags."
    );
    let instruction = format!(
        "Based on the following document from {tenant_name} with document type \
{document_type}, provide concise meaningful commentary on whether {tenant_name} is a \
good fit for the property.\n```\n{document_text}\n```"
    );
    vec![ChatMessage::system(&role), ChatMessage::user(&instruction)]
}

/// Produces a critical tenant-fit assessment of one document.
pub struct TenantEvaluator {
    gateway: Arc<dyn ChatGateway>,
}

impl TenantEvaluator {
    /// Wraps a chat gateway.
    pub fn new(gateway: Arc<dyn ChatGateway>) -> Self {
        Self { gateway }
    }

    /// Evaluates one document's text, returning sanitized prose.
    pub async fn evaluate(
        &self,
        document_text: &str,
        document_type: &str,
        tenant_name: &str,
        address: &str,
    ) -> Result<String, LlmError> {
        let messages =
            build_evaluation_messages(document_text, document_type, tenant_name, address);
        let raw = self.gateway.complete(&messages, 0.0).await?;
        Ok(sanitize_markdown(&raw))
    }
}
