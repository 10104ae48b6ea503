//! Per-tenant conversational agent.
//!
//! An agent accumulates ingested text fragments for one (address, tenant) pair and
//! answers interview questions about them in the tenant's voice. Agents are rebuilt
//! from storage on demand; nothing here persists.

use std::sync::Arc;

use crate::llm::{ChatGateway, ChatMessage, ChunkStream, LlmError};

use super::types::DataType;

/// What kind of material a fragment carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// A structured summary of a document of the given data type.
    Summary(DataType),
    /// A raw video link ingested verbatim.
    VideoReference,
}

impl FragmentKind {
    fn label(self) -> &'static str {
        match self {
            Self::Summary(data_type) => data_type.as_str(),
            Self::VideoReference => "video reference",
        }
    }
}

/// One ingested piece of tenant material.
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Fragment text, already sanitized where it came from a model.
    pub content: String,
    /// Classification used to label the fragment in chat context.
    pub kind: FragmentKind,
}

/// Conversational corpus for one tenant at one property.
pub struct TenantAgent {
    address: String,
    tenant_name: String,
    gateway: Arc<dyn ChatGateway>,
    fragments: Vec<Fragment>,
}

impl TenantAgent {
    /// Creates an empty agent for the pair.
    pub fn new(address: &str, tenant_name: &str, gateway: Arc<dyn ChatGateway>) -> Self {
        Self {
            address: address.to_owned(),
            tenant_name: tenant_name.to_owned(),
            gateway,
            fragments: Vec::new(),
        }
    }

    /// Adds one fragment to the corpus.
    pub fn add(&mut self, content: impl Into<String>, kind: FragmentKind) {
        self.fragments.push(Fragment {
            content: content.into(),
            kind,
        });
    }

    /// Number of fragments ingested so far.
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    fn persona(&self) -> String {
        format!(
            "You are a tenant named {} who is interested in renting the unit at {}. You \
are currently being interviewed to determine if you are a good fit for the unit. You \
will be asked questions about the documents you have uploaded.",
            self.tenant_name, self.address
        )
    }

    fn context(&self) -> String {
        if self.fragments.is_empty() {
            return "No documents have been uploaded yet.".to_owned();
        }
        let mut out = String::from("The documents you have uploaded:\n");
        for fragment in &self.fragments {
            out.push_str(&format!("[{}]\n{}\n\n", fragment.kind.label(), fragment.content));
        }
        out
    }

    pub(crate) fn chat_messages(&self, question: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.persona()),
            ChatMessage::system(self.context()),
            ChatMessage::user(question),
        ]
    }

    /// Answers one question as a lazy chunk stream.
    pub async fn chat(&self, question: &str) -> Result<ChunkStream, LlmError> {
        let messages = self.chat_messages(question);
        self.gateway.complete_stream(&messages, 0.0).await
    }
}
