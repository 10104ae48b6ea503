//! Language-model gateway integration.
//!
//! The gateway speaks the common chat-completions contract: an ordered list of
//! `{role, content}` messages in, one completion out, optionally streamed as
//! server-sent-event deltas. Callers in the screening pipeline pin the temperature
//! to 0 so repeated requests with identical inputs produce identical payloads.

pub mod client;
mod sse;

use async_trait::async_trait;
use futures_core::Stream;
use reqwest::StatusCode;
use serde::Serialize;
use std::pin::Pin;
use thiserror::Error;

pub use client::OpenAiChatGateway;

/// Errors surfaced by the chat-completion gateway.
///
/// Every variant is terminal for the operation that raised it; nothing in the
/// pipeline retries a failed gateway call.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport failed before a response was received.
    #[error("Language model gateway unreachable: {0}")]
    Unreachable(String),
    /// Gateway responded with a non-success status.
    #[error("Language model gateway returned {status}: {body}")]
    Gateway {
        /// HTTP status returned by the gateway.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Response arrived but lacked the expected completion payload.
    #[error("Malformed gateway response: {0}")]
    InvalidResponse(String),
}

/// One entry in an ordered chat-completion conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// Message role (`system` or `user`).
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Build a system-role message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    /// Build a user-role message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Finite, in-order sequence of answer fragments produced by a streaming completion.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Interface implemented by chat-completion backends.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Issue one synchronous completion request and return the full answer text.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, LlmError>;

    /// Issue one streaming completion request and return the lazy chunk sequence.
    ///
    /// The concatenation of all yielded fragments is the final answer. Errors that
    /// occur mid-stream surface as stream items; fragments already yielded remain
    /// valid partial output.
    async fn complete_stream(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<ChunkStream, LlmError>;
}
