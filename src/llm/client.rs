//! Chat-completion client for OpenAI-style gateways.

use crate::config::get_config;
use crate::llm::sse::{self, SseEvent};
use crate::llm::{ChatGateway, ChatMessage, ChunkStream, LlmError};
use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::{Value, json};

/// HTTP client for a hosted chat-completion gateway.
pub struct OpenAiChatGateway {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: String,
    pub(crate) model: String,
}

impl OpenAiChatGateway {
    /// Construct a new gateway client using configuration derived from the environment.
    pub fn new() -> Result<Self, LlmError> {
        let config = get_config();
        let client = Client::builder()
            .user_agent("tenantdesk/0.1")
            .build()
            .map_err(|err| LlmError::Unreachable(err.to_string()))?;

        tracing::debug!(url = %config.llm_url, model = %config.llm_model, "Initialized chat gateway client");

        Ok(Self {
            client,
            base_url: config.llm_url.trim_end_matches('/').to_string(),
            api_key: config.llm_api_key.clone(),
            model: config.llm_model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn build_body(&self, messages: &[ChatMessage], temperature: f32, stream: bool) -> Value {
        json!({
            "model": self.model,
            "messages": messages,
            "temperature": temperature,
            "stream": stream,
        })
    }

    async fn send(&self, body: &Value) -> Result<reqwest::Response, LlmError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                LlmError::Unreachable(format!("failed to reach {}: {err}", self.base_url))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = LlmError::Gateway { status, body };
            tracing::error!(error = %error, "Chat completion request failed");
            return Err(error);
        }

        Ok(response)
    }
}

fn extract_completion_text(body: &Value) -> Result<String, LlmError> {
    body.get("choices")
        .and_then(|choices| choices.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(str::to_string)
        .ok_or_else(|| LlmError::InvalidResponse("no message content in completion".into()))
}

#[async_trait]
impl ChatGateway for OpenAiChatGateway {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, LlmError> {
        let body = self.build_body(messages, temperature, false);
        let response = self.send(&body).await?;
        let payload: Value = response
            .json()
            .await
            .map_err(|err| LlmError::InvalidResponse(format!("bad completion body: {err}")))?;
        extract_completion_text(&payload)
    }

    async fn complete_stream(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<ChunkStream, LlmError> {
        let body = self.build_body(messages, temperature, true);
        let response = self.send(&body).await?;
        let mut byte_stream = response.bytes_stream();

        let stream = try_stream! {
            let mut buffer: Vec<u8> = Vec::new();
            let mut done = false;
            while !done {
                let Some(chunk) = byte_stream.next().await else {
                    break;
                };
                let bytes =
                    chunk.map_err(|err| LlmError::Unreachable(format!("stream failed: {err}")))?;
                buffer.extend_from_slice(&bytes);
                for payload in sse::drain_data_lines(&mut buffer) {
                    match sse::parse_sse_data(&payload)? {
                        Some(SseEvent::Delta(text)) => yield text,
                        Some(SseEvent::Done) => {
                            done = true;
                            break;
                        }
                        None => {}
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn test_gateway(base_url: String) -> OpenAiChatGateway {
        OpenAiChatGateway {
            client: Client::builder()
                .user_agent("tenantdesk-test")
                .build()
                .expect("client"),
            base_url,
            api_key: "test-key".into(),
            model: "screening-model".into(),
        }
    }

    fn sample_messages() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("You review documents."),
            ChatMessage::user("Summarize this."),
        ]
    }

    #[tokio::test]
    async fn complete_extracts_message_content() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer test-key")
                    .json_body_partial(r#"{"model":"screening-model","temperature":0.0,"stream":false}"#);
                then.status(200).json_body(serde_json::json!({
                    "choices": [
                        { "message": { "role": "assistant", "content": "A summary." } }
                    ]
                }));
            })
            .await;

        let gateway = test_gateway(server.base_url());
        let answer = gateway
            .complete(&sample_messages(), 0.0)
            .await
            .expect("completion");

        mock.assert();
        assert_eq!(answer, "A summary.");
    }

    #[tokio::test]
    async fn identical_inputs_issue_identical_payloads() {
        let server = MockServer::start_async().await;
        let gateway = test_gateway(server.base_url());
        let expected_body = gateway.build_body(&sample_messages(), 0.0, false);

        let mock = server
            .mock_async(move |when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .json_body(expected_body.clone());
                then.status(200).json_body(serde_json::json!({
                    "choices": [{ "message": { "content": "ok" } }]
                }));
            })
            .await;

        gateway.complete(&sample_messages(), 0.0).await.expect("first");
        gateway.complete(&sample_messages(), 0.0).await.expect("second");

        mock.assert_hits(2);
    }

    #[tokio::test]
    async fn error_status_surfaces_gateway_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(429).body("quota exceeded");
            })
            .await;

        let gateway = test_gateway(server.base_url());
        let error = gateway
            .complete(&sample_messages(), 0.0)
            .await
            .expect_err("gateway error");

        assert!(
            matches!(error, LlmError::Gateway { status, ref body } if status.as_u16() == 429 && body == "quota exceeded")
        );
    }

    #[tokio::test]
    async fn missing_content_is_invalid_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(serde_json::json!({ "choices": [] }));
            })
            .await;

        let gateway = test_gateway(server.base_url());
        let error = gateway
            .complete(&sample_messages(), 0.0)
            .await
            .expect_err("invalid response");

        assert!(matches!(error, LlmError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn streaming_yields_ordered_chunks() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).body(concat!(
                    "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
                    "data: {\"choices\":[{\"delta\":{\"content\":\"Good \"}}]}\n\n",
                    "data: {\"choices\":[{\"delta\":{\"content\":\"tenant.\"}}]}\n\n",
                    "data: [DONE]\n\n",
                ));
            })
            .await;

        let gateway = test_gateway(server.base_url());
        let mut stream = gateway
            .complete_stream(&sample_messages(), 0.0)
            .await
            .expect("stream");

        let mut chunks = Vec::new();
        while let Some(chunk) = stream.next().await {
            chunks.push(chunk.expect("chunk"));
        }

        assert_eq!(chunks, vec!["Good ".to_string(), "tenant.".to_string()]);
    }

    #[tokio::test]
    async fn streaming_preserves_non_ascii_text() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).body(concat!(
                    "data: {\"choices\":[{\"delta\":{\"content\":\"caf\u{e9} \"}}]}\n\n",
                    "data: {\"choices\":[{\"delta\":{\"content\":\"r\u{e9}sum\u{e9}\"}}]}\n\n",
                    "data: [DONE]\n\n",
                ));
            })
            .await;

        let gateway = test_gateway(server.base_url());
        let mut stream = gateway
            .complete_stream(&sample_messages(), 0.0)
            .await
            .expect("stream");

        let mut answer = String::new();
        while let Some(chunk) = stream.next().await {
            answer.push_str(&chunk.expect("chunk"));
        }

        assert_eq!(answer, "caf\u{e9} r\u{e9}sum\u{e9}");
    }
}
