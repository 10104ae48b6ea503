//! Parsing for chat-completion server-sent events.

use serde_json::Value;

use super::LlmError;

/// Meaningful outcomes of one SSE `data:` payload.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum SseEvent {
    /// Incremental answer text.
    Delta(String),
    /// Stream terminator sentinel.
    Done,
}

/// Parse one SSE `data:` payload into an event.
///
/// Payloads with no answer text (role announcements, finish-reason chunks, usage
/// summaries) yield `None` and are skipped by the caller.
pub(crate) fn parse_sse_data(data: &str) -> Result<Option<SseEvent>, LlmError> {
    if data.trim() == "[DONE]" {
        return Ok(Some(SseEvent::Done));
    }

    let value: Value = serde_json::from_str(data)
        .map_err(|err| LlmError::InvalidResponse(format!("bad SSE chunk: {err}")))?;

    let delta = value
        .get("choices")
        .and_then(|choices| choices.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("delta"))
        .and_then(|delta| delta.get("content"))
        .and_then(|content| content.as_str());

    match delta {
        Some(text) if !text.is_empty() => Ok(Some(SseEvent::Delta(text.to_string()))),
        _ => Ok(None),
    }
}

/// Split buffered SSE bytes into complete `data:` payloads, retaining the tail.
///
/// SSE frames are newline-delimited. The buffer holds raw bytes and only complete
/// lines are decoded, so a multibyte character split across network chunks stays
/// intact until its remaining bytes arrive.
pub(crate) fn drain_data_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut payloads = Vec::new();
    while let Some(newline) = buffer.iter().position(|&byte| byte == b'\n') {
        let line: Vec<u8> = buffer.drain(..=newline).collect();
        let line = String::from_utf8_lossy(&line);
        let line = line.trim_end_matches(['\n', '\r']);
        if let Some(payload) = line.strip_prefix("data:") {
            let payload = payload.trim_start();
            if !payload.is_empty() {
                payloads.push(payload.to_string());
            }
        }
    }
    payloads
}
