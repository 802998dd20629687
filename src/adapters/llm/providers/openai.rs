use crate::adapters::llm::{ChatMessage, StreamEvent};
use futures::StreamExt;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

#[derive(Debug, Serialize)]
struct OpenAIChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage<'a> {
    role: &'static str,
    content: &'a str,
}

pub async fn chat_stream_with_endpoint(
    api_key: &str,
    model: &str,
    messages: &[ChatMessage],
    extra_headers: &[(String, String)],
    tx: mpsc::UnboundedSender<StreamEvent>,
    endpoint: &str,
    provider_name: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let client = reqwest::Client::new();

    let mut request = client
        .post(endpoint)
        .header("content-type", "application/json")
        .json(&OpenAIChatCompletionsRequest {
            model,
            messages: build_chat_completion_messages(messages),
            stream: true,
        });
    if !api_key.trim().is_empty() {
        request = request.header("Authorization", format!("Bearer {}", api_key.trim()));
    }
    for (name, value) in extra_headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("{provider_name} API error ({status}): {body}").into());
    }

    let mut stream = response.bytes_stream();
    let mut buffer = SseLineBuffer::default();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for line in buffer.push(&chunk) {
            handle_sse_line(&tx, &line, provider_name)?;
        }
    }

    if let Some(trailing) = buffer.finish() {
        handle_sse_line(&tx, &trailing, provider_name)?;
    }

    let _ = tx.send(StreamEvent::Done);
    Ok(())
}

/// Splits a byte stream into lines. Bytes are only decoded once a full line
/// is present, so a multi-byte character split across chunks survives.
#[derive(Debug, Default)]
struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(line_end) = self.pending.iter().position(|b| *b == b'\n') {
            let line = self.pending.drain(..=line_end).collect::<Vec<_>>();
            lines.push(String::from_utf8_lossy(&line).trim().to_string());
        }
        lines
    }

    fn finish(self) -> Option<String> {
        let trailing = String::from_utf8_lossy(&self.pending).trim().to_string();
        (!trailing.is_empty()).then_some(trailing)
    }
}

fn handle_sse_line(
    tx: &mpsc::UnboundedSender<StreamEvent>,
    line: &str,
    provider_name: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if line.is_empty() || line.starts_with(':') || line == "data: [DONE]" {
        return Ok(());
    }

    let Some(data) = line.strip_prefix("data:").map(str::trim_start) else {
        return Ok(());
    };
    let Ok(parsed) = serde_json::from_str::<Value>(data) else {
        return Ok(());
    };

    if let Some(error) = parsed.get("error") {
        let msg = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error");
        return Err(format!("{provider_name} error: {msg}").into());
    }

    for delta_text in extract_delta_texts(&parsed) {
        let _ = tx.send(StreamEvent::Text(delta_text));
    }
    Ok(())
}

fn extract_delta_texts(parsed: &Value) -> Vec<String> {
    parsed
        .get("choices")
        .and_then(|c| c.as_array())
        .map(|choices| {
            choices
                .iter()
                .filter_map(|choice| choice["delta"].get("content").and_then(|c| c.as_str()))
                .filter(|content| !content.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn build_chat_completion_messages(messages: &[ChatMessage]) -> Vec<OpenAIMessage<'_>> {
    messages
        .iter()
        .map(|m| OpenAIMessage {
            role: m.role.as_str(),
            content: &m.content,
        })
        .collect()
}
