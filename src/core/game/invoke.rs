use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::core::ports::llm::{ChatMessage, LlmChatRequest, LlmPort, StreamEvent};

pub const FALLBACK_RESPONSE: &str =
    "I am unable to respond at the moment. Please check your API key and try again.";

/// Single-attempt model calls. Every failure (transport, provider error
/// payload, empty reply, timeout) becomes [`FALLBACK_RESPONSE`].
#[derive(Clone)]
pub struct ModelClient {
    llm: Arc<dyn LlmPort>,
    response_timeout: Duration,
}

impl ModelClient {
    pub fn new(llm: Arc<dyn LlmPort>, response_timeout: Duration) -> Self {
        Self {
            llm,
            response_timeout,
        }
    }

    pub async fn invoke(&self, model: &str, messages: &[ChatMessage]) -> String {
        match self.try_invoke(model, messages).await {
            Ok(text) => text,
            Err(reason) => {
                log::warn!("model call to {model} failed: {reason}");
                FALLBACK_RESPONSE.to_string()
            }
        }
    }

    async fn try_invoke(&self, model: &str, messages: &[ChatMessage]) -> Result<String, String> {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let call = self.llm.chat_stream(LlmChatRequest {
            model,
            messages,
            tx,
        });
        match tokio::time::timeout(self.response_timeout, call).await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => return Err(error.to_string()),
            Err(_) => {
                return Err(format!(
                    "llm_response_timeout:{}ms",
                    self.response_timeout.as_millis()
                ))
            }
        }

        let mut text = String::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                StreamEvent::Text(delta) => text.push_str(&delta),
                StreamEvent::Done => break,
                StreamEvent::Error(error) => return Err(error),
            }
        }

        let text = text.trim();
        if text.is_empty() {
            return Err("empty response".to_string());
        }
        Ok(text.to_string())
    }
}
