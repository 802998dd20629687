pub mod providers;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::adapters::providers::{ChatRequest, ProviderRegistry};
use crate::core::ports::llm::{DynError, LlmChatRequest, LlmPort};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug)]
pub enum StreamEvent {
    Text(String),
    Done,
    Error(String),
}

/// Credentials and attribution headers for the configured provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderAccess {
    pub provider: String,
    pub api_key: String,
    pub base_url: Option<String>,
    pub http_referer: Option<String>,
    pub app_title: Option<String>,
}

impl ProviderAccess {
    fn extra_headers(&self) -> Vec<(String, String)> {
        if !self.provider.trim().eq_ignore_ascii_case("openrouter") {
            return Vec::new();
        }

        let mut headers = Vec::new();
        if let Some(referer) = self.http_referer.as_deref().filter(|v| !v.trim().is_empty()) {
            headers.push(("HTTP-Referer".to_string(), referer.trim().to_string()));
        }
        if let Some(title) = self.app_title.as_deref().filter(|v| !v.trim().is_empty()) {
            headers.push(("X-Title".to_string(), title.trim().to_string()));
        }
        headers
    }
}

pub async fn chat_stream(
    access: &ProviderAccess,
    model: &str,
    messages: &[ChatMessage],
    tx: tokio::sync::mpsc::UnboundedSender<StreamEvent>,
) -> Result<(), DynError> {
    let model_name = model.trim();
    if model_name.is_empty() {
        return Err("Model id must be non-empty".into());
    }

    let registry = ProviderRegistry::default();
    let provider = registry
        .resolve_llm(&access.provider)
        .map_err(|e| -> DynError { e.into() })?;

    let extra_headers = access.extra_headers();
    provider
        .chat(ChatRequest {
            api_key: &access.api_key,
            base_url: access.base_url.as_deref(),
            model: model_name,
            messages,
            extra_headers: &extra_headers,
            tx,
        })
        .await
}

pub struct ChatLlmAdapter {
    access: ProviderAccess,
}

impl ChatLlmAdapter {
    pub fn new(access: ProviderAccess) -> Self {
        Self { access }
    }
}

impl LlmPort for ChatLlmAdapter {
    fn chat_stream<'a>(
        &'a self,
        request: LlmChatRequest<'a>,
    ) -> BoxFuture<'a, Result<(), DynError>> {
        Box::pin(async move {
            chat_stream(&self.access, request.model, request.messages, request.tx).await
        })
    }
}
