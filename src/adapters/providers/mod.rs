use crate::adapters::llm::{self, ChatMessage, StreamEvent};
use futures::future::BoxFuture;
use std::collections::HashMap;
use tokio::sync::mpsc;

type DynError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub api_key: &'a str,
    /// Overrides the provider's default base url (e.g. a remote Ollama host).
    pub base_url: Option<&'a str>,
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub extra_headers: &'a [(String, String)],
    pub tx: mpsc::UnboundedSender<StreamEvent>,
}

pub trait LlmProvider: Send + Sync {
    fn id(&self) -> &str;
    fn display_name(&self) -> &str;
    fn default_base_url(&self) -> &str;
    fn chat<'a>(&'a self, request: ChatRequest<'a>) -> BoxFuture<'a, Result<(), DynError>>;
}

/// Any provider speaking the OpenAI chat-completions protocol.
struct OpenAiCompatibleProvider {
    id: &'static str,
    display_name: &'static str,
    base_url: &'static str,
}

impl LlmProvider for OpenAiCompatibleProvider {
    fn id(&self) -> &str {
        self.id
    }

    fn display_name(&self) -> &str {
        self.display_name
    }

    fn default_base_url(&self) -> &str {
        self.base_url
    }

    fn chat<'a>(&'a self, request: ChatRequest<'a>) -> BoxFuture<'a, Result<(), DynError>> {
        Box::pin(async move {
            let base_url = request
                .base_url
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .unwrap_or(self.base_url);
            let endpoint = chat_completions_endpoint(base_url);
            llm::providers::openai::chat_stream_with_endpoint(
                request.api_key,
                request.model,
                request.messages,
                request.extra_headers,
                request.tx,
                &endpoint,
                self.display_name,
            )
            .await
        })
    }
}

pub struct ProviderRegistry {
    llm: HashMap<String, Box<dyn LlmProvider>>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        let mut registry = Self {
            llm: HashMap::new(),
        };

        registry.register_llm(Box::new(OpenAiCompatibleProvider {
            id: "openrouter",
            display_name: "OpenRouter",
            base_url: "https://openrouter.ai/api/v1",
        }));
        registry.register_llm(Box::new(OpenAiCompatibleProvider {
            id: "openai",
            display_name: "OpenAI",
            base_url: "https://api.openai.com/v1",
        }));
        registry.register_llm(Box::new(OpenAiCompatibleProvider {
            id: "ollama",
            display_name: "Ollama",
            base_url: "http://localhost:11434/v1",
        }));
        registry.register_llm(Box::new(OpenAiCompatibleProvider {
            id: "lm_studio",
            display_name: "LM Studio",
            base_url: "http://localhost:1234/v1",
        }));

        registry
    }
}

impl ProviderRegistry {
    pub fn register_llm(&mut self, provider: Box<dyn LlmProvider>) {
        self.llm.insert(provider.id().to_string(), provider);
    }

    pub fn resolve_llm(&self, provider_id: &str) -> Result<&dyn LlmProvider, String> {
        let normalized = provider_id.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err("No LLM provider configured".to_string());
        }
        self.llm
            .get(&normalized)
            .map(|provider| provider.as_ref())
            .ok_or_else(|| format!("Unsupported LLM provider: {normalized}"))
    }

    pub fn llm_provider_ids(&self) -> Vec<String> {
        let mut ids = self.llm.keys().cloned().collect::<Vec<_>>();
        ids.sort();
        ids
    }
}

pub fn chat_completions_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim().trim_end_matches('/'))
}

pub fn models_endpoint(base_url: &str) -> String {
    format!("{}/models", base_url.trim().trim_end_matches('/'))
}
