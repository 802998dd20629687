use futures::future::BoxFuture;
use tokio::sync::mpsc;

pub type DynError = Box<dyn std::error::Error + Send + Sync>;

pub use crate::adapters::llm::{ChatMessage, Role, StreamEvent};

#[derive(Debug, Clone)]
pub struct LlmChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub tx: mpsc::UnboundedSender<StreamEvent>,
}

pub trait LlmPort: Send + Sync {
    fn chat_stream<'a>(
        &'a self,
        request: LlmChatRequest<'a>,
    ) -> BoxFuture<'a, Result<(), DynError>>;
}
