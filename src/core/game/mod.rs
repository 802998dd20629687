mod events;
mod history;
mod invoke;
pub mod prompts;
mod record;
pub mod run;
mod verdict;

use std::sync::Arc;
use std::time::Duration;

use crate::core::ports::{llm::LlmPort, store::StorePort};

pub use events::{TurnEvent, TurnEventKind};
pub use history::ConversationHistory;
pub use invoke::{ModelClient, FALLBACK_RESPONSE};
pub use record::{Conversation, GameRun};
pub use run::{GameError, GameOutcome, GameRequest, GameStream};
pub use verdict::{extract_verdict, Verdict, VerdictExtraction};

const DEFAULT_LLM_RESPONSE_TIMEOUT: Duration = Duration::from_secs(180);

/// Runs imitation games. One instance can serve many concurrent runs; each
/// run owns its histories and its event consumer.
pub struct Game {
    pub(crate) llm: Arc<dyn LlmPort>,
    pub(crate) store: Arc<dyn StorePort>,
    pub(crate) llm_response_timeout: Duration,
}

impl Game {
    pub fn new(llm: Arc<dyn LlmPort>, store: Arc<dyn StorePort>) -> Self {
        Self {
            llm,
            store,
            llm_response_timeout: DEFAULT_LLM_RESPONSE_TIMEOUT,
        }
    }

    pub fn with_llm_response_timeout(mut self, timeout: Duration) -> Self {
        self.llm_response_timeout = timeout;
        self
    }
}
