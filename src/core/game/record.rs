use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::ports::store::StorePort;

use super::history::ConversationHistory;
use super::verdict::Verdict;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub interrogator_transcript: ConversationHistory,
    pub participant_transcript: ConversationHistory,
}

/// The durable record of one finished run. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRun {
    pub run_id: String,
    pub interrogator_model: String,
    pub participant_model: String,
    pub interrogator_system_prompt: String,
    pub participant_system_prompt: String,
    pub conversation: Conversation,
    pub judgment: String,
    pub verdict: Verdict,
    pub run_by: String,
    pub created_at: String,
}

/// Hands the run to the store off the async executor. Returns whether the
/// write succeeded; failures are logged and go no further.
pub(super) async fn record_run(store: Arc<dyn StorePort>, run: GameRun) -> bool {
    let run_id = run.run_id.clone();
    let outcome = tokio::task::spawn_blocking(move || store.persist(&run)).await;

    match outcome {
        Ok(Ok(())) => {
            log::info!("game run {run_id} saved");
            true
        }
        Ok(Err(error)) => {
            log::warn!("failed to save game run {run_id}: {error}");
            false
        }
        Err(error) => {
            log::warn!("game run {run_id} persistence task failed: {error}");
            false
        }
    }
}
