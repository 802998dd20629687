use crate::core::game::GameRun;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to encode conversation: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("run store unavailable: {0}")]
    Unavailable(String),
}

/// Write side of the run record store. `run_id` is unique per call and is
/// never deduplicated here.
pub trait StorePort: Send + Sync {
    fn persist(&self, run: &GameRun) -> Result<(), StoreError>;
}
