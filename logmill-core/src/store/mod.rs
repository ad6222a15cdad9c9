mod sqlite;

pub use sqlite::SqliteStore;

use crate::enrichment::UserAgentClass;
use crate::event::LogEvent;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to apply schema: {0}")]
    Schema(#[source] rusqlite::Error),

    #[error("database query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

/// A batched event with its user-agent reference already resolved.
#[derive(Debug, Clone)]
pub struct ResolvedEvent {
    pub event: LogEvent,
    pub user_agent_id: Option<i64>,
}

/// Write seam between the ingestion batcher and persistence.
pub trait EventStore {
    fn find_user_agent(&self, raw: &str) -> Result<Option<i64>, StoreError>;

    fn insert_user_agent(&mut self, raw: &str, class: &UserAgentClass)
    -> Result<i64, StoreError>;

    /// Commit a batch as one atomic multi-row write, in arrival order.
    fn insert_event_batch(&mut self, batch: &[ResolvedEvent]) -> Result<(), StoreError>;
}
