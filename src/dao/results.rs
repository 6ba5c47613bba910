//! Persistence of final battle rankings.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use tracing::debug;

use crate::dao::{models::BattleResultEntity, storage::StorageResult};

/// Sink for final rankings, written fire-and-forget when a room completes.
///
/// The engine never blocks on this; a failed write is logged and the room
/// finishes regardless.
pub trait ResultStore: Send + Sync {
    fn save_results(&self, result: BattleResultEntity) -> BoxFuture<'static, StorageResult<()>>;
}

/// Result sink keeping rankings in process memory, keyed by room code.
///
/// Room codes are unique among live rooms, and results only need to outlive
/// the completed-room retention window, so the code is a sufficient key.
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    results: DashMap<String, BattleResultEntity>,
}

impl InMemoryResultStore {
    /// Create an empty sink.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fetch a stored result by room code. Used by tests and debugging.
    pub fn find(&self, room_code: &str) -> Option<BattleResultEntity> {
        self.results.get(room_code).map(|entry| entry.value().clone())
    }
}

impl ResultStore for InMemoryResultStore {
    fn save_results(&self, result: BattleResultEntity) -> BoxFuture<'static, StorageResult<()>> {
        debug!(code = %result.room_code, players = result.rankings.len(), "storing final rankings");
        self.results.insert(result.room_code.clone(), result);
        Box::pin(async move { Ok(()) })
    }
}
