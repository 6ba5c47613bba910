pub mod memory;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::QuizEntity;
use crate::dao::storage::StorageResult;

/// Abstraction over the read-only quiz catalogue.
///
/// The engine consults it when a battle is created (existence check) and once
/// at game start, where the question list is snapshotted into the room.
pub trait QuizStore: Send + Sync {
    fn find_quiz(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
