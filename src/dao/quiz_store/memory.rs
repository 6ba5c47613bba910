//! In-memory quiz catalogue, optionally seeded from a JSON file.

use std::{fs, path::Path, sync::Arc};

use dashmap::DashMap;
use futures::future::BoxFuture;
use tracing::info;
use uuid::Uuid;

use crate::dao::{
    models::QuizEntity,
    quiz_store::QuizStore,
    storage::{StorageError, StorageResult},
};

/// Quiz store holding the whole catalogue in process memory.
///
/// Quizzes are immutable once inserted; lookups hand out clones so the engine
/// can snapshot question lists without holding any lock.
#[derive(Debug, Default)]
pub struct InMemoryQuizStore {
    quizzes: DashMap<Uuid, QuizEntity>,
}

impl InMemoryQuizStore {
    /// Create an empty catalogue.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Load a catalogue from a JSON file containing an array of quizzes.
    pub fn from_file(path: &Path) -> StorageResult<Arc<Self>> {
        let contents = fs::read_to_string(path)
            .map_err(|err| StorageError::unavailable(format!("reading {}", path.display()), err))?;
        let quizzes: Vec<QuizEntity> = serde_json::from_str(&contents)
            .map_err(|err| StorageError::Corrupted(format!("{}: {err}", path.display())))?;

        let store = Self::default();
        for quiz in quizzes {
            if quiz.questions.iter().any(|q| q.correct_answer >= q.options.len()) {
                return Err(StorageError::Corrupted(format!(
                    "quiz `{}` has a correct answer outside its options",
                    quiz.id
                )));
            }
            store.quizzes.insert(quiz.id, quiz);
        }

        info!(path = %path.display(), count = store.quizzes.len(), "loaded quiz catalogue");
        Ok(Arc::new(store))
    }

    /// Insert or replace a quiz. Used by seeding and tests.
    pub fn insert(&self, quiz: QuizEntity) {
        self.quizzes.insert(quiz.id, quiz);
    }

    /// Number of quizzes currently held.
    pub fn len(&self) -> usize {
        self.quizzes.len()
    }

    /// Whether the catalogue is empty.
    pub fn is_empty(&self) -> bool {
        self.quizzes.is_empty()
    }
}

impl QuizStore for InMemoryQuizStore {
    fn find_quiz(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let quiz = self.quizzes.get(&id).map(|entry| entry.value().clone());
        Box::pin(async move { Ok(quiz) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async move { Ok(()) })
    }
}
