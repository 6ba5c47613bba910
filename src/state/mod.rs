/// Room registry and code generation.
pub mod registry;
/// Per-room state machine.
pub mod room;
/// Pure scoring functions.
pub mod scoring;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    dao::{quiz_store::QuizStore, results::ResultStore},
};

use self::registry::RoomRegistry;

/// Shared handle to the central application state.
pub type SharedState = Arc<AppState>;

/// Central application state: configuration, the live-room registry, and the
/// storage collaborators. Owned by a single composition root and injected
/// everywhere else; there is no ambient global state.
pub struct AppState {
    config: AppConfig,
    registry: RoomRegistry,
    quiz_store: Arc<dyn QuizStore>,
    result_store: Arc<dyn ResultStore>,
}

impl AppState {
    /// Construct the shared state wrapped in an [`Arc`] so it can be cloned
    /// cheaply into actors and socket tasks.
    pub fn new(
        config: AppConfig,
        quiz_store: Arc<dyn QuizStore>,
        result_store: Arc<dyn ResultStore>,
    ) -> SharedState {
        let registry = RoomRegistry::new(config.rooms.code_length);
        Arc::new(Self {
            config,
            registry,
            quiz_store,
            result_store,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Live-room registry.
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Quiz catalogue handle.
    pub fn quiz_store(&self) -> Arc<dyn QuizStore> {
        self.quiz_store.clone()
    }

    /// Final-ranking sink handle.
    pub fn result_store(&self) -> Arc<dyn ResultStore> {
        self.result_store.clone()
    }
}
