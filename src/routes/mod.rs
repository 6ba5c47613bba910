use axum::Router;

use crate::state::SharedState;

/// Battle bootstrap routes.
pub mod battle;
/// Swagger UI routes.
pub mod docs;
/// Health check routes.
pub mod health;
/// WebSocket session routes.
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(websocket::router())
        .merge(battle::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
