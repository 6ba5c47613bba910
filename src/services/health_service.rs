use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with a health payload, probing the quiz catalogue.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let live_rooms = state.registry().len();

    match state.quiz_store().health_check().await {
        Ok(()) => HealthResponse::ok(live_rooms),
        Err(err) => {
            warn!(error = %err, "quiz store health check failed");
            HealthResponse::degraded(live_rooms)
        }
    }
}
