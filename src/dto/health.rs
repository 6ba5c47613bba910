use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of currently live rooms.
    pub live_rooms: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(live_rooms: usize) -> Self {
        Self {
            status: "ok".to_string(),
            live_rooms,
        }
    }

    /// Create a health response indicating the quiz catalogue is unreachable.
    pub fn degraded(live_rooms: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            live_rooms,
        }
    }
}
