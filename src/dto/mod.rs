use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// REST payloads for battle creation and snapshots.
pub mod battle;
/// Health check payloads.
pub mod health;
/// Validation helpers for DTOs.
pub mod validation;
/// WebSocket message envelopes.
pub mod ws;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
