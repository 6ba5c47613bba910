/// Battle bootstrap and read-only snapshots.
pub mod battle_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Per-room actor: serialized transitions and question settlement.
pub mod room_actor;
/// WebSocket connection and message handling service.
pub mod websocket_service;
