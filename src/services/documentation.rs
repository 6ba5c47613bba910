use utoipa::OpenApi;

/// Aggregated OpenAPI specification for the quiz battle backend.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::battle::create_battle,
        crate::routes::battle::battle_snapshot,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::battle::CreateBattleRequest,
            crate::dto::battle::BattleCreated,
            crate::dto::battle::BattleSnapshot,
            crate::dto::battle::QuizMeta,
            crate::dto::battle::PlayerSummary,
            crate::dto::battle::QuestionView,
            crate::dto::battle::RankedResult,
            crate::dto::ws::ClientMessage,
            crate::dto::ws::ServerMessage,
            crate::dto::ws::PlayerQuestionResult,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "battle", description = "Battle room bootstrap and snapshots"),
        (name = "session", description = "WebSocket operations for battle sessions"),
    )
)]
pub struct ApiDoc;
