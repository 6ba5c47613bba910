use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::battle::{BattleCreated, BattleSnapshot, CreateBattleRequest},
    error::AppError,
    services::battle_service,
    state::SharedState,
};

/// Routes handling battle bootstrap and read-only snapshots.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/battles", post(create_battle))
        .route("/battles/{code}", get(battle_snapshot))
}

/// Open a new battle room and return its join code.
#[utoipa::path(
    post,
    path = "/battles",
    tag = "battle",
    request_body = CreateBattleRequest,
    responses(
        (status = 200, description = "Battle room created", body = BattleCreated),
        (status = 404, description = "Quiz not found"),
        (status = 409, description = "Quiz has no questions")
    )
)]
pub async fn create_battle(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateBattleRequest>>,
) -> Result<Json<BattleCreated>, AppError> {
    let created = battle_service::create_battle(&state, payload).await?;
    Ok(Json(created))
}

/// Fetch a read-only snapshot of a live room.
#[utoipa::path(
    get,
    path = "/battles/{code}",
    tag = "battle",
    params(("code" = String, Path, description = "Room code to look up")),
    responses(
        (status = 200, description = "Room snapshot", body = BattleSnapshot),
        (status = 404, description = "Room not found")
    )
)]
pub async fn battle_snapshot(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<BattleSnapshot>, AppError> {
    let snapshot = battle_service::battle_snapshot(&state, &code).await?;
    Ok(Json(snapshot))
}
