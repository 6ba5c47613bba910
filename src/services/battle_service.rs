//! Battle bootstrap and read-only room projections.

use tokio::sync::oneshot;
use tracing::info;
use validator::Validate;

use crate::{
    dto::battle::{BattleCreated, BattleSnapshot, CreateBattleRequest, QuizMeta},
    error::{AppError, GameError},
    services::room_actor::{self, RoomCommand},
    state::SharedState,
};

/// Open a new battle room for a quiz, admitting the creator as host.
///
/// The quiz catalogue is consulted up front so a dead quiz id fails the
/// creation request instead of surfacing later at game start.
pub async fn create_battle(
    state: &SharedState,
    request: CreateBattleRequest,
) -> Result<BattleCreated, AppError> {
    request.validate()?;

    let quiz = state
        .quiz_store()
        .find_quiz(request.quiz_id)
        .await?
        .ok_or(GameError::QuizNotFound(request.quiz_id))?;
    if quiz.questions.is_empty() {
        return Err(GameError::EmptyQuiz(quiz.id).into());
    }

    let handle = room_actor::spawn_room(state, quiz.id, request.host_id, request.host_name);
    info!(code = %handle.code, quiz = %quiz.id, "battle created");

    Ok(BattleCreated {
        room_code: handle.code,
        quiz: QuizMeta::from(&quiz),
    })
}

/// Read-only snapshot of a live room, served by its actor.
pub async fn battle_snapshot(state: &SharedState, code: &str) -> Result<BattleSnapshot, AppError> {
    let handle = state
        .registry()
        .find(code)
        .ok_or_else(|| GameError::RoomNotFound(code.to_string()))?;

    let (tx, rx) = oneshot::channel();
    handle
        .commands
        .send(RoomCommand::Snapshot { reply: tx })
        .await
        .map_err(|_| GameError::RoomClosed)?;
    let snapshot = rx.await.map_err(|_| GameError::RoomClosed)?;
    Ok(snapshot)
}
