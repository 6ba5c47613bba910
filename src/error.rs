use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::dao::storage::StorageError;

/// Domain errors produced by room transitions and battle operations.
///
/// Every variant is recovered at the gateway boundary and turned into a
/// notification for the offending client only; none of them corrupts room
/// state or propagates to other players.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// No live room is registered under the given code.
    #[error("room `{0}` not found")]
    RoomNotFound(String),
    /// A genuinely new player tried to enter after the game started.
    #[error("game already started; new players cannot join")]
    JoinRejected,
    /// The acting player is not on the room's roster.
    #[error("player `{0}` is not in the room")]
    UnknownPlayer(String),
    /// A host-only action was attempted by a non-host player.
    #[error("only the host can perform this action")]
    NotAuthorized,
    /// The quiz referenced by the room does not exist.
    #[error("quiz `{0}` not found")]
    QuizNotFound(Uuid),
    /// The quiz exists but has no questions to play.
    #[error("quiz `{0}` has no questions")]
    EmptyQuiz(Uuid),
    /// The player already submitted an answer for the current question.
    #[error("answer already recorded for this question")]
    AlreadyAnswered,
    /// The submission targets a question that is no longer open.
    #[error("question `{0}` is no longer accepting answers")]
    QuestionClosed(Uuid),
    /// The operation requires a running game.
    #[error("game has not started")]
    GameNotStarted,
    /// The operation requires a room still in the waiting state.
    #[error("game already started")]
    AlreadyStarted,
    /// The room task shut down while the request was in flight.
    #[error("room is no longer available")]
    RoomClosed,
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<GameError> for AppError {
    fn from(err: GameError) -> Self {
        match &err {
            GameError::RoomNotFound(_)
            | GameError::QuizNotFound(_)
            | GameError::UnknownPlayer(_) => AppError::NotFound(err.to_string()),
            GameError::NotAuthorized => AppError::Unauthorized(err.to_string()),
            GameError::JoinRejected
            | GameError::EmptyQuiz(_)
            | GameError::AlreadyAnswered
            | GameError::QuestionClosed(_)
            | GameError::GameNotStarted
            | GameError::AlreadyStarted => AppError::Conflict(err.to_string()),
            GameError::RoomClosed => AppError::ServiceUnavailable(err.to_string()),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::ServiceUnavailable(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
