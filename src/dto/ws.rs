use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::battle::{PlayerSummary, QuestionView, QuizMeta, RankedResult},
    state::room::PlayerResult,
};

/// Messages accepted from battle WebSocket clients.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Enter (or re-enter) a room. Must be the first frame on a connection;
    /// repeated joins for a known player are absorbed, never duplicated.
    Join {
        /// Code of the room to enter, case-insensitive.
        room_code: String,
        /// Identifier unique per connection/session, assigned externally.
        player_id: String,
        /// Name shown to other players.
        display_name: String,
    },
    /// Host-only: load the quiz and begin the first question.
    StartGame,
    /// Submit the player's single answer for the current question.
    SubmitAnswer {
        /// Question being answered; must match the open question.
        question_id: Uuid,
        /// Chosen option index.
        answer: usize,
        /// Client-measured time between delivery and submission.
        time_spent_ms: u64,
    },
    /// Leave the room for good, skipping the disconnect grace window.
    Leave,
    /// Reconnect support: ask for the in-flight question without mutating
    /// any room state.
    RequestCurrentQuestion,
    /// Fallback for unrecognized message types.
    #[serde(other)]
    Unknown,
}

/// Messages pushed to battle WebSocket clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Private acknowledgement of a successful join or re-join.
    Joined {
        /// Normalized room code.
        room_code: String,
        /// Room lifecycle state.
        status: String,
        /// Roster in join order.
        players: Vec<PlayerSummary>,
    },
    /// A new player entered the room.
    PlayerJoined {
        /// The new roster entry.
        player: PlayerSummary,
    },
    /// A player left the room.
    PlayerLeft {
        /// Identifier of the departed player.
        player_id: String,
    },
    /// The host role moved to another player.
    HostChanged {
        /// Identifier of the new host.
        host_id: String,
    },
    /// The game started; first question attached.
    GameStarted {
        /// Quiz metadata.
        quiz: QuizMeta,
        /// First question, correct answer stripped.
        question: QuestionView,
        /// 1-based question number.
        question_number: usize,
        /// Total number of questions.
        total_questions: usize,
        /// Answer window for this question in milliseconds.
        time_limit_ms: u64,
    },
    /// Private feedback for an accepted submission.
    AnswerResult {
        /// Whether the chosen option was correct.
        is_correct: bool,
        /// Points awarded by the scoring policy.
        points_earned: u32,
        /// Index of the correct option.
        correct_answer: usize,
        /// Submitter's cumulative score.
        total_score: u32,
    },
    /// Roster-wide score refresh after every accepted answer.
    ScoreUpdate {
        /// Roster in join order with current scores.
        players: Vec<PlayerSummary>,
        /// Players that answered the open question so far.
        answered: usize,
        /// Players expected to answer.
        total: usize,
    },
    /// Settlement reveal: the closed question's answer and per-player results.
    QuestionResult {
        /// The question that was closed.
        question_id: Uuid,
        /// Index of the correct option.
        correct_answer: usize,
        /// Per-player results in join order.
        results: Vec<PlayerQuestionResult>,
    },
    /// The next question opened for answers.
    NextQuestion {
        /// Question, correct answer stripped.
        question: QuestionView,
        /// 1-based question number.
        question_number: usize,
        /// Total number of questions.
        total_questions: usize,
        /// Answer window for this question in milliseconds.
        time_limit_ms: u64,
    },
    /// The last question settled; final ranking attached.
    GameCompleted {
        /// Deterministic final ranking, best first.
        ranking: Vec<RankedResult>,
    },
    /// Private reply to a current-question request after a reconnect.
    CurrentQuestion {
        /// Question, correct answer stripped.
        question: QuestionView,
        /// 1-based question number.
        question_number: usize,
        /// Total number of questions.
        total_questions: usize,
    },
    /// Error notification delivered to the offending client only.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

/// Per-player reveal row inside [`ServerMessage::QuestionResult`].
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerQuestionResult {
    /// Player the row belongs to.
    pub player_id: String,
    /// Chosen option index; `null` on timeout.
    pub answer: Option<usize>,
    /// Correctness of the submission.
    pub is_correct: bool,
    /// Points earned on this question.
    pub points: u32,
    /// Cumulative score after this question.
    pub score: u32,
}

impl From<PlayerResult> for PlayerQuestionResult {
    fn from(value: PlayerResult) -> Self {
        Self {
            player_id: value.player_id,
            answer: value.answer,
            is_correct: value.is_correct,
            points: value.points,
            score: value.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_message_round_trips_through_its_tag() {
        let json = r#"{"type":"join","room_code":"AB23CD","player_id":"p1","display_name":"Ada"}"#;
        let parsed: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(parsed, ClientMessage::Join { ref room_code, .. } if room_code == "AB23CD"));
    }

    #[test]
    fn unknown_message_types_fall_back_to_unknown() {
        let parsed: ClientMessage = serde_json::from_str(r#"{"type":"dance"}"#).unwrap();
        assert!(matches!(parsed, ClientMessage::Unknown));
    }

    #[test]
    fn server_error_serializes_with_snake_case_tag() {
        let message = ServerMessage::Error {
            message: "room `zzzzzz` not found".into(),
        };
        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains(r#""type":"error""#), "{json}");
    }
}
