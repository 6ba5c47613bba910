use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::QuizEntity,
    dto::{
        format_system_time,
        validation::{validate_display_name, validate_player_id},
    },
    state::room::{Player, Question, RankedPlayer, RoomStatus},
};

/// Payload used to open a brand-new battle room.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBattleRequest {
    /// Quiz the room will play.
    pub quiz_id: Uuid,
    /// Identifier of the creating player; admitted as host.
    pub host_id: String,
    /// Display name of the host.
    pub host_name: String,
}

impl Validate for CreateBattleRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_player_id(&self.host_id) {
            errors.add("host_id", e);
        }
        if let Err(e) = validate_display_name(&self.host_name) {
            errors.add("host_name", e);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Response returned once a battle room has been opened.
#[derive(Debug, Serialize, ToSchema)]
pub struct BattleCreated {
    /// Short code other players type to join.
    pub room_code: String,
    /// Metadata of the quiz the room will play.
    pub quiz: QuizMeta,
}

/// Client-safe quiz metadata (no answers).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuizMeta {
    /// Quiz identifier.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Number of questions in the quiz.
    pub total_questions: usize,
}

impl From<&QuizEntity> for QuizMeta {
    fn from(value: &QuizEntity) -> Self {
        Self {
            id: value.id,
            title: value.title.clone(),
            total_questions: value.questions.len(),
        }
    }
}

/// Public projection of a player exposed to room members.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerSummary {
    /// Player identifier.
    pub id: String,
    /// Name shown to other players.
    pub display_name: String,
    /// Whether the player currently holds the host role.
    pub is_host: bool,
    /// Transport liveness.
    pub connected: bool,
    /// Cumulative score.
    pub score: u32,
}

impl From<&Player> for PlayerSummary {
    fn from(value: &Player) -> Self {
        Self {
            id: value.id.clone(),
            display_name: value.display_name.clone(),
            is_host: value.is_host,
            connected: value.connected,
            score: value.score,
        }
    }
}

/// A question as broadcast to clients: the correct answer is stripped.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionView {
    /// Question identifier, echoed back in submissions.
    pub id: Uuid,
    /// Question prompt.
    pub text: String,
    /// Answer options, addressed by index.
    pub options: Vec<String>,
    /// Base points at stake.
    pub points: u32,
}

impl From<&Question> for QuestionView {
    fn from(value: &Question) -> Self {
        Self {
            id: value.id,
            text: value.text.clone(),
            options: value.options.clone(),
            points: value.points,
        }
    }
}

/// One row of a final ranking.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RankedResult {
    /// 1-based position, best first.
    pub rank: usize,
    /// Ranked player id.
    pub player_id: String,
    /// Display name at completion time.
    pub display_name: String,
    /// Final cumulative score.
    pub score: u32,
}

impl From<&RankedPlayer> for RankedResult {
    fn from(value: &RankedPlayer) -> Self {
        Self {
            rank: value.rank,
            player_id: value.player_id.clone(),
            display_name: value.display_name.clone(),
            score: value.score,
        }
    }
}

/// Read-only room snapshot served to REST clients (lobby screens, polling).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BattleSnapshot {
    /// Room code.
    pub room_code: String,
    /// Quiz being played.
    pub quiz_id: Uuid,
    /// Lifecycle state: "waiting", "active" or "completed".
    pub status: String,
    /// Current host, absent only for a room being torn down.
    pub host_id: Option<String>,
    /// Roster in join order.
    pub players: Vec<PlayerSummary>,
    /// 1-based number of the open question; absent unless active.
    pub question_number: Option<usize>,
    /// Size of the question snapshot; absent until the game starts.
    pub total_questions: Option<usize>,
    /// RFC3339 creation timestamp.
    pub created_at: String,
}

impl BattleSnapshot {
    /// Assemble a snapshot from room internals. Purely a projection; the
    /// caller is the room actor, which owns the state.
    pub fn project(
        code: &str,
        quiz_id: Uuid,
        status: RoomStatus,
        host_id: Option<&str>,
        players: Vec<PlayerSummary>,
        question_number: Option<usize>,
        total_questions: Option<usize>,
        created_at: SystemTime,
    ) -> Self {
        Self {
            room_code: code.to_string(),
            quiz_id,
            status: status.as_str().to_string(),
            host_id: host_id.map(str::to_string),
            players,
            question_number,
            total_questions,
            created_at: format_system_time(created_at),
        }
    }
}
