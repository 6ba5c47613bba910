use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored representation of a quiz: an immutable ordered question list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizEntity {
    /// Primary key of the quiz.
    pub id: Uuid,
    /// Display title shown to players when a battle starts.
    pub title: String,
    /// Ordered questions; position in this list is the play order.
    pub questions: Vec<QuestionEntity>,
}

/// Stored representation of one question, correct answer included.
///
/// The correct answer never leaves the server unredacted; client-facing
/// projections go through `dto::battle::QuestionView`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionEntity {
    /// Primary key of the question.
    pub id: Uuid,
    /// Question prompt.
    pub text: String,
    /// Answer options, addressed by index in submissions.
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct_answer: usize,
    /// Base points awarded before the time factor is applied.
    pub points: u32,
}

/// Final ranking of a finished battle, persisted fire-and-forget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleResultEntity {
    /// Code of the room the battle ran in.
    pub room_code: String,
    /// Quiz the battle was played against.
    pub quiz_id: Uuid,
    /// Ranked entries, best first.
    pub rankings: Vec<RankedEntryEntity>,
}

/// One row of a persisted final ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedEntryEntity {
    /// 1-based position in the final ranking.
    pub rank: usize,
    /// Identifier of the ranked player.
    pub player_id: String,
    /// Display name at the time the battle finished.
    pub display_name: String,
    /// Final cumulative score.
    pub score: u32,
}
