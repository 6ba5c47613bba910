//! Pure state machine for one quiz-battle room.
//!
//! A [`Room`] owns every piece of per-battle mutable state: the join-ordered
//! player roster, the host assignment, the question snapshot and the answer
//! cursor. It performs no I/O and never reads a clock; the per-room actor owns
//! time (deadlines, grace windows, expiry) and feeds elapsed durations in.

use std::time::Duration;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    dao::models::QuestionEntity,
    error::GameError,
    state::scoring::ScoringPolicy,
};

/// Lifecycle of a room. Transitions are monotonic: `Waiting → Active →
/// Completed`, never backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    /// Players are gathering; the host may start the game.
    Waiting,
    /// Questions are being played in lock-step.
    Active,
    /// Final ranking computed; roster and scores are frozen.
    Completed,
}

impl RoomStatus {
    /// Wire representation used in DTOs.
    pub fn as_str(self) -> &'static str {
        match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Active => "active",
            RoomStatus::Completed => "completed",
        }
    }
}

/// One question of the immutable snapshot taken at game start.
#[derive(Debug, Clone)]
pub struct Question {
    /// Stable identifier, echoed back in submissions.
    pub id: Uuid,
    /// Question prompt.
    pub text: String,
    /// Answer options, addressed by index.
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct_answer: usize,
    /// Base points before the time factor.
    pub points: u32,
}

impl From<QuestionEntity> for Question {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            text: value.text,
            options: value.options,
            correct_answer: value.correct_answer,
            points: value.points,
        }
    }
}

/// A single recorded submission, or the zero-point back-fill written when a
/// question settles with the player never having answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    /// Question this record belongs to.
    pub question_id: Uuid,
    /// Chosen option index; `None` when the player timed out.
    pub answer: Option<usize>,
    /// Whether the chosen option was correct.
    pub is_correct: bool,
    /// Points awarded by the scoring policy.
    pub points: u32,
    /// Reported time between question delivery and submission.
    pub time_spent: Duration,
}

/// Per-room player entry, owned exclusively by its room.
#[derive(Debug, Clone)]
pub struct Player {
    /// Identifier unique per connection/session, assigned externally.
    pub id: String,
    /// Name shown to other players.
    pub display_name: String,
    /// Whether this player currently holds the host role.
    pub is_host: bool,
    /// Transport liveness; flipped by the gateway, never by clients.
    pub connected: bool,
    /// Cumulative score. Only ever incremented by accepted submissions.
    pub score: u32,
    /// One entry per settled-or-answered question, in question order.
    pub answers: Vec<AnswerRecord>,
}

impl Player {
    fn new(id: String, display_name: String, is_host: bool) -> Self {
        Self {
            id,
            display_name,
            is_host,
            connected: false,
            score: 0,
            answers: Vec::new(),
        }
    }

    /// Whether this player has an answer entry for the given question.
    pub fn has_answered(&self, question_id: Uuid) -> bool {
        self.answers.iter().any(|a| a.question_id == question_id)
    }
}

/// Outcome of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// A brand-new player entered the roster.
    Joined,
    /// The player was already known; liveness refreshed, nothing else touched.
    Rejoined,
}

/// Outcome of removing a player.
#[derive(Debug, Clone)]
pub struct LeaveOutcome {
    /// The removed entry.
    pub removed: Player,
    /// New host id if the host role moved.
    pub new_host: Option<String>,
    /// Whether the roster is now empty (room eligible for removal).
    pub is_empty: bool,
}

/// Why a question settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleReason {
    /// Every player on the roster had answered.
    AllAnswered,
    /// The per-question deadline elapsed.
    DeadlineElapsed,
}

/// Per-player reveal data produced at settlement, in join order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerResult {
    /// Player the row belongs to.
    pub player_id: String,
    /// Chosen option index, `None` on timeout.
    pub answer: Option<usize>,
    /// Correctness of the submission.
    pub is_correct: bool,
    /// Points earned on this question.
    pub points: u32,
    /// Cumulative score after this question.
    pub score: u32,
}

/// What a settlement transitioned the room into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// Cursor advanced to the next question.
    Advanced {
        /// New value of the question cursor.
        next_index: usize,
    },
    /// Last question settled; the room is completed.
    Completed {
        /// Final deterministic ranking, best first.
        ranking: Vec<RankedPlayer>,
    },
}

/// One row of the final ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedPlayer {
    /// 1-based position; ties keep distinct positions in join order.
    pub rank: usize,
    /// Ranked player id.
    pub player_id: String,
    /// Display name at completion time.
    pub display_name: String,
    /// Final cumulative score.
    pub score: u32,
}

/// Everything a settlement reveals about the question it closed.
#[derive(Debug, Clone)]
pub struct SettledQuestion {
    /// The question that was closed.
    pub question_id: Uuid,
    /// Index of the correct option, now safe to reveal.
    pub correct_answer: usize,
    /// What triggered the settlement.
    pub reason: SettleReason,
    /// Per-player reveal rows.
    pub results: Vec<PlayerResult>,
    /// Where the room went next.
    pub outcome: Settlement,
}

/// State of one quiz-battle session.
#[derive(Debug)]
pub struct Room {
    code: String,
    quiz_id: Uuid,
    host_id: Option<String>,
    players: IndexMap<String, Player>,
    status: RoomStatus,
    questions: Vec<Question>,
    current_question: usize,
}

impl Room {
    /// Create a room in the waiting state with its host admitted as the first
    /// player.
    pub fn new(code: String, quiz_id: Uuid, host_id: String, host_name: String) -> Self {
        let mut players = IndexMap::new();
        players.insert(
            host_id.clone(),
            Player::new(host_id.clone(), host_name, true),
        );

        Self {
            code,
            quiz_id,
            host_id: Some(host_id),
            players,
            status: RoomStatus::Waiting,
            questions: Vec::new(),
            current_question: 0,
        }
    }

    /// Short human-typed room code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Quiz this room plays.
    pub fn quiz_id(&self) -> Uuid {
        self.quiz_id
    }

    /// Current lifecycle state.
    pub fn status(&self) -> RoomStatus {
        self.status
    }

    /// Current host, `None` only when the roster is empty.
    pub fn host_id(&self) -> Option<&str> {
        self.host_id.as_deref()
    }

    /// Roster in join order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Number of players on the roster.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// 0-based cursor into the question snapshot; meaningful only while active.
    pub fn current_index(&self) -> usize {
        self.current_question
    }

    /// Size of the question snapshot; zero until the game starts.
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// The question currently open for answers.
    pub fn current_question(&self) -> Option<&Question> {
        match self.status {
            RoomStatus::Active => self.questions.get(self.current_question),
            _ => None,
        }
    }

    /// Admit a player, or refresh liveness for one already on the roster.
    ///
    /// Re-joining is idempotent regardless of room state: it never duplicates
    /// the entry, resets the score, or changes the stored name. Genuinely new
    /// players are only admitted while the room is waiting.
    pub fn join(&mut self, player_id: &str, display_name: &str) -> Result<JoinOutcome, GameError> {
        if let Some(player) = self.players.get_mut(player_id) {
            player.connected = true;
            return Ok(JoinOutcome::Rejoined);
        }

        if self.status != RoomStatus::Waiting {
            return Err(GameError::JoinRejected);
        }

        let is_host = self.players.is_empty();
        let mut player = Player::new(player_id.to_string(), display_name.to_string(), is_host);
        player.connected = true;
        if is_host {
            self.host_id = Some(player_id.to_string());
        }
        self.players.insert(player_id.to_string(), player);

        Ok(JoinOutcome::Joined)
    }

    /// Mark a player's transport as lost without removing them.
    pub fn mark_disconnected(&mut self, player_id: &str) -> Result<(), GameError> {
        let player = self
            .players
            .get_mut(player_id)
            .ok_or_else(|| GameError::UnknownPlayer(player_id.to_string()))?;
        player.connected = false;
        Ok(())
    }

    /// Whether the player is on the roster but currently disconnected.
    pub fn is_disconnected(&self, player_id: &str) -> bool {
        self.players
            .get(player_id)
            .is_some_and(|player| !player.connected)
    }

    /// Remove a player, reassigning the host role to the earliest-joined
    /// remaining player when the host leaves.
    pub fn leave(&mut self, player_id: &str) -> Result<LeaveOutcome, GameError> {
        let removed = self
            .players
            .shift_remove(player_id)
            .ok_or_else(|| GameError::UnknownPlayer(player_id.to_string()))?;

        let mut new_host = None;
        if removed.is_host {
            self.host_id = None;
            if let Some((id, player)) = self.players.first_mut() {
                player.is_host = true;
                self.host_id = Some(id.clone());
                new_host = Some(id.clone());
            }
        }

        Ok(LeaveOutcome {
            removed,
            new_host,
            is_empty: self.players.is_empty(),
        })
    }

    /// Host-only check used before the quiz snapshot is fetched, so non-hosts
    /// never trigger a store read.
    pub fn ensure_can_start(&self, requester_id: &str) -> Result<(), GameError> {
        if self.status != RoomStatus::Waiting {
            return Err(GameError::AlreadyStarted);
        }
        if !self.players.contains_key(requester_id) {
            return Err(GameError::UnknownPlayer(requester_id.to_string()));
        }
        if self.host_id.as_deref() != Some(requester_id) {
            return Err(GameError::NotAuthorized);
        }
        Ok(())
    }

    /// Begin the game with an immutable question snapshot.
    pub fn start(
        &mut self,
        requester_id: &str,
        questions: Vec<Question>,
    ) -> Result<(), GameError> {
        self.ensure_can_start(requester_id)?;
        if questions.is_empty() {
            return Err(GameError::EmptyQuiz(self.quiz_id));
        }

        self.questions = questions;
        self.current_question = 0;
        self.status = RoomStatus::Active;
        Ok(())
    }

    /// Record a player's single answer for the currently open question.
    pub fn submit_answer(
        &mut self,
        player_id: &str,
        question_id: Uuid,
        answer: usize,
        time_spent: Duration,
        policy: ScoringPolicy,
        time_limit: Duration,
    ) -> Result<AnswerRecord, GameError> {
        match self.status {
            RoomStatus::Waiting => return Err(GameError::GameNotStarted),
            RoomStatus::Completed => return Err(GameError::QuestionClosed(question_id)),
            RoomStatus::Active => {}
        }

        let question = self.questions[self.current_question].clone();
        if question.id != question_id {
            return Err(GameError::QuestionClosed(question_id));
        }

        let player = self
            .players
            .get_mut(player_id)
            .ok_or_else(|| GameError::UnknownPlayer(player_id.to_string()))?;
        if player.has_answered(question_id) {
            return Err(GameError::AlreadyAnswered);
        }

        let is_correct = answer == question.correct_answer;
        let points = policy.score(is_correct, question.points, time_spent, time_limit);
        let record = AnswerRecord {
            question_id,
            answer: Some(answer),
            is_correct,
            points,
            time_spent,
        };

        player.answers.push(record.clone());
        player.score += points;
        Ok(record)
    }

    /// Whether every player on the roster has an answer entry for the open
    /// question. Players who left no longer count; disconnected players still
    /// do until their grace expires and they are removed.
    pub fn all_answered(&self) -> bool {
        let Some(question) = self.current_question() else {
            return false;
        };
        self.players
            .values()
            .all(|player| player.has_answered(question.id))
    }

    /// Number of players that have answered the open question so far.
    pub fn answered_count(&self) -> usize {
        match self.current_question() {
            Some(question) => self
                .players
                .values()
                .filter(|player| player.has_answered(question.id))
                .count(),
            None => 0,
        }
    }

    /// Close the open question: back-fill zero-point records for players who
    /// never answered, reveal per-player results, and either advance the
    /// cursor or complete the room.
    pub fn settle(
        &mut self,
        reason: SettleReason,
        time_limit: Duration,
    ) -> Result<SettledQuestion, GameError> {
        let question = self
            .current_question()
            .cloned()
            .ok_or(GameError::GameNotStarted)?;

        // Timed-out players still get an answer entry so per-question
        // bookkeeping stays consistent.
        for player in self.players.values_mut() {
            if !player.has_answered(question.id) {
                player.answers.push(AnswerRecord {
                    question_id: question.id,
                    answer: None,
                    is_correct: false,
                    points: 0,
                    time_spent: time_limit,
                });
            }
        }

        let results = self
            .players
            .values()
            .map(|player| {
                let record = player
                    .answers
                    .iter()
                    .find(|a| a.question_id == question.id)
                    .cloned()
                    .unwrap_or(AnswerRecord {
                        question_id: question.id,
                        answer: None,
                        is_correct: false,
                        points: 0,
                        time_spent: time_limit,
                    });
                PlayerResult {
                    player_id: player.id.clone(),
                    answer: record.answer,
                    is_correct: record.is_correct,
                    points: record.points,
                    score: player.score,
                }
            })
            .collect();

        let outcome = if self.current_question + 1 < self.questions.len() {
            self.current_question += 1;
            Settlement::Advanced {
                next_index: self.current_question,
            }
        } else {
            self.status = RoomStatus::Completed;
            Settlement::Completed {
                ranking: self.ranking(),
            }
        };

        Ok(SettledQuestion {
            question_id: question.id,
            correct_answer: question.correct_answer,
            reason,
            results,
            outcome,
        })
    }

    /// Final ranking: score descending, ties resolved by original join order.
    /// The sort is stable over the join-ordered roster, which makes the
    /// tie-break deterministic.
    pub fn ranking(&self) -> Vec<RankedPlayer> {
        let mut entries: Vec<&Player> = self.players.values().collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries
            .into_iter()
            .enumerate()
            .map(|(index, player)| RankedPlayer {
                rank: index + 1,
                player_id: player.id.clone(),
                display_name: player.display_name.clone(),
                score: player.score,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const POLICY: ScoringPolicy = ScoringPolicy::FullDecay;
    const LIMIT: Duration = Duration::from_secs(20);

    fn sample_questions(count: usize) -> Vec<Question> {
        (0..count)
            .map(|index| Question {
                id: Uuid::new_v4(),
                text: format!("question {index}"),
                options: vec!["a".into(), "b".into(), "c".into()],
                correct_answer: index % 3,
                points: 100,
            })
            .collect()
    }

    fn active_room(question_count: usize) -> Room {
        let mut room = Room::new("abc123".into(), Uuid::new_v4(), "p1".into(), "Ada".into());
        room.join("p2", "Grace").unwrap();
        room.start("p1", sample_questions(question_count)).unwrap();
        room
    }

    fn submit(room: &mut Room, player: &str, correct: bool, secs: u64) -> AnswerRecord {
        let question = room.current_question().unwrap().clone();
        let answer = if correct {
            question.correct_answer
        } else {
            (question.correct_answer + 1) % question.options.len()
        };
        room.submit_answer(
            player,
            question.id,
            answer,
            Duration::from_secs(secs),
            POLICY,
            LIMIT,
        )
        .unwrap()
    }

    #[test]
    fn creator_is_admitted_as_host() {
        let room = Room::new("abc123".into(), Uuid::new_v4(), "p1".into(), "Ada".into());
        assert_eq!(room.host_id(), Some("p1"));
        assert_eq!(room.player_count(), 1);
        assert!(room.players().next().unwrap().is_host);
    }

    #[test]
    fn join_preserves_insertion_order() {
        let mut room = Room::new("abc123".into(), Uuid::new_v4(), "p1".into(), "Ada".into());
        room.join("p2", "Grace").unwrap();
        room.join("p3", "Edsger").unwrap();

        let ids: Vec<&str> = room.players().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn rejoin_is_idempotent() {
        let mut room = active_room(2);
        submit(&mut room, "p1", true, 2);
        let score_before = room.players().next().unwrap().score;

        let outcome = room.join("p1", "Someone Else").unwrap();
        assert_eq!(outcome, JoinOutcome::Rejoined);
        assert_eq!(room.player_count(), 2);

        let p1 = room.players().next().unwrap();
        assert_eq!(p1.score, score_before);
        assert_eq!(p1.display_name, "Ada");
    }

    #[test]
    fn new_player_rejected_once_active() {
        let mut room = active_room(2);
        assert_eq!(room.join("p9", "Late"), Err(GameError::JoinRejected));
        assert_eq!(room.player_count(), 2);
    }

    #[test]
    fn only_host_may_start() {
        let mut room = Room::new("abc123".into(), Uuid::new_v4(), "p1".into(), "Ada".into());
        room.join("p2", "Grace").unwrap();

        assert_eq!(
            room.start("p2", sample_questions(1)),
            Err(GameError::NotAuthorized)
        );
        assert_eq!(
            room.start("p9", sample_questions(1)),
            Err(GameError::UnknownPlayer("p9".into()))
        );
        assert!(room.start("p1", sample_questions(1)).is_ok());
        assert_eq!(room.status(), RoomStatus::Active);
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut room = active_room(1);
        assert_eq!(
            room.start("p1", sample_questions(1)),
            Err(GameError::AlreadyStarted)
        );
    }

    #[test]
    fn start_rejects_empty_snapshot() {
        let mut room = Room::new("abc123".into(), Uuid::new_v4(), "p1".into(), "Ada".into());
        let quiz_id = room.quiz_id();
        assert_eq!(room.start("p1", vec![]), Err(GameError::EmptyQuiz(quiz_id)));
        assert_eq!(room.status(), RoomStatus::Waiting);
    }

    #[test]
    fn answers_accumulate_score() {
        let mut room = active_room(3);
        let first = submit(&mut room, "p1", true, 2);
        assert!(first.is_correct);
        assert!(first.points > 0);

        room.settle(SettleReason::DeadlineElapsed, LIMIT).unwrap();
        let second = submit(&mut room, "p1", true, 2);

        let p1 = room.players().next().unwrap();
        assert_eq!(p1.score, first.points + second.points);
    }

    #[test]
    fn duplicate_answer_is_rejected_and_score_unchanged() {
        let mut room = active_room(2);
        let question = room.current_question().unwrap().clone();
        submit(&mut room, "p1", true, 2);
        let score = room.players().next().unwrap().score;

        let err = room.submit_answer("p1", question.id, 0, Duration::ZERO, POLICY, LIMIT);
        assert_eq!(err, Err(GameError::AlreadyAnswered));
        assert_eq!(room.players().next().unwrap().score, score);
    }

    #[test]
    fn stale_question_id_is_rejected() {
        let mut room = active_room(2);
        let stale = room.current_question().unwrap().clone();
        submit(&mut room, "p1", true, 2);
        submit(&mut room, "p2", true, 3);
        room.settle(SettleReason::AllAnswered, LIMIT).unwrap();

        let err = room.submit_answer("p1", stale.id, 0, Duration::ZERO, POLICY, LIMIT);
        assert_eq!(err, Err(GameError::QuestionClosed(stale.id)));
    }

    #[test]
    fn submitting_before_start_is_rejected() {
        let mut room = Room::new("abc123".into(), Uuid::new_v4(), "p1".into(), "Ada".into());
        let err = room.submit_answer("p1", Uuid::new_v4(), 0, Duration::ZERO, POLICY, LIMIT);
        assert_eq!(err, Err(GameError::GameNotStarted));
    }

    #[test]
    fn all_answered_tracks_roster() {
        let mut room = active_room(1);
        assert!(!room.all_answered());
        submit(&mut room, "p1", true, 2);
        assert!(!room.all_answered());
        submit(&mut room, "p2", false, 3);
        assert!(room.all_answered());
    }

    #[test]
    fn leaving_mid_question_unblocks_completeness() {
        let mut room = active_room(1);
        submit(&mut room, "p1", true, 2);
        assert!(!room.all_answered());
        room.leave("p2").unwrap();
        assert!(room.all_answered());
    }

    #[test]
    fn settle_backfills_timeouts_with_zero_points() {
        let mut room = active_room(2);
        let question = room.current_question().unwrap().clone();
        submit(&mut room, "p1", true, 2);

        let settled = room.settle(SettleReason::DeadlineElapsed, LIMIT).unwrap();
        assert_eq!(settled.question_id, question.id);

        let p2_row = settled
            .results
            .iter()
            .find(|r| r.player_id == "p2")
            .unwrap();
        assert_eq!(p2_row.answer, None);
        assert!(!p2_row.is_correct);
        assert_eq!(p2_row.points, 0);

        // The back-fill is a real answer entry, so the next question still
        // sees a clean slate.
        let p2 = room.players().find(|p| p.id == "p2").unwrap();
        assert_eq!(p2.answers.len(), 1);
        assert!(matches!(settled.outcome, Settlement::Advanced { next_index: 1 }));
    }

    #[test]
    fn settling_the_last_question_completes_the_room() {
        let mut room = active_room(1);
        submit(&mut room, "p1", true, 2);
        submit(&mut room, "p2", true, 8);

        let settled = room.settle(SettleReason::AllAnswered, LIMIT).unwrap();
        assert_eq!(room.status(), RoomStatus::Completed);

        let Settlement::Completed { ranking } = settled.outcome else {
            panic!("expected completion");
        };
        assert_eq!(ranking[0].player_id, "p1");
        assert_eq!(ranking[0].rank, 1);
        assert_eq!(ranking[1].player_id, "p2");
        assert_eq!(ranking[1].rank, 2);
    }

    #[test]
    fn faster_player_ranks_first() {
        let mut room = active_room(1);
        let fast = submit(&mut room, "p2", true, 1);
        let slow = submit(&mut room, "p1", true, 15);
        assert!(fast.points > slow.points);

        let settled = room.settle(SettleReason::AllAnswered, LIMIT).unwrap();
        let Settlement::Completed { ranking } = settled.outcome else {
            panic!("expected completion");
        };
        assert_eq!(ranking[0].player_id, "p2");
    }

    #[test]
    fn ranking_ties_resolve_by_join_order() {
        let mut room = Room::new("abc123".into(), Uuid::new_v4(), "p1".into(), "Ada".into());
        room.join("p2", "Grace").unwrap();
        room.join("p3", "Edsger").unwrap();

        let ranking = room.ranking();
        assert_eq!(
            ranking.iter().map(|r| r.player_id.as_str()).collect::<Vec<_>>(),
            vec!["p1", "p2", "p3"]
        );
    }

    #[test]
    fn completed_room_rejects_further_mutation() {
        let mut room = active_room(1);
        submit(&mut room, "p1", true, 2);
        submit(&mut room, "p2", true, 3);
        let settled = room.settle(SettleReason::AllAnswered, LIMIT).unwrap();

        let err = room.submit_answer(
            "p1",
            settled.question_id,
            0,
            Duration::ZERO,
            POLICY,
            LIMIT,
        );
        assert_eq!(err, Err(GameError::QuestionClosed(settled.question_id)));
        assert_eq!(room.join("p9", "Late"), Err(GameError::JoinRejected));
    }

    #[test]
    fn host_failover_picks_earliest_joined() {
        let mut room = Room::new("abc123".into(), Uuid::new_v4(), "p1".into(), "Ada".into());
        room.join("p2", "Grace").unwrap();
        room.join("p3", "Edsger").unwrap();

        let outcome = room.leave("p1").unwrap();
        assert_eq!(outcome.new_host.as_deref(), Some("p2"));
        assert_eq!(room.host_id(), Some("p2"));

        let hosts: Vec<&str> = room
            .players()
            .filter(|p| p.is_host)
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(hosts, vec!["p2"]);

        // The departed host can no longer start the game.
        assert_eq!(
            room.ensure_can_start("p1"),
            Err(GameError::UnknownPlayer("p1".into()))
        );
        assert!(room.ensure_can_start("p2").is_ok());
    }

    #[test]
    fn non_host_leave_keeps_host() {
        let mut room = Room::new("abc123".into(), Uuid::new_v4(), "p1".into(), "Ada".into());
        room.join("p2", "Grace").unwrap();

        let outcome = room.leave("p2").unwrap();
        assert_eq!(outcome.new_host, None);
        assert_eq!(room.host_id(), Some("p1"));
    }

    #[test]
    fn last_leave_empties_the_room() {
        let mut room = Room::new("abc123".into(), Uuid::new_v4(), "p1".into(), "Ada".into());
        let outcome = room.leave("p1").unwrap();
        assert!(outcome.is_empty);
        assert_eq!(room.host_id(), None);
    }

    #[test]
    fn disconnect_keeps_player_on_roster() {
        let mut room = active_room(1);
        room.mark_disconnected("p2").unwrap();
        assert!(room.is_disconnected("p2"));
        assert_eq!(room.player_count(), 2);

        // Still blocks completeness until removed or settled by deadline.
        submit(&mut room, "p1", true, 2);
        assert!(!room.all_answered());
    }
}
