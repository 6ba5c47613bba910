//! Per-room actor task.
//!
//! Every room owns a serial command queue processed by a single tokio task,
//! so all transitions against one room are linearized: concurrent answer
//! submissions can never race the completeness check, and the per-question
//! deadline is a `select!` arm of the same loop rather than a separate timer
//! thread, which makes "deadline fired" and "last player answered" mutually
//! exclusive settlement triggers. Different rooms run on independent tasks.

use std::time::{Duration, SystemTime};

use tokio::{
    sync::{broadcast, mpsc, oneshot},
    time::{Instant, sleep, sleep_until},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::models::{BattleResultEntity, RankedEntryEntity},
    dto::{
        battle::{BattleSnapshot, PlayerSummary, QuestionView, QuizMeta},
        ws::ServerMessage,
    },
    error::GameError,
    state::{
        SharedState,
        registry::RoomHandle,
        room::{JoinOutcome, RankedPlayer, Room, RoomStatus, SettleReason, Settlement},
    },
};

/// Commands dispatched into a room's serial queue.
#[derive(Debug)]
pub enum RoomCommand {
    /// Admit a player, or refresh liveness for a known one.
    Join {
        /// Identifier of the joining player.
        player_id: String,
        /// Name shown to other players.
        display_name: String,
        /// Private response channel.
        reply: oneshot::Sender<Result<JoinReply, GameError>>,
    },
    /// Host-only: snapshot the quiz and open the first question.
    Start {
        /// Player requesting the start.
        requester_id: String,
        /// Private response channel.
        reply: oneshot::Sender<Result<(), GameError>>,
    },
    /// Record a player's single answer for the open question.
    SubmitAnswer {
        /// Submitting player.
        player_id: String,
        /// Question being answered.
        question_id: Uuid,
        /// Chosen option index.
        answer: usize,
        /// Client-reported time between delivery and submission.
        time_spent: Duration,
        /// Private response channel.
        reply: oneshot::Sender<Result<AnswerReply, GameError>>,
    },
    /// Remove a player immediately (explicit leave, no grace).
    Leave {
        /// Departing player.
        player_id: String,
    },
    /// Reconnect support: read-only projection of the open question.
    CurrentQuestion {
        /// Requesting player.
        player_id: String,
        /// Private response channel.
        reply: oneshot::Sender<Result<CurrentQuestionReply, GameError>>,
    },
    /// Read-only room snapshot for REST clients.
    Snapshot {
        /// Private response channel.
        reply: oneshot::Sender<BattleSnapshot>,
    },
    /// Transport-level disconnect; starts the leave grace window.
    Disconnected {
        /// Player whose transport dropped.
        player_id: String,
    },
    /// Fired after the grace window; converts a still-absent player into a
    /// leave. A no-op if the player reconnected in the meantime.
    DisconnectExpired {
        /// Player whose grace window elapsed.
        player_id: String,
    },
}

/// Fan-out events published on a room's broadcast channel.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    /// Deliver to every subscribed session.
    Broadcast(ServerMessage),
    /// Deliver to every subscribed session except the named player's.
    BroadcastExcept {
        /// Player whose session should skip the message.
        exclude: String,
        /// Payload to deliver.
        message: ServerMessage,
    },
}

/// Successful join response.
#[derive(Debug, Clone)]
pub struct JoinReply {
    /// Room lifecycle state at join time.
    pub status: String,
    /// Roster in join order.
    pub players: Vec<PlayerSummary>,
    /// Whether this was an idempotent re-join.
    pub rejoined: bool,
}

/// Private feedback for an accepted submission.
#[derive(Debug, Clone)]
pub struct AnswerReply {
    /// Whether the chosen option was correct.
    pub is_correct: bool,
    /// Points awarded by the scoring policy.
    pub points_earned: u32,
    /// Index of the correct option.
    pub correct_answer: usize,
    /// Submitter's cumulative score.
    pub total_score: u32,
}

/// Reply to a current-question request.
#[derive(Debug, Clone)]
pub struct CurrentQuestionReply {
    /// Open question, correct answer stripped.
    pub question: QuestionView,
    /// 1-based question number.
    pub question_number: usize,
    /// Total number of questions.
    pub total_questions: usize,
}

const COMMAND_QUEUE_CAPACITY: usize = 64;
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Reserve a code, create the room with its host admitted, and spawn the
/// actor task that owns it.
pub fn spawn_room(
    state: &SharedState,
    quiz_id: Uuid,
    host_id: String,
    host_name: String,
) -> RoomHandle {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
    let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

    let handle = state.registry().register(command_tx.clone(), event_tx.clone());
    let room = Room::new(handle.code.clone(), quiz_id, host_id, host_name);

    let actor = RoomActor {
        state: state.clone(),
        room,
        question_limit: Duration::ZERO,
        deadline: None,
        expires_at: Instant::now() + state.config().rooms.waiting_ttl,
        created_at: SystemTime::now(),
        commands: command_rx,
        self_tx: command_tx,
        events: event_tx,
    };
    tokio::spawn(actor.run());

    handle
}

enum Flow {
    Continue,
    Stop,
}

struct RoomActor {
    state: SharedState,
    room: Room,
    question_limit: Duration,
    deadline: Option<Instant>,
    expires_at: Instant,
    created_at: SystemTime,
    commands: mpsc::Receiver<RoomCommand>,
    self_tx: mpsc::Sender<RoomCommand>,
    events: broadcast::Sender<RoomEvent>,
}

impl RoomActor {
    async fn run(mut self) {
        info!(code = %self.room.code(), quiz = %self.room.quiz_id(), "room task started");

        loop {
            let expires_at = self.expires_at;
            let deadline_armed = self.deadline.is_some();
            let question_deadline = self.deadline.unwrap_or(expires_at);

            tokio::select! {
                maybe_command = self.commands.recv() => match maybe_command {
                    Some(command) => {
                        if matches!(self.handle_command(command).await, Flow::Stop) {
                            break;
                        }
                    }
                    None => break,
                },
                () = sleep_until(question_deadline), if deadline_armed => {
                    self.settle_current(SettleReason::DeadlineElapsed);
                }
                () = sleep_until(expires_at) => {
                    info!(
                        code = %self.room.code(),
                        status = ?self.room.status(),
                        "room expired; reclaiming"
                    );
                    break;
                }
            }
        }

        self.state.registry().remove(self.room.code());
        info!(code = %self.room.code(), "room task ended");
    }

    async fn handle_command(&mut self, command: RoomCommand) -> Flow {
        match command {
            RoomCommand::Join {
                player_id,
                display_name,
                reply,
            } => {
                let result = self.handle_join(&player_id, &display_name);
                let _ = reply.send(result);
                Flow::Continue
            }
            RoomCommand::Start {
                requester_id,
                reply,
            } => {
                let result = self.handle_start(&requester_id).await;
                let fatal = matches!(result, Err(GameError::RoomClosed));
                let _ = reply.send(result);
                if fatal { Flow::Stop } else { Flow::Continue }
            }
            RoomCommand::SubmitAnswer {
                player_id,
                question_id,
                answer,
                time_spent,
                reply,
            } => {
                let result = self.handle_submit(&player_id, question_id, answer, time_spent);
                let _ = reply.send(result);
                if self.room.status() == RoomStatus::Active && self.room.all_answered() {
                    self.settle_current(SettleReason::AllAnswered);
                }
                Flow::Continue
            }
            RoomCommand::Leave { player_id } => self.remove_player(&player_id, "left"),
            RoomCommand::CurrentQuestion { player_id, reply } => {
                let _ = reply.send(self.handle_current_question(&player_id));
                Flow::Continue
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
                Flow::Continue
            }
            RoomCommand::Disconnected { player_id } => {
                if self.room.mark_disconnected(&player_id).is_ok() {
                    debug!(
                        code = %self.room.code(),
                        player = %player_id,
                        "transport lost; starting grace window"
                    );
                    let tx = self.self_tx.clone();
                    let grace = self.state.config().rooms.disconnect_grace;
                    tokio::spawn(async move {
                        sleep(grace).await;
                        let _ = tx.send(RoomCommand::DisconnectExpired { player_id }).await;
                    });
                }
                Flow::Continue
            }
            RoomCommand::DisconnectExpired { player_id } => {
                if self.room.is_disconnected(&player_id) {
                    self.remove_player(&player_id, "disconnect grace elapsed")
                } else {
                    Flow::Continue
                }
            }
        }
    }

    fn handle_join(
        &mut self,
        player_id: &str,
        display_name: &str,
    ) -> Result<JoinReply, GameError> {
        let outcome = self.room.join(player_id, display_name)?;
        let rejoined = outcome == JoinOutcome::Rejoined;

        match outcome {
            JoinOutcome::Joined => {
                info!(
                    code = %self.room.code(),
                    player = %player_id,
                    "player joined"
                );
                if let Some(player) = self.room.players().find(|p| p.id == player_id) {
                    self.broadcast_except(
                        player_id,
                        ServerMessage::PlayerJoined {
                            player: player.into(),
                        },
                    );
                }
            }
            JoinOutcome::Rejoined => {
                debug!(
                    code = %self.room.code(),
                    player = %player_id,
                    "player re-joined"
                );
            }
        }

        Ok(JoinReply {
            status: self.room.status().as_str().to_string(),
            players: self.player_summaries(),
            rejoined,
        })
    }

    async fn handle_start(&mut self, requester_id: &str) -> Result<(), GameError> {
        self.room.ensure_can_start(requester_id)?;

        let quiz_id = self.room.quiz_id();
        let quiz = match self.state.quiz_store().find_quiz(quiz_id).await {
            Ok(Some(quiz)) => quiz,
            Ok(None) => return Err(GameError::QuizNotFound(quiz_id)),
            Err(err) => {
                warn!(
                    code = %self.room.code(),
                    error = %err,
                    "quiz store unavailable at start; aborting room"
                );
                return Err(GameError::RoomClosed);
            }
        };

        let questions = quiz.questions.iter().cloned().map(Into::into).collect();
        let limit = self
            .state
            .config()
            .rooms
            .time_limit
            .question_limit(quiz.questions.len());

        self.room.start(requester_id, questions)?;
        self.question_limit = limit;
        self.deadline = Some(Instant::now() + limit);
        self.expires_at = Instant::now() + self.state.config().rooms.active_ttl;

        let meta = QuizMeta::from(&quiz);
        let Some(question) = self.room.current_question() else {
            return Err(GameError::EmptyQuiz(quiz_id));
        };
        let total_questions = self.room.question_count();

        info!(
            code = %self.room.code(),
            quiz = %quiz_id,
            questions = total_questions,
            limit_ms = limit.as_millis(),
            "game started"
        );

        self.broadcast(ServerMessage::GameStarted {
            quiz: meta,
            question: question.into(),
            question_number: 1,
            total_questions,
            time_limit_ms: limit.as_millis() as u64,
        });
        Ok(())
    }

    fn handle_submit(
        &mut self,
        player_id: &str,
        question_id: Uuid,
        answer: usize,
        time_spent: Duration,
    ) -> Result<AnswerReply, GameError> {
        let policy = self.state.config().rooms.scoring_policy;
        let record = self.room.submit_answer(
            player_id,
            question_id,
            answer,
            time_spent,
            policy,
            self.question_limit,
        )?;

        let correct_answer = self
            .room
            .current_question()
            .map(|q| q.correct_answer)
            .unwrap_or_default();
        let total_score = self
            .room
            .players()
            .find(|p| p.id == player_id)
            .map(|p| p.score)
            .unwrap_or(record.points);

        self.broadcast(ServerMessage::ScoreUpdate {
            players: self.player_summaries(),
            answered: self.room.answered_count(),
            total: self.room.player_count(),
        });

        Ok(AnswerReply {
            is_correct: record.is_correct,
            points_earned: record.points,
            correct_answer,
            total_score,
        })
    }

    fn handle_current_question(
        &self,
        player_id: &str,
    ) -> Result<CurrentQuestionReply, GameError> {
        if !self.room.players().any(|p| p.id == player_id) {
            return Err(GameError::UnknownPlayer(player_id.to_string()));
        }
        let question = self
            .room
            .current_question()
            .ok_or(GameError::GameNotStarted)?;

        Ok(CurrentQuestionReply {
            question: question.into(),
            question_number: self.room.current_index() + 1,
            total_questions: self.room.question_count(),
        })
    }

    /// Close the open question and broadcast the outcome. Clearing the
    /// deadline first guarantees a question settles at most once even when
    /// the timer and the last answer arrive back-to-back.
    fn settle_current(&mut self, reason: SettleReason) {
        self.deadline = None;
        let Ok(settled) = self.room.settle(reason, self.question_limit) else {
            return;
        };

        debug!(
            code = %self.room.code(),
            question = %settled.question_id,
            reason = ?settled.reason,
            "question settled"
        );

        self.broadcast(ServerMessage::QuestionResult {
            question_id: settled.question_id,
            correct_answer: settled.correct_answer,
            results: settled.results.into_iter().map(Into::into).collect(),
        });

        match settled.outcome {
            Settlement::Advanced { next_index } => {
                self.deadline = Some(Instant::now() + self.question_limit);
                let total_questions = self.room.question_count();
                let Some(question) = self.room.current_question() else {
                    return;
                };
                self.broadcast(ServerMessage::NextQuestion {
                    question: question.into(),
                    question_number: next_index + 1,
                    total_questions,
                    time_limit_ms: self.question_limit.as_millis() as u64,
                });
            }
            Settlement::Completed { ranking } => {
                info!(code = %self.room.code(), "battle completed");
                self.broadcast(ServerMessage::GameCompleted {
                    ranking: ranking.iter().map(Into::into).collect(),
                });
                self.persist_results(ranking);
                self.expires_at = Instant::now() + self.state.config().rooms.completed_retention;
            }
        }
    }

    /// Remove a player and run the follow-up rules: host failover broadcast,
    /// empty-room teardown, and a completeness re-check for the open question.
    fn remove_player(&mut self, player_id: &str, cause: &str) -> Flow {
        let Ok(outcome) = self.room.leave(player_id) else {
            return Flow::Continue;
        };

        info!(
            code = %self.room.code(),
            player = %player_id,
            cause,
            "player removed"
        );
        self.broadcast(ServerMessage::PlayerLeft {
            player_id: player_id.to_string(),
        });
        if let Some(host_id) = outcome.new_host {
            info!(code = %self.room.code(), host = %host_id, "host reassigned");
            self.broadcast(ServerMessage::HostChanged { host_id });
        }

        if outcome.is_empty {
            info!(code = %self.room.code(), "room empty; closing");
            return Flow::Stop;
        }

        if self.room.status() == RoomStatus::Active && self.room.all_answered() {
            self.settle_current(SettleReason::AllAnswered);
        }
        Flow::Continue
    }

    fn persist_results(&self, ranking: Vec<RankedPlayer>) {
        let entity = BattleResultEntity {
            room_code: self.room.code().to_string(),
            quiz_id: self.room.quiz_id(),
            rankings: ranking
                .into_iter()
                .map(|entry| RankedEntryEntity {
                    rank: entry.rank,
                    player_id: entry.player_id,
                    display_name: entry.display_name,
                    score: entry.score,
                })
                .collect(),
        };

        // Fire-and-forget: settlement never blocks on persistence.
        let store = self.state.result_store();
        let code = entity.room_code.clone();
        tokio::spawn(async move {
            if let Err(err) = store.save_results(entity).await {
                warn!(code = %code, error = %err, "failed to persist final rankings");
            }
        });
    }

    fn snapshot(&self) -> BattleSnapshot {
        let (question_number, total_questions) = match self.room.status() {
            RoomStatus::Waiting => (None, None),
            RoomStatus::Active => (
                Some(self.room.current_index() + 1),
                Some(self.room.question_count()),
            ),
            RoomStatus::Completed => (None, Some(self.room.question_count())),
        };

        BattleSnapshot::project(
            self.room.code(),
            self.room.quiz_id(),
            self.room.status(),
            self.room.host_id(),
            self.player_summaries(),
            question_number,
            total_questions,
            self.created_at,
        )
    }

    fn player_summaries(&self) -> Vec<PlayerSummary> {
        self.room.players().map(Into::into).collect()
    }

    fn broadcast(&self, message: ServerMessage) {
        let _ = self.events.send(RoomEvent::Broadcast(message));
    }

    fn broadcast_except(&self, exclude: &str, message: ServerMessage) {
        let _ = self.events.send(RoomEvent::BroadcastExcept {
            exclude: exclude.to_string(),
            message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::{
        config::AppConfig,
        dao::{
            models::{QuestionEntity, QuizEntity},
            quiz_store::memory::InMemoryQuizStore,
            results::InMemoryResultStore,
        },
        state::{AppState, scoring::ScoringPolicy},
    };

    const RECV_TIMEOUT: Duration = Duration::from_secs(60);

    struct Harness {
        state: SharedState,
        results: Arc<InMemoryResultStore>,
        quiz_id: Uuid,
    }

    fn harness(question_count: usize) -> Harness {
        let quiz_store = InMemoryQuizStore::new();
        let quiz_id = Uuid::new_v4();
        quiz_store.insert(QuizEntity {
            id: quiz_id,
            title: "general knowledge".into(),
            questions: (0..question_count)
                .map(|index| QuestionEntity {
                    id: Uuid::new_v4(),
                    text: format!("question {index}"),
                    options: vec!["a".into(), "b".into(), "c".into()],
                    correct_answer: 0,
                    points: 100,
                })
                .collect(),
        });

        let results = InMemoryResultStore::new();
        let mut config = AppConfig::default();
        config.rooms.scoring_policy = ScoringPolicy::FullDecay;

        let state = AppState::new(config, quiz_store, results.clone());
        Harness {
            state,
            results,
            quiz_id,
        }
    }

    async fn join(
        handle: &RoomHandle,
        player_id: &str,
        display_name: &str,
    ) -> Result<JoinReply, GameError> {
        let (tx, rx) = oneshot::channel();
        handle
            .commands
            .send(RoomCommand::Join {
                player_id: player_id.into(),
                display_name: display_name.into(),
                reply: tx,
            })
            .await
            .expect("room alive");
        rx.await.expect("reply")
    }

    async fn start(handle: &RoomHandle, requester_id: &str) -> Result<(), GameError> {
        let (tx, rx) = oneshot::channel();
        handle
            .commands
            .send(RoomCommand::Start {
                requester_id: requester_id.into(),
                reply: tx,
            })
            .await
            .expect("room alive");
        rx.await.expect("reply")
    }

    async fn submit(
        handle: &RoomHandle,
        player_id: &str,
        question_id: Uuid,
        answer: usize,
        time_spent: Duration,
    ) -> Result<AnswerReply, GameError> {
        let (tx, rx) = oneshot::channel();
        handle
            .commands
            .send(RoomCommand::SubmitAnswer {
                player_id: player_id.into(),
                question_id,
                answer,
                time_spent,
                reply: tx,
            })
            .await
            .expect("room alive");
        rx.await.expect("reply")
    }

    async fn snapshot(handle: &RoomHandle) -> BattleSnapshot {
        let (tx, rx) = oneshot::channel();
        handle
            .commands
            .send(RoomCommand::Snapshot { reply: tx })
            .await
            .expect("room alive");
        rx.await.expect("reply")
    }

    /// Pull broadcast payloads until one matches, failing on channel close.
    async fn wait_for<F>(rx: &mut broadcast::Receiver<RoomEvent>, mut matches: F) -> ServerMessage
    where
        F: FnMut(&ServerMessage) -> bool,
    {
        let deadline = tokio::time::timeout(RECV_TIMEOUT, async {
            loop {
                match rx.recv().await {
                    Ok(RoomEvent::Broadcast(message))
                    | Ok(RoomEvent::BroadcastExcept { message, .. }) => {
                        if matches(&message) {
                            return message;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => panic!("room channel closed"),
                }
            }
        });
        deadline.await.expect("expected event before timeout")
    }

    fn question_of(message: &ServerMessage) -> QuestionView {
        match message {
            ServerMessage::GameStarted { question, .. }
            | ServerMessage::NextQuestion { question, .. } => question.clone(),
            other => panic!("expected a question-bearing message, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn happy_path_produces_speed_ordered_ranking() {
        let h = harness(3);
        let handle = spawn_room(&h.state, h.quiz_id, "alice".into(), "Alice".into());
        let mut events = handle.events.subscribe();

        join(&handle, "alice", "Alice").await.unwrap();
        join(&handle, "bob", "Bob").await.unwrap();
        start(&handle, "alice").await.unwrap();

        let started =
            wait_for(&mut events, |m| matches!(m, ServerMessage::GameStarted { .. })).await;
        let mut question = question_of(&started);

        for round in 0..3 {
            let fast = submit(&handle, "alice", question.id, 0, Duration::from_secs(2))
                .await
                .unwrap();
            let slow = submit(&handle, "bob", question.id, 0, Duration::from_secs(8))
                .await
                .unwrap();
            assert!(fast.is_correct && slow.is_correct);
            assert!(fast.points_earned > slow.points_earned, "round {round}");

            let settled = wait_for(&mut events, |m| {
                matches!(
                    m,
                    ServerMessage::NextQuestion { .. } | ServerMessage::GameCompleted { .. }
                )
            })
            .await;
            if let ServerMessage::NextQuestion { .. } = &settled {
                question = question_of(&settled);
            } else if let ServerMessage::GameCompleted { ranking } = &settled {
                assert_eq!(ranking[0].player_id, "alice");
                assert_eq!(ranking[0].rank, 1);
                assert_eq!(ranking[1].player_id, "bob");
                assert!(ranking[0].score > ranking[1].score);
            }
        }

        let snap = snapshot(&handle).await;
        assert_eq!(snap.status, "completed");

        // Persistence is fire-and-forget; give the spawned task a turn.
        tokio::time::sleep(Duration::from_millis(1)).await;
        let stored = h.results.find(&handle.code).expect("rankings persisted");
        assert_eq!(stored.rankings[0].player_id, "alice");
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_settles_unanswered_players_with_zero_points() {
        let h = harness(2);
        let handle = spawn_room(&h.state, h.quiz_id, "alice".into(), "Alice".into());
        let mut events = handle.events.subscribe();

        join(&handle, "alice", "Alice").await.unwrap();
        join(&handle, "bob", "Bob").await.unwrap();
        start(&handle, "alice").await.unwrap();

        let started =
            wait_for(&mut events, |m| matches!(m, ServerMessage::GameStarted { .. })).await;
        let question = question_of(&started);

        submit(&handle, "alice", question.id, 0, Duration::from_secs(2))
            .await
            .unwrap();

        // Only the deadline can settle now.
        let reveal = wait_for(&mut events, |m| {
            matches!(m, ServerMessage::QuestionResult { .. })
        })
        .await;
        let ServerMessage::QuestionResult { results, .. } = reveal else {
            unreachable!();
        };
        let bob_row = results.iter().find(|r| r.player_id == "bob").unwrap();
        assert_eq!(bob_row.answer, None);
        assert!(!bob_row.is_correct);
        assert_eq!(bob_row.points, 0);

        // The game still advances to the next question.
        wait_for(&mut events, |m| matches!(m, ServerMessage::NextQuestion { .. })).await;
    }

    #[tokio::test(start_paused = true)]
    async fn late_submission_after_settlement_is_rejected() {
        let h = harness(2);
        let handle = spawn_room(&h.state, h.quiz_id, "alice".into(), "Alice".into());
        let mut events = handle.events.subscribe();

        join(&handle, "alice", "Alice").await.unwrap();
        start(&handle, "alice").await.unwrap();

        let started =
            wait_for(&mut events, |m| matches!(m, ServerMessage::GameStarted { .. })).await;
        let first = question_of(&started);

        submit(&handle, "alice", first.id, 0, Duration::from_secs(1))
            .await
            .unwrap();
        wait_for(&mut events, |m| matches!(m, ServerMessage::NextQuestion { .. })).await;

        let err = submit(&handle, "alice", first.id, 1, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err, GameError::QuestionClosed(first.id));

        let snap = snapshot(&handle).await;
        let alice = &snap.players[0];
        assert_eq!(alice.score, 95, "late answer must not change the score");
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_submission_is_rejected() {
        let h = harness(2);
        let handle = spawn_room(&h.state, h.quiz_id, "alice".into(), "Alice".into());
        let mut events = handle.events.subscribe();

        join(&handle, "alice", "Alice").await.unwrap();
        join(&handle, "bob", "Bob").await.unwrap();
        start(&handle, "alice").await.unwrap();

        let started =
            wait_for(&mut events, |m| matches!(m, ServerMessage::GameStarted { .. })).await;
        let question = question_of(&started);

        submit(&handle, "alice", question.id, 0, Duration::from_secs(1))
            .await
            .unwrap();
        let err = submit(&handle, "alice", question.id, 1, Duration::from_secs(2))
            .await
            .unwrap_err();
        assert_eq!(err, GameError::AlreadyAnswered);
    }

    #[tokio::test(start_paused = true)]
    async fn non_host_cannot_start() {
        let h = harness(1);
        let handle = spawn_room(&h.state, h.quiz_id, "alice".into(), "Alice".into());

        join(&handle, "bob", "Bob").await.unwrap();
        assert_eq!(start(&handle, "bob").await, Err(GameError::NotAuthorized));
        assert_eq!(
            start(&handle, "nobody").await,
            Err(GameError::UnknownPlayer("nobody".into()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn host_leave_fails_over_to_earliest_joined() {
        let h = harness(1);
        let handle = spawn_room(&h.state, h.quiz_id, "p1".into(), "One".into());
        let mut events = handle.events.subscribe();

        join(&handle, "p2", "Two").await.unwrap();
        join(&handle, "p3", "Three").await.unwrap();

        handle
            .commands
            .send(RoomCommand::Leave {
                player_id: "p1".into(),
            })
            .await
            .unwrap();

        let changed =
            wait_for(&mut events, |m| matches!(m, ServerMessage::HostChanged { .. })).await;
        let ServerMessage::HostChanged { host_id } = changed else {
            unreachable!();
        };
        assert_eq!(host_id, "p2");

        // The new host can start; the departed one cannot.
        assert!(start(&handle, "p2").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_grace_converts_to_leave() {
        let h = harness(1);
        let handle = spawn_room(&h.state, h.quiz_id, "alice".into(), "Alice".into());
        let mut events = handle.events.subscribe();

        join(&handle, "alice", "Alice").await.unwrap();
        join(&handle, "bob", "Bob").await.unwrap();

        handle
            .commands
            .send(RoomCommand::Disconnected {
                player_id: "bob".into(),
            })
            .await
            .unwrap();

        let left = wait_for(&mut events, |m| matches!(m, ServerMessage::PlayerLeft { .. })).await;
        let ServerMessage::PlayerLeft { player_id } = left else {
            unreachable!();
        };
        assert_eq!(player_id, "bob");

        let snap = snapshot(&handle).await;
        assert_eq!(snap.players.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rejoin_within_grace_cancels_the_leave() {
        let h = harness(1);
        let handle = spawn_room(&h.state, h.quiz_id, "alice".into(), "Alice".into());

        join(&handle, "alice", "Alice").await.unwrap();
        join(&handle, "bob", "Bob").await.unwrap();

        handle
            .commands
            .send(RoomCommand::Disconnected {
                player_id: "bob".into(),
            })
            .await
            .unwrap();

        let reply = join(&handle, "bob", "Bob").await.unwrap();
        assert!(reply.rejoined);

        // Let the grace timer fire; bob must survive it.
        tokio::time::sleep(h.state.config().rooms.disconnect_grace * 2).await;
        let snap = snapshot(&handle).await;
        assert_eq!(snap.players.len(), 2);
        assert!(snap.players.iter().any(|p| p.id == "bob" && p.connected));
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_projection_does_not_mutate_state() {
        let h = harness(2);
        let handle = spawn_room(&h.state, h.quiz_id, "alice".into(), "Alice".into());
        let mut events = handle.events.subscribe();

        join(&handle, "alice", "Alice").await.unwrap();
        join(&handle, "bob", "Bob").await.unwrap();
        start(&handle, "alice").await.unwrap();

        let started =
            wait_for(&mut events, |m| matches!(m, ServerMessage::GameStarted { .. })).await;
        let question = question_of(&started);

        submit(&handle, "alice", question.id, 0, Duration::from_secs(1))
            .await
            .unwrap();
        let before = snapshot(&handle).await;

        let (tx, rx) = oneshot::channel();
        handle
            .commands
            .send(RoomCommand::CurrentQuestion {
                player_id: "bob".into(),
                reply: tx,
            })
            .await
            .unwrap();
        let current = rx.await.unwrap().unwrap();
        assert_eq!(current.question.id, question.id);
        assert_eq!(current.question_number, 1);
        assert_eq!(current.total_questions, 2);

        let after = snapshot(&handle).await;
        assert_eq!(before.question_number, after.question_number);
        assert_eq!(
            before.players.iter().map(|p| p.score).collect::<Vec<_>>(),
            after.players.iter().map(|p| p.score).collect::<Vec<_>>()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_waiting_room_is_reclaimed() {
        let h = harness(1);
        let handle = spawn_room(&h.state, h.quiz_id, "alice".into(), "Alice".into());
        assert!(h.state.registry().find(&handle.code).is_some());

        tokio::time::sleep(h.state.config().rooms.waiting_ttl * 2).await;
        assert!(h.state.registry().find(&handle.code).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn settlement_happens_exactly_once_per_question() {
        let h = harness(2);
        let handle = spawn_room(&h.state, h.quiz_id, "alice".into(), "Alice".into());
        let mut events = handle.events.subscribe();

        join(&handle, "alice", "Alice").await.unwrap();
        start(&handle, "alice").await.unwrap();

        let started =
            wait_for(&mut events, |m| matches!(m, ServerMessage::GameStarted { .. })).await;
        let first = question_of(&started);

        // Settle the first question by completeness.
        submit(&handle, "alice", first.id, 0, Duration::from_secs(1))
            .await
            .unwrap();
        wait_for(&mut events, |m| matches!(m, ServerMessage::NextQuestion { .. })).await;
        let snap = snapshot(&handle).await;
        assert_eq!(snap.question_number, Some(2));

        // Cross the instant the first question's deadline was armed for. Only
        // the second question may settle (by timeout); a reveal for the first
        // one would mean the completeness and deadline triggers both fired.
        tokio::time::sleep(Duration::from_secs(25)).await;
        loop {
            match events.try_recv() {
                Ok(RoomEvent::Broadcast(ServerMessage::QuestionResult {
                    question_id, ..
                })) => {
                    assert_ne!(question_id, first.id, "question settled twice");
                }
                Ok(_) => continue,
                Err(_) => break,
            }
        }
    }
}
