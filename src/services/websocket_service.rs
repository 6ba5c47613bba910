//! WebSocket session gateway.
//!
//! Translates the external event surface (join, start, submit-answer, leave,
//! request-current-question) into room commands and fans room events back out
//! to the connected client. Taxonomy errors are serialized to the offending
//! client only; transport losses are reported as `Disconnected` so the room
//! can apply its grace window instead of dropping the player instantly.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    dto::{
        validation::{validate_display_name, validate_player_id},
        ws::{ClientMessage, ServerMessage},
    },
    error::GameError,
    services::room_actor::{RoomCommand, RoomEvent},
    state::{
        SharedState,
        registry::{RoomHandle, normalize_code},
    },
};

/// How long a fresh connection gets to identify itself with a `join` frame.
const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Internal error type for gateway send operations.
#[derive(Debug, Error)]
enum GatewayError {
    /// Writer channel closed - the session should be terminated.
    #[error("connection closed")]
    ConnectionClosed,
}

enum SessionFlow {
    Continue,
    Left,
}

/// Handle the full lifecycle of one battle WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we
    // await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let initial_message = match tokio::time::timeout(JOIN_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(error = %err, "websocket receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!("websocket join timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let ClientMessage::Join {
        room_code,
        player_id,
        display_name,
    } = parse_client_message(&initial_message)
    else {
        warn!("first frame was not a join");
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    };

    if validate_player_id(&player_id).is_err() || validate_display_name(&display_name).is_err() {
        let _ = send_error(&outbound_tx, "invalid player id or display name");
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    }

    let code = normalize_code(&room_code);
    let Some(handle) = state.registry().find(&code) else {
        let _ = send_error(&outbound_tx, &GameError::RoomNotFound(code).to_string());
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    };

    // Subscribe before joining so the session cannot miss events raced in
    // between its own admission and the first frame it forwards.
    let mut events = handle.events.subscribe();

    match request(&handle, |reply| RoomCommand::Join {
        player_id: player_id.clone(),
        display_name,
        reply,
    })
    .await
    {
        Ok(reply) => {
            info!(code = %code, player = %player_id, "player session established");
            let _ = send_message(
                &outbound_tx,
                &ServerMessage::Joined {
                    room_code: code.clone(),
                    status: reply.status,
                    players: reply.players,
                },
            );
        }
        Err(err) => {
            let _ = send_error(&outbound_tx, &err.to_string());
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    }

    let mut left_explicitly = false;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if forward_event(&outbound_tx, &player_id, event).is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(code = %code, player = %player_id, skipped, "session lagged behind room events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!(code = %code, player = %player_id, "room closed; ending session");
                    break;
                }
            },
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let flow = handle_frame(&handle, &code, &player_id, &text, &outbound_tx).await;
                    if matches!(flow, SessionFlow::Left) {
                        left_explicitly = true;
                        break;
                    }
                }
                Some(Ok(Message::Ping(payload))) => {
                    let _ = outbound_tx.send(Message::Pong(payload));
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(code = %code, player = %player_id, "client closed");
                    let _ = outbound_tx.send(Message::Close(frame));
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(code = %code, player = %player_id, error = %err, "websocket error");
                    break;
                }
                None => break,
            }
        }
    }

    if !left_explicitly {
        // Not an error: the room keeps the player through the grace window in
        // case this is a brief network blip.
        let _ = handle
            .commands
            .send(RoomCommand::Disconnected {
                player_id: player_id.clone(),
            })
            .await;
    }

    info!(code = %code, player = %player_id, "player session ended");
    finalize(writer_task, outbound_tx).await;
}

/// Dispatch one inbound frame to the room, replying to this client only.
async fn handle_frame(
    handle: &RoomHandle,
    code: &str,
    player_id: &str,
    text: &str,
    outbound_tx: &mpsc::UnboundedSender<Message>,
) -> SessionFlow {
    match parse_client_message(text) {
        ClientMessage::Join {
            room_code,
            player_id: joining_id,
            display_name,
        } => {
            // Duplicate joins for the bound player are absorbed as re-joins;
            // anything else is a protocol misuse by this client.
            if normalize_code(&room_code) != code || joining_id != player_id {
                let _ = send_error(outbound_tx, "session is already bound to a room");
                return SessionFlow::Continue;
            }
            match request(handle, |reply| RoomCommand::Join {
                player_id: player_id.to_string(),
                display_name,
                reply,
            })
            .await
            {
                Ok(reply) => {
                    let _ = send_message(
                        outbound_tx,
                        &ServerMessage::Joined {
                            room_code: code.to_string(),
                            status: reply.status,
                            players: reply.players,
                        },
                    );
                }
                Err(err) => {
                    let _ = send_error(outbound_tx, &err.to_string());
                }
            }
            SessionFlow::Continue
        }
        ClientMessage::StartGame => {
            if let Err(err) = request(handle, |reply| RoomCommand::Start {
                requester_id: player_id.to_string(),
                reply,
            })
            .await
            {
                let _ = send_error(outbound_tx, &err.to_string());
            }
            SessionFlow::Continue
        }
        ClientMessage::SubmitAnswer {
            question_id,
            answer,
            time_spent_ms,
        } => {
            let result = request(handle, |reply| RoomCommand::SubmitAnswer {
                player_id: player_id.to_string(),
                question_id,
                answer,
                time_spent: Duration::from_millis(time_spent_ms),
                reply,
            })
            .await;
            match result {
                Ok(feedback) => {
                    let _ = send_message(
                        outbound_tx,
                        &ServerMessage::AnswerResult {
                            is_correct: feedback.is_correct,
                            points_earned: feedback.points_earned,
                            correct_answer: feedback.correct_answer,
                            total_score: feedback.total_score,
                        },
                    );
                }
                Err(err) => {
                    let _ = send_error(outbound_tx, &err.to_string());
                }
            }
            SessionFlow::Continue
        }
        ClientMessage::Leave => {
            let _ = handle
                .commands
                .send(RoomCommand::Leave {
                    player_id: player_id.to_string(),
                })
                .await;
            SessionFlow::Left
        }
        ClientMessage::RequestCurrentQuestion => {
            let result = request(handle, |reply| RoomCommand::CurrentQuestion {
                player_id: player_id.to_string(),
                reply,
            })
            .await;
            match result {
                Ok(current) => {
                    let _ = send_message(
                        outbound_tx,
                        &ServerMessage::CurrentQuestion {
                            question: current.question,
                            question_number: current.question_number,
                            total_questions: current.total_questions,
                        },
                    );
                }
                Err(err) => {
                    let _ = send_error(outbound_tx, &err.to_string());
                }
            }
            SessionFlow::Continue
        }
        ClientMessage::Unknown => {
            debug!(code = %code, player = %player_id, "ignoring unknown message type");
            SessionFlow::Continue
        }
    }
}

/// Send a command carrying a oneshot reply channel and await the answer.
async fn request<T>(
    handle: &RoomHandle,
    make_command: impl FnOnce(oneshot::Sender<Result<T, GameError>>) -> RoomCommand,
) -> Result<T, GameError> {
    let (tx, rx) = oneshot::channel();
    handle
        .commands
        .send(make_command(tx))
        .await
        .map_err(|_| GameError::RoomClosed)?;
    rx.await.map_err(|_| GameError::RoomClosed)?
}

/// Forward a room event to this session, honoring exclusions.
fn forward_event(
    outbound_tx: &mpsc::UnboundedSender<Message>,
    player_id: &str,
    event: RoomEvent,
) -> Result<(), GatewayError> {
    match event {
        RoomEvent::Broadcast(message) => send_message(outbound_tx, &message),
        RoomEvent::BroadcastExcept { exclude, message } if exclude != player_id => {
            send_message(outbound_tx, &message)
        }
        RoomEvent::BroadcastExcept { .. } => Ok(()),
    }
}

fn send_error(
    outbound_tx: &mpsc::UnboundedSender<Message>,
    message: &str,
) -> Result<(), GatewayError> {
    send_message(
        outbound_tx,
        &ServerMessage::Error {
            message: message.to_string(),
        },
    )
}

/// Serialize a payload and push it onto the session's writer queue.
///
/// Serialization failures are permanent (a bug in our own types), so they are
/// logged and swallowed; a closed writer is transient and reported so the
/// caller can terminate the session.
fn send_message<T>(
    tx: &mpsc::UnboundedSender<Message>,
    value: &T,
) -> Result<(), GatewayError>
where
    T: ?Sized + serde::Serialize + std::fmt::Debug,
{
    let payload = match serde_json::to_string(value) {
        Ok(p) => p,
        Err(err) => {
            warn!(error = %err, "failed to serialize message `{value:?}`");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into()))
        .map_err(|_| GatewayError::ConnectionClosed)
}

fn parse_client_message(text: &str) -> ClientMessage {
    match serde_json::from_str(text) {
        Ok(message) => message,
        Err(err) => {
            debug!(error = %err, "failed to parse client message");
            ClientMessage::Unknown
        }
    }
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
