use super::state::AppState;
use crate::session::SessionEvent;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Messages a live client may send as text frames. Binary frames are raw
/// WAV chunks.
#[derive(Debug, Deserialize)]
#[serde(tag = "event")]
pub enum ClientMessage {
    /// Base64-encoded WAV chunk
    #[serde(rename = "audio chunk")]
    AudioChunk { data: String },

    #[serde(rename = "configure")]
    Configure { target: String },

    #[serde(rename = "end")]
    End,
}

/// GET /live
/// Upgrade to a WebSocket bound to a fresh live session
pub async fn live_socket(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_socket(socket, state))
}

async fn run_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let handle = match state.sessions.open().await {
        Ok(handle) => handle,
        Err(e) => {
            warn!("Refusing live connection: {}", e);
            let event = SessionEvent::Error {
                sequence: None,
                kind: e.kind(),
                error: e.to_string(),
            };
            if let Ok(json) = serde_json::to_string(&event) {
                let _ = sender.send(Message::Text(json)).await;
            }
            let _ = sender.close().await;
            return;
        }
    };

    let (input, mut events, task) = handle.into_parts();
    let session_id = input.session_id().to_string();
    info!("Live socket connected to session {}", session_id);

    // Session events -> socket. Ends after the closed event or a send failure.
    let mut outbound = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let closed = matches!(event, SessionEvent::Closed { .. });
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!("Dropping unserialisable event: {}", e),
            }
            if closed {
                break;
            }
        }
        let _ = sender.close().await;
    });

    // Socket -> session. Hands the input back so a graceful end can outlive
    // this task.
    let mut inbound = tokio::spawn(async move {
        let mut ended = false;
        while let Some(Ok(message)) = receiver.next().await {
            let sent = match message {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::AudioChunk { data }) => input.send_encoded_chunk(data).await,
                    Ok(ClientMessage::Configure { target }) => input.set_target(target).await,
                    Ok(ClientMessage::End) => {
                        ended = input.end().await.is_ok();
                        break;
                    }
                    Err(e) => input.reject(format!("Invalid message: {}", e)).await,
                },
                Message::Binary(data) => input.send_chunk(data).await,
                Message::Close(_) => break,
                Message::Ping(_) | Message::Pong(_) => Ok(()),
            };

            if sent.is_err() {
                break;
            }
        }
        (input, ended)
    });

    tokio::select! {
        _ = &mut outbound => {
            // Session closed on its own (idle timeout, failure)
            inbound.abort();
        }
        joined = &mut inbound => {
            match joined {
                Ok((input, true)) => {
                    // Graceful end: keep the input alive until the session
                    // has flushed its queue and said goodbye
                    let _ = (&mut outbound).await;
                    drop(input);
                }
                Ok((input, false)) => {
                    drop(input);
                    let _ = (&mut outbound).await;
                }
                Err(e) => {
                    warn!("Live socket reader for {} failed: {}", session_id, e);
                    let _ = (&mut outbound).await;
                }
            }
        }
    }

    match task.await {
        Ok(stats) => debug!(
            "Live socket for {} finished: {:?}, {} chunks",
            session_id, stats.close_reason, stats.chunks_received
        ),
        Err(e) => warn!("Live session {} task failed: {}", session_id, e),
    }
}

