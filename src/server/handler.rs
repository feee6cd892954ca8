//! WebSocket and HTTP handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};

use super::connection::Connection;
use super::error::SessionError;
use super::registry::RoomSummary;
use super::session::{Flow, Session};
use super::state::AppState;

/// `GET /chat` — upgrade to a WebSocket session.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one client connection to completion.
///
/// Two flows per connection: this function's read loop feeding the session
/// handler, and a spawned writer task draining the outbound queue into the
/// socket. Whichever side finishes first, cleanup runs exactly once.
pub async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (connection, mut outbound) = Connection::new();
    let connection_id = connection.id();
    tracing::info!(%connection_id, "connection opened");

    let mut session = Session::new(connection.clone(), state.registry.clone());

    // Writer: drain queued frames FIFO until the queue or the socket closes.
    // A write failure marks the connection dead so fan-out stops queueing.
    let writer_connection = connection.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                writer_connection.mark_dead();
                break;
            }
        }
    });

    // Reader: decode frames serially and run the session state machine.
    let read_loop = async {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    let err = SessionError::Transport(e.to_string());
                    tracing::warn!(%connection_id, error = %err, "closing connection");
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    if session.handle_text(text.as_str()).await == Flow::Close {
                        break;
                    }
                }
                Message::Close(_) => {
                    tracing::debug!(%connection_id, "close frame received");
                    break;
                }
                // Ping/pong is answered by the protocol layer; binary
                // frames are not part of this protocol.
                _ => {}
            }
        }
    };

    tokio::select! {
        _ = &mut send_task => {
            tracing::debug!(%connection_id, "writer finished first");
        }
        _ = read_loop => {
            send_task.abort();
        }
    }

    session.close().await;
    tracing::info!(%connection_id, "connection closed");
}

/// `GET /api/health`
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// `GET /api/rooms` — summaries of every live room.
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummary>> {
    Json(state.registry.summaries().await)
}
