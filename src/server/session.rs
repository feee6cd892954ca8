//! Per-connection session handler.
//!
//! Translates inbound protocol actions into registry and room operations.
//! State machine per connection: unjoined until the first successful join,
//! joined (possibly moving between rooms) until disconnect or transport
//! failure, then closed for good.

use std::sync::Arc;

use super::connection::{Connection, ConnectionId};
use super::error::SessionError;
use super::protocol::{self, ClientAction, ServerEvent};
use super::registry::RoomRegistry;
use super::room::{Room, RoomKey};

/// What the read loop should do after handling a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

struct Joined {
    /// Non-owning back-reference; the room stays reachable through the
    /// registry only.
    room: Arc<Room>,
    user_id: String,
}

/// One connection's control loop state.
pub struct Session {
    connection: Arc<Connection>,
    registry: Arc<RoomRegistry>,
    joined: Option<Joined>,
}

impl Session {
    pub fn new(connection: Arc<Connection>, registry: Arc<RoomRegistry>) -> Self {
        Self {
            connection,
            registry,
            joined: None,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection.id()
    }

    /// Handle one inbound text frame.
    ///
    /// Protocol errors are reported back to this connection and never close
    /// it; only an explicit `disconnect` returns [`Flow::Close`].
    pub async fn handle_text(&mut self, text: &str) -> Flow {
        match protocol::decode_action(text) {
            Ok(action) => self.handle_action(action).await,
            Err(err) => {
                self.report(err);
                Flow::Continue
            }
        }
    }

    async fn handle_action(&mut self, action: ClientAction) -> Flow {
        match action {
            ClientAction::Join {
                channel_id,
                room_id,
                user_id,
            } => {
                self.join(RoomKey::new(channel_id, room_id), user_id).await;
                Flow::Continue
            }
            ClientAction::Send { payload, user_id } => {
                if let Err(err) = self.send(payload, user_id).await {
                    self.report(err);
                }
                Flow::Continue
            }
            ClientAction::Disconnect => {
                tracing::info!(connection_id = %self.connection.id(), "disconnect requested");
                Flow::Close
            }
        }
    }

    async fn join(&mut self, key: RoomKey, user_id: String) {
        // Re-joining the current room only refreshes the identity.
        if let Some(joined) = self.joined.as_mut() {
            if joined.room.key() == &key {
                if joined
                    .room
                    .join(self.connection.clone(), user_id.clone())
                    .await
                    .is_ok()
                {
                    joined.user_id = user_id.clone();
                    self.connection
                        .enqueue(ServerEvent::join_ack(&key, &user_id).to_json());
                    return;
                }
                // The room was reclaimed under us; fall through and rejoin.
            }
        }

        // A connection is a member of at most one room: moving to a new
        // room leaves the old one first.
        if let Some(previous) = self.joined.take() {
            self.leave_room(previous).await;
        }

        // A freshly fetched room can still lose the race against
        // remove_if_empty; a closed room refuses the join, so retry until
        // the join lands in a live instance.
        let room = loop {
            let room = self.registry.get_or_create(&key).await;
            match room.join(self.connection.clone(), user_id.clone()).await {
                Ok(()) => break room,
                Err(_) => continue,
            }
        };

        tracing::info!(
            connection_id = %self.connection.id(),
            room = %key,
            user_id = %user_id,
            "joined room"
        );

        self.connection
            .enqueue(ServerEvent::join_ack(&key, &user_id).to_json());
        room.broadcast(
            Some(self.connection.id()),
            &ServerEvent::user_joined(&key, &user_id),
        )
        .await;

        self.joined = Some(Joined { room, user_id });
    }

    async fn send(&self, payload: String, user_id: Option<String>) -> Result<(), SessionError> {
        let joined = self.joined.as_ref().ok_or(SessionError::NotJoined)?;
        // The reference clients disagree on whether `send` carries a
        // user_id; fall back to the identity recorded at join time.
        let sender = user_id.unwrap_or_else(|| joined.user_id.clone());

        tracing::debug!(
            connection_id = %self.connection.id(),
            room = %joined.room.key(),
            user_id = %sender,
            "broadcasting message"
        );
        joined
            .room
            .broadcast(
                Some(self.connection.id()),
                &ServerEvent::broadcast(joined.room.key(), &sender, payload),
            )
            .await;
        Ok(())
    }

    fn report(&self, err: SessionError) {
        tracing::warn!(
            connection_id = %self.connection.id(),
            error = %err,
            "reporting session error to sender"
        );
        if let Some(code) = err.code() {
            self.connection
                .enqueue(ServerEvent::error(code, &err.to_string()).to_json());
        }
    }

    /// Tear the session down: leave the current room, notify the remaining
    /// members, reclaim the room if it emptied, mark the connection dead.
    ///
    /// Runs its side effects at most once no matter which flow gets here
    /// first; later calls are no-ops.
    pub async fn close(&mut self) {
        if !self.connection.claim_cleanup() {
            return;
        }
        if let Some(joined) = self.joined.take() {
            self.leave_room(joined).await;
        }
        tracing::info!(connection_id = %self.connection.id(), "session closed");
    }

    async fn leave_room(&self, joined: Joined) {
        let Joined { room, user_id } = joined;
        if room.leave(self.connection.id()).await.is_some() {
            room.broadcast(
                Some(self.connection.id()),
                &ServerEvent::user_left(room.key(), &user_id),
            )
            .await;
        }
        if room.is_empty().await {
            self.registry.remove_if_empty(room.key()).await;
        }
    }
}
