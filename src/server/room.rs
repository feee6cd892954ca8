//! Room membership and broadcast fan-out.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use super::connection::{Connection, ConnectionId};
use super::protocol::ServerEvent;

/// Registry key addressing one room: a channel is the top-level namespace,
/// a room is one broadcast scope inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomKey {
    pub channel_id: String,
    pub room_id: String,
}

impl RoomKey {
    pub fn new(channel_id: impl Into<String>, room_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            room_id: room_id.into(),
        }
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel_id, self.room_id)
    }
}

/// Join target was already reclaimed by the registry; retry through
/// `RoomRegistry::get_or_create` to land in a fresh instance.
#[derive(Debug, Error)]
#[error("room was reclaimed")]
pub struct RoomClosed;

struct Member {
    connection: Arc<Connection>,
    user_id: String,
}

struct Members {
    by_id: HashMap<ConnectionId, Member>,
    /// Set once the registry has reclaimed this room. A closed room never
    /// accepts another member; re-creating the same key yields a fresh,
    /// unrelated room.
    closed: bool,
}

/// The set of connections currently joined to one (channel_id, room_id)
/// pair. Owns broadcast fan-out to its members.
///
/// Reachable only through the registry; sessions hold a non-owning
/// back-reference for leave/broadcast.
pub struct Room {
    key: RoomKey,
    members: Mutex<Members>,
}

impl Room {
    pub fn new(key: RoomKey) -> Self {
        Self {
            key,
            members: Mutex::new(Members {
                by_id: HashMap::new(),
                closed: false,
            }),
        }
    }

    pub fn key(&self) -> &RoomKey {
        &self.key
    }

    /// Add a connection to the membership, recording its user identity.
    ///
    /// Idempotent per connection; re-joining updates the recorded user_id
    /// (last write wins).
    pub async fn join(
        &self,
        connection: Arc<Connection>,
        user_id: String,
    ) -> Result<(), RoomClosed> {
        let mut members = self.members.lock().await;
        if members.closed {
            return Err(RoomClosed);
        }
        members
            .by_id
            .insert(connection.id(), Member { connection, user_id });
        Ok(())
    }

    /// Remove a connection from the membership.
    ///
    /// Returns the user_id recorded at join time, or `None` if the
    /// connection was not a member.
    pub async fn leave(&self, id: ConnectionId) -> Option<String> {
        let mut members = self.members.lock().await;
        members.by_id.remove(&id).map(|m| m.user_id)
    }

    pub async fn is_empty(&self) -> bool {
        self.members.lock().await.by_id.is_empty()
    }

    pub async fn member_count(&self) -> usize {
        self.members.lock().await.by_id.len()
    }

    /// User identities of the current members, sorted for consistent output.
    pub async fn user_ids(&self) -> Vec<String> {
        let members = self.members.lock().await;
        let mut ids: Vec<String> = members.by_id.values().map(|m| m.user_id.clone()).collect();
        ids.sort();
        ids
    }

    /// Enqueue an event on every member except `exclude` (normally the
    /// sender; the server never echoes a message back to its author).
    ///
    /// The member lock is held across the enqueues, which never block, so
    /// sequential broadcasts reach every member in the same relative order
    /// and a slow consumer cannot stall the room.
    pub async fn broadcast(&self, exclude: Option<ConnectionId>, event: &ServerEvent) {
        let frame = event.to_json();
        let members = self.members.lock().await;
        for (id, member) in members.by_id.iter() {
            if Some(*id) != exclude {
                member.connection.enqueue(frame.clone());
            }
        }
    }

    /// Mark the room closed if it has no members. Registry-only; called
    /// under the registry lock so a closed room is removed atomically.
    pub(super) async fn close_if_empty(&self) -> bool {
        let mut members = self.members.lock().await;
        if members.by_id.is_empty() {
            members.closed = true;
            true
        } else {
            false
        }
    }
}
