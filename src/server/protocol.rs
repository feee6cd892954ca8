//! Wire protocol for the `/chat` WebSocket endpoint.
//!
//! Each frame is one JSON object. Inbound frames carry an `action` tag and
//! are decoded once, at this boundary, into the closed [`ClientAction`]
//! enum. Outbound frames carry an `event` tag and an RFC 3339 UTC
//! timestamp.

use serde::{Deserialize, Serialize};

use super::error::SessionError;
use super::room::RoomKey;
use crate::common::time::utc_timestamp;

/// Largest inbound frame accepted, in bytes.
pub const MAX_FRAME_BYTES: usize = 512;

/// Inbound client actions.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientAction {
    /// Join a room, leaving the current one if any.
    Join {
        channel_id: String,
        room_id: String,
        user_id: String,
    },
    /// Broadcast a payload to the current room. `user_id` is optional; when
    /// omitted the identity recorded at join time is used.
    Send {
        payload: String,
        #[serde(default)]
        user_id: Option<String>,
    },
    /// Graceful close.
    Disconnect,
}

/// Error codes reported back to a sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotJoined,
    MalformedAction,
}

/// Outbound server events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Acknowledges a successful join to the joiner.
    JoinAck {
        channel_id: String,
        room_id: String,
        user_id: String,
        timestamp: String,
    },
    /// Notifies the other room members that someone joined.
    UserJoined {
        channel_id: String,
        room_id: String,
        user_id: String,
        timestamp: String,
    },
    /// A chat payload delivered to room members. `user_id` is the sender.
    Broadcast {
        channel_id: String,
        room_id: String,
        user_id: String,
        payload: String,
        timestamp: String,
    },
    /// Notifies the remaining members that someone left the room.
    UserLeft {
        channel_id: String,
        room_id: String,
        user_id: String,
        timestamp: String,
    },
    /// An error reported back to the connection that caused it.
    Error {
        code: ErrorCode,
        detail: String,
        timestamp: String,
    },
}

impl ServerEvent {
    pub fn join_ack(key: &RoomKey, user_id: &str) -> Self {
        ServerEvent::JoinAck {
            channel_id: key.channel_id.clone(),
            room_id: key.room_id.clone(),
            user_id: user_id.to_string(),
            timestamp: utc_timestamp(),
        }
    }

    pub fn user_joined(key: &RoomKey, user_id: &str) -> Self {
        ServerEvent::UserJoined {
            channel_id: key.channel_id.clone(),
            room_id: key.room_id.clone(),
            user_id: user_id.to_string(),
            timestamp: utc_timestamp(),
        }
    }

    pub fn broadcast(key: &RoomKey, user_id: &str, payload: String) -> Self {
        ServerEvent::Broadcast {
            channel_id: key.channel_id.clone(),
            room_id: key.room_id.clone(),
            user_id: user_id.to_string(),
            payload,
            timestamp: utc_timestamp(),
        }
    }

    pub fn user_left(key: &RoomKey, user_id: &str) -> Self {
        ServerEvent::UserLeft {
            channel_id: key.channel_id.clone(),
            room_id: key.room_id.clone(),
            user_id: user_id.to_string(),
            timestamp: utc_timestamp(),
        }
    }

    pub fn error(code: ErrorCode, detail: &str) -> Self {
        ServerEvent::Error {
            code,
            detail: detail.to_string(),
            timestamp: utc_timestamp(),
        }
    }

    /// Serialize to one wire frame.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

/// Decode one inbound text frame.
///
/// Distinguishes unparseable JSON from a parseable object with an unknown
/// or incomplete action, so the reported detail is useful to the client.
pub fn decode_action(text: &str) -> Result<ClientAction, SessionError> {
    if text.len() > MAX_FRAME_BYTES {
        return Err(SessionError::MalformedAction(format!(
            "frame exceeds {MAX_FRAME_BYTES} bytes"
        )));
    }
    serde_json::from_str(text).map_err(|e| {
        if serde_json::from_str::<serde_json::Value>(text).is_err() {
            SessionError::MalformedAction("invalid JSON".to_string())
        } else {
            SessionError::MalformedAction(format!("unrecognized action: {e}"))
        }
    })
}
