//! Process-wide room registry.
//!
//! One instance is owned by the server and handed to every session by
//! `Arc`; there is no ambient global state.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use super::room::{Room, RoomKey};

/// Read-only summary of one live room, served by `GET /api/rooms`.
#[derive(Debug, Serialize)]
pub struct RoomSummary {
    pub channel_id: String,
    pub room_id: String,
    pub user_ids: Vec<String>,
}

/// Maps (channel_id, room_id) to its single live [`Room`].
///
/// Rooms are created lazily on first join and reclaimed when their last
/// member leaves. Lock order is always registry before room members.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<RoomKey, Arc<Room>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Return the room for `key`, creating it if absent.
    ///
    /// Atomic per key: concurrent calls for the same key all resolve to the
    /// same instance.
    pub async fn get_or_create(&self, key: &RoomKey) -> Arc<Room> {
        let mut rooms = self.rooms.lock().await;
        if let Some(room) = rooms.get(key) {
            return room.clone();
        }
        let room = Arc::new(Room::new(key.clone()));
        tracing::info!(room = %key, "room created");
        rooms.insert(key.clone(), room.clone());
        room
    }

    /// Remove the entry for `key` if its room has no members; no-op
    /// otherwise.
    ///
    /// The emptiness check and the removal happen under the registry lock,
    /// and the room is marked closed under its own member lock, so a
    /// connection that is mid-join either lands before the removal (the
    /// room stays) or observes the closed flag and retries into a fresh
    /// room. A room is never pulled out from under a completed join.
    pub async fn remove_if_empty(&self, key: &RoomKey) {
        let mut rooms = self.rooms.lock().await;
        if let Some(room) = rooms.get(key) {
            if room.close_if_empty().await {
                rooms.remove(key);
                tracing::info!(room = %key, "empty room reclaimed");
            }
        }
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Snapshot of every live room for the HTTP surface.
    pub async fn summaries(&self) -> Vec<RoomSummary> {
        let rooms: Vec<Arc<Room>> = self.rooms.lock().await.values().cloned().collect();

        let mut summaries = Vec::with_capacity(rooms.len());
        for room in rooms {
            summaries.push(RoomSummary {
                channel_id: room.key().channel_id.clone(),
                room_id: room.key().room_id.clone(),
                user_ids: room.user_ids().await,
            });
        }
        summaries.sort_by(|a, b| {
            (a.channel_id.as_str(), a.room_id.as_str())
                .cmp(&(b.channel_id.as_str(), b.room_id.as_str()))
        });
        summaries
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::connection::Connection;

    #[tokio::test]
    async fn test_get_or_create_returns_the_same_instance() {
        // given (precondition):
        let registry = RoomRegistry::new();
        let key = RoomKey::new("chA", "r1");

        // when (operation):
        let first = registry.get_or_create(&key).await;
        let second = registry.get_or_create(&key).await;

        // then (expected result): one room per key
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.room_count().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_get_or_create_yields_one_room() {
        let registry = Arc::new(RoomRegistry::new());
        let key = RoomKey::new("chA", "r1");

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                let key = key.clone();
                tokio::spawn(async move { registry.get_or_create(&key).await })
            })
            .collect();

        let mut rooms = Vec::new();
        for task in tasks {
            rooms.push(task.await.unwrap());
        }

        assert!(rooms.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(registry.room_count().await, 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_get_distinct_rooms() {
        let registry = RoomRegistry::new();

        let a = registry.get_or_create(&RoomKey::new("chA", "r1")).await;
        let b = registry.get_or_create(&RoomKey::new("chA", "r2")).await;
        let c = registry.get_or_create(&RoomKey::new("chB", "r1")).await;

        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(registry.room_count().await, 3);
    }

    #[tokio::test]
    async fn test_remove_if_empty_reclaims_only_empty_rooms() {
        let registry = RoomRegistry::new();
        let key = RoomKey::new("chA", "r1");
        let room = registry.get_or_create(&key).await;

        let (conn, _rx) = Connection::new();
        room.join(conn.clone(), "alice".to_string()).await.unwrap();

        // occupied: no-op
        registry.remove_if_empty(&key).await;
        assert_eq!(registry.room_count().await, 1);

        // empty: reclaimed
        room.leave(conn.id()).await;
        registry.remove_if_empty(&key).await;
        assert_eq!(registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_rejoin_after_reclaim_gets_a_fresh_room() {
        let registry = RoomRegistry::new();
        let key = RoomKey::new("chA", "r1");

        let old = registry.get_or_create(&key).await;
        registry.remove_if_empty(&key).await;
        let fresh = registry.get_or_create(&key).await;

        assert!(!Arc::ptr_eq(&old, &fresh));
    }

    #[tokio::test]
    async fn test_join_losing_the_reclaim_race_retries_into_a_fresh_room() {
        // A connection got its room handle before the registry reclaimed
        // the entry. Its join must fail closed, and the retry through
        // get_or_create must land in a live room.
        let registry = RoomRegistry::new();
        let key = RoomKey::new("chA", "r1");
        let stale = registry.get_or_create(&key).await;

        registry.remove_if_empty(&key).await;

        let (conn, _rx) = Connection::new();
        assert!(stale.join(conn.clone(), "alice".to_string()).await.is_err());

        let fresh = registry.get_or_create(&key).await;
        fresh.join(conn, "alice".to_string()).await.unwrap();
        assert_eq!(fresh.member_count().await, 1);
    }

    #[tokio::test]
    async fn test_summaries_reflect_live_membership() {
        let registry = RoomRegistry::new();
        let room = registry.get_or_create(&RoomKey::new("chA", "r1")).await;
        let (conn, _rx) = Connection::new();
        room.join(conn, "alice".to_string()).await.unwrap();

        let summaries = registry.summaries().await;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].channel_id, "chA");
        assert_eq!(summaries[0].room_id, "r1");
        assert_eq!(summaries[0].user_ids, vec!["alice".to_string()]);
    }
}
