//! Multi-room WebSocket chat server library.
//!
//! Clients connect to a single WebSocket endpoint, join a room addressed by
//! a (channel_id, room_id) pair, and exchange messages that are fanned out
//! to every other member of that room.

pub mod common;
pub mod server;
