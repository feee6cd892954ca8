//! Multi-room WebSocket chat server implementation.

mod connection;
mod error;
mod handler;
mod protocol;
mod registry;
mod room;
mod runner;
mod session;
mod signal;
mod state;

pub use runner::run_server;
