//! Shared utilities used by the server and its binaries.

pub mod logger;
pub mod time;
