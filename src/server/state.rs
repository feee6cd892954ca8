//! Shared application state.

use std::sync::Arc;

use super::registry::RoomRegistry;

/// State shared by every handler: the one process-wide room registry.
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
}
