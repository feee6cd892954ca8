//! Per-connection identity, liveness and the outbound send queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique identifier for one transport session.
pub type ConnectionId = Uuid;

/// One client's live transport session.
///
/// Holds the sending half of the connection's outbound queue; the receiving
/// half is drained FIFO by the connection's writer task. Room fan-out and
/// the session handler both enqueue through this type and never touch the
/// socket directly.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    outbound: mpsc::UnboundedSender<String>,
    alive: AtomicBool,
    cleanup_claimed: AtomicBool,
}

impl Connection {
    /// Create a connection plus the receiver its writer task drains.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = Arc::new(Self {
            id: Uuid::new_v4(),
            outbound: tx,
            alive: AtomicBool::new(true),
            cleanup_claimed: AtomicBool::new(false),
        });
        (connection, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Queue a serialized frame for the writer task.
    ///
    /// Never blocks the caller. Frames for a dead connection are silently
    /// dropped, so a broadcast to a closing member cannot stall the room.
    pub fn enqueue(&self, frame: String) {
        if !self.is_alive() {
            return;
        }
        if self.outbound.send(frame).is_err() {
            // Writer task is gone; stop accepting frames.
            self.alive.store(false, Ordering::Release);
        }
    }

    /// Mark the connection dead. Idempotent.
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::Release);
    }

    /// Claim the one-shot cleanup of this connection.
    ///
    /// Returns `true` exactly once, whichever flow (read loop, writer
    /// failure, explicit disconnect) gets there first, so room removal runs
    /// at most once.
    pub fn claim_cleanup(&self) -> bool {
        self.mark_dead();
        !self.cleanup_claimed.swap(true, Ordering::AcqRel)
    }
}
