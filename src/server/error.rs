//! Session error taxonomy.
//!
//! Every variant is scoped to a single connection; none of them may affect
//! any other connection's handling.

use thiserror::Error;

use super::protocol::ErrorCode;

/// Errors raised while handling one connection's inbound frames.
#[derive(Debug, Error)]
pub enum SessionError {
    /// `send` received before any successful `join`.
    #[error("not joined to any room")]
    NotJoined,

    /// Unparseable frame, oversized frame, or unknown `action`.
    #[error("malformed action: {0}")]
    MalformedAction(String),

    /// Socket or frame failure. Fatal to this connection only.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl SessionError {
    /// Protocol error code to report back to the sender, or `None` for
    /// errors that close the connection instead of being reported.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            SessionError::NotJoined => Some(ErrorCode::NotJoined),
            SessionError::MalformedAction(_) => Some(ErrorCode::MalformedAction),
            SessionError::Transport(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reportable_errors_carry_a_code() {
        assert_eq!(SessionError::NotJoined.code(), Some(ErrorCode::NotJoined));
        assert_eq!(
            SessionError::MalformedAction("bad".into()).code(),
            Some(ErrorCode::MalformedAction)
        );
        assert_eq!(SessionError::Transport("reset".into()).code(), None);
    }
}
