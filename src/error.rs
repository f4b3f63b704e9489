//! Error types for conference event subscriptions.

use crate::session::SessionState;
use crate::transport::TransportHandle;
use crate::types::ConferenceIdentity;
use thiserror::Error;

/// Main error type for subscription operations.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid state: cannot {operation} while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Session already registered: {0}")]
    SessionExists(ConferenceIdentity),

    #[error("Unknown conference: {0}")]
    UnknownConference(ConferenceIdentity),

    #[error("Unknown transport handle: {0}")]
    UnknownHandle(TransportHandle),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Why a raw membership document could not be turned into a [`MembershipDocument`].
///
/// [`MembershipDocument`]: crate::types::MembershipDocument
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Document is not valid UTF-8: {0}")]
    Encoding(String),

    #[error("Malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    #[error("Document has no root element")]
    MissingRoot,

    #[error("Unexpected root element: {0}")]
    UnexpectedRoot(String),

    #[error("Root element has no entity attribute")]
    MissingEntity,

    #[error("Document ended before the root element was closed")]
    Truncated,
}

impl From<serde_json::Error> for EventError {
    fn from(e: serde_json::Error) -> Self {
        EventError::Config(e.to_string())
    }
}

/// Result type for subscription operations.
pub type Result<T> = std::result::Result<T, EventError>;
