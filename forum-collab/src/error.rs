//! Collaborator-side errors and their conversion into [`ForumError`].

use forum_core::{EntityId, ForumError};

use crate::protocol::ProtocolError;

/// Failure reported by the auth, storage or realtime collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Collaborator unreachable or timed out.
    Unavailable(String),
    /// Referenced document does not exist.
    NotFound(EntityId),
    /// Operation requires a signed-in user.
    Unauthenticated,
    /// Collaborator refused the request.
    Rejected(String),
    /// A pushed frame could not be encoded or decoded.
    Protocol(ProtocolError),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Unavailable(e) => write!(f, "Backend unavailable: {e}"),
            BackendError::NotFound(id) => write!(f, "Document not found: {id}"),
            BackendError::Unauthenticated => write!(f, "Not signed in"),
            BackendError::Rejected(e) => write!(f, "Request rejected: {e}"),
            BackendError::Protocol(e) => write!(f, "Protocol error: {e}"),
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BackendError::Protocol(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ProtocolError> for BackendError {
    fn from(e: ProtocolError) -> Self {
        BackendError::Protocol(e)
    }
}

impl From<BackendError> for ForumError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Unavailable(msg) => ForumError::TransientIo(msg),
            BackendError::NotFound(id) => ForumError::NotFound(id),
            BackendError::Unauthenticated => ForumError::Unauthorized,
            BackendError::Rejected(msg) => ForumError::Rejected(msg),
            BackendError::Protocol(e) => ForumError::TransientIo(e.to_string()),
        }
    }
}
