//! User-facing error taxonomy.
//!
//! Every controller returns `ForumError`. Collaborator failures are
//! converted at the controller boundary; none of them is fatal, and prior
//! state is always left intact.

use std::fmt;

use crate::id::EntityId;
use crate::validation::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForumError {
    /// Input failed a form rule. Shown inline; the form keeps its input.
    Validation(ValidationError),
    /// No signed-in user. The caller should route to sign-in.
    Unauthorized,
    /// A collaborator could not be reached. Shown as a retry prompt; no
    /// automatic retry happens.
    TransientIo(String),
    /// Referenced question or answer is not (yet) known. Shown as a
    /// loading or empty state.
    NotFound(EntityId),
    /// The collaborator refused the request (bad credentials, weak
    /// password, duplicate account).
    Rejected(String),
}

impl ForumError {
    /// Whether retrying the same action later might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ForumError::TransientIo(_))
    }
}

impl fmt::Display for ForumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForumError::Validation(e) => write!(f, "{e}"),
            ForumError::Unauthorized => write!(f, "You must be signed in to do that."),
            ForumError::TransientIo(e) => write!(f, "Request failed, please try again ({e})"),
            ForumError::NotFound(id) => write!(f, "Not found: {id}"),
            ForumError::Rejected(e) => write!(f, "Error: {e}"),
        }
    }
}

impl std::error::Error for ForumError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ForumError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for ForumError {
    fn from(e: ValidationError) -> Self {
        ForumError::Validation(e)
    }
}
