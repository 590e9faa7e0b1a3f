//! Process-wide session context, injected into controllers.

use tokio::sync::watch;

use forum_core::{ForumError, User};

use crate::backend::AuthProvider;

/// Who is signed in, kept current by the auth collaborator's watcher.
///
/// Cloning is cheap; every clone observes the same transitions.
#[derive(Clone)]
pub struct SessionContext {
    rx: watch::Receiver<Option<User>>,
}

impl SessionContext {
    /// Subscribe to session transitions. Call once at startup.
    pub fn init<A: AuthProvider>(auth: &A) -> Self {
        let rx = auth.watch();
        match rx.borrow().as_ref() {
            Some(user) => log::info!("Session initialized for {}", user.email),
            None => log::info!("Session initialized (signed out)"),
        }
        Self { rx }
    }

    pub fn current_user(&self) -> Option<User> {
        self.rx.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// The signed-in user, or `Unauthorized`.
    pub fn require_user(&self) -> Result<User, ForumError> {
        self.current_user().ok_or(ForumError::Unauthorized)
    }

    /// Wait for the next session transition and return the new state.
    /// `None` once the auth collaborator has gone away.
    pub async fn changed(&mut self) -> Option<Option<User>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Stop observing session transitions.
    pub fn shutdown(self) {
        log::info!("Session context shut down");
    }
}
