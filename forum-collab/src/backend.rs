//! Contracts of the managed backend, consumed as black boxes.
//!
//! ```text
//! ┌──────────────┐  current_user / watch   ┌─────────────────┐
//! │ AuthProvider │ ──────────────────────► │ SessionContext  │
//! └──────────────┘                         └─────────────────┘
//! ┌─────────────────┐  append / update_fields / fetch
//! │ DocumentStorage │ ◄──────────────────── controllers
//! └─────────────────┘
//! ┌──────────────┐  subscribe → SnapshotStream  ┌─────────────┐
//! │ RealtimeFeed │ ───────────────────────────► │ SyncAdapter │ ──► EntityStore
//! └──────────────┘                              └─────────────┘
//! ```

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

use forum_core::{EntityId, NewEntity, Scope, Snapshot, SortOrder, User, UserId, VoteDirection};

use crate::error::BackendError;
use crate::protocol::SnapshotFrame;

/// Field-level update applied to one stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    /// Set-union append of `voter` to the `direction` vote set.
    AddVoter {
        direction: VoteDirection,
        voter: UserId,
    },
}

/// External identity provider for popup sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityProvider {
    Google,
}

impl std::fmt::Display for IdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityProvider::Google => write!(f, "google.com"),
        }
    }
}

/// Authentication collaborator.
pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<User>;

    /// Session transitions. The receiver always holds the current state.
    fn watch(&self) -> watch::Receiver<Option<User>>;

    /// Register a new account. On success the new user is signed in.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<User, BackendError>> + Send;

    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<User, BackendError>> + Send;

    /// Sign in through an external provider. The first sign-in with a
    /// provider identity creates the account.
    fn sign_in_with_provider(
        &self,
        provider: IdentityProvider,
    ) -> impl Future<Output = Result<User, BackendError>> + Send;

    fn sign_out(&self) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Re-check the signed-in user's password before a sensitive change.
    fn reauthenticate(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn update_password(
        &self,
        new_password: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}

/// Document storage collaborator.
pub trait DocumentStorage: Send + Sync {
    /// Append a new document to `scope`. The backend assigns its id and
    /// creation timestamp.
    fn append(
        &self,
        scope: &Scope,
        entity: NewEntity,
    ) -> impl Future<Output = Result<EntityId, BackendError>> + Send;

    fn update_fields(
        &self,
        scope: &Scope,
        id: &EntityId,
        update: FieldUpdate,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// One-shot read of a scope, without subscribing.
    fn fetch(&self, scope: &Scope) -> impl Future<Output = Result<Snapshot, BackendError>> + Send;
}

/// Realtime subscription collaborator.
pub trait RealtimeFeed: Send + Sync {
    /// Subscribe to full-scope snapshots ordered by creation time. The
    /// first snapshot is the scope's current content.
    fn subscribe(
        &self,
        scope: &Scope,
        order: SortOrder,
    ) -> impl Future<Output = Result<SnapshotStream, BackendError>> + Send;
}

/// Single-consumer stream of snapshots for one scope.
///
/// Frames that are stale (sequence not newer than the last delivered) or
/// belong to another scope are skipped. Undecodable frames are logged and
/// skipped; the next good frame supersedes them anyway.
pub struct SnapshotStream {
    scope: Scope,
    order: SortOrder,
    pending: Option<Snapshot>,
    last_sequence: u64,
    rx: broadcast::Receiver<Arc<Vec<u8>>>,
}

impl SnapshotStream {
    pub fn new(
        scope: Scope,
        order: SortOrder,
        initial: SnapshotFrame,
        rx: broadcast::Receiver<Arc<Vec<u8>>>,
    ) -> Self {
        Self {
            scope,
            order,
            last_sequence: initial.sequence,
            pending: Some(initial.snapshot),
            rx,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Next snapshot, or `None` once the feed has closed.
    pub async fn next(&mut self) -> Option<Snapshot> {
        if let Some(snapshot) = self.pending.take() {
            return Some(snapshot.ordered(self.order));
        }

        loop {
            match self.rx.recv().await {
                Ok(bytes) => match SnapshotFrame::decode(&bytes) {
                    Ok(frame) => {
                        if frame.sequence <= self.last_sequence
                            || frame.snapshot.scope() != self.scope
                        {
                            continue;
                        }
                        self.last_sequence = frame.sequence;
                        return Some(frame.snapshot.ordered(self.order));
                    }
                    Err(e) => {
                        log::warn!("Dropping undecodable frame for {}: {e}", self.scope);
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::debug!("Subscriber of {} lagged, skipped {skipped} frames", self.scope);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
