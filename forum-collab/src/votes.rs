//! Vote Controller: idempotent up/down votes on questions and answers.
//!
//! A cast is decided against the Entity Store's current vote sets and,
//! when needed, sent as a set-union update. The store itself is never
//! touched here; the vote shows up with the next pushed snapshot.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use forum_core::{
    plan_vote, EntityId, ForumError, VoteDirection, VotePlan, VoteTally, VoteTarget,
};

use crate::backend::{DocumentStorage, FieldUpdate};
use crate::session::SessionContext;
use crate::sync::SharedStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Update sent and acknowledged.
    Recorded,
    /// Voter already in the target set; nothing sent.
    AlreadyVoted,
    /// Another cast on the same entity is still in flight on this client.
    Busy,
}

/// Marks one entity as having a cast in flight until dropped, including
/// when the cast's future is dropped mid-await.
struct InFlight<'a> {
    ids: &'a Mutex<HashSet<EntityId>>,
    id: EntityId,
}

impl<'a> InFlight<'a> {
    /// `None` if a cast on `id` is already in flight.
    fn claim(ids: &'a Mutex<HashSet<EntityId>>, id: &EntityId) -> Option<Self> {
        let claimed = ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone());
        claimed.then(|| Self { ids, id: id.clone() })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

pub struct VoteController<S> {
    storage: S,
    store: SharedStore,
    session: SessionContext,
    in_flight: Mutex<HashSet<EntityId>>,
}

impl<S: DocumentStorage> VoteController<S> {
    pub fn new(storage: S, store: SharedStore, session: SessionContext) -> Self {
        Self {
            storage,
            store,
            session,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Cast the signed-in user's vote on `target`.
    ///
    /// Repeating a cast is a successful no-op. A vote in the opposite
    /// direction is kept: nothing clears the other set.
    pub async fn cast_vote(
        &self,
        target: &VoteTarget,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, ForumError> {
        let voter = self.session.require_user()?.uid;

        let plan = {
            let store = self.store.read().await;
            let entity = store
                .votable(target)
                .ok_or_else(|| ForumError::NotFound(target.id().clone()))?;
            plan_vote(entity, &voter, direction)
        };
        if plan == VotePlan::AlreadyCast {
            log::debug!("{voter} already voted {direction} on {}", target.id());
            return Ok(VoteOutcome::AlreadyVoted);
        }

        let Some(_claim) = InFlight::claim(&self.in_flight, target.id()) else {
            return Ok(VoteOutcome::Busy);
        };
        let result = self
            .storage
            .update_fields(
                &target.scope(),
                target.id(),
                FieldUpdate::AddVoter { direction, voter },
            )
            .await;

        match result {
            Ok(()) => Ok(VoteOutcome::Recorded),
            Err(e) => {
                log::warn!("Vote on {} failed: {e}", target.id());
                Err(e.into())
            }
        }
    }

    /// Current counts, if the target is in the store.
    pub async fn tally(&self, target: &VoteTarget) -> Option<VoteTally> {
        self.store.read().await.votable(target).map(|v| v.tally())
    }

    /// Whether the `direction` button should be enabled for the signed-in
    /// user.
    pub async fn can_vote(&self, target: &VoteTarget, direction: VoteDirection) -> bool {
        let Some(user) = self.session.current_user() else {
            return false;
        };
        let busy = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(target.id());
        if busy {
            return false;
        }
        let store = self.store.read().await;
        store
            .votable(target)
            .is_some_and(|v| !v.has_voted(&user.uid, direction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::AuthProvider;
    use crate::config::ForumConfig;
    use crate::memory::{MemoryBackend, MemoryClient};
    use crate::sync::{shared_store, SyncAdapter};
    use crate::testing::GatedStorage;
    use forum_core::{NewEntity, QuestionDraft, Scope};
    use std::time::Duration;
    use tokio::time::timeout;

    async fn setup() -> (MemoryBackend, MemoryClient, SharedStore, VoteTarget) {
        let backend = MemoryBackend::new(ForumConfig::for_testing());
        let client = backend.connect();
        let user = client.sign_up("voter@example.com", "hunter22").await.unwrap();
        let id = backend
            .append(
                &Scope::Questions,
                NewEntity::Question {
                    draft: QuestionDraft::new("Valid Title", "Valid description text"),
                    author: user,
                },
            )
            .await
            .unwrap();
        let store = shared_store();
        store
            .write()
            .await
            .apply(backend.fetch(&Scope::Questions).await.unwrap());
        (backend, client, store, VoteTarget::Question(id))
    }

    #[tokio::test]
    async fn test_requires_session() {
        let (backend, client, store, target) = setup().await;
        client.sign_out().await.unwrap();
        let votes = VoteController::new(backend, store, SessionContext::init(&client));

        assert_eq!(
            votes.cast_vote(&target, VoteDirection::Up).await,
            Err(ForumError::Unauthorized)
        );
        assert!(!votes.can_vote(&target, VoteDirection::Up).await);
    }

    #[tokio::test]
    async fn test_unknown_target() {
        let (backend, client, store, _) = setup().await;
        let votes = VoteController::new(backend, store, SessionContext::init(&client));
        let missing = VoteTarget::Question(EntityId::new("missing"));

        assert_eq!(
            votes.cast_vote(&missing, VoteDirection::Down).await,
            Err(ForumError::NotFound(EntityId::new("missing")))
        );
    }

    #[tokio::test]
    async fn test_repeat_cast_is_noop_once_pushed() {
        let (backend, client, store, target) = setup().await;
        let _sub = SyncAdapter::attach(&backend, store.clone(), Scope::Questions)
            .await
            .unwrap();
        let votes = VoteController::new(backend.clone(), store.clone(), SessionContext::init(&client));

        assert!(votes.can_vote(&target, VoteDirection::Up).await);
        assert_eq!(
            votes.cast_vote(&target, VoteDirection::Up).await,
            Ok(VoteOutcome::Recorded)
        );

        tokio::time::timeout(Duration::from_secs(2), async {
            while votes.tally(&target).await.map(|t| t.up) != Some(1) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert!(!votes.can_vote(&target, VoteDirection::Up).await);
        assert!(votes.can_vote(&target, VoteDirection::Down).await);
        assert_eq!(
            votes.cast_vote(&target, VoteDirection::Up).await,
            Ok(VoteOutcome::AlreadyVoted)
        );
        assert_eq!(backend.update_count(), 1);
    }

    #[tokio::test]
    async fn test_offline_is_transient() {
        let (backend, client, store, target) = setup().await;
        let votes = VoteController::new(backend.clone(), store, SessionContext::init(&client));
        backend.set_available(false);

        let result = votes.cast_vote(&target, VoteDirection::Up).await;
        assert!(matches!(result, Err(ForumError::TransientIo(_))));
        // The guard is released after a failure.
        backend.set_available(true);
        assert!(votes.can_vote(&target, VoteDirection::Up).await);
    }

    #[tokio::test]
    async fn test_second_cast_busy_while_first_pending() {
        let (backend, client, store, target) = setup().await;
        let storage = GatedStorage::closed(backend.clone());
        let votes = VoteController::new(storage.clone(), store, SessionContext::init(&client));

        let first = votes.cast_vote(&target, VoteDirection::Up);
        tokio::pin!(first);
        assert!(timeout(Duration::from_millis(20), &mut first).await.is_err());

        assert!(!votes.can_vote(&target, VoteDirection::Up).await);
        assert!(!votes.can_vote(&target, VoteDirection::Down).await);
        assert_eq!(
            votes.cast_vote(&target, VoteDirection::Down).await,
            Ok(VoteOutcome::Busy)
        );

        storage.open();
        assert_eq!(first.await, Ok(VoteOutcome::Recorded));
        assert!(votes.can_vote(&target, VoteDirection::Down).await);
        assert_eq!(backend.update_count(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_cast_releases_target() {
        let (backend, client, store, target) = setup().await;
        let storage = GatedStorage::closed(backend.clone());
        let votes = VoteController::new(storage.clone(), store, SessionContext::init(&client));

        let cancelled = timeout(
            Duration::from_millis(20),
            votes.cast_vote(&target, VoteDirection::Up),
        )
        .await;
        assert!(cancelled.is_err());
        assert!(votes.can_vote(&target, VoteDirection::Up).await);

        storage.open();
        assert_eq!(
            votes.cast_vote(&target, VoteDirection::Up).await,
            Ok(VoteOutcome::Recorded)
        );
        assert_eq!(backend.update_count(), 1);
    }
}
