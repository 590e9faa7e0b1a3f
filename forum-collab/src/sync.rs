//! Realtime Sync Adapter: pumps pushed snapshots into the shared store.
//!
//! Each [`Subscription`] owns one pump task, the single consumer of one
//! [`SnapshotStream`]. The pump is the only writer of its scope in the
//! [`EntityStore`]; controllers only read.
//!
//! Unsubscribing takes the store write lock before deactivating the pump,
//! and the pump re-checks its flag after acquiring that same lock. Once
//! `unsubscribe` returns, no further snapshot reaches the store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use forum_core::{EntityId, EntityStore, ForumError, Scope};

use crate::backend::{RealtimeFeed, SnapshotStream};

/// Entity Store shared between the sync pumps and the controllers.
pub type SharedStore = Arc<RwLock<EntityStore>>;

pub fn shared_store() -> SharedStore {
    Arc::new(RwLock::new(EntityStore::new()))
}

pub struct SyncAdapter;

impl SyncAdapter {
    /// Subscribe to `scope` and keep the store's copy of it current.
    ///
    /// Resolves once the initial snapshot has been applied.
    pub async fn attach<F: RealtimeFeed>(
        feed: &F,
        store: SharedStore,
        scope: Scope,
    ) -> Result<Subscription, ForumError> {
        let mut stream = feed
            .subscribe(&scope, scope.default_order())
            .await
            .map_err(|e| {
                log::warn!("Subscribe to {scope} failed: {e}");
                ForumError::from(e)
            })?;

        let initial = stream
            .next()
            .await
            .ok_or_else(|| ForumError::TransientIo(format!("feed for {scope} closed")))?;
        store.write().await.apply(initial);

        let active = Arc::new(AtomicBool::new(true));
        let task = tokio::spawn(pump(stream, store.clone(), active.clone()));

        log::info!("Subscribed to {scope}");
        Ok(Subscription {
            scope,
            store,
            active,
            task,
        })
    }
}

async fn pump(mut stream: SnapshotStream, store: SharedStore, active: Arc<AtomicBool>) {
    while let Some(snapshot) = stream.next().await {
        let mut guard = store.write().await;
        if !active.load(Ordering::SeqCst) {
            return;
        }
        guard.apply(snapshot);
    }
    log::debug!("Feed for {} closed", stream.scope());
}

/// Handle to a live scope subscription. Dropping it stops the pump too,
/// but only [`Subscription::unsubscribe`] waits out an apply in progress.
pub struct Subscription {
    scope: Scope,
    store: SharedStore,
    active: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) && !self.task.is_finished()
    }

    pub async fn unsubscribe(self) {
        {
            let _store = self.store.write().await;
            self.active.store(false, Ordering::SeqCst);
        }
        self.task.abort();
        log::info!("Unsubscribed from {}", self.scope);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        self.task.abort();
    }
}

/// Live subscriptions backing a question detail page: the question itself,
/// its answers, and the comments of every answer seen so far.
pub struct ThreadView<F: RealtimeFeed> {
    feed: F,
    store: SharedStore,
    question: EntityId,
    subscriptions: Vec<Subscription>,
    comments: HashMap<EntityId, Subscription>,
}

impl<F: RealtimeFeed> ThreadView<F> {
    pub async fn open(feed: F, store: SharedStore, question: EntityId) -> Result<Self, ForumError> {
        let questions = SyncAdapter::attach(&feed, store.clone(), Scope::Questions).await?;
        if store.read().await.question(&question).is_none() {
            questions.unsubscribe().await;
            return Err(ForumError::NotFound(question));
        }
        let answers =
            SyncAdapter::attach(&feed, store.clone(), Scope::answers(question.clone())).await?;

        let mut view = Self {
            feed,
            store,
            question,
            subscriptions: vec![questions, answers],
            comments: HashMap::new(),
        };
        view.sync_comments().await?;
        Ok(view)
    }

    pub fn question(&self) -> &EntityId {
        &self.question
    }

    /// Attach a comments subscription for every answer that lacks one.
    /// Returns how many were added.
    pub async fn sync_comments(&mut self) -> Result<usize, ForumError> {
        let missing: Vec<EntityId> = {
            let store = self.store.read().await;
            store
                .answers(&self.question)
                .iter()
                .map(|a| a.id.clone())
                .filter(|id| !self.comments.contains_key(id))
                .collect()
        };

        for answer in &missing {
            let scope = Scope::comments(self.question.clone(), answer.clone());
            let subscription = SyncAdapter::attach(&self.feed, self.store.clone(), scope).await?;
            self.comments.insert(answer.clone(), subscription);
        }
        Ok(missing.len())
    }

    /// Scopes currently kept in sync.
    pub fn scopes(&self) -> Vec<Scope> {
        self.subscriptions
            .iter()
            .chain(self.comments.values())
            .map(|s| s.scope().clone())
            .collect()
    }

    pub async fn close(self) {
        for subscription in self.subscriptions {
            subscription.unsubscribe().await;
        }
        for (_, subscription) in self.comments {
            subscription.unsubscribe().await;
        }
    }
}
