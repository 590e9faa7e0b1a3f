//! In-memory stand-in for the managed backend.
//!
//! One [`MemoryBackend`] plays the shared server side (documents, accounts,
//! per-scope broadcast rooms). Each browser tab is a [`MemoryClient`] with
//! its own auth session on top of the shared backend.
//!
//! ```text
//! MemoryClient (alice) ──┐                     ┌── RoomManager ── Scope rooms
//!                        ├── MemoryBackend ────┤
//! MemoryClient (bob) ────┘                     └── EntityStore (documents)
//! ```
//!
//! Every write bumps a global sequence number and pushes the written
//! scope's full snapshot to its room. Pushes can be delayed
//! (`simulated_latency_ms`) or held back entirely to exercise the
//! no-optimistic-update latency contract, and the whole backend can be
//! switched offline to exercise transient failures.
//!
//! Provider sign-in is simulated by giving a client the identity its popup
//! would return ([`MemoryClient::with_identity`]).
//!
//! This is a test double: passwords are kept in plain text and nothing is
//! persisted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::{watch, Mutex, RwLock};
use uuid::Uuid;

use forum_core::{
    Answer, Comment, EntityId, EntityStore, NewEntity, Question, Scope, Snapshot, SortOrder, User,
    UserId, Votable, VoteSet,
};

use crate::backend::{
    AuthProvider, DocumentStorage, FieldUpdate, IdentityProvider, RealtimeFeed, SnapshotStream,
};
use crate::broadcast::RoomManager;
use crate::config::ForumConfig;
use crate::error::BackendError;
use crate::protocol::SnapshotFrame;

/// Minimum password length accepted by the auth side.
pub const MIN_PASSWORD_CHARS: usize = 6;

struct Account {
    user: User,
    /// `None` for accounts created through an identity provider.
    password: Option<String>,
}

struct Shared {
    config: ForumConfig,
    documents: RwLock<EntityStore>,
    /// Bumped under the `documents` write lock.
    sequence: AtomicU64,
    /// Last assigned creation timestamp (ms).
    clock: AtomicU64,
    rooms: RoomManager,
    accounts: RwLock<HashMap<String, Account>>,
    available: AtomicBool,
    /// `Some` while pushes are held back.
    held: Mutex<Option<Vec<(Scope, Arc<Vec<u8>>)>>>,
    appends: AtomicU64,
    updates: AtomicU64,
}

/// Shared backend state. Cheap to clone.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<Shared>,
}

impl MemoryBackend {
    pub fn new(config: ForumConfig) -> Self {
        let rooms = RoomManager::new(config.broadcast_capacity);
        Self {
            inner: Arc::new(Shared {
                config,
                documents: RwLock::new(EntityStore::new()),
                sequence: AtomicU64::new(0),
                clock: AtomicU64::new(0),
                rooms,
                accounts: RwLock::new(HashMap::new()),
                available: AtomicBool::new(true),
                held: Mutex::new(None),
                appends: AtomicU64::new(0),
                updates: AtomicU64::new(0),
            }),
        }
    }

    /// Open a new client session (signed out).
    pub fn connect(&self) -> MemoryClient {
        let (session, _) = watch::channel(None);
        let client = MemoryClient {
            backend: self.clone(),
            client_id: Uuid::new_v4(),
            session: Arc::new(session),
            identities: Arc::new(HashMap::new()),
        };
        log::debug!("Client {} connected", client.client_id);
        client
    }

    pub fn config(&self) -> &ForumConfig {
        &self.inner.config
    }

    /// Simulate an outage: every call fails with `Unavailable` while off.
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
        log::info!("Backend {}", if available { "online" } else { "offline" });
    }

    /// Queue pushes instead of delivering them.
    pub async fn hold_pushes(&self) {
        let mut held = self.inner.held.lock().await;
        if held.is_none() {
            *held = Some(Vec::new());
        }
    }

    /// Deliver every held push in write order and stop holding. Returns
    /// the number of frames released.
    pub async fn release_pushes(&self) -> usize {
        let frames = self.inner.held.lock().await.take().unwrap_or_default();
        let released = frames.len();
        for (scope, encoded) in frames {
            self.deliver(&scope, encoded).await;
        }
        released
    }

    /// Successful appends so far.
    pub fn append_count(&self) -> u64 {
        self.inner.appends.load(Ordering::Relaxed)
    }

    /// Field updates that changed a document.
    pub fn update_count(&self) -> u64 {
        self.inner.updates.load(Ordering::Relaxed)
    }

    /// Current content of a scope as stored server-side.
    pub async fn stored(&self, scope: &Scope) -> Snapshot {
        self.inner.documents.read().await.snapshot(scope)
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.inner.rooms
    }

    fn check_available(&self) -> Result<(), BackendError> {
        if self.inner.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Unavailable("backend offline".to_string()))
        }
    }

    /// Wall-clock milliseconds, forced strictly increasing.
    fn next_timestamp(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let prev = self
            .inner
            .clock
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(prev + 1)
    }

    fn next_sequence(&self) -> u64 {
        self.inner.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn push(&self, frame: SnapshotFrame) -> Result<(), BackendError> {
        let scope = frame.snapshot.scope();
        let encoded = Arc::new(frame.encode()?);

        {
            let mut held = self.inner.held.lock().await;
            if let Some(queue) = held.as_mut() {
                queue.push((scope, encoded));
                return Ok(());
            }
        }

        let latency = self.inner.config.simulated_latency();
        if latency.is_zero() {
            self.deliver(&scope, encoded).await;
        } else {
            let backend = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(latency).await;
                backend.deliver(&scope, encoded).await;
            });
        }
        Ok(())
    }

    /// Publish to the scope's room. A room nobody listens to any more is
    /// dropped; the next subscriber gets the current state as its initial
    /// snapshot instead.
    async fn deliver(&self, scope: &Scope, encoded: Arc<Vec<u8>>) {
        let Some(room) = self.inner.rooms.get(scope).await else {
            return;
        };
        if room.publish(encoded) == 0 && self.inner.rooms.remove_if_idle(scope).await {
            log::debug!("Closed idle room {scope}");
        }
    }
}

impl DocumentStorage for MemoryBackend {
    async fn append(&self, scope: &Scope, entity: NewEntity) -> Result<EntityId, BackendError> {
        self.check_available()?;
        let kind = entity.kind();
        let id = EntityId::generate();

        let frame = {
            let mut docs = self.inner.documents.write().await;
            let created_at = self.next_timestamp();
            let mut snapshot = docs.snapshot(scope);

            match (&mut snapshot, entity) {
                (Snapshot::Questions(questions), NewEntity::Question { draft, author }) => {
                    questions.push(Question {
                        id: id.clone(),
                        title: draft.title,
                        description: draft.description,
                        category: draft.category,
                        tags: draft.tags,
                        author,
                        created_at,
                        upvotes: VoteSet::new(),
                        downvotes: VoteSet::new(),
                    });
                }
                (Snapshot::Answers { question, answers }, NewEntity::Answer { draft, author }) => {
                    if docs.question(question).is_none() {
                        return Err(BackendError::NotFound(question.clone()));
                    }
                    answers.push(Answer {
                        id: id.clone(),
                        question_id: question.clone(),
                        text: draft.text,
                        author,
                        created_at,
                        upvotes: VoteSet::new(),
                        downvotes: VoteSet::new(),
                    });
                }
                (
                    Snapshot::Comments {
                        question,
                        answer,
                        comments,
                    },
                    NewEntity::Comment { draft, author },
                ) => {
                    if docs.answer(question, answer).is_none() {
                        return Err(BackendError::NotFound(answer.clone()));
                    }
                    comments.push(Comment {
                        id: id.clone(),
                        answer_id: answer.clone(),
                        text: draft.text,
                        author,
                        created_at,
                    });
                }
                _ => {
                    return Err(BackendError::Rejected(format!(
                        "cannot append a {kind} to {scope}"
                    )));
                }
            }

            docs.apply(snapshot.ordered(scope.default_order()));
            SnapshotFrame::new(self.next_sequence(), docs.snapshot(scope))
        };

        self.inner.appends.fetch_add(1, Ordering::Relaxed);
        log::info!("Appended {kind} {id} to {scope}");
        self.push(frame).await?;
        Ok(id)
    }

    async fn update_fields(
        &self,
        scope: &Scope,
        id: &EntityId,
        update: FieldUpdate,
    ) -> Result<(), BackendError> {
        self.check_available()?;
        let FieldUpdate::AddVoter { direction, voter } = update;

        let frame = {
            let mut docs = self.inner.documents.write().await;
            let mut snapshot = docs.snapshot(scope);

            let inserted = match &mut snapshot {
                Snapshot::Questions(questions) => questions
                    .iter_mut()
                    .find(|q| &q.id == id)
                    .map(|q| q.record_vote(voter, direction)),
                Snapshot::Answers { answers, .. } => answers
                    .iter_mut()
                    .find(|a| &a.id == id)
                    .map(|a| a.record_vote(voter, direction)),
                Snapshot::Comments { .. } => {
                    return Err(BackendError::Rejected(
                        "comments cannot be voted on".to_string(),
                    ));
                }
            };

            match inserted {
                None => return Err(BackendError::NotFound(id.clone())),
                // Set-union with an existing member: nothing changed, nothing to push.
                Some(false) => return Ok(()),
                Some(true) => {}
            }

            docs.apply(snapshot);
            SnapshotFrame::new(self.next_sequence(), docs.snapshot(scope))
        };

        self.inner.updates.fetch_add(1, Ordering::Relaxed);
        log::debug!("Recorded {direction} vote on {id} in {scope}");
        self.push(frame).await
    }

    async fn fetch(&self, scope: &Scope) -> Result<Snapshot, BackendError> {
        self.check_available()?;
        let docs = self.inner.documents.read().await;
        Ok(docs.snapshot(scope).ordered(scope.default_order()))
    }
}

impl RealtimeFeed for MemoryBackend {
    async fn subscribe(&self, scope: &Scope, order: SortOrder) -> Result<SnapshotStream, BackendError> {
        self.check_available()?;
        let (room, rx) = self.inner.rooms.subscribe(scope).await;

        // Read the sequence under the same lock as the content so the
        // initial frame is consistent with later pushes.
        let initial = {
            let docs = self.inner.documents.read().await;
            SnapshotFrame::new(self.inner.sequence.load(Ordering::SeqCst), docs.snapshot(scope))
        };

        log::debug!("New subscriber on {scope} ({} total)", room.subscriber_count());
        Ok(SnapshotStream::new(scope.clone(), order, initial, rx))
    }
}

/// One client's view of the backend: its own auth session.
#[derive(Clone)]
pub struct MemoryClient {
    backend: MemoryBackend,
    client_id: Uuid,
    session: Arc<watch::Sender<Option<User>>>,
    /// Email each provider's popup signs in as.
    identities: Arc<HashMap<IdentityProvider, String>>,
}

impl MemoryClient {
    /// Let `provider` sign this client in as `email`.
    pub fn with_identity(mut self, provider: IdentityProvider, email: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.identities).insert(provider, email.into());
        self
    }

    pub fn backend(&self) -> &MemoryBackend {
        &self.backend
    }

    pub fn client_id(&self) -> Uuid {
        self.client_id
    }

    fn set_session(&self, user: Option<User>) {
        self.session.send_replace(user);
    }

    fn signed_in(&self) -> Result<User, BackendError> {
        self.current_user().ok_or(BackendError::Unauthenticated)
    }
}

fn check_password_strength(password: &str) -> Result<(), BackendError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(BackendError::Rejected(format!(
            "auth/weak-password: Password should be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}

impl AuthProvider for MemoryClient {
    fn current_user(&self) -> Option<User> {
        self.session.borrow().clone()
    }

    fn watch(&self) -> watch::Receiver<Option<User>> {
        self.session.subscribe()
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<User, BackendError> {
        self.backend.check_available()?;
        if !email.contains('@') {
            return Err(BackendError::Rejected("auth/invalid-email".to_string()));
        }
        check_password_strength(password)?;

        let user = {
            let mut accounts = self.backend.inner.accounts.write().await;
            if accounts.contains_key(email) {
                return Err(BackendError::Rejected(
                    "auth/email-already-in-use".to_string(),
                ));
            }
            let user = User::new(UserId::generate(), email);
            accounts.insert(
                email.to_string(),
                Account {
                    user: user.clone(),
                    password: Some(password.to_string()),
                },
            );
            user
        };

        log::info!("Registered {} as {}", user.email, user.uid);
        self.set_session(Some(user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User, BackendError> {
        self.backend.check_available()?;
        let user = {
            let accounts = self.backend.inner.accounts.read().await;
            accounts
                .get(email)
                .filter(|account| account.password.as_deref() == Some(password))
                .map(|account| account.user.clone())
                .ok_or_else(|| BackendError::Rejected("auth/invalid-credential".to_string()))?
        };
        self.set_session(Some(user.clone()));
        Ok(user)
    }

    async fn sign_in_with_provider(&self, provider: IdentityProvider) -> Result<User, BackendError> {
        self.backend.check_available()?;
        let email = self
            .identities
            .get(&provider)
            .ok_or_else(|| BackendError::Rejected("auth/popup-closed-by-user".to_string()))?;

        let user = {
            let mut accounts = self.backend.inner.accounts.write().await;
            accounts
                .entry(email.clone())
                .or_insert_with(|| {
                    log::info!("Provisioned {email} through {provider}");
                    Account {
                        user: User::new(UserId::generate(), email.as_str()),
                        password: None,
                    }
                })
                .user
                .clone()
        };
        self.set_session(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.set_session(None);
        Ok(())
    }

    async fn reauthenticate(&self, email: &str, password: &str) -> Result<(), BackendError> {
        self.backend.check_available()?;
        let user = self.signed_in()?;
        if user.email != email {
            return Err(BackendError::Rejected("auth/user-mismatch".to_string()));
        }
        let accounts = self.backend.inner.accounts.read().await;
        match accounts.get(email) {
            Some(account) if account.password.as_deref() == Some(password) => Ok(()),
            _ => Err(BackendError::Rejected("auth/wrong-password".to_string())),
        }
    }

    async fn update_password(&self, new_password: &str) -> Result<(), BackendError> {
        self.backend.check_available()?;
        let user = self.signed_in()?;
        check_password_strength(new_password)?;

        let mut accounts = self.backend.inner.accounts.write().await;
        let account = accounts
            .get_mut(&user.email)
            .ok_or(BackendError::Unauthenticated)?;
        account.password = Some(new_password.to_string());
        Ok(())
    }
}
