//! Profile page loader.
//!
//! [`ProfileLoader::load`] is a one-shot read. [`ProfileLoader::live`]
//! follows the questions scope and rebuilds the profile on every push,
//! re-reading each question's answers once per push.

use futures_util::future::join_all;

use forum_core::{EntityStore, ForumError, ProfileSummary, Scope, Snapshot, SortOrder, User};

use crate::backend::{DocumentStorage, RealtimeFeed, SnapshotStream};
use crate::session::SessionContext;

/// Point-in-time copy of everything the profile page shows.
#[derive(Debug)]
pub struct ProfileData {
    user: User,
    store: EntityStore,
}

impl ProfileData {
    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn summary(&self) -> ProfileSummary<'_> {
        ProfileSummary::compute(&self.store, &self.user.uid)
    }
}

pub struct ProfileLoader<S> {
    storage: S,
    session: SessionContext,
}

impl<S: DocumentStorage> ProfileLoader<S> {
    pub fn new(storage: S, session: SessionContext) -> Self {
        Self { storage, session }
    }

    /// Fetch all questions, then every question's answers concurrently.
    pub async fn load(&self) -> Result<ProfileData, ForumError> {
        let user = self.session.require_user()?;
        let questions = self.fetch(&Scope::Questions).await?;
        self.assemble(user, questions).await
    }

    /// Follow the questions scope. Each pushed snapshot yields a fresh
    /// [`ProfileData`] from [`LiveProfile::next`].
    pub async fn live<F: RealtimeFeed>(
        &self,
        feed: &F,
    ) -> Result<LiveProfile<'_, S>, ForumError> {
        let user = self.session.require_user()?;
        let questions = feed
            .subscribe(&Scope::Questions, SortOrder::NewestFirst)
            .await
            .map_err(|e| {
                log::warn!("Subscribing to {} failed: {e}", Scope::Questions);
                ForumError::from(e)
            })?;
        Ok(LiveProfile {
            loader: self,
            user,
            questions,
        })
    }

    async fn assemble(&self, user: User, questions: Snapshot) -> Result<ProfileData, ForumError> {
        let answer_scopes: Vec<Scope> = match &questions {
            Snapshot::Questions(questions) => questions
                .iter()
                .map(|q| Scope::answers(q.id.clone()))
                .collect(),
            _ => Vec::new(),
        };

        let mut store = EntityStore::new();
        store.apply(questions);
        for answers in join_all(answer_scopes.iter().map(|scope| self.fetch(scope))).await {
            store.apply(answers?);
        }

        log::debug!(
            "Loaded profile of {} across {} questions",
            user.email,
            answer_scopes.len()
        );
        Ok(ProfileData { user, store })
    }

    async fn fetch(&self, scope: &Scope) -> Result<Snapshot, ForumError> {
        self.storage.fetch(scope).await.map_err(|e| {
            log::warn!("Fetching {scope} failed: {e}");
            ForumError::from(e)
        })
    }
}

/// Profile kept current by the questions feed.
pub struct LiveProfile<'a, S> {
    loader: &'a ProfileLoader<S>,
    user: User,
    questions: SnapshotStream,
}

impl<S: DocumentStorage> LiveProfile<'_, S> {
    /// Profile for the next questions snapshot; the first call returns the
    /// current one. `None` once the feed has closed.
    pub async fn next(&mut self) -> Option<Result<ProfileData, ForumError>> {
        let questions = self.questions.next().await?;
        Some(self.loader.assemble(self.user.clone(), questions).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::AuthProvider;
    use crate::compose::CompositionController;
    use crate::config::ForumConfig;
    use crate::memory::MemoryBackend;
    use forum_core::{AnswerDraft, QuestionDraft};
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_requires_session() {
        let backend = MemoryBackend::new(ForumConfig::for_testing());
        let client = backend.connect();
        let loader = ProfileLoader::new(backend.clone(), SessionContext::init(&client));
        assert!(matches!(loader.load().await, Err(ForumError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_collects_answers_across_questions() {
        let backend = MemoryBackend::new(ForumConfig::for_testing());
        let alice = backend.connect();
        let bob = backend.connect();
        alice.sign_up("alice@example.com", "hunter22").await.unwrap();
        bob.sign_up("bob@example.com", "hunter22").await.unwrap();

        let as_alice = CompositionController::new(backend.clone(), SessionContext::init(&alice));
        let as_bob = CompositionController::new(backend.clone(), SessionContext::init(&bob));

        let q1 = as_alice
            .submit_question(QuestionDraft::new("First question", "Some description"))
            .await
            .unwrap();
        let q2 = as_bob
            .submit_question(QuestionDraft::new("Second question", "Some description"))
            .await
            .unwrap();
        as_alice
            .submit_answer(&q2, AnswerDraft::new("Alice answers Bob"))
            .await
            .unwrap();
        as_bob
            .submit_answer(&q1, AnswerDraft::new("Bob answers Alice"))
            .await
            .unwrap();

        let profile = ProfileLoader::new(backend.clone(), SessionContext::init(&alice))
            .load()
            .await
            .unwrap();
        let summary = profile.summary();
        assert_eq!(profile.user().email, "alice@example.com");
        assert_eq!(summary.questions.len(), 1);
        assert_eq!(summary.answers.len(), 1);
        assert_eq!(summary.answers[0].question_id, &q2);
        assert_eq!(summary.answers[0].question_title, "Second question");
        assert_eq!(summary.total_upvotes, 0);
    }

    #[tokio::test]
    async fn test_offline_is_transient() {
        let backend = MemoryBackend::new(ForumConfig::for_testing());
        let client = backend.connect();
        client.sign_up("kim@example.com", "hunter22").await.unwrap();
        backend.set_available(false);

        let loader = ProfileLoader::new(backend.clone(), SessionContext::init(&client));
        assert!(loader.load().await.unwrap_err().is_transient());
    }

    #[tokio::test]
    async fn test_live_profile_follows_new_questions() {
        let backend = MemoryBackend::new(ForumConfig::for_testing());
        let client = backend.connect();
        client.sign_up("kim@example.com", "hunter22").await.unwrap();
        let session = SessionContext::init(&client);
        let compose = CompositionController::new(backend.clone(), session.clone());
        compose
            .submit_question(QuestionDraft::new("First question", "Some description"))
            .await
            .unwrap();

        let loader = ProfileLoader::new(backend.clone(), session);
        let mut live = loader.live(&backend).await.unwrap();
        let first = live.next().await.unwrap().unwrap();
        assert_eq!(first.summary().questions.len(), 1);

        compose
            .submit_question(QuestionDraft::new("Second question", "Some description"))
            .await
            .unwrap();
        let second = timeout(Duration::from_secs(2), live.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let summary = second.summary();
        assert_eq!(summary.questions.len(), 2);
        assert_eq!(summary.questions[0].title, "Second question");
    }

    #[tokio::test]
    async fn test_live_requires_session() {
        let backend = MemoryBackend::new(ForumConfig::for_testing());
        let client = backend.connect();
        let loader = ProfileLoader::new(backend.clone(), SessionContext::init(&client));
        assert!(matches!(loader.live(&backend).await, Err(ForumError::Unauthorized)));
    }
}
