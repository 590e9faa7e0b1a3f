//! Composition Controller: validate and submit questions, answers and
//! comments.
//!
//! Submissions are appended through the storage collaborator only. The new
//! document reaches the Entity Store with the next pushed snapshot, never
//! by a local insert, so callers must expect a short window where a
//! successful submit is not yet visible.

use forum_core::{
    AnswerDraft, CommentDraft, EntityId, ForumError, NewEntity, QuestionDraft, Scope, User,
    Validate,
};

use crate::backend::DocumentStorage;
use crate::session::SessionContext;

/// Lifecycle of one form submission.
///
/// `Idle -> Validating -> Submitting -> {Succeeded, Failed}`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded(EntityId),
    Failed(ForumError),
}

/// A form: the user's draft plus where its submission stands.
///
/// Success clears the draft; failure keeps it so the user can fix it.
#[derive(Debug, Clone, Default)]
pub struct Submission<D> {
    draft: D,
    state: SubmissionState,
}

impl<D: Validate + Clone + Default> Submission<D> {
    pub fn new(draft: D) -> Self {
        Self {
            draft,
            state: SubmissionState::Idle,
        }
    }

    pub fn draft(&self) -> &D {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut D {
        &mut self.draft
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Error to show inline, if the last submission failed.
    pub fn error(&self) -> Option<&ForumError> {
        match &self.state {
            SubmissionState::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.state == SubmissionState::Submitting
    }

    /// Back to `Idle`, keeping the draft.
    pub fn reset(&mut self) {
        self.state = SubmissionState::Idle;
    }

    fn begin(&mut self) -> Result<D, ForumError> {
        self.state = SubmissionState::Validating;
        if let Err(e) = self.draft.validate() {
            let e = ForumError::from(e);
            self.state = SubmissionState::Failed(e.clone());
            return Err(e);
        }
        self.state = SubmissionState::Submitting;
        Ok(self.draft.clone())
    }

    fn finish(&mut self, result: Result<EntityId, ForumError>) -> Result<EntityId, ForumError> {
        match &result {
            Ok(id) => {
                self.draft = D::default();
                self.state = SubmissionState::Succeeded(id.clone());
            }
            Err(e) => self.state = SubmissionState::Failed(e.clone()),
        }
        result
    }
}

pub struct CompositionController<S> {
    storage: S,
    session: SessionContext,
}

impl<S: DocumentStorage> CompositionController<S> {
    pub fn new(storage: S, session: SessionContext) -> Self {
        Self { storage, session }
    }

    pub async fn submit_question(&self, draft: QuestionDraft) -> Result<EntityId, ForumError> {
        self.submit(Scope::Questions, draft, |draft, author| NewEntity::Question {
            draft,
            author,
        })
        .await
    }

    pub async fn submit_answer(
        &self,
        question: &EntityId,
        draft: AnswerDraft,
    ) -> Result<EntityId, ForumError> {
        self.submit(Scope::answers(question.clone()), draft, |draft, author| {
            NewEntity::Answer { draft, author }
        })
        .await
    }

    pub async fn submit_comment(
        &self,
        question: &EntityId,
        answer: &EntityId,
        draft: CommentDraft,
    ) -> Result<EntityId, ForumError> {
        self.submit(
            Scope::comments(question.clone(), answer.clone()),
            draft,
            |draft, author| NewEntity::Comment { draft, author },
        )
        .await
    }

    pub async fn submit_question_form(
        &self,
        form: &mut Submission<QuestionDraft>,
    ) -> Result<EntityId, ForumError> {
        let draft = form.begin()?;
        let result = self.submit_question(draft).await;
        form.finish(result)
    }

    pub async fn submit_answer_form(
        &self,
        question: &EntityId,
        form: &mut Submission<AnswerDraft>,
    ) -> Result<EntityId, ForumError> {
        let draft = form.begin()?;
        let result = self.submit_answer(question, draft).await;
        form.finish(result)
    }

    pub async fn submit_comment_form(
        &self,
        question: &EntityId,
        answer: &EntityId,
        form: &mut Submission<CommentDraft>,
    ) -> Result<EntityId, ForumError> {
        let draft = form.begin()?;
        let result = self.submit_comment(question, answer, draft).await;
        form.finish(result)
    }

    async fn submit<D: Validate>(
        &self,
        scope: Scope,
        draft: D,
        build: impl FnOnce(D, User) -> NewEntity,
    ) -> Result<EntityId, ForumError> {
        draft.validate()?;
        let author = self.session.require_user()?;
        let entity = build(draft, author);
        let kind = entity.kind();

        match self.storage.append(&scope, entity).await {
            Ok(id) => {
                log::info!("Submitted {kind} {id}");
                Ok(id)
            }
            Err(e) => {
                log::warn!("Submitting {kind} to {scope} failed: {e}");
                Err(e.into())
            }
        }
    }
}
