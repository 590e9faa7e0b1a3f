//! In-memory projection of the documents pushed by the realtime feed.
//!
//! The store holds the latest snapshot of every scope it has seen. Applying
//! a snapshot replaces that scope's collection wholesale (last snapshot
//! wins); there is no merge. Scopes that were never applied read as empty.
//!
//! The store itself is not synchronized. A single writer (the sync
//! adapter's pump task) applies snapshots; controllers only read.

use std::collections::HashMap;

use crate::id::EntityId;
use crate::model::{Answer, Comment, EntityRef, Question};
use crate::scope::{Scope, Snapshot};
use crate::vote::{Votable, VoteTarget};

#[derive(Debug, Default)]
pub struct EntityStore {
    questions: Vec<Question>,
    /// question id → answers
    answers: HashMap<EntityId, Vec<Answer>>,
    /// answer id → comments
    comments: HashMap<EntityId, Vec<Comment>>,
    /// Number of snapshots applied per scope.
    revisions: HashMap<Scope, u64>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the collection of the snapshot's scope.
    pub fn apply(&mut self, snapshot: Snapshot) {
        let scope = snapshot.scope();
        log::debug!("Applying snapshot of {scope} ({} documents)", snapshot.len());

        match snapshot {
            Snapshot::Questions(questions) => self.questions = questions,
            Snapshot::Answers { question, answers } => {
                self.answers.insert(question, answers);
            }
            Snapshot::Comments {
                answer, comments, ..
            } => {
                self.comments.insert(answer, comments);
            }
        }

        *self.revisions.entry(scope).or_insert(0) += 1;
    }

    /// Look up any document by id.
    pub fn get(&self, id: &EntityId) -> Option<EntityRef<'_>> {
        if let Some(q) = self.questions.iter().find(|q| &q.id == id) {
            return Some(EntityRef::Question(q));
        }
        if let Some(a) = self.answers.values().flatten().find(|a| &a.id == id) {
            return Some(EntityRef::Answer(a));
        }
        self.comments
            .values()
            .flatten()
            .find(|c| &c.id == id)
            .map(EntityRef::Comment)
    }

    /// All questions in the order of the last snapshot.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, id: &EntityId) -> Option<&Question> {
        self.questions.iter().find(|q| &q.id == id)
    }

    /// Answers of a question; empty if the scope was never applied.
    pub fn answers(&self, question: &EntityId) -> &[Answer] {
        self.answers.get(question).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn answer(&self, question: &EntityId, answer: &EntityId) -> Option<&Answer> {
        self.answers(question).iter().find(|a| &a.id == answer)
    }

    /// Comments of an answer; empty if the scope was never applied.
    pub fn comments(&self, answer: &EntityId) -> &[Comment] {
        self.comments.get(answer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The question or answer a vote would land on.
    pub fn votable(&self, target: &VoteTarget) -> Option<&dyn Votable> {
        match target {
            VoteTarget::Question(id) => self.question(id).map(|q| q as &dyn Votable),
            VoteTarget::Answer { question, answer } => {
                self.answer(question, answer).map(|a| a as &dyn Votable)
            }
        }
    }

    /// Owned copy of a scope's current collection.
    pub fn snapshot(&self, scope: &Scope) -> Snapshot {
        match scope {
            Scope::Questions => Snapshot::Questions(self.questions.clone()),
            Scope::Answers { question } => Snapshot::Answers {
                question: question.clone(),
                answers: self.answers(question).to_vec(),
            },
            Scope::Comments { question, answer } => Snapshot::Comments {
                question: question.clone(),
                answer: answer.clone(),
                comments: self.comments(answer).to_vec(),
            },
        }
    }

    /// Snapshots applied to `scope` so far (0 = never seen).
    pub fn revision(&self, scope: &Scope) -> u64 {
        self.revisions.get(scope).copied().unwrap_or(0)
    }

    /// Whether at least one snapshot of `scope` has arrived.
    pub fn is_loaded(&self, scope: &Scope) -> bool {
        self.revisions.contains_key(scope)
    }

    /// Every answer held, across all questions.
    pub fn all_answers(&self) -> impl Iterator<Item = &Answer> {
        self.answers.values().flatten()
    }
}
