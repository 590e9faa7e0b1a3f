//! Scopes and snapshots.
//!
//! A scope names one collection in the document hierarchy:
//!
//! ```text
//! questions
//! questions/{q}/answers
//! questions/{q}/answers/{a}/comments
//! ```
//!
//! A snapshot is the complete, ordered content of one scope at one point
//! in time. Every realtime push carries a full snapshot, so the receiver
//! never merges: the newest snapshot replaces the previous one.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::EntityId;
use crate::model::{Answer, Comment, Question};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// All questions.
    Questions,
    /// Answers of one question.
    Answers { question: EntityId },
    /// Comments of one answer.
    Comments { question: EntityId, answer: EntityId },
}

impl Scope {
    pub fn answers(question: impl Into<EntityId>) -> Self {
        Scope::Answers {
            question: question.into(),
        }
    }

    pub fn comments(question: impl Into<EntityId>, answer: impl Into<EntityId>) -> Self {
        Scope::Comments {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Collection path, e.g. `questions/q1/answers`.
    pub fn path(&self) -> String {
        match self {
            Scope::Questions => "questions".to_string(),
            Scope::Answers { question } => format!("questions/{question}/answers"),
            Scope::Comments { question, answer } => {
                format!("questions/{question}/answers/{answer}/comments")
            }
        }
    }

    /// The feed lists newest questions first; threads read oldest first.
    pub fn default_order(&self) -> SortOrder {
        match self {
            Scope::Questions => SortOrder::NewestFirst,
            Scope::Answers { .. } | Scope::Comments { .. } => SortOrder::OldestFirst,
        }
    }

    /// Scope holding the document that owns this collection.
    pub fn parent(&self) -> Option<Scope> {
        match self {
            Scope::Questions => None,
            Scope::Answers { .. } => Some(Scope::Questions),
            Scope::Comments { question, .. } => Some(Scope::answers(question.clone())),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Ordering by creation timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    OldestFirst,
    NewestFirst,
}

/// Full content of one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Snapshot {
    Questions(Vec<Question>),
    Answers {
        question: EntityId,
        answers: Vec<Answer>,
    },
    Comments {
        question: EntityId,
        answer: EntityId,
        comments: Vec<Comment>,
    },
}

impl Snapshot {
    /// An empty snapshot for `scope`.
    pub fn empty(scope: &Scope) -> Self {
        match scope {
            Scope::Questions => Snapshot::Questions(Vec::new()),
            Scope::Answers { question } => Snapshot::Answers {
                question: question.clone(),
                answers: Vec::new(),
            },
            Scope::Comments { question, answer } => Snapshot::Comments {
                question: question.clone(),
                answer: answer.clone(),
                comments: Vec::new(),
            },
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            Snapshot::Questions(_) => Scope::Questions,
            Snapshot::Answers { question, .. } => Scope::answers(question.clone()),
            Snapshot::Comments {
                question, answer, ..
            } => Scope::comments(question.clone(), answer.clone()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Snapshot::Questions(questions) => questions.len(),
            Snapshot::Answers { answers, .. } => answers.len(),
            Snapshot::Comments { comments, .. } => comments.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a document with `id` is part of this snapshot.
    pub fn contains(&self, id: &EntityId) -> bool {
        match self {
            Snapshot::Questions(questions) => questions.iter().any(|q| &q.id == id),
            Snapshot::Answers { answers, .. } => answers.iter().any(|a| &a.id == id),
            Snapshot::Comments { comments, .. } => comments.iter().any(|c| &c.id == id),
        }
    }

    /// Sort by creation timestamp. Ties keep their relative order.
    pub fn ordered(mut self, order: SortOrder) -> Self {
        match &mut self {
            Snapshot::Questions(questions) => sort_by_created(questions, order, |q| q.created_at),
            Snapshot::Answers { answers, .. } => sort_by_created(answers, order, |a| a.created_at),
            Snapshot::Comments { comments, .. } => {
                sort_by_created(comments, order, |c| c.created_at)
            }
        }
        self
    }
}

fn sort_by_created<T>(items: &mut [T], order: SortOrder, created_at: impl Fn(&T) -> u64) {
    match order {
        SortOrder::OldestFirst => items.sort_by_key(|item| created_at(item)),
        SortOrder::NewestFirst => items.sort_by_key(|item| std::cmp::Reverse(created_at(item))),
    }
}
