//! Vote sets and the idempotent voting policy.
//!
//! Each question and answer carries two independent sets of voter ids.
//! Casting a vote is a set insert: repeating it never grows the set, and
//! casts from different voters commute, so concurrent votes merge without
//! lost updates.
//!
//! Votes are never retracted, and nothing removes a voter from the
//! opposite set when they vote the other way. A voter may therefore hold
//! an upvote and a downvote on the same entity at the same time. That is
//! the observed product behavior and is kept as-is.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::id::{EntityId, UserId};
use crate::model::{Answer, Question};
use crate::scope::Scope;

/// Vote direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn opposite(self) -> Self {
        match self {
            VoteDirection::Up => VoteDirection::Down,
            VoteDirection::Down => VoteDirection::Up,
        }
    }
}

impl fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteDirection::Up => f.write_str("up"),
            VoteDirection::Down => f.write_str("down"),
        }
    }
}

/// Set of voter ids for one direction on one entity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteSet(BTreeSet<UserId>);

impl VoteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set-union insert. Returns `false` if the voter was already present.
    pub fn insert(&mut self, voter: UserId) -> bool {
        self.0.insert(voter)
    }

    pub fn contains(&self, voter: &UserId) -> bool {
        self.0.contains(voter)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserId> {
        self.0.iter()
    }
}

impl FromIterator<UserId> for VoteSet {
    fn from_iter<I: IntoIterator<Item = UserId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Up/down counts shown next to the vote buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteTally {
    pub up: usize,
    pub down: usize,
}

impl VoteTally {
    pub fn score(&self) -> i64 {
        self.up as i64 - self.down as i64
    }
}

/// Anything carrying up/down vote sets.
pub trait Votable {
    fn id(&self) -> &EntityId;
    fn votes(&self, direction: VoteDirection) -> &VoteSet;
    fn votes_mut(&mut self, direction: VoteDirection) -> &mut VoteSet;

    fn has_voted(&self, voter: &UserId, direction: VoteDirection) -> bool {
        self.votes(direction).contains(voter)
    }

    fn tally(&self) -> VoteTally {
        VoteTally {
            up: self.votes(VoteDirection::Up).len(),
            down: self.votes(VoteDirection::Down).len(),
        }
    }

    /// Insert `voter` into the `direction` set. The opposite set is left
    /// untouched.
    fn record_vote(&mut self, voter: UserId, direction: VoteDirection) -> bool {
        self.votes_mut(direction).insert(voter)
    }
}

impl Votable for Question {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn votes(&self, direction: VoteDirection) -> &VoteSet {
        match direction {
            VoteDirection::Up => &self.upvotes,
            VoteDirection::Down => &self.downvotes,
        }
    }

    fn votes_mut(&mut self, direction: VoteDirection) -> &mut VoteSet {
        match direction {
            VoteDirection::Up => &mut self.upvotes,
            VoteDirection::Down => &mut self.downvotes,
        }
    }
}

impl Votable for Answer {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn votes(&self, direction: VoteDirection) -> &VoteSet {
        match direction {
            VoteDirection::Up => &self.upvotes,
            VoteDirection::Down => &self.downvotes,
        }
    }

    fn votes_mut(&mut self, direction: VoteDirection) -> &mut VoteSet {
        match direction {
            VoteDirection::Up => &mut self.upvotes,
            VoteDirection::Down => &mut self.downvotes,
        }
    }
}

/// The entity a vote is cast on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteTarget {
    Question(EntityId),
    Answer { question: EntityId, answer: EntityId },
}

impl VoteTarget {
    pub fn id(&self) -> &EntityId {
        match self {
            VoteTarget::Question(id) => id,
            VoteTarget::Answer { answer, .. } => answer,
        }
    }

    /// Collection the target document lives in.
    pub fn scope(&self) -> Scope {
        match self {
            VoteTarget::Question(_) => Scope::Questions,
            VoteTarget::Answer { question, .. } => Scope::answers(question.clone()),
        }
    }
}

/// What the vote controller should do for a cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VotePlan {
    /// Voter already in the target set: succeed without a backend call.
    AlreadyCast,
    /// Send a set-union update to the backend.
    Cast,
}

pub fn plan_vote(target: &dyn Votable, voter: &UserId, direction: VoteDirection) -> VotePlan {
    if target.has_voted(voter, direction) {
        VotePlan::AlreadyCast
    } else {
        VotePlan::Cast
    }
}
