//! Forum documents: questions, answers and comments.
//!
//! Ownership is strictly hierarchical:
//!
//! ```text
//! Question ──┬── Answer ──┬── Comment
//!            │            └── Comment
//!            └── Answer ───── Comment
//! ```
//!
//! Documents are append-only. After creation the only mutation is a voter
//! being inserted into an up/down vote set (questions and answers only).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::id::{EntityId, UserId};
use crate::vote::VoteSet;

/// An authenticated user, as reported by the auth collaborator.
///
/// Also stored on every document as its author.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub uid: UserId,
    pub email: String,
}

impl User {
    pub fn new(uid: impl Into<UserId>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
        }
    }
}

/// A label that did not match any known category or tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLabelError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseLabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for ParseLabelError {}

// ───────────────────────────────────────────────────────────────────
// Category & tags
// ───────────────────────────────────────────────────────────────────

/// Question category (fixed set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Category {
    #[default]
    General,
    Programming,
    Science,
    Math,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::General,
        Category::Programming,
        Category::Science,
        Category::Math,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::General => "General",
            Category::Programming => "Programming",
            Category::Science => "Science",
            Category::Math => "Math",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ParseLabelError {
                kind: "category",
                value: s.to_string(),
            })
    }
}

/// Question tag (fixed vocabulary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tag {
    React,
    Firebase,
    JavaScript,
    #[serde(rename = "CSS")]
    Css,
    #[serde(rename = "HTML")]
    Html,
    Python,
    Other,
}

impl Tag {
    pub const ALL: [Tag; 7] = [
        Tag::React,
        Tag::Firebase,
        Tag::JavaScript,
        Tag::Css,
        Tag::Html,
        Tag::Python,
        Tag::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::React => "React",
            Tag::Firebase => "Firebase",
            Tag::JavaScript => "JavaScript",
            Tag::Css => "CSS",
            Tag::Html => "HTML",
            Tag::Python => "Python",
            Tag::Other => "Other",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tag::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseLabelError {
                kind: "tag",
                value: s.to_string(),
            })
    }
}

// ───────────────────────────────────────────────────────────────────
// Documents
// ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub tags: BTreeSet<Tag>,
    pub author: User,
    /// Milliseconds since the Unix epoch, assigned by the backend.
    pub created_at: u64,
    pub upvotes: VoteSet,
    pub downvotes: VoteSet,
}

/// An answer. Belongs to exactly one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: EntityId,
    pub question_id: EntityId,
    pub text: String,
    pub author: User,
    pub created_at: u64,
    pub upvotes: VoteSet,
    pub downvotes: VoteSet,
}

/// A comment on an answer. Comments cannot be voted on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: EntityId,
    pub answer_id: EntityId,
    pub text: String,
    pub author: User,
    pub created_at: u64,
}

/// Borrowed view of any stored document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityRef<'a> {
    Question(&'a Question),
    Answer(&'a Answer),
    Comment(&'a Comment),
}

impl<'a> EntityRef<'a> {
    pub fn id(&self) -> &'a EntityId {
        match self {
            EntityRef::Question(q) => &q.id,
            EntityRef::Answer(a) => &a.id,
            EntityRef::Comment(c) => &c.id,
        }
    }

    pub fn author(&self) -> &'a User {
        match self {
            EntityRef::Question(q) => &q.author,
            EntityRef::Answer(a) => &a.author,
            EntityRef::Comment(c) => &c.author,
        }
    }

    pub fn created_at(&self) -> u64 {
        match self {
            EntityRef::Question(q) => q.created_at,
            EntityRef::Answer(a) => a.created_at,
            EntityRef::Comment(c) => c.created_at,
        }
    }

    pub fn as_question(&self) -> Option<&'a Question> {
        match self {
            EntityRef::Question(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_answer(&self) -> Option<&'a Answer> {
        match self {
            EntityRef::Answer(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_comment(&self) -> Option<&'a Comment> {
        match self {
            EntityRef::Comment(c) => Some(c),
            _ => None,
        }
    }
}

// ───────────────────────────────────────────────────────────────────
// Drafts (user input before submission)
// ───────────────────────────────────────────────────────────────────

/// Question form input.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub tags: BTreeSet<Tag>,
}

impl QuestionDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    /// Checkbox toggle: adds the tag if absent, removes it otherwise.
    pub fn toggle_tag(&mut self, tag: Tag) {
        if !self.tags.remove(&tag) {
            self.tags.insert(tag);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnswerDraft {
    pub text: String,
}

impl AnswerDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommentDraft {
    pub text: String,
}

impl CommentDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A validated document awaiting append. The backend assigns the id and
/// creation timestamp; vote sets always start empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NewEntity {
    Question { draft: QuestionDraft, author: User },
    Answer { draft: AnswerDraft, author: User },
    Comment { draft: CommentDraft, author: User },
}

impl NewEntity {
    pub fn author(&self) -> &User {
        match self {
            NewEntity::Question { author, .. }
            | NewEntity::Answer { author, .. }
            | NewEntity::Comment { author, .. } => author,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NewEntity::Question { .. } => "question",
            NewEntity::Answer { .. } => "answer",
            NewEntity::Comment { .. } => "comment",
        }
    }
}
