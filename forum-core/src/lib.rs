//! # forum-core: Domain model for the Q&A forum client
//!
//! Synchronous, I/O-free building blocks shared by the controllers in
//! `forum-collab`:
//!
//! ```text
//!   realtime push                    user intent
//!        │                                │
//!        ▼                                ▼
//! ┌──────────────┐   reads     ┌──────────────────┐
//! │ EntityStore  │ ◄────────── │ vote / validate  │
//! │ (snapshots)  │             │ (policy)         │
//! └──────────────┘             └──────────────────┘
//!        │
//!        ▼
//!  feed · profile · preview   (read models)
//! ```
//!
//! ## Modules
//!
//! - [`model`]: Questions, answers, comments, drafts
//! - [`vote`]: Vote sets, idempotent voting policy
//! - [`scope`]: Collection scopes and full-scope snapshots
//! - [`store`]: Latest-snapshot-wins entity store
//! - [`validation`]: Form rules
//! - [`feed`], [`profile`], [`preview`]: Read models for the views

pub mod error;
pub mod feed;
pub mod id;
pub mod model;
pub mod preview;
pub mod profile;
pub mod scope;
pub mod store;
pub mod validation;
pub mod vote;

// Re-exports for convenience
pub use error::ForumError;
pub use feed::{FeedPage, FeedQuery, DEFAULT_PAGE_SIZE};
pub use id::{EntityId, UserId};
pub use model::{
    Answer, AnswerDraft, Category, Comment, CommentDraft, EntityRef, NewEntity, ParseLabelError,
    Question, QuestionDraft, Tag, User,
};
pub use preview::{preview, ExpandedSet, Preview, ANSWER_PREVIEW_CHARS, COMMENT_PREVIEW_CHARS};
pub use profile::{AnsweredQuestion, ProfileSummary};
pub use scope::{Scope, Snapshot, SortOrder};
pub use store::EntityStore;
pub use validation::{Field, Validate, ValidationError};
pub use vote::{plan_vote, Votable, VoteDirection, VotePlan, VoteSet, VoteTally, VoteTarget};
