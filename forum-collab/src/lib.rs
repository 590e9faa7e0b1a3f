//! # forum-collab: Collaborator boundary and controllers for the forum client
//!
//! Consumes the managed backend (auth, document storage, realtime feed)
//! through three traits and keeps a shared [`EntityStore`](forum_core::EntityStore)
//! current from pushed snapshots.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  SnapshotStream   ┌─────────────┐  apply   ┌─────────────┐
//! │ RealtimeFeed │ ────────────────► │ SyncAdapter │ ───────► │ SharedStore │
//! └──────────────┘  (bincode frames) └─────────────┘          └──────┬──────┘
//!        ▲                                                           │ read
//!        │ push                                                      ▼
//! ┌──────┴──────────┐   append / update_fields   ┌──────────────────────────┐
//! │ DocumentStorage │ ◄───────────────────────── │ Vote / Composition       │
//! └─────────────────┘                            │ controllers              │
//! ┌──────────────┐   watch                       └────────────┬─────────────┘
//! │ AuthProvider │ ─────────► SessionContext ─────────────────┘
//! └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`backend`]: Collaborator traits and the snapshot stream
//! - [`protocol`]: Snapshot frame encoding
//! - [`broadcast`]: Per-scope fan-out rooms
//! - [`memory`]: In-memory backend for tests and the demo
//! - [`sync`]: Realtime Sync Adapter and question thread view
//! - [`session`]: Injected session context
//! - [`votes`], [`compose`], [`account`], [`profile`]: Controllers

pub mod account;
pub mod backend;
pub mod broadcast;
pub mod compose;
pub mod config;
pub mod error;
pub mod memory;
pub mod profile;
pub mod protocol;
pub mod session;
pub mod sync;
#[cfg(test)]
mod testing;
pub mod votes;

// Re-exports for convenience
pub use account::AccountController;
pub use backend::{
    AuthProvider, DocumentStorage, FieldUpdate, IdentityProvider, RealtimeFeed, SnapshotStream,
};
pub use broadcast::{BroadcastStats, RoomManager, ScopeRoom};
pub use compose::{CompositionController, Submission, SubmissionState};
pub use config::ForumConfig;
pub use error::BackendError;
pub use memory::{MemoryBackend, MemoryClient};
pub use profile::{LiveProfile, ProfileData, ProfileLoader};
pub use protocol::{ProtocolError, SnapshotFrame};
pub use session::SessionContext;
pub use sync::{shared_store, SharedStore, Subscription, SyncAdapter, ThreadView};
pub use votes::{VoteController, VoteOutcome};
