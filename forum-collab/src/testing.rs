//! Test doubles shared by the unit tests.

use std::sync::Arc;
use tokio::sync::Semaphore;

use forum_core::{EntityId, NewEntity, Scope, Snapshot};

use crate::backend::{DocumentStorage, FieldUpdate};
use crate::error::BackendError;
use crate::memory::MemoryBackend;

/// Storage whose writes wait at a gate until [`GatedStorage::open`].
/// Reads go straight through.
#[derive(Clone)]
pub struct GatedStorage {
    inner: MemoryBackend,
    gate: Arc<Semaphore>,
}

impl GatedStorage {
    pub fn closed(inner: MemoryBackend) -> Self {
        Self {
            inner,
            gate: Arc::new(Semaphore::new(0)),
        }
    }

    pub fn open(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }

    async fn pass(&self) -> Result<(), BackendError> {
        self.gate
            .acquire()
            .await
            .map(drop)
            .map_err(|_| BackendError::Unavailable("gate closed".into()))
    }
}

impl DocumentStorage for GatedStorage {
    async fn append(&self, scope: &Scope, entity: NewEntity) -> Result<EntityId, BackendError> {
        self.pass().await?;
        self.inner.append(scope, entity).await
    }

    async fn update_fields(
        &self,
        scope: &Scope,
        id: &EntityId,
        update: FieldUpdate,
    ) -> Result<(), BackendError> {
        self.pass().await?;
        self.inner.update_fields(scope, id, update).await
    }

    async fn fetch(&self, scope: &Scope) -> Result<Snapshot, BackendError> {
        self.inner.fetch(scope).await
    }
}
