use tracing::debug;
use uuid::Uuid;

use crate::models::{EntityId, NodeKind};

/// A server-side node removed locally and not yet deleted remotely.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Tombstone {
    pub kind: NodeKind,
    pub id: Uuid,
}

/// Deletions made since the last save, in the order they happened.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ChangeTracker {
    tombstones: Vec<Tombstone>,
}

impl ChangeTracker {
    /// Pending ids were never persisted, so there is nothing to delete remotely.
    pub fn record(&mut self, kind: NodeKind, id: EntityId) {
        match id.persisted() {
            Some(id) => self.record_persisted(kind, id),
            None => debug!(%kind, %id, "dropped unsaved node; no tombstone"),
        }
    }

    pub fn record_persisted(&mut self, kind: NodeKind, id: Uuid) {
        debug!(%kind, %id, "tombstone recorded");
        self.tombstones.push(Tombstone { kind, id });
    }

    pub fn tombstones(&self) -> &[Tombstone] {
        &self.tombstones
    }

    pub fn is_empty(&self) -> bool {
        self.tombstones.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tombstones.len()
    }

    /// Hand every tombstone to the caller and clear the tracker.
    pub fn take(&mut self) -> Vec<Tombstone> {
        std::mem::take(&mut self.tombstones)
    }
}
