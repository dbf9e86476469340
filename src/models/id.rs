use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

const TMP_PREFIX: &str = "tmp-";

/// Canonical textual length of a hyphenated UUID (8-4-4-4-12).
const HYPHENATED_LEN: usize = 36;

/// Returns true unless `id` is a canonical hyphenated UUID (case-insensitive).
///
/// Only the 8-4-4-4-12 form counts as permanent. `uuid` also accepts the simple,
/// braced and urn forms, which the persistence service never emits.
pub(crate) fn is_temporary(id: &str) -> bool {
    if id.len() != HYPHENATED_LEN {
        return true;
    }
    Uuid::try_parse(id).is_err()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum IdError {
    #[error("malformed identifier: {0:?}")]
    Malformed(String),
    #[error("expected a server identifier, got temporary id {0:?}")]
    NotPersisted(String),
}

/// Client-minted placeholder for a node the server has not seen yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct PendingId(pub u64);

impl fmt::Display for PendingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TMP_PREFIX}{}", self.0)
    }
}

/// Identifier of a node the editor can create locally (section, subsection, element).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum EntityId {
    Pending(PendingId),
    Persisted(Uuid),
}

impl EntityId {
    pub fn is_pending(&self) -> bool {
        matches!(self, EntityId::Pending(_))
    }

    pub fn persisted(&self) -> Option<Uuid> {
        match self {
            EntityId::Persisted(id) => Some(*id),
            EntityId::Pending(_) => None,
        }
    }

    pub fn pending(&self) -> Option<PendingId> {
        match self {
            EntityId::Pending(id) => Some(*id),
            EntityId::Persisted(_) => None,
        }
    }

    /// Classify a wire identifier.
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        if !is_temporary(raw) {
            let id = Uuid::try_parse(raw).map_err(|_| IdError::Malformed(raw.to_string()))?;
            return Ok(EntityId::Persisted(id));
        }

        raw.strip_prefix(TMP_PREFIX)
            .and_then(|n| n.parse::<u64>().ok())
            .map(|n| EntityId::Pending(PendingId(n)))
            .ok_or_else(|| IdError::Malformed(raw.to_string()))
    }
}

impl From<Uuid> for EntityId {
    fn from(id: Uuid) -> Self {
        EntityId::Persisted(id)
    }
}

impl From<PendingId> for EntityId {
    fn from(id: PendingId) -> Self {
        EntityId::Pending(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Pending(id) => id.fmt(f),
            EntityId::Persisted(id) => id.hyphenated().fmt(f),
        }
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        EntityId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parse an id that must already be server-assigned (pages, navbar, items).
pub(crate) fn parse_persisted(raw: &str) -> Result<Uuid, IdError> {
    match EntityId::parse(raw)? {
        EntityId::Persisted(id) => Ok(id),
        EntityId::Pending(_) => Err(IdError::NotPersisted(raw.to_string())),
    }
}

/// Per-session source of pending ids.
#[derive(Debug, Clone, Default)]
pub(crate) struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn next_pending(&mut self) -> PendingId {
        self.next += 1;
        PendingId(self.next)
    }

    pub fn next_id(&mut self) -> EntityId {
        EntityId::Pending(self.next_pending())
    }
}
