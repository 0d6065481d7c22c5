use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use bson::oid::ObjectId;

/// A 12-byte document identity.
///
/// Carries a freshness flag alongside the raw id: set while the id only
/// exists locally, cleared once it has been written to the server. Equality,
/// ordering, and hashing look at the id bytes alone, so a freshly generated
/// id and its decoded counterpart compare equal.
#[derive(Debug, Clone, Copy)]
pub struct Oid {
    id: ObjectId,
    fresh: bool,
}

impl Oid {
    /// Generate a new id, fresh until first saved.
    pub fn new() -> Self {
        Oid {
            id: ObjectId::new(),
            fresh: true,
        }
    }

    pub fn object_id(&self) -> ObjectId {
        self.id
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.id.bytes()
    }

    /// True while the id has never gone out on the wire.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Clear the fresh flag once the id has been written.
    pub fn mark_saved(&mut self) {
        self.fresh = false;
    }
}

impl Default for Oid {
    fn default() -> Self {
        Oid::new()
    }
}

impl From<ObjectId> for Oid {
    /// Decoded ids are never fresh.
    fn from(id: ObjectId) -> Self {
        Oid { id, fresh: false }
    }
}

impl PartialEq for Oid {
    fn eq(&self, other: &Self) -> bool {
        self.id.bytes() == other.id.bytes()
    }
}

impl Eq for Oid {}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Oid {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.bytes().cmp(&other.id.bytes())
    }
}

impl Hash for Oid {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.bytes().hash(state);
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}
