use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use bson::Bson;
use quill_transport::Transport;
use quill_wire::{Doc, message};

use crate::collection::Collection;
use crate::dead_cursors::DeadCursors;
use crate::error::ClientError;
use crate::pool::BufferPool;

/// Reserved collection listing every namespace in the database.
const NAMESPACES: &str = "system.namespaces";
/// Reserved collection holding index descriptors.
pub(crate) const INDEXES: &str = "system.indexes";

const BUFFER_POOL_SIZE: usize = 8;

// ── Core ──────────────────────────────────────────────────────

/// State shared by a database and every handle derived from it.
pub(crate) struct Core<T: Transport> {
    pub(crate) root: String,
    pub(crate) transport: Mutex<T>,
    pub(crate) buffers: BufferPool,
    pub(crate) dead_cursors: DeadCursors,
}

impl<T: Transport> Core<T> {
    /// Release queued dead cursors once enough have piled up.
    ///
    /// Runs on the query path. Failures keep the ids queued and never reach
    /// the caller.
    pub(crate) fn clean_cursors(&self) {
        let Some(ids) = self.dead_cursors.take_if_due() else {
            return;
        };
        tracing::debug!(count = ids.len(), "releasing dead cursors");
        let mut msg = self.buffers.acquire();
        message::kill_cursors(&mut msg, &ids);
        let result = {
            let mut transport = self.transport.lock().unwrap();
            transport.kill_cursors(&msg)
        };
        if let Err(error) = result {
            tracing::warn!(count = ids.len(), %error, "dead cursor release failed, requeueing");
            self.dead_cursors.requeue(ids);
        }
    }
}

// ── Database ──────────────────────────────────────────────────

/// A database handle: one transport, one namespace root, and the registry
/// of collection handles hanging off them.
pub struct Database<T: Transport> {
    core: Arc<Core<T>>,
    collections: RwLock<HashMap<String, Arc<Collection<T>>>>,
}

impl<T: Transport> Database<T> {
    pub fn new(transport: T, root: impl Into<String>) -> Self {
        let core = Core {
            root: root.into(),
            transport: Mutex::new(transport),
            buffers: BufferPool::new(BUFFER_POOL_SIZE),
            dead_cursors: DeadCursors::new(),
        };
        Self {
            core: Arc::new(core),
            collections: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &str {
        &self.core.root
    }

    /// Number of cursor ids awaiting deferred release.
    pub fn pending_dead_cursors(&self) -> usize {
        self.core.dead_cursors.len()
    }

    /// Get or create the handle for a collection.
    ///
    /// Handles are cached; concurrent callers for one name converge on a
    /// single pointer-identical handle. Construction performs no I/O and
    /// entries are never evicted.
    pub fn collection(&self, name: &str) -> Arc<Collection<T>> {
        if let Some(collection) = self.collections.read().unwrap().get(name) {
            return Arc::clone(collection);
        }
        let mut collections = self.collections.write().unwrap();
        let collection = collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Collection::new(Arc::clone(&self.core), name)));
        Arc::clone(collection)
    }

    /// Resolve a full namespace against this database.
    ///
    /// A bare name resolves locally and a full name under this root resolves
    /// to its collection; a foreign root is an error.
    pub fn collection_from_full(&self, full: &str) -> Result<Arc<Collection<T>>, ClientError> {
        match full.split_once('.') {
            None => Ok(self.collection(full)),
            Some((root, local)) if root == self.core.root => Ok(self.collection(local)),
            Some(_) => Err(ClientError::CrossDatabase(full.to_string())),
        }
    }

    /// List collection names, sorted and stripped of the root.
    ///
    /// Namespaces from other roots and internal namespaces (a `$` in the
    /// name) are omitted.
    pub fn collection_names(&self) -> Result<BTreeSet<String>, ClientError> {
        let mut names = BTreeSet::new();
        let namespaces = self.collection(NAMESPACES);
        let Some(mut cursor) = namespaces.find(&Doc::new(), None, 0, 0)? else {
            return Ok(names);
        };
        while cursor.has_next()? {
            let entry = cursor.next()?;
            let Some(full) = entry.get("name").and_then(Bson::as_str) else {
                continue;
            };
            let Some((root, local)) = full.split_once('.') else {
                continue;
            };
            if root != self.core.root || local.contains('$') {
                continue;
            }
            names.insert(local.to_string());
        }
        Ok(names)
    }
}
