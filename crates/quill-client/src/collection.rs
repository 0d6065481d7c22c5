use std::sync::Arc;

use bson::Document;
use quill_transport::Transport;
use quill_wire::{Doc, DocBatch, NS_KEY, Oid, message, namespace};

use crate::cursor::Cursor;
use crate::database::{Core, INDEXES};
use crate::error::ClientError;

/// Handle for one collection. Shared freely through the registry; every
/// operation takes `&self`.
pub struct Collection<T: Transport> {
    core: Arc<Core<T>>,
    name: String,
    full_name: String,
}

impl<T: Transport> Collection<T> {
    pub(crate) fn new(core: Arc<Core<T>>, name: &str) -> Self {
        let full_name = namespace::full_name(&core.root, name);
        Self {
            core,
            name: name.to_string(),
            full_name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    // ── Write operations ────────────────────────────────────────

    /// Insert a document.
    ///
    /// With `stamp` set the document is prepared first: a missing identity
    /// is generated, the identity's fresh flag is cleared, and the
    /// collection name is recorded under `_ns`. The caller's document sees
    /// those changes.
    pub fn save(&self, doc: &mut Doc, stamp: bool) -> Result<(), ClientError> {
        tracing::debug!(ns = %self.full_name, "insert");
        if stamp {
            self.stamp(doc);
        }
        let mut msg = self.core.buffers.acquire();
        message::insert(&mut msg, &self.full_name, doc)?;
        self.core.transport.lock().unwrap().insert(&msg)?;
        Ok(())
    }

    /// Delete documents matching the selector.
    pub fn remove(&self, selector: &Doc) -> Result<(), ClientError> {
        tracing::debug!(ns = %self.full_name, id_only = selector.is_id_only(), "delete");
        let mut msg = self.core.buffers.acquire();
        message::delete(&mut msg, &self.full_name, selector)?;
        self.core.transport.lock().unwrap().delete(&msg)?;
        Ok(())
    }

    /// Update documents matching the selector, optionally upserting.
    pub fn update(
        &self,
        selector: &Doc,
        update: &mut Doc,
        upsert: bool,
        stamp: bool,
    ) -> Result<(), ClientError> {
        tracing::debug!(ns = %self.full_name, upsert, "update");
        if stamp {
            self.stamp(update);
        }
        let mut msg = self.core.buffers.acquire();
        message::update(&mut msg, &self.full_name, upsert, selector, update)?;
        self.core.transport.lock().unwrap().update(&msg)?;
        Ok(())
    }

    /// Record an index descriptor in the reserved index collection.
    ///
    /// Descriptors are saved unstamped; the descriptor carries the indexed
    /// namespace under `ns` itself.
    pub fn ensure_index(&self, keys: &Document, name: &str) -> Result<(), ClientError> {
        let mut descriptor = Doc::new();
        descriptor.insert("name", name);
        descriptor.insert("ns", self.full_name.as_str());
        descriptor.insert("key", keys.clone());
        let indexes = Collection::new(Arc::clone(&self.core), INDEXES);
        indexes.save(&mut descriptor, false)
    }

    // ── Read operations ─────────────────────────────────────────

    /// Run a query.
    ///
    /// Queued dead cursors are opportunistically released first. An empty
    /// first reply yields `None`; a server error reply fails the call.
    pub fn find(
        &self,
        selector: &Doc,
        fields: Option<&Doc>,
        skip: i32,
        limit: i32,
    ) -> Result<Option<Cursor<T>>, ClientError> {
        self.core.clean_cursors();
        tracing::debug!(ns = %self.full_name, skip, limit, "query");

        let mut msg = self.core.buffers.acquire();
        message::query(&mut msg, &self.full_name, skip, limit, selector, fields)?;
        let mut reply = self.core.buffers.acquire();
        self.core.transport.lock().unwrap().query(&msg, &mut reply)?;

        let batch = DocBatch::parse(&self.core.root, &self.full_name, &reply, None)?;
        if batch.is_empty() {
            return Ok(None);
        }
        if let Some(err) = batch.error_message() {
            return Err(ClientError::QueryFailed(err));
        }
        Ok(Some(Cursor::new(
            Arc::clone(&self.core),
            self.full_name.clone(),
            batch,
            limit,
        )))
    }

    /// Fetch a document by identity.
    pub fn find_by_id(&self, id: &Oid) -> Result<Option<Doc>, ClientError> {
        let mut selector = Doc::new();
        selector.set_id(*id);
        let Some(mut cursor) = self.find(&selector, None, 0, 2)? else {
            return Ok(None);
        };
        let doc = cursor.next()?;
        if cursor.has_next()? {
            tracing::warn!(ns = %self.full_name, %id, "multiple documents share one id");
        }
        Ok(Some(doc))
    }

    // ── Helpers ─────────────────────────────────────────────────

    /// Prepare a document for writing: identity present and no longer
    /// fresh, collection name recorded under `_ns`.
    fn stamp(&self, doc: &mut Doc) {
        doc.ensure_id().mark_saved();
        doc.insert(NS_KEY, self.name.as_str());
    }
}
