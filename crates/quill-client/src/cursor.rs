use std::collections::HashSet;
use std::sync::Arc;

use quill_transport::Transport;
use quill_wire::{Doc, DocBatch, Oid, ReplyHeader, message};

use crate::database::Core;
use crate::error::ClientError;

/// Streaming handle over a query's result batches.
///
/// Batches are pulled on demand with get-more round trips. An identity seen
/// in an earlier batch is suppressed when the server resends it across a
/// continuation boundary; duplicates inside the first batch are served as
/// delivered.
///
/// Dropping a cursor that still holds a live server-side cursor queues the
/// id for deferred release; [`close`](Cursor::close) releases it right away.
pub struct Cursor<T: Transport> {
    core: Arc<Core<T>>,
    full_name: String,
    docs: std::vec::IntoIter<Doc>,
    header: ReplyHeader,
    seen: HashSet<Oid>,
    page_size: i32,
    total_bytes: usize,
    closed: bool,
}

impl<T: Transport> Cursor<T> {
    pub(crate) fn new(
        core: Arc<Core<T>>,
        full_name: String,
        batch: DocBatch,
        page_size: i32,
    ) -> Self {
        let total_bytes = batch.bytes();
        let (header, docs) = batch.into_parts();
        let seen = docs.iter().filter_map(|doc| doc.id().copied()).collect();
        Self {
            core,
            full_name,
            docs: docs.into_iter(),
            header,
            seen,
            page_size,
            total_bytes,
            closed: false,
        }
    }

    /// Whether another document can be served, fetching batches as needed.
    ///
    /// A continuation made up entirely of already-seen documents parses
    /// empty, so this keeps fetching until a document or the end of the
    /// cursor shows up.
    pub fn has_next(&mut self) -> Result<bool, ClientError> {
        loop {
            if !self.docs.as_slice().is_empty() {
                return Ok(true);
            }
            if self.closed || !self.header.has_more() {
                return Ok(false);
            }
            self.fetch_more()?;
        }
    }

    /// The next document, or [`ClientError::CursorExhausted`] past the end.
    pub fn next(&mut self) -> Result<Doc, ClientError> {
        if self.has_next()? {
            if let Some(doc) = self.docs.next() {
                return Ok(doc);
            }
        }
        Err(ClientError::CursorExhausted)
    }

    /// Mutation through a cursor is not supported; use the collection
    /// handle.
    pub fn remove(&mut self) -> Result<(), ClientError> {
        Err(ClientError::Unsupported("remove through a cursor"))
    }

    /// Raw reply bytes received so far.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// The live server-side cursor id, or 0 when none is held.
    pub fn cursor_id(&self) -> i64 {
        self.header.cursor_id
    }

    /// Release the server-side cursor now. Idempotent.
    ///
    /// Undelivered documents are discarded. When the release fails the id
    /// is queued for deferred release instead and the failure is returned.
    pub fn close(&mut self) -> Result<(), ClientError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.docs = Vec::new().into_iter();
        let id = self.header.cursor_id;
        if id <= 0 {
            return Ok(());
        }
        self.header.cursor_id = 0;

        let mut msg = self.core.buffers.acquire();
        message::kill_cursors(&mut msg, &[id]);
        let result = {
            let mut transport = self.core.transport.lock().unwrap();
            transport.kill_cursors(&msg)
        };
        if let Err(error) = result {
            self.core.dead_cursors.push(id);
            return Err(error.into());
        }
        Ok(())
    }

    fn fetch_more(&mut self) -> Result<(), ClientError> {
        let id = self.header.cursor_id;
        if id <= 0 {
            return Err(ClientError::InvalidCursor(id));
        }

        let mut msg = self.core.buffers.acquire();
        message::get_more(&mut msg, &self.full_name, self.page_size, id)?;
        let mut reply = self.core.buffers.acquire();
        self.core.transport.lock().unwrap().get_more(&msg, &mut reply)?;

        let batch = DocBatch::parse(
            &self.core.root,
            &self.full_name,
            &reply,
            Some(&mut self.seen),
        )?;
        self.total_bytes += batch.bytes();
        let (header, docs) = batch.into_parts();
        self.header = header;
        self.docs = docs.into_iter();
        Ok(())
    }
}

impl<T: Transport> Drop for Cursor<T> {
    fn drop(&mut self) {
        if !self.closed && self.header.cursor_id > 0 {
            self.core.dead_cursors.push(self.header.cursor_id);
        }
    }
}
