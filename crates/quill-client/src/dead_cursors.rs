use std::mem;
use std::sync::Mutex;

/// Backlog sizes that trigger a drain.
pub const FLUSH_INTERVAL: usize = 20;
/// Backlog size at which a drain always triggers.
pub const FLUSH_CEILING: usize = 100;

/// Cursor ids whose server-side release has been deferred.
///
/// Ids land here when a cursor is dropped without an explicit close, or when
/// an immediate release fails. The backlog is drained on the query path, in
/// batches: a drain is due when the backlog is a multiple of
/// [`FLUSH_INTERVAL`], or once it has reached [`FLUSH_CEILING`].
pub struct DeadCursors {
    pending: Mutex<Vec<i64>>,
}

impl DeadCursors {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Queue a cursor id for deferred release.
    pub fn push(&self, id: i64) {
        self.pending.lock().unwrap().push(id);
    }

    pub fn len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take the whole backlog if a drain is due.
    ///
    /// The swap is atomic: ids pushed after it stay queued for the next
    /// drain.
    pub fn take_if_due(&self) -> Option<Vec<i64>> {
        let mut pending = self.pending.lock().unwrap();
        if pending.is_empty() {
            return None;
        }
        if pending.len() % FLUSH_INTERVAL != 0 && pending.len() < FLUSH_CEILING {
            return None;
        }
        Some(mem::take(&mut *pending))
    }

    /// Put a failed drain back. Ids pushed since the drain stay too, so the
    /// server may see a release twice; it never sees one dropped.
    pub fn requeue(&self, ids: Vec<i64>) {
        self.pending.lock().unwrap().extend(ids);
    }
}

impl Default for DeadCursors {
    fn default() -> Self {
        Self::new()
    }
}
