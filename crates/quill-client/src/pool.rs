use std::ops::{Deref, DerefMut};

use crossbeam::channel::{Receiver, Sender};

/// Reusable byte buffers for message encode and reply decode.
///
/// Backed by a bounded channel: acquiring recycles a pooled buffer when one
/// is free and allocates otherwise, and the guard returns the buffer on
/// drop. A full pool drops returned buffers instead of blocking.
pub struct BufferPool {
    sender: Sender<Vec<u8>>,
    receiver: Receiver<Vec<u8>>,
}

impl BufferPool {
    pub fn new(size: usize) -> Self {
        let (sender, receiver) = crossbeam::channel::bounded(size);
        Self { sender, receiver }
    }

    /// Hand out a cleared buffer.
    pub fn acquire(&self) -> PooledBuf<'_> {
        let mut buf = self.receiver.try_recv().unwrap_or_default();
        buf.clear();
        PooledBuf {
            buf: Some(buf),
            pool: &self.sender,
        }
    }
}

pub struct PooledBuf<'a> {
    buf: Option<Vec<u8>>,
    pool: &'a Sender<Vec<u8>>,
}

impl Deref for PooledBuf<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        // buf is always Some until Drop runs, and Deref cannot be called after Drop
        self.buf.as_ref().expect("BUG: buffer already consumed")
    }
}

impl DerefMut for PooledBuf<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        // buf is always Some until Drop runs, and DerefMut cannot be called after Drop
        self.buf.as_mut().expect("BUG: buffer already consumed")
    }
}

impl Drop for PooledBuf<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            let _ = self.pool.try_send(buf);
        }
    }
}
