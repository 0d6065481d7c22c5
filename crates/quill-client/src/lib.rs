mod collection;
mod cursor;
mod database;
mod dead_cursors;
mod error;
mod pool;

pub use collection::Collection;
pub use cursor::Cursor;
pub use database::Database;
pub use dead_cursors::{DeadCursors, FLUSH_CEILING, FLUSH_INTERVAL};
pub use error::ClientError;
pub use pool::{BufferPool, PooledBuf};

pub use bson::{Bson, Document};
pub use quill_wire::{Doc, Oid};
