mod doc;
mod error;
pub mod message;
pub mod namespace;
mod oid;
mod reply;

pub use doc::{Doc, ERR_KEY, ID_KEY, NS_KEY};
pub use error::WireError;
pub use oid::Oid;
pub use reply::{DocBatch, ReplyHeader};
