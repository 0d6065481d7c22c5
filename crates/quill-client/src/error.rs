use std::fmt;

use quill_transport::TransportError;
use quill_wire::WireError;

#[derive(Debug)]
pub enum ClientError {
    Transport(TransportError),
    Wire(WireError),
    QueryFailed(String),
    CursorExhausted,
    InvalidCursor(i64),
    CrossDatabase(String),
    Unsupported(&'static str),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(e) => write!(f, "transport error: {e}"),
            ClientError::Wire(e) => write!(f, "wire error: {e}"),
            ClientError::QueryFailed(msg) => write!(f, "query failed: {msg}"),
            ClientError::CursorExhausted => write!(f, "cursor exhausted"),
            ClientError::InvalidCursor(id) => write!(f, "invalid cursor id: {id}"),
            ClientError::CrossDatabase(ns) => write!(f, "namespace outside this database: {ns}"),
            ClientError::Unsupported(what) => write!(f, "unsupported: {what}"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Transport(e) => Some(e),
            ClientError::Wire(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(e: TransportError) -> Self {
        ClientError::Transport(e)
    }
}

impl From<WireError> for ClientError {
    fn from(e: WireError) -> Self {
        ClientError::Wire(e)
    }
}
