use std::fmt;

#[derive(Debug)]
pub enum WireError {
    Encode(bson::ser::Error),
    Decode(bson::de::Error),
    InvalidNamespace(String),
    TruncatedReply(String),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(e) => write!(f, "encode: {e}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::InvalidNamespace(ns) => write!(f, "invalid namespace: {ns:?}"),
            Self::TruncatedReply(msg) => write!(f, "truncated reply: {msg}"),
        }
    }
}

impl std::error::Error for WireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(e) => Some(e),
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<bson::ser::Error> for WireError {
    fn from(e: bson::ser::Error) -> Self {
        Self::Encode(e)
    }
}

impl From<bson::de::Error> for WireError {
    fn from(e: bson::de::Error) -> Self {
        Self::Decode(e)
    }
}
