use crate::error::TransportError;

/// A connection able to carry the six request types.
///
/// Message bodies are opaque to the transport; implementations own the
/// framing around them. `query` and `get_more` fill `reply` with the reply
/// body, framing stripped, and return its length.
pub trait Transport {
    fn insert(&mut self, msg: &[u8]) -> Result<(), TransportError>;

    fn delete(&mut self, msg: &[u8]) -> Result<(), TransportError>;

    fn update(&mut self, msg: &[u8]) -> Result<(), TransportError>;

    fn kill_cursors(&mut self, msg: &[u8]) -> Result<(), TransportError>;

    fn query(&mut self, msg: &[u8], reply: &mut Vec<u8>) -> Result<usize, TransportError>;

    fn get_more(&mut self, msg: &[u8], reply: &mut Vec<u8>) -> Result<usize, TransportError>;
}
