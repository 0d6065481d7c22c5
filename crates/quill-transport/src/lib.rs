mod error;
mod tcp;
mod transport;

pub use error::TransportError;
pub use tcp::TcpTransport;
pub use transport::Transport;
