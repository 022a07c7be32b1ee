//! Duplex transport layer for the TM field-set protocol
//!
//! One transport implementation (WebSocket over `tokio-tungstenite`) plus
//! the sender/receiver traits the client programs against, so tests can
//! substitute an in-memory duplex pair.

pub mod error;
pub mod traits;
pub mod websocket;

pub use error::{Result, TransportError};
pub use traits::{TransportEvent, TransportReceiver, TransportSender};
pub use websocket::{WebSocketReceiver, WebSocketSender, WebSocketTransport};
