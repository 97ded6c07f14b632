//! Session transport and connection lifecycle

pub mod connection;
pub mod session;
pub mod websocket;

pub use connection::{ConnectionConfig, ConnectionManager, ConnectionState, ConnectionStatus};
pub use session::{DropSignal, LedgerSession, SessionConnector};
pub use websocket::{WebSocketConnector, WebSocketSession};
