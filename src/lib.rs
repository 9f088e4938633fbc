//! Persistent TCP link for a virtual gamepad.
//!
//! Maintains a single connection to a fixed host:port, keeps it alive with
//! periodic heartbeats, and reconnects automatically with exponential backoff
//! after any failure. The host UI only needs to observe one boolean
//! connectivity signal and push key events through [`ConnectionMonitor::send_message`].

pub mod connection;
pub mod protocol;
pub mod transport;

pub use connection::{ConnectionMonitor, LinkConfig};
pub use protocol::KeyEvent;
pub use transport::TcpClient;
