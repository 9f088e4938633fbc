//! Network transport for the gamepad link

pub mod tcp;

pub use tcp::TcpClient;
