//! Connection supervision for the persistent gamepad link
//!
//! This module handles:
//! - One long-lived monitoring task per link
//! - Automatic reconnection with exponential backoff
//! - Heartbeating to detect silently-dead connections
//! - Publishing the boolean connectivity signal the host UI observes

mod monitor;

pub use monitor::{ConnectionMonitor, LinkConfig};
