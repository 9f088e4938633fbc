//! Wire protocol: plain text, one message per line.
//!
//! There is no framing beyond the newline delimiter and no acknowledgement;
//! the link is strictly fire-and-forget from the gamepad side.

use std::fmt;

/// Periodic no-op message used to detect a silently-dead connection.
pub const HEARTBEAT: &str = "HEARTBEAT";

/// A key press or release for a named control, e.g. `BUTTON_A`.
///
/// `Display` produces the wire line (`KEY_DOWN:<id>` / `KEY_UP:<id>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    Down(String),
    Up(String),
}

impl KeyEvent {
    /// Key event for a control being pressed.
    pub fn press(control: impl Into<String>) -> Self {
        Self::Down(control.into())
    }

    /// Key event for a control being released.
    pub fn release(control: impl Into<String>) -> Self {
        Self::Up(control.into())
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyEvent::Down(control) => write!(f, "KEY_DOWN:{control}"),
            KeyEvent::Up(control) => write!(f, "KEY_UP:{control}"),
        }
    }
}
