//! Keyboard state tracking
//!
//! A fixed table of 256 flags indexed by virtual key code. The window
//! procedure writes it, the frame loop reads it, both on the message-pump
//! thread.

use tracing::trace;

/// Number of virtual key codes tracked.
pub const KEY_COUNT: usize = 256;

/// Virtual key code of the Escape key.
pub const VK_ESCAPE: u8 = 0x1B;

/// InputSystem holds the pressed/released state of every virtual key.
///
/// Key codes are `u8`, so every code maps to a slot in the table.
#[derive(Debug, Clone)]
pub struct InputSystem {
    keys: [bool; KEY_COUNT],
}

impl InputSystem {
    /// Create an InputSystem with every key released
    pub fn new() -> Self {
        Self {
            keys: [false; KEY_COUNT],
        }
    }

    /// Release every key
    pub fn initialize(&mut self) {
        self.keys = [false; KEY_COUNT];
    }

    /// Record a key press
    pub fn key_down(&mut self, key: u8) {
        trace!(key, "Key down");
        self.keys[usize::from(key)] = true;
    }

    /// Record a key release
    pub fn key_up(&mut self, key: u8) {
        trace!(key, "Key up");
        self.keys[usize::from(key)] = false;
    }

    /// Check if a specific key is currently pressed
    pub fn is_key_down(&self, key: u8) -> bool {
        self.keys[usize::from(key)]
    }
}

impl Default for InputSystem {
    fn default() -> Self {
        Self::new()
    }
}
