//! Control input as seen by movement rules.
//!
//! How the four booleans get populated (keyboard, gamepad, replay, AI) is the
//! host's business; movement rules only ask.

use serde::{Deserialize, Serialize};

/// Directional control queries read by movement behaviors.
pub trait Controls {
    fn up(&self) -> bool;
    fn down(&self) -> bool;
    fn left(&self) -> bool;
    fn right(&self) -> bool;
}

/// A plain snapshot of the four directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl ControlState {
    /// No direction held.
    pub const IDLE: ControlState = ControlState {
        up: false,
        down: false,
        left: false,
        right: false,
    };
}

impl Controls for ControlState {
    fn up(&self) -> bool {
        self.up
    }

    fn down(&self) -> bool {
        self.down
    }

    fn left(&self) -> bool {
        self.left
    }

    fn right(&self) -> bool {
        self.right
    }
}
