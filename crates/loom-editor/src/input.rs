//! Platform-agnostic input events.
//!
//! Positions are screen pixels relative to the canvas element. Every event
//! carries the host's monotonic timestamp in milliseconds; the editor uses
//! it for the select debounce and shake sampling.

use loom_core::space::{ScreenPoint, ScreenVector};

/// Keyboard modifier state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, ⌘ on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

/// A touch contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    pub id: u64,
    pub pos: ScreenPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, single touch, pencil contact).
    PointerDown {
        pos: ScreenPoint,
        button: PointerButton,
        modifiers: Modifiers,
        time_ms: u64,
    },

    PointerMove {
        pos: ScreenPoint,
        modifiers: Modifiers,
        time_ms: u64,
    },

    /// Pointer released.
    PointerUp {
        pos: ScreenPoint,
        modifiers: Modifiers,
        time_ms: u64,
    },

    DoubleClick {
        pos: ScreenPoint,
        modifiers: Modifiers,
        time_ms: u64,
    },

    /// Full set of active touches after a touch started, moved or ended.
    Touches { touches: Vec<Touch>, time_ms: u64 },

    /// Wheel / trackpad scroll, in pixels.
    Wheel {
        pos: ScreenPoint,
        delta: ScreenVector,
        modifiers: Modifiers,
        time_ms: u64,
    },

    KeyDown {
        /// `KeyboardEvent.key` value (e.g. `"x"`, `"Delete"`, `" "`).
        key: String,
        modifiers: Modifiers,
        time_ms: u64,
    },

    KeyUp {
        key: String,
        modifiers: Modifiers,
        time_ms: u64,
    },
}

impl InputEvent {
    pub fn pointer_down(x: f32, y: f32, time_ms: u64) -> Self {
        Self::PointerDown {
            pos: ScreenPoint::new(x, y),
            button: PointerButton::Primary,
            modifiers: Modifiers::default(),
            time_ms,
        }
    }

    pub fn pointer_move(x: f32, y: f32, time_ms: u64) -> Self {
        Self::PointerMove {
            pos: ScreenPoint::new(x, y),
            modifiers: Modifiers::default(),
            time_ms,
        }
    }

    pub fn pointer_up(x: f32, y: f32, time_ms: u64) -> Self {
        Self::PointerUp {
            pos: ScreenPoint::new(x, y),
            modifiers: Modifiers::default(),
            time_ms,
        }
    }

    pub fn key_down(key: &str, modifiers: Modifiers, time_ms: u64) -> Self {
        Self::KeyDown {
            key: key.to_string(),
            modifiers,
            time_ms,
        }
    }

    pub fn key_up(key: &str, time_ms: u64) -> Self {
        Self::KeyUp {
            key: key.to_string(),
            modifiers: Modifiers::default(),
            time_ms,
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<ScreenPoint> {
        match self {
            Self::PointerDown { pos, .. }
            | Self::PointerMove { pos, .. }
            | Self::PointerUp { pos, .. }
            | Self::DoubleClick { pos, .. }
            | Self::Wheel { pos, .. } => Some(*pos),
            _ => None,
        }
    }

    pub fn time_ms(&self) -> u64 {
        match self {
            Self::PointerDown { time_ms, .. }
            | Self::PointerMove { time_ms, .. }
            | Self::PointerUp { time_ms, .. }
            | Self::DoubleClick { time_ms, .. }
            | Self::Touches { time_ms, .. }
            | Self::Wheel { time_ms, .. }
            | Self::KeyDown { time_ms, .. }
            | Self::KeyUp { time_ms, .. } => *time_ms,
        }
    }
}
