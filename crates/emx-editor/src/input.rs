//! Input abstraction layer.
//!
//! Normalizes mouse, touch and keyboard events from the host into a single
//! `InputEvent` enum consumed by the selection tools. Positions are canvas
//! pixels (screen space).

use kurbo::Point;

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// ⌘ on macOS, Ctrl elsewhere.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start).
    PointerDown { x: f64, y: f64, modifiers: Modifiers },

    PointerMove { x: f64, y: f64, modifiers: Modifiers },

    PointerUp { x: f64, y: f64, modifiers: Modifiers },

    /// Two clicks in quick succession, as reported by the host.
    DoubleClick { x: f64, y: f64 },

    Key { key: String, modifiers: Modifiers },
}

impl InputEvent {
    /// (Used when bridging from JS via wasm-bindgen.)
    pub fn from_pointer_down(x: f64, y: f64, modifiers: Modifiers) -> Self {
        Self::PointerDown { x, y, modifiers }
    }

    pub fn from_pointer_move(x: f64, y: f64, modifiers: Modifiers) -> Self {
        Self::PointerMove { x, y, modifiers }
    }

    pub fn from_pointer_up(x: f64, y: f64, modifiers: Modifiers) -> Self {
        Self::PointerUp { x, y, modifiers }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. }
            | Self::DoubleClick { x, y } => Some(Point::new(*x, *y)),
            Self::Key { .. } => None,
        }
    }
}
