//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. The map lives
//! in Rust so the WASM bridge and any native host share it.

use crate::tools::SelectionMode;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Mode switching ──
    Mode(SelectionMode),

    // ── Gesture ──
    /// Abandon the box/lasso in progress.
    Cancel,
    /// Close the lasso (needs 3 vertices).
    Finish,

    // ── Selection ──
    ClearSelection,

    // ── View ──
    ZoomIn,
    ZoomOut,
    ResetView,
    /// Hold to pan with the pointer.
    PanStart,
}

/// Resolves key events into shortcut actions.
///
/// On macOS `meta` is ⌘; on other platforms `ctrl` plays the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// `key` is the `KeyboardEvent.key` value (e.g. `"b"`, `"Escape"`).
    /// Returns `None` if the combo has no binding.
    pub fn resolve(key: &str, ctrl: bool, shift: bool, _alt: bool, meta: bool) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        if cmd && shift {
            return match key {
                "a" | "A" => Some(ShortcutAction::ClearSelection),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ResetView),
                _ => None,
            };
        }

        match key {
            "c" | "C" => Some(ShortcutAction::Mode(SelectionMode::Click)),
            "b" | "B" => Some(ShortcutAction::Mode(SelectionMode::Box)),
            "l" | "L" => Some(ShortcutAction::Mode(SelectionMode::Polygon)),
            "=" | "+" => Some(ShortcutAction::ZoomIn),
            "-" | "_" => Some(ShortcutAction::ZoomOut),
            "0" => Some(ShortcutAction::ResetView),
            "Escape" => Some(ShortcutAction::Cancel),
            "Enter" => Some(ShortcutAction::Finish),
            " " => Some(ShortcutAction::PanStart),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_mode_shortcuts() {
        assert_eq!(
            ShortcutMap::resolve("c", false, false, false, false),
            Some(ShortcutAction::Mode(SelectionMode::Click))
        );
        assert_eq!(
            ShortcutMap::resolve("B", false, false, false, false),
            Some(ShortcutAction::Mode(SelectionMode::Box))
        );
        assert_eq!(
            ShortcutMap::resolve("l", false, false, false, false),
            Some(ShortcutAction::Mode(SelectionMode::Polygon))
        );
    }

    #[test]
    fn resolve_zoom_with_and_without_cmd() {
        // "+" is typed with shift on most layouts.
        assert_eq!(
            ShortcutMap::resolve("+", false, true, false, false),
            Some(ShortcutAction::ZoomIn)
        );
        assert_eq!(
            ShortcutMap::resolve("+", false, false, false, false),
            Some(ShortcutAction::ZoomIn)
        );
        assert_eq!(
            ShortcutMap::resolve("=", false, false, false, true),
            Some(ShortcutAction::ZoomIn)
        );
        assert_eq!(
            ShortcutMap::resolve("-", true, false, false, false),
            Some(ShortcutAction::ZoomOut)
        );
        assert_eq!(
            ShortcutMap::resolve("0", false, false, false, false),
            Some(ShortcutAction::ResetView)
        );
    }

    #[test]
    fn resolve_gesture_keys() {
        assert_eq!(
            ShortcutMap::resolve("Escape", false, false, false, false),
            Some(ShortcutAction::Cancel)
        );
        assert_eq!(
            ShortcutMap::resolve("Enter", false, false, false, false),
            Some(ShortcutAction::Finish)
        );
        assert_eq!(
            ShortcutMap::resolve(" ", false, false, false, false),
            Some(ShortcutAction::PanStart)
        );
    }

    #[test]
    fn resolve_cmd_shift_a_clears() {
        assert_eq!(
            ShortcutMap::resolve("a", false, true, false, true),
            Some(ShortcutAction::ClearSelection)
        );
        assert_eq!(
            ShortcutMap::resolve("A", true, true, false, false),
            Some(ShortcutAction::ClearSelection)
        );
        assert_eq!(ShortcutMap::resolve("a", true, false, false, false), None);
    }

    #[test]
    fn unbound_returns_none() {
        assert_eq!(ShortcutMap::resolve("q", false, false, false, false), None);
        assert_eq!(ShortcutMap::resolve("F13", false, false, false, false), None);
    }
}
