//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Keys that act
//! as long as they are held (cut, routing cut, pan) resolve separately via
//! `ShortcutMap::held_mode`, since they are tracked on both key-down and
//! key-up.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Edit ──
    Delete,
    SelectAll,
    Copy,
    Cut,
    Paste,
    /// Cancel the active gesture, or clear the selection when idle.
    Escape,

    // ── Structure ──
    Group,
    Ungroup,
    BringToFront,
    CycleColor,
    TogglePin,

    // ── View ──
    ZoomIn,
    ZoomOut,
    ZoomToFit,
}

/// Modes that stay active while their key is held down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeldMode {
    /// Pointer drags a line; crossed edges are deleted.
    Cut,
    /// Pointer drags a line; the first crossed edge gets a routing point.
    RoutingCut,
    /// Pointer drags pan the canvas.
    Pan,
}

/// Resolves key events into shortcut actions.
///
/// Uses platform-aware modifier detection: on macOS `meta` is ⌘,
/// on other platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"c"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let cmd = modifiers.command();

        // ── Modifier combos first (most specific) ──
        if cmd && modifiers.shift {
            return match key {
                "g" | "G" => Some(ShortcutAction::Ungroup),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "a" | "A" => Some(ShortcutAction::SelectAll),
                "c" | "C" => Some(ShortcutAction::Copy),
                "x" | "X" => Some(ShortcutAction::Cut),
                "v" | "V" => Some(ShortcutAction::Paste),
                "g" | "G" => Some(ShortcutAction::Group),
                "]" => Some(ShortcutAction::BringToFront),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ZoomToFit),
                _ => None,
            };
        }

        // ── Single keys ──
        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Escape),
            "c" | "C" => Some(ShortcutAction::CycleColor),
            "p" | "P" => Some(ShortcutAction::TogglePin),
            _ => None,
        }
    }

    /// Held-key mode for `key`, ignoring combos with ⌘/Ctrl.
    pub fn held_mode(key: &str, modifiers: Modifiers) -> Option<HeldMode> {
        if modifiers.command() {
            return None;
        }
        match key {
            "x" | "X" => Some(HeldMode::Cut),
            "r" | "R" => Some(HeldMode::RoutingCut),
            " " => Some(HeldMode::Pan),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    fn cmd() -> Modifiers {
        Modifiers { meta: true, ..NONE }
    }

    #[test]
    fn resolve_clipboard() {
        assert_eq!(ShortcutMap::resolve("c", cmd()), Some(ShortcutAction::Copy));
        assert_eq!(
            ShortcutMap::resolve("x", Modifiers { ctrl: true, ..NONE }),
            Some(ShortcutAction::Cut)
        );
        assert_eq!(ShortcutMap::resolve("v", cmd()), Some(ShortcutAction::Paste));
    }

    #[test]
    fn resolve_group_ungroup() {
        assert_eq!(ShortcutMap::resolve("g", cmd()), Some(ShortcutAction::Group));
        assert_eq!(
            ShortcutMap::resolve("G", Modifiers { shift: true, ..cmd() }),
            Some(ShortcutAction::Ungroup)
        );
    }

    #[test]
    fn plain_c_cycles_color() {
        assert_eq!(ShortcutMap::resolve("c", NONE), Some(ShortcutAction::CycleColor));
    }

    #[test]
    fn resolve_delete() {
        assert_eq!(ShortcutMap::resolve("Delete", NONE), Some(ShortcutAction::Delete));
        assert_eq!(ShortcutMap::resolve("Backspace", NONE), Some(ShortcutAction::Delete));
    }

    #[test]
    fn held_keys() {
        assert_eq!(ShortcutMap::held_mode("x", NONE), Some(HeldMode::Cut));
        assert_eq!(ShortcutMap::held_mode("r", NONE), Some(HeldMode::RoutingCut));
        assert_eq!(ShortcutMap::held_mode(" ", NONE), Some(HeldMode::Pan));
        assert_eq!(ShortcutMap::held_mode("x", cmd()), None);
    }

    #[test]
    fn unknown_combo_returns_none() {
        assert_eq!(ShortcutMap::resolve("q", NONE), None);
        assert_eq!(ShortcutMap::resolve("q", cmd()), None);
    }
}
