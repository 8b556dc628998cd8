//! Runtime window model: identifiers, placement types, and the persisted
//! layout snapshot.

use app_schema::{GeneratedApp, WindowPosition};
use serde::{Deserialize, Serialize};

/// Current layout snapshot schema version.
pub const SHELL_LAYOUT_SCHEMA_VERSION: u32 = 1;
/// Default width of a newly opened window in px.
pub const DEFAULT_WINDOW_WIDTH: f64 = 420.0;
/// Default height of a newly opened window in px.
pub const DEFAULT_WINDOW_HEIGHT: f64 = 600.0;
/// Minimum window width enforced during resize.
pub const MIN_WINDOW_WIDTH: f64 = 320.0;
/// Minimum window height enforced during resize.
pub const MIN_WINDOW_HEIGHT: f64 = 200.0;
/// First z-index handed out by a fresh shell.
pub const BASE_Z_INDEX: u32 = 10;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
/// Stable identifier for a runtime-managed window.
pub struct WindowId(pub u64);

/// Window content size in px.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSize {
    /// Width in px.
    pub width: f64,
    /// Height in px.
    pub height: f64,
}

impl WindowSize {
    /// Clamps both dimensions to the shell minimums.
    pub fn clamped_min(self) -> Self {
        Self {
            width: self.width.max(MIN_WINDOW_WIDTH),
            height: self.height.max(MIN_WINDOW_HEIGHT),
        }
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
        }
    }
}

/// Pointer movement delta applied to a drag or resize.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerDelta {
    /// Horizontal movement in px.
    pub dx: f64,
    /// Vertical movement in px.
    pub dy: f64,
}

/// Deterministic cascade position for a freshly opened window.
pub fn cascade_position(window_id: WindowId) -> WindowPosition {
    let offset = ((window_id.0.saturating_sub(1)) % 8) as f64 * 24.0;
    WindowPosition {
        x: 48.0 + offset,
        y: 56.0 + offset,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Persisted state of one window: app payload plus session-owned view state.
pub struct WindowSnapshot {
    /// App payload (schema, position, z-index).
    pub app: GeneratedApp,
    /// Window content size.
    pub size: WindowSize,
    /// Minimized flag.
    pub minimized: bool,
    /// Maximized flag.
    pub maximized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Versioned layout snapshot persisted through the key-value store.
pub struct ShellSnapshot {
    /// Snapshot schema version.
    pub schema_version: u32,
    /// Persisted windows, in stacking order.
    pub windows: Vec<WindowSnapshot>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn cascade_positions_repeat_after_eight_windows() {
        let first = cascade_position(WindowId(1));
        let ninth = cascade_position(WindowId(9));
        assert_eq!(first, ninth);
        assert_eq!(first.x, 48.0);
        assert_eq!(cascade_position(WindowId(2)).x, 72.0);
    }

    #[test]
    fn window_size_clamps_to_shell_minimums() {
        let size = WindowSize {
            width: 10.0,
            height: 5000.0,
        }
        .clamped_min();
        assert_eq!(size.width, MIN_WINDOW_WIDTH);
        assert_eq!(size.height, 5000.0);
    }
}
