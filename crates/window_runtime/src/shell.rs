//! Shell reducer: window stack, focus, and the prompt error banner.
//!
//! State transitions go through [`reduce_shell`], which mutates a
//! [`ShellState`] in place and returns the side effects the caller must carry
//! out. The reducer itself never touches storage or sessions.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::{WindowId, BASE_Z_INDEX};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Shell-owned stacking and lifecycle state for one window.
pub struct WindowHandle {
    /// Window id.
    pub id: WindowId,
    /// Stacking order; larger renders on top.
    pub z_index: u32,
    /// Whether this window currently has focus.
    pub is_focused: bool,
    /// Whether the window is minimized (hidden, restorable).
    pub minimized: bool,
}

#[derive(Debug, Clone, PartialEq)]
/// Shell-level state: window stack, focus, and the prompt error banner.
pub struct ShellState {
    /// Next window id to allocate.
    pub next_window_id: u64,
    /// Monotonic z-index counter; the topmost window carries its last value.
    pub z_counter: u32,
    /// Managed window handles, in creation order.
    pub windows: Vec<WindowHandle>,
    /// Dismissible top-level error banner, set on prompt failures.
    pub error: Option<String>,
}

impl Default for ShellState {
    fn default() -> Self {
        Self {
            next_window_id: 1,
            z_counter: BASE_Z_INDEX,
            windows: Vec::new(),
            error: None,
        }
    }
}

impl ShellState {
    /// Returns the focused window id, if any.
    pub fn focused_window_id(&self) -> Option<WindowId> {
        self.windows.iter().find(|w| w.is_focused).map(|w| w.id)
    }

    /// Returns the handle for `window_id`, if managed.
    pub fn handle(&self, window_id: WindowId) -> Option<&WindowHandle> {
        self.windows.iter().find(|w| w.id == window_id)
    }

    /// Returns the highest z-index among non-minimized windows.
    pub fn top_z_index(&self) -> Option<u32> {
        self.windows
            .iter()
            .filter(|w| !w.minimized)
            .map(|w| w.z_index)
            .max()
    }

    fn handle_mut(&mut self, window_id: WindowId) -> Result<&mut WindowHandle, ShellError> {
        self.windows
            .iter_mut()
            .find(|w| w.id == window_id)
            .ok_or(ShellError::WindowNotFound(window_id))
    }
}

/// Requests the shell reducer understands.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellAction {
    /// Allocate a new focused window on top of the stack.
    OpenWindow,
    /// Drop a window from the stack.
    CloseWindow {
        /// Target window.
        window_id: WindowId,
    },
    /// Bring a window to the front and focus it.
    FocusWindow {
        /// Target window.
        window_id: WindowId,
    },
    /// Hide a window, keeping it restorable.
    MinimizeWindow {
        /// Target window.
        window_id: WindowId,
    },
    /// Unhide a minimized window and focus it.
    RestoreWindow {
        /// Target window.
        window_id: WindowId,
    },
    /// Show the top-level error banner.
    SetError {
        /// Banner text.
        message: String,
    },
    /// Dismiss the top-level error banner.
    ClearError,
}

/// Side effects the caller must carry out after a successful reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellEffect {
    /// The window stack changed; persist the layout snapshot.
    PersistLayout,
    /// A new window was allocated with this id.
    WindowOpened(WindowId),
}

/// Errors produced by [`reduce_shell`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    /// The action referenced a window the shell does not manage.
    #[error("window {0:?} is not managed by this shell")]
    WindowNotFound(WindowId),
}

/// Applies `action` to `state`, returning the effects to carry out.
pub fn reduce_shell(
    state: &mut ShellState,
    action: ShellAction,
) -> Result<Vec<ShellEffect>, ShellError> {
    match action {
        ShellAction::OpenWindow => {
            let id = WindowId(state.next_window_id);
            state.next_window_id += 1;
            state.z_counter += 1;
            state.windows.push(WindowHandle {
                id,
                z_index: state.z_counter,
                is_focused: false,
                minimized: false,
            });
            normalize_focus(state);
            debug!(window_id = id.0, z_index = state.z_counter, "window opened");
            Ok(vec![
                ShellEffect::WindowOpened(id),
                ShellEffect::PersistLayout,
            ])
        }
        ShellAction::CloseWindow { window_id } => {
            // Validate before mutating.
            state.handle_mut(window_id)?;
            state.windows.retain(|w| w.id != window_id);
            normalize_focus(state);
            debug!(window_id = window_id.0, "window closed");
            Ok(vec![ShellEffect::PersistLayout])
        }
        ShellAction::FocusWindow { window_id } => {
            let top = state.top_z_index();
            let handle = state.handle_mut(window_id)?;
            // Raising an already-topmost window would burn z-indexes for
            // nothing; only re-stack when something is above it.
            let already_top = !handle.minimized && top == Some(handle.z_index);
            if !already_top {
                state.z_counter += 1;
                let z = state.z_counter;
                let handle = state.handle_mut(window_id)?;
                handle.z_index = z;
                handle.minimized = false;
            }
            normalize_focus(state);
            Ok(if already_top {
                Vec::new()
            } else {
                vec![ShellEffect::PersistLayout]
            })
        }
        ShellAction::MinimizeWindow { window_id } => {
            let handle = state.handle_mut(window_id)?;
            handle.minimized = true;
            normalize_focus(state);
            Ok(vec![ShellEffect::PersistLayout])
        }
        ShellAction::RestoreWindow { window_id } => {
            state.handle_mut(window_id)?.minimized = false;
            // Restore also raises, reusing the focus path.
            reduce_shell(state, ShellAction::FocusWindow { window_id })
        }
        ShellAction::SetError { message } => {
            state.error = Some(message);
            Ok(Vec::new())
        }
        ShellAction::ClearError => {
            state.error = None;
            Ok(Vec::new())
        }
    }
}

/// Focus follows stacking: the highest non-minimized window is focused,
/// everything else is not.
fn normalize_focus(state: &mut ShellState) {
    let top = state.top_z_index();
    for handle in &mut state.windows {
        handle.is_focused = !handle.minimized && top == Some(handle.z_index);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn open(state: &mut ShellState) -> WindowId {
        let effects = reduce_shell(state, ShellAction::OpenWindow).unwrap();
        let ShellEffect::WindowOpened(id) = effects[0] else {
            panic!("expected WindowOpened effect");
        };
        id
    }

    #[test]
    fn open_window_assigns_ids_and_z_from_the_base() {
        let mut state = ShellState::default();
        let first = open(&mut state);
        let second = open(&mut state);
        assert_eq!(first, WindowId(1));
        assert_eq!(second, WindowId(2));
        assert_eq!(state.handle(first).unwrap().z_index, BASE_Z_INDEX + 1);
        assert_eq!(state.handle(second).unwrap().z_index, BASE_Z_INDEX + 2);
        assert_eq!(state.focused_window_id(), Some(second));
    }

    #[test]
    fn focusing_the_topmost_window_is_a_no_op() {
        let mut state = ShellState::default();
        let _first = open(&mut state);
        let second = open(&mut state);
        let z_before = state.z_counter;
        let effects =
            reduce_shell(&mut state, ShellAction::FocusWindow { window_id: second }).unwrap();
        assert_eq!(effects, Vec::new());
        assert_eq!(state.z_counter, z_before);
    }

    #[test]
    fn focusing_a_buried_window_raises_it() {
        let mut state = ShellState::default();
        let first = open(&mut state);
        let second = open(&mut state);
        let effects =
            reduce_shell(&mut state, ShellAction::FocusWindow { window_id: first }).unwrap();
        assert_eq!(effects, vec![ShellEffect::PersistLayout]);
        assert!(state.handle(first).unwrap().z_index > state.handle(second).unwrap().z_index);
        assert_eq!(state.focused_window_id(), Some(first));
    }

    #[test]
    fn minimizing_the_focused_window_moves_focus_down() {
        let mut state = ShellState::default();
        let first = open(&mut state);
        let second = open(&mut state);
        reduce_shell(&mut state, ShellAction::MinimizeWindow { window_id: second }).unwrap();
        assert_eq!(state.focused_window_id(), Some(first));
        assert!(state.handle(second).unwrap().minimized);
    }

    #[test]
    fn restoring_raises_and_focuses() {
        let mut state = ShellState::default();
        let first = open(&mut state);
        let _second = open(&mut state);
        reduce_shell(&mut state, ShellAction::MinimizeWindow { window_id: first }).unwrap();
        reduce_shell(&mut state, ShellAction::RestoreWindow { window_id: first }).unwrap();
        assert!(!state.handle(first).unwrap().minimized);
        assert_eq!(state.focused_window_id(), Some(first));
    }

    #[test]
    fn closing_an_unknown_window_is_an_error() {
        let mut state = ShellState::default();
        let err = reduce_shell(
            &mut state,
            ShellAction::CloseWindow {
                window_id: WindowId(99),
            },
        )
        .unwrap_err();
        assert_eq!(err, ShellError::WindowNotFound(WindowId(99)));
    }

    #[test]
    fn error_banner_sets_and_clears() {
        let mut state = ShellState::default();
        reduce_shell(
            &mut state,
            ShellAction::SetError {
                message: "generation failed".into(),
            },
        )
        .unwrap();
        assert_eq!(state.error.as_deref(), Some("generation failed"));
        reduce_shell(&mut state, ShellAction::ClearError).unwrap();
        assert_eq!(state.error, None);
    }
}
