//! Window/action runtime for the generative desktop shell.
//!
//! One [`session::WindowSession`] owns each live app schema and turns
//! declarative [`app_schema::Action`] values into schema mutations,
//! persistence calls, and chained regenerations. The [`shell`] reducer owns
//! window stacking and focus, and [`desktop::DesktopRuntime`] wires sessions,
//! shell state, and collaborator services together.

pub mod desktop;
pub mod model;
pub mod persistence;
pub mod session;
pub mod shell;
pub mod transform;

pub use desktop::DesktopRuntime;
pub use model::*;
pub use persistence::{load_shell_snapshot, persist_shell_snapshot, SHELL_LAYOUT_KEY};
pub use session::{SessionEffect, SessionServices, WindowSession};
pub use shell::{reduce_shell, ShellAction, ShellEffect, ShellError, ShellState, WindowHandle};
pub use transform::{activate_tab, close_tab, transform_forest, transform_node};
