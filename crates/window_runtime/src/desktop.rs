//! Desktop orchestrator: shell state, window sessions, and the launcher.
//!
//! [`DesktopRuntime`] is the single entry point a host embeds. It owns the
//! [`ShellState`], one [`WindowSession`] per open window, and the collaborator
//! bundle, and it carries out the effects both layers hand back.

use std::collections::BTreeMap;
use std::rc::Rc;

use app_schema::{
    Action, AppLayout, AppSchema, CapturePayload, GeneratedApp, GenerationContext, UiComponent,
    WidgetComponent,
};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::model::{
    cascade_position, PointerDelta, ShellSnapshot, WindowId, WindowSize, BASE_Z_INDEX,
    SHELL_LAYOUT_SCHEMA_VERSION,
};
use crate::persistence::{load_shell_snapshot, persist_shell_snapshot};
use crate::session::{SessionEffect, SessionServices, WindowSession};
use crate::shell::{reduce_shell, ShellAction, ShellEffect, ShellError, ShellState, WindowHandle};

/// The embeddable desktop: shell, sessions, and collaborators.
pub struct DesktopRuntime {
    shell: ShellState,
    sessions: BTreeMap<WindowId, WindowSession>,
    services: SessionServices,
}

impl DesktopRuntime {
    /// Creates an empty desktop over the given collaborators.
    pub fn new(services: SessionServices) -> Self {
        Self {
            shell: ShellState::default(),
            sessions: BTreeMap::new(),
            services,
        }
    }

    /// Creates a desktop, restoring the persisted layout when one is usable.
    pub async fn boot(services: SessionServices) -> Self {
        let mut runtime = Self::new(services);
        let store = Rc::clone(&runtime.services.store);
        if let Some(snapshot) = load_shell_snapshot(store.as_ref()).await {
            runtime.hydrate(snapshot);
        }
        runtime
    }

    /// Shell state, for rendering.
    pub fn shell(&self) -> &ShellState {
        &self.shell
    }

    /// The session behind `window_id`, if open.
    pub fn session(&self, window_id: WindowId) -> Option<&WindowSession> {
        self.sessions.get(&window_id)
    }

    /// Open window ids in stacking order, bottom first.
    pub fn stacking_order(&self) -> Vec<WindowId> {
        let mut handles: Vec<&WindowHandle> = self.shell.windows.iter().collect();
        handles.sort_by_key(|h| h.z_index);
        handles.iter().map(|h| h.id).collect()
    }

    /// Opens a new focused window around `schema`.
    pub async fn open_window(&mut self, schema: AppSchema) -> Result<WindowId, ShellError> {
        let effects = reduce_shell(&mut self.shell, ShellAction::OpenWindow)?;
        let Some(ShellEffect::WindowOpened(id)) = effects.first().copied() else {
            // OpenWindow always yields WindowOpened first.
            return Err(ShellError::WindowNotFound(WindowId(0)));
        };
        let z_index = self
            .shell
            .handle(id)
            .map(|h| h.z_index)
            .unwrap_or(BASE_Z_INDEX);
        let app = GeneratedApp {
            id: id.0,
            position: cascade_position(id),
            z_index,
            schema,
        };
        info!(window_id = id.0, app_name = %app.schema.app_name, "opening window");
        self.sessions
            .insert(id, WindowSession::new(app, self.services.clone()));
        self.persist_layout().await;
        Ok(id)
    }

    /// Closes a window and drops its session.
    pub async fn close_window(&mut self, window_id: WindowId) -> Result<(), ShellError> {
        reduce_shell(&mut self.shell, ShellAction::CloseWindow { window_id })?;
        self.sessions.remove(&window_id);
        self.persist_layout().await;
        Ok(())
    }

    /// Focuses a window, raising it unless it is already topmost.
    pub async fn focus_window(&mut self, window_id: WindowId) -> Result<(), ShellError> {
        let effects = reduce_shell(&mut self.shell, ShellAction::FocusWindow { window_id })?;
        self.sync_z_indexes();
        if effects.contains(&ShellEffect::PersistLayout) {
            self.persist_layout().await;
        }
        Ok(())
    }

    /// Minimizes a window.
    pub async fn minimize_window(&mut self, window_id: WindowId) -> Result<(), ShellError> {
        reduce_shell(&mut self.shell, ShellAction::MinimizeWindow { window_id })?;
        self.persist_layout().await;
        Ok(())
    }

    /// Restores a minimized window, raising and focusing it.
    pub async fn restore_window(&mut self, window_id: WindowId) -> Result<(), ShellError> {
        reduce_shell(&mut self.shell, ShellAction::RestoreWindow { window_id })?;
        self.sync_z_indexes();
        self.persist_layout().await;
        Ok(())
    }

    /// Toggles the maximized flag of a window.
    pub async fn toggle_maximize(&mut self, window_id: WindowId) -> Result<(), ShellError> {
        let session = self
            .sessions
            .get_mut(&window_id)
            .ok_or(ShellError::WindowNotFound(window_id))?;
        let maximized = !session.maximized();
        session.set_maximized(maximized);
        self.persist_layout().await;
        Ok(())
    }

    /// Drags a window by a pointer delta.
    pub async fn move_window(
        &mut self,
        window_id: WindowId,
        delta: PointerDelta,
    ) -> Result<(), ShellError> {
        let session = self
            .sessions
            .get_mut(&window_id)
            .ok_or(ShellError::WindowNotFound(window_id))?;
        if session.maximized() {
            return Ok(());
        }
        let position = session.app().position;
        session.set_position(position.x + delta.dx, position.y + delta.dy);
        self.persist_layout().await;
        Ok(())
    }

    /// Resizes a window by a pointer delta, clamped to the shell minimums.
    pub async fn resize_window(
        &mut self,
        window_id: WindowId,
        delta: PointerDelta,
    ) -> Result<(), ShellError> {
        let session = self
            .sessions
            .get_mut(&window_id)
            .ok_or(ShellError::WindowNotFound(window_id))?;
        if session.maximized() {
            return Ok(());
        }
        let size = session.size();
        session.set_size(WindowSize {
            width: size.width + delta.dx,
            height: size.height + delta.dy,
        });
        self.persist_layout().await;
        Ok(())
    }

    /// Records a live input widget value for prompt substitution.
    pub fn set_input(
        &mut self,
        window_id: WindowId,
        field_id: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ShellError> {
        self.sessions
            .get_mut(&window_id)
            .ok_or(ShellError::WindowNotFound(window_id))?
            .set_input(field_id, value);
        Ok(())
    }

    /// Routes an action to the owning window and carries out its effects.
    pub async fn dispatch(
        &mut self,
        window_id: WindowId,
        action: Action,
        payload: Option<CapturePayload>,
    ) -> Result<(), ShellError> {
        let session = self
            .sessions
            .get_mut(&window_id)
            .ok_or(ShellError::WindowNotFound(window_id))?;
        let effects = session.dispatch(action, payload).await;
        for effect in effects {
            match effect {
                SessionEffect::OpenWindow(schema) => {
                    self.open_window(schema).await?;
                }
                SessionEffect::SchemaReplaced => self.persist_layout().await,
                SessionEffect::OpenExternalUrl(url) => {
                    let hardware = Rc::clone(&self.services.hardware);
                    if let Err(err) = hardware.open_external_url(&url).await {
                        warn!(%err, %url, "external navigation failed");
                    }
                }
                SessionEffect::GenerationFailed(message) => self.set_error(message),
            }
        }
        Ok(())
    }

    /// Handles a launcher prompt: the fast path for the file explorer,
    /// otherwise a top-level generation into a new window.
    pub async fn submit_prompt(&mut self, prompt: &str) {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return;
        }
        let lowered = prompt.to_lowercase();
        if lowered == "files" || lowered == "explorer" {
            match self.build_explorer_schema().await {
                Ok(schema) => {
                    if let Err(err) = self.open_window(schema).await {
                        warn!(%err, "explorer window failed to open");
                    }
                }
                Err(message) => self.set_error(message),
            }
            return;
        }

        let context = self.build_launcher_context(prompt, &lowered).await;
        let generator = Rc::clone(&self.services.generator);
        match generator.generate(prompt, Some(&context)).await {
            Ok(schema) => {
                if let Err(err) = self.open_window(schema).await {
                    warn!(%err, "generated window failed to open");
                }
            }
            Err(err) => {
                warn!(%err, "launcher generation failed");
                self.set_error(format!("Generation failed: {err}"));
            }
        }
    }

    /// Dismisses the top-level error banner.
    pub fn dismiss_error(&mut self) {
        // ClearError never fails.
        let _ = reduce_shell(&mut self.shell, ShellAction::ClearError);
    }

    fn set_error(&mut self, message: String) {
        let _ = reduce_shell(&mut self.shell, ShellAction::SetError { message });
    }

    /// Top-level prompts carry no live app, but when the prompt names an open
    /// app that persists data, its stored data rides along as context.
    async fn build_launcher_context(&self, prompt: &str, lowered: &str) -> GenerationContext {
        let mut stored_data = None;
        let matched = self.sessions.values().find(|session| {
            let schema = &session.app().schema;
            schema.data_key.is_some() && lowered.contains(&schema.app_name.to_lowercase())
        });
        if let Some(session) = matched {
            if let Some(key) = &session.app().schema.data_key {
                let store = Rc::clone(&self.services.store);
                match store.get(key).await {
                    Ok(value) => stored_data = value,
                    Err(err) => warn!(%err, data_key = %key, "launcher context fetch failed"),
                }
            }
        }
        GenerationContext {
            current_app: None,
            stored_data,
            user_action: prompt.to_string(),
        }
    }

    /// Builds the file explorer schema from stored image records, bypassing
    /// the generator entirely.
    async fn build_explorer_schema(&self) -> Result<AppSchema, String> {
        let records = Rc::clone(&self.services.records);
        let files = records
            .list_files()
            .await
            .map_err(|err| format!("Could not list files: {err}"))?;
        let images: Vec<UiComponent> = files
            .iter()
            .filter(|f| f.mime_type.starts_with("image/"))
            .map(|f| {
                UiComponent::Widget(WidgetComponent {
                    kind: "image".to_string(),
                    props: json!({ "src": f.name, "alt": f.name, "folder": f.folder }),
                })
            })
            .collect();
        let components = if images.is_empty() {
            vec![UiComponent::Widget(WidgetComponent {
                kind: "text".to_string(),
                props: json!({ "content": "No saved images yet." }),
            })]
        } else {
            images
        };
        debug!(count = components.len(), "explorer fast path");
        Ok(AppSchema {
            app_name: "File Explorer".to_string(),
            icon: "\u{1f4c1}".to_string(),
            layout: AppLayout::GridView,
            components,
            data_key: None,
            app_data: None,
            hardware_access: None,
            system_integration: None,
        })
    }

    /// Writes stacking changes back onto the app payloads.
    fn sync_z_indexes(&mut self) {
        for handle in &self.shell.windows {
            if let Some(session) = self.sessions.get_mut(&handle.id) {
                session.set_z_index(handle.z_index);
            }
        }
    }

    /// Persists the current layout, best effort.
    async fn persist_layout(&self) {
        let snapshot = self.snapshot();
        let store = Rc::clone(&self.services.store);
        if let Err(err) = persist_shell_snapshot(store.as_ref(), &snapshot).await {
            warn!(%err, "layout persist failed");
        }
    }

    /// Assembles the persisted view of the current desktop.
    pub fn snapshot(&self) -> ShellSnapshot {
        let windows = self
            .shell
            .windows
            .iter()
            .filter_map(|handle| {
                self.sessions
                    .get(&handle.id)
                    .map(|session| session.snapshot(handle.minimized))
            })
            .collect();
        ShellSnapshot {
            schema_version: SHELL_LAYOUT_SCHEMA_VERSION,
            windows,
        }
    }

    /// Rebuilds shell and sessions from a persisted snapshot.
    fn hydrate(&mut self, snapshot: ShellSnapshot) {
        let mut max_id = 0u64;
        let mut max_z = BASE_Z_INDEX;
        for window in snapshot.windows {
            let id = WindowId(window.app.id);
            max_id = max_id.max(window.app.id);
            max_z = max_z.max(window.app.z_index);
            self.shell.windows.push(WindowHandle {
                id,
                z_index: window.app.z_index,
                is_focused: false,
                minimized: window.minimized,
            });
            self.sessions
                .insert(id, WindowSession::from_snapshot(window, self.services.clone()));
        }
        self.shell.next_window_id = max_id + 1;
        self.shell.z_counter = max_z;
        let top = self.shell.top_z_index();
        for handle in &mut self.shell.windows {
            handle.is_focused = !handle.minimized && top == Some(handle.z_index);
        }
        info!(windows = self.shell.windows.len(), "restored desktop layout");
    }
}
