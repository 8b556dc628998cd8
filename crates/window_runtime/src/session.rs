//! Per-window action dispatcher.
//!
//! A [`WindowSession`] owns one live [`GeneratedApp`] and turns the
//! declarative [`Action`] values its widgets emit into schema mutations,
//! collaborator calls, and chained regenerations. Dispatch drains an explicit
//! follow-up queue instead of recursing, with a hard depth cap, so a
//! confirmation prompt that itself chains can never run away.

use std::{collections::HashMap, collections::VecDeque, rc::Rc, time::Duration};

use app_schema::{
    Action, AppSchema, CapturePayload, CurrentAppContext, GenerateTarget, GenerationContext,
    GeneratedApp, NavigateTarget, SystemDataType,
};
use platform_services::{
    next_monotonic_timestamp_ms, FileRecord, HardwareService, KeyValueStore, NoopHardwareService,
    NoopKeyValueStore, NoopRecordStore, NoopSchemaGenerator, SchemaGenerator, SystemRecordStore,
};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::model::{WindowSize, WindowSnapshot};
use crate::transform;

/// How long a stored-data fetch may run before the dispatcher falls back to
/// in-memory app data.
pub const CONTEXT_FETCH_TIMEOUT: Duration = Duration::from_secs(3);
/// How long any single persistence call may run before being abandoned.
pub const PERSIST_TIMEOUT: Duration = Duration::from_secs(2);
/// Maximum number of actions one dispatch may execute, chained follow-ups
/// included.
pub const MAX_CHAIN_DEPTH: usize = 8;

/// Placeholder token replaced with a monotonic timestamp in capture filenames.
const TIMESTAMP_TOKEN: &str = "${timestamp}";

/// The collaborator bundle every session dispatches against.
#[derive(Clone)]
pub struct SessionServices {
    /// The prompt-to-schema boundary.
    pub generator: Rc<dyn SchemaGenerator>,
    /// Per-`dataKey` persistence.
    pub store: Rc<dyn KeyValueStore>,
    /// System-wide records (mail, notes, files, app data).
    pub records: Rc<dyn SystemRecordStore>,
    /// Host hardware capabilities.
    pub hardware: Rc<dyn HardwareService>,
}

impl SessionServices {
    /// Services where every collaborator is inert; useful as a baseline.
    pub fn noop() -> Self {
        Self {
            generator: Rc::new(NoopSchemaGenerator),
            store: Rc::new(NoopKeyValueStore),
            records: Rc::new(NoopRecordStore),
            hardware: Rc::new(NoopHardwareService),
        }
    }
}

impl std::fmt::Debug for SessionServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionServices").finish_non_exhaustive()
    }
}

/// Outcomes a dispatch hands back to the owning shell.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    /// A `new_window` generation produced this schema; open it.
    OpenWindow(AppSchema),
    /// This window's schema was replaced in place; re-render and persist.
    SchemaReplaced,
    /// Open a URL outside the shell.
    OpenExternalUrl(String),
    /// A generation failed; surface the message.
    GenerationFailed(String),
}

/// One live window: its app payload plus session-scoped view state.
#[derive(Debug)]
pub struct WindowSession {
    app: GeneratedApp,
    size: WindowSize,
    maximized: bool,
    updating: bool,
    input_values: HashMap<String, String>,
    services: SessionServices,
}

impl WindowSession {
    /// Creates a session around an app payload.
    pub fn new(app: GeneratedApp, services: SessionServices) -> Self {
        Self {
            app,
            size: WindowSize::default(),
            maximized: false,
            updating: false,
            input_values: HashMap::new(),
            services,
        }
    }

    /// Rebuilds a session from a persisted snapshot.
    pub fn from_snapshot(snapshot: WindowSnapshot, services: SessionServices) -> Self {
        let mut session = Self::new(snapshot.app, services);
        session.size = snapshot.size;
        session.maximized = snapshot.maximized;
        session
    }

    /// Snapshot of this session for layout persistence.
    ///
    /// `minimized` is shell state; the caller fills it in.
    pub fn snapshot(&self, minimized: bool) -> WindowSnapshot {
        WindowSnapshot {
            app: self.app.clone(),
            size: self.size,
            minimized,
            maximized: self.maximized,
        }
    }

    /// The live app payload.
    pub fn app(&self) -> &GeneratedApp {
        &self.app
    }

    /// Current window size.
    pub fn size(&self) -> WindowSize {
        self.size
    }

    /// Resizes the window, clamped to the shell minimums.
    pub fn set_size(&mut self, size: WindowSize) {
        self.size = size.clamped_min();
    }

    /// Whether the window is maximized.
    pub fn maximized(&self) -> bool {
        self.maximized
    }

    /// Sets the maximized flag.
    pub fn set_maximized(&mut self, maximized: bool) {
        self.maximized = maximized;
    }

    /// Whether a generation is in flight for this window.
    pub fn updating(&self) -> bool {
        self.updating
    }

    /// Moves the window to an absolute position.
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.app.position.x = x;
        self.app.position.y = y;
    }

    /// Updates the stacking order recorded on the app payload.
    pub fn set_z_index(&mut self, z_index: u32) {
        self.app.z_index = z_index;
    }

    /// Records the live value of an input widget for prompt substitution.
    pub fn set_input(&mut self, field_id: impl Into<String>, value: impl Into<String>) {
        self.input_values.insert(field_id.into(), value.into());
    }

    /// Executes `action`, draining any chained follow-ups, and returns the
    /// effects the shell must act on.
    ///
    /// `payload` carries capture bytes for `capture_*` actions and is ignored
    /// by every other kind.
    pub async fn dispatch(
        &mut self,
        action: Action,
        payload: Option<CapturePayload>,
    ) -> Vec<SessionEffect> {
        let mut effects = Vec::new();
        let mut queue: VecDeque<(Action, Option<CapturePayload>)> = VecDeque::new();
        queue.push_back((action, payload));
        let mut executed = 0usize;
        while let Some((action, payload)) = queue.pop_front() {
            if executed >= MAX_CHAIN_DEPTH {
                warn!(
                    kind = action.kind(),
                    remaining = queue.len() + 1,
                    "action chain exceeded depth cap, dropping tail"
                );
                break;
            }
            executed += 1;
            debug!(kind = action.kind(), window_id = self.app.id, "dispatching action");
            for prompt in self.handle(action, payload, &mut effects).await {
                queue.push_back((
                    Action::Generate {
                        prompt,
                        target: GenerateTarget::Current,
                    },
                    None,
                ));
            }
        }
        effects
    }

    /// Executes one action; returns follow-up prompts to chain.
    async fn handle(
        &mut self,
        action: Action,
        payload: Option<CapturePayload>,
        effects: &mut Vec<SessionEffect>,
    ) -> Vec<String> {
        match action {
            Action::Generate { prompt, target } => {
                self.handle_generate(&prompt, target, effects).await;
                Vec::new()
            }
            Action::CapturePhoto { filename } => {
                self.persist_capture(
                    &filename,
                    payload,
                    "image/jpeg",
                    &["camera", "photo"],
                    "photos",
                    |name| {
                        format!(
                            "Show a confirmation that photo '{name}' was saved. \
                             Also include a button to 'view all files'."
                        )
                    },
                )
                .await
            }
            Action::CaptureVideo { filename, mime_type } => {
                self.persist_capture(
                    &filename,
                    override_mime(payload, mime_type),
                    "video/webm",
                    &["video", "recording"],
                    "videos",
                    |name| format!("Show a confirmation that video '{name}' was saved."),
                )
                .await
            }
            Action::CaptureAudio { filename, mime_type } => {
                self.persist_capture(
                    &filename,
                    override_mime(payload, mime_type),
                    "audio/webm",
                    &["audio", "recording"],
                    "recordings",
                    |name| format!("Show a confirmation that audio clip '{name}' was saved."),
                )
                .await
            }
            Action::StartRecording { filename } => self.handle_start_recording(&filename).await,
            Action::StopRecording { filename } => {
                self.handle_stop_recording(filename.as_deref()).await
            }
            Action::SelectFiles { options } => {
                let hardware = Rc::clone(&self.services.hardware);
                let selected = match hardware.select_files(&options).await {
                    Ok(files) => files,
                    Err(err) => {
                        warn!(%err, "file picker failed");
                        return Vec::new();
                    }
                };
                if selected.is_empty() {
                    return Vec::new();
                }
                let mut stored = 0usize;
                for file in selected {
                    let record = FileRecord {
                        name: file.name,
                        mime_type: file.mime_type,
                        size: file.bytes.len() as u64,
                        bytes: file.bytes,
                        tags: vec!["uploaded".to_string()],
                        folder: "uploads".to_string(),
                    };
                    if self.persist_file(record).await {
                        stored += 1;
                    }
                }
                if stored == 0 {
                    return Vec::new();
                }
                vec![format!(
                    "Show confirmation that {stored} file(s) were uploaded successfully."
                )]
            }
            Action::GetLocation => {
                let hardware = Rc::clone(&self.services.hardware);
                match hardware.current_location().await {
                    Ok(Some(fix)) => vec![format!(
                        "Show current location: {:.6}, {:.6} (\u{b1}{}m accuracy)",
                        fix.latitude, fix.longitude, fix.accuracy_m
                    )],
                    Ok(None) => {
                        debug!("location unavailable or denied");
                        Vec::new()
                    }
                    Err(err) => {
                        warn!(%err, "location query failed");
                        Vec::new()
                    }
                }
            }
            Action::ShowNotification { title, body } => {
                let hardware = Rc::clone(&self.services.hardware);
                if let Err(err) = hardware.show_notification(&title, &body).await {
                    warn!(%err, "notification failed");
                }
                Vec::new()
            }
            Action::SaveToSystem { data_type, data } => {
                let records = Rc::clone(&self.services.records);
                let result = match data_type {
                    SystemDataType::Email => records.add_email(data).await,
                    SystemDataType::Contact => records.add_contact(data).await,
                    SystemDataType::Note => records.add_note(data).await,
                    SystemDataType::Event => records.add_calendar_event(data).await,
                };
                match result {
                    Ok(_) => vec![format!(
                        "Show confirmation that {} was saved to the system.",
                        data_type.token()
                    )],
                    Err(err) => {
                        warn!(%err, data_type = data_type.token(), "system save failed");
                        Vec::new()
                    }
                }
            }
            Action::NavigateUrl { url, target } => {
                if target == Some(NavigateTarget::Blank) {
                    effects.push(SessionEffect::OpenExternalUrl(url));
                } else {
                    // In-widget navigation is owned by the widget itself.
                    debug!(%url, "same-frame navigation left to the widget");
                }
                Vec::new()
            }
            Action::OpenTab { url, tab_id } => {
                match tab_id {
                    Some(tab_id) => {
                        self.app.schema.components =
                            transform::activate_tab(&self.app.schema.components, &tab_id);
                        effects.push(SessionEffect::SchemaReplaced);
                    }
                    None => debug!(%url, "open_tab without a tabId is a no-op"),
                }
                Vec::new()
            }
            Action::CloseTab { tab_id } => {
                self.app.schema.components =
                    transform::close_tab(&self.app.schema.components, &tab_id);
                effects.push(SessionEffect::SchemaReplaced);
                Vec::new()
            }
            Action::DownloadFile { url, filename } => {
                let hardware = Rc::clone(&self.services.hardware);
                match hardware.fetch_url(&url).await {
                    Ok(bytes) => {
                        if let Err(err) = hardware.download_file(bytes, &filename).await {
                            warn!(%err, %filename, "download handoff failed");
                        }
                    }
                    Err(err) => warn!(%err, %url, "download fetch failed"),
                }
                Vec::new()
            }
            Action::ExecuteCommand {
                command,
                working_directory,
            } => {
                // Never executed; generated apps have no shell access.
                warn!(
                    %command,
                    working_directory = working_directory.as_deref().unwrap_or("."),
                    "execute_command rejected"
                );
                Vec::new()
            }
        }
    }

    async fn handle_generate(
        &mut self,
        prompt: &str,
        target: GenerateTarget,
        effects: &mut Vec<SessionEffect>,
    ) {
        if self.updating {
            warn!(window_id = self.app.id, "generation already in flight, dropping prompt");
            return;
        }
        self.updating = true;
        let prompt = self.substitute_inputs(prompt);
        let context = self.build_context(&prompt).await;
        let generator = Rc::clone(&self.services.generator);
        match generator.generate(&prompt, Some(&context)).await {
            Ok(schema) => {
                self.persist_app_data(&schema).await;
                match target {
                    GenerateTarget::NewWindow => effects.push(SessionEffect::OpenWindow(schema)),
                    GenerateTarget::Current => {
                        self.apply_schema(schema);
                        effects.push(SessionEffect::SchemaReplaced);
                    }
                }
            }
            Err(err) => {
                warn!(%err, window_id = self.app.id, "generation failed");
                effects.push(SessionEffect::GenerationFailed(err.to_string()));
            }
        }
        self.updating = false;
    }

    async fn handle_start_recording(&mut self, filename: &str) -> Vec<String> {
        let hardware = Rc::clone(&self.services.hardware);
        match hardware.start_audio_recording().await {
            Ok(true) => {
                vec!["Show recording started confirmation with a stop button.".to_string()]
            }
            Ok(false) => {
                warn!(%filename, "microphone denied, recording not started");
                Vec::new()
            }
            Err(err) => {
                warn!(%err, "recording start failed");
                Vec::new()
            }
        }
    }

    async fn handle_stop_recording(&mut self, filename: Option<&str>) -> Vec<String> {
        let hardware = Rc::clone(&self.services.hardware);
        let recording = match hardware.stop_audio_recording(filename).await {
            Ok(Some(recording)) => recording,
            Ok(None) => {
                debug!("stop_recording with no active recording");
                return Vec::new();
            }
            Err(err) => {
                warn!(%err, "recording stop failed");
                return Vec::new();
            }
        };
        let name = resolve_filename(&recording.filename);
        let record = FileRecord {
            name: name.clone(),
            mime_type: "audio/webm".to_string(),
            size: recording.bytes.len() as u64,
            bytes: recording.bytes,
            tags: vec!["audio".to_string(), "recording".to_string()],
            folder: "recordings".to_string(),
        };
        if !self.persist_file(record).await {
            return Vec::new();
        }
        vec![format!(
            "Show confirmation that recording '{name}' was saved ({}ms duration).",
            recording.duration_ms
        )]
    }

    /// Shared tail of the three `capture_*` actions: resolve the filename,
    /// store the payload as a file record, and chain a confirmation prompt.
    async fn persist_capture(
        &mut self,
        filename: &str,
        payload: Option<CapturePayload>,
        default_mime: &str,
        tags: &[&str],
        folder: &str,
        confirmation: impl Fn(&str) -> String,
    ) -> Vec<String> {
        let Some(payload) = payload else {
            warn!(%filename, "capture action arrived without a payload");
            return Vec::new();
        };
        let name = resolve_filename(payload.filename.as_deref().unwrap_or(filename));
        let record = FileRecord {
            name: name.clone(),
            mime_type: payload
                .mime_type
                .unwrap_or_else(|| default_mime.to_string()),
            size: payload.bytes.len() as u64,
            bytes: payload.bytes,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            folder: folder.to_string(),
        };
        if !self.persist_file(record).await {
            return Vec::new();
        }
        vec![confirmation(&name)]
    }

    async fn persist_file(&self, record: FileRecord) -> bool {
        let name = record.name.clone();
        let records = Rc::clone(&self.services.records);
        match timeout(PERSIST_TIMEOUT, records.add_file(record)).await {
            Ok(Ok(_)) => true,
            Ok(Err(err)) => {
                warn!(%err, %name, "file record persist failed");
                false
            }
            Err(_) => {
                warn!(%name, "file record persist timed out");
                false
            }
        }
    }

    /// Persists `dataKey`-scoped app data through both stores, best effort.
    async fn persist_app_data(&self, schema: &AppSchema) {
        let (Some(key), Some(data)) = (&schema.data_key, &schema.app_data) else {
            return;
        };
        let store = Rc::clone(&self.services.store);
        match timeout(PERSIST_TIMEOUT, store.set(key, data.clone())).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(%err, data_key = %key, "app data store failed"),
            Err(_) => warn!(data_key = %key, "app data store timed out"),
        }
        let app_id = format!("app_{}", self.app.id);
        let records = Rc::clone(&self.services.records);
        match timeout(PERSIST_TIMEOUT, records.set_app_data(key, &app_id, data.clone())).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(%err, data_key = %key, "app data record failed"),
            Err(_) => warn!(data_key = %key, "app data record timed out"),
        }
    }

    /// Builds the generator context: live app state plus stored data.
    ///
    /// The stored-data fetch is bounded by [`CONTEXT_FETCH_TIMEOUT`]; on
    /// timeout or storage failure the in-memory app data stands in, so a slow
    /// store degrades context instead of blocking generation.
    async fn build_context(&self, user_action: &str) -> GenerationContext {
        let current = CurrentAppContext {
            app_name: self.app.schema.app_name.clone(),
            components: self.app.schema.components.clone(),
            app_data: self.app.schema.app_data.clone(),
            data_key: self.app.schema.data_key.clone(),
        };
        let stored_data = match &self.app.schema.data_key {
            Some(key) => {
                let store = Rc::clone(&self.services.store);
                match timeout(CONTEXT_FETCH_TIMEOUT, store.get(key)).await {
                    Ok(Ok(value)) => value,
                    Ok(Err(err)) => {
                        warn!(%err, data_key = %key, "context fetch failed, using app data");
                        self.app.schema.app_data.clone()
                    }
                    Err(_) => {
                        warn!(data_key = %key, "context fetch timed out, using app data");
                        self.app.schema.app_data.clone()
                    }
                }
            }
            None => None,
        };
        GenerationContext {
            current_app: Some(current),
            stored_data,
            user_action: user_action.to_string(),
        }
    }

    /// Replaces `{fieldId}` placeholders with live input widget values.
    fn substitute_inputs(&self, prompt: &str) -> String {
        let mut out = prompt.to_string();
        for (field_id, value) in &self.input_values {
            let token = format!("{{{field_id}}}");
            if out.contains(&token) {
                out = out.replace(&token, value);
            }
        }
        out
    }

    /// Installs a freshly generated schema, resetting input state.
    fn apply_schema(&mut self, schema: AppSchema) {
        self.app.schema = schema;
        self.input_values.clear();
    }
}

fn resolve_filename(template: &str) -> String {
    if template.contains(TIMESTAMP_TOKEN) {
        template.replace(TIMESTAMP_TOKEN, &next_monotonic_timestamp_ms().to_string())
    } else {
        template.to_string()
    }
}

/// Folds the action-level MIME override into the payload.
fn override_mime(
    payload: Option<CapturePayload>,
    mime_type: Option<String>,
) -> Option<CapturePayload> {
    payload.map(|mut payload| {
        if payload.mime_type.is_none() {
            payload.mime_type = mime_type;
        }
        payload
    })
}
