//! Shared contract types between the generative window runtime and the schema
//! generator boundary.
//!
//! Everything here crosses the generator boundary as JSON, so field names and
//! tag spellings are part of the wire contract: actions are tagged by `type`
//! with snake_case kinds and camelCase fields, component kinds are kebab-case
//! strings, and schemas carry camelCase keys.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Component kind string for the tabbed container node.
pub const TAB_CONTAINER_KIND: &str = "tab-container";
/// Component kind string for the two-pane split view node.
pub const SPLIT_VIEW_KIND: &str = "split-view";

/// One node in a schema's component tree.
///
/// Only two kinds are structural (they own nested component forests); every
/// other kind is an opaque leaf whose props belong to the renderer. Unknown
/// kinds and malformed container props are tolerated by degrading to the
/// opaque [`UiComponent::Widget`] form, never by failing deserialization.
#[derive(Debug, Clone, PartialEq)]
pub enum UiComponent {
    /// Tabbed container owning one component forest per tab.
    TabContainer(TabContainerProps),
    /// Two-pane split view owning a left and a right component forest.
    SplitView(SplitViewProps),
    /// Any other component kind, carried as an opaque props bag.
    Widget(WidgetComponent),
}

impl UiComponent {
    /// Returns the wire kind string of this node.
    pub fn kind(&self) -> &str {
        match self {
            Self::TabContainer(_) => TAB_CONTAINER_KIND,
            Self::SplitView(_) => SPLIT_VIEW_KIND,
            Self::Widget(widget) => &widget.kind,
        }
    }
}

/// Opaque leaf component: a kind identifier plus renderer-owned props.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetComponent {
    /// Wire `type` identifier (for example `header` or `email-item`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Renderer-owned props payload.
    #[serde(default)]
    pub props: Value,
}

/// Raw `{type, props}` envelope used for tolerant (de)serialization.
#[derive(Serialize, Deserialize)]
struct RawComponent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    props: Value,
}

impl Serialize for UiComponent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error;
        let raw = match self {
            Self::TabContainer(props) => RawComponent {
                kind: TAB_CONTAINER_KIND.to_string(),
                props: serde_json::to_value(props).map_err(S::Error::custom)?,
            },
            Self::SplitView(props) => RawComponent {
                kind: SPLIT_VIEW_KIND.to_string(),
                props: serde_json::to_value(props).map_err(S::Error::custom)?,
            },
            Self::Widget(widget) => RawComponent {
                kind: widget.kind.clone(),
                props: widget.props.clone(),
            },
        };
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UiComponent {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawComponent::deserialize(deserializer)?;
        Ok(match raw.kind.as_str() {
            TAB_CONTAINER_KIND => match serde_json::from_value(raw.props.clone()) {
                Ok(props) => Self::TabContainer(props),
                Err(_) => Self::Widget(WidgetComponent {
                    kind: raw.kind,
                    props: raw.props,
                }),
            },
            SPLIT_VIEW_KIND => match serde_json::from_value(raw.props.clone()) {
                Ok(props) => Self::SplitView(props),
                Err(_) => Self::Widget(WidgetComponent {
                    kind: raw.kind,
                    props: raw.props,
                }),
            },
            _ => Self::Widget(WidgetComponent {
                kind: raw.kind,
                props: raw.props,
            }),
        })
    }
}

/// One tab inside a [`UiComponent::TabContainer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabDefinition {
    /// Tab identifier, unique within its container.
    pub id: String,
    /// Tab label text.
    pub label: String,
    /// Optional icon markup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Component forest rendered while this tab is active.
    #[serde(default)]
    pub components: Vec<UiComponent>,
}

/// Props of a tabbed container node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabContainerProps {
    /// Ordered tab definitions.
    #[serde(default)]
    pub tabs: Vec<TabDefinition>,
    /// Active tab id; unset means "first tab".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_tab: Option<String>,
}

/// Split axis of a [`UiComponent::SplitView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitOrientation {
    /// Panes side by side.
    #[default]
    Horizontal,
    /// Panes stacked vertically.
    Vertical,
}

/// Props of a two-pane split view node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitViewProps {
    /// Split axis.
    #[serde(default)]
    pub orientation: SplitOrientation,
    /// Component forest in the first pane.
    #[serde(default)]
    pub left_components: Vec<UiComponent>,
    /// Component forest in the second pane.
    #[serde(default)]
    pub right_components: Vec<UiComponent>,
    /// Initial split ratio in percent when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_split: Option<f64>,
}

/// Top-level layout hint for a generated app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppLayout {
    /// One scrolling column.
    #[default]
    SingleView,
    /// Vertical list emphasis.
    ListView,
    /// Grid of items.
    GridView,
}

/// The unit the external generator returns: one application description.
///
/// Invariant: when `data_key` is set for a stateful app, `app_data` holds the
/// complete current state and is always rewritten wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSchema {
    /// User-facing application name.
    pub app_name: String,
    /// Icon markup for the title bar and dock.
    #[serde(default)]
    pub icon: String,
    /// Top-level layout hint.
    #[serde(default)]
    pub layout: AppLayout,
    /// Top-level component forest.
    #[serde(default)]
    pub components: Vec<UiComponent>,
    /// Stable key under which app state is persisted and re-fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_key: Option<String>,
    /// Complete structured state for stateful apps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_data: Option<Value>,
    /// Hardware capabilities the app declares.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_access: Option<Vec<String>>,
    /// Whether the app integrates with system-wide records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_integration: Option<bool>,
}

/// Window position in desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowPosition {
    /// Horizontal offset in px.
    pub x: f64,
    /// Vertical offset in px.
    pub y: f64,
}

/// An [`AppSchema`] instantiated as a live window, with placement metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedApp {
    /// Unique window id.
    pub id: u64,
    /// Current top-left position.
    pub position: WindowPosition,
    /// Stacking order; larger values render on top.
    pub z_index: u32,
    /// Live schema payload, rewritten wholesale on regeneration.
    #[serde(flatten)]
    pub schema: AppSchema,
}

/// Regeneration target of a [`Action::Generate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerateTarget {
    /// Replace the dispatching window's schema wholesale.
    #[serde(rename = "self")]
    Current,
    /// Ask the shell to open a new window from the generated schema.
    #[serde(rename = "new_window")]
    NewWindow,
}

/// File picker options carried by [`Action::SelectFiles`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileSelectOptions {
    /// Whether multiple files may be selected.
    #[serde(default)]
    pub multiple: bool,
    /// Accepted MIME types / extensions filter.
    #[serde(default)]
    pub accept: String,
}

/// System record category targeted by [`Action::SaveToSystem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemDataType {
    /// System mailbox record.
    Email,
    /// Address book record.
    Contact,
    /// Notes record.
    Note,
    /// Calendar event record.
    Event,
}

impl SystemDataType {
    /// Returns the wire token for confirmation prompts and logs.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Contact => "contact",
            Self::Note => "note",
            Self::Event => "event",
        }
    }
}

/// Navigation target of [`Action::NavigateUrl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigateTarget {
    /// Navigate inside the owning widget.
    #[serde(rename = "_self")]
    SameFrame,
    /// Open externally.
    #[serde(rename = "_blank")]
    Blank,
}

/// A declarative instruction produced by a UI widget.
///
/// Actions are immutable values consumed exactly once by the window runtime's
/// dispatcher; they are never queued across windows or replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Regenerate a schema from a natural-language prompt.
    Generate {
        /// Prompt text, optionally containing `{fieldId}` placeholders.
        prompt: String,
        /// Whether the result replaces this window or opens a new one.
        target: GenerateTarget,
    },
    /// A camera widget captured a photo; payload carries the bytes.
    CapturePhoto {
        /// Destination filename, `${timestamp}` placeholder allowed.
        filename: String,
    },
    /// A camera widget captured a video clip; payload carries the bytes.
    #[serde(rename_all = "camelCase")]
    CaptureVideo {
        /// Destination filename, `${timestamp}` placeholder allowed.
        filename: String,
        /// MIME type override when known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
    /// An audio widget captured a clip; payload carries the bytes.
    #[serde(rename_all = "camelCase")]
    CaptureAudio {
        /// Destination filename, `${timestamp}` placeholder allowed.
        filename: String,
        /// MIME type override when known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
    /// Start a hardware audio recording.
    StartRecording {
        /// Destination filename for the eventual recording.
        filename: String,
    },
    /// Stop the active hardware audio recording and persist it.
    StopRecording {
        /// Destination filename override.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
    },
    /// Open the host file picker and store the selected files.
    SelectFiles {
        /// Picker options.
        options: FileSelectOptions,
    },
    /// Query the current geolocation.
    GetLocation,
    /// Emit a host notification.
    ShowNotification {
        /// Notification title.
        title: String,
        /// Notification body.
        body: String,
    },
    /// Append a record to the system-wide store.
    #[serde(rename_all = "camelCase")]
    SaveToSystem {
        /// Record category.
        data_type: SystemDataType,
        /// Record payload.
        data: Value,
    },
    /// Navigate a URL; only `_blank` is handled by the runtime.
    NavigateUrl {
        /// Target URL.
        url: String,
        /// Navigation target; in-widget navigation stays widget-owned.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<NavigateTarget>,
    },
    /// Activate a tab across every container that owns it.
    #[serde(rename_all = "camelCase")]
    OpenTab {
        /// Associated URL, informational for browser-style widgets.
        #[serde(default)]
        url: String,
        /// Tab to activate; absent means no-op.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tab_id: Option<String>,
    },
    /// Close a tab across every container that owns it.
    #[serde(rename_all = "camelCase")]
    CloseTab {
        /// Tab to close.
        tab_id: String,
    },
    /// Fetch a URL and hand the bytes to the host download routine.
    DownloadFile {
        /// Source URL.
        url: String,
        /// Destination filename.
        filename: String,
    },
    /// Shell command execution request; always rejected by the runtime.
    #[serde(rename_all = "camelCase")]
    ExecuteCommand {
        /// Requested command line.
        command: String,
        /// Requested working directory.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        working_directory: Option<String>,
    },
}

impl Action {
    /// Returns the wire `type` token of this action.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Generate { .. } => "generate",
            Self::CapturePhoto { .. } => "capture_photo",
            Self::CaptureVideo { .. } => "capture_video",
            Self::CaptureAudio { .. } => "capture_audio",
            Self::StartRecording { .. } => "start_recording",
            Self::StopRecording { .. } => "stop_recording",
            Self::SelectFiles { .. } => "select_files",
            Self::GetLocation => "get_location",
            Self::ShowNotification { .. } => "show_notification",
            Self::SaveToSystem { .. } => "save_to_system",
            Self::NavigateUrl { .. } => "navigate_url",
            Self::OpenTab { .. } => "open_tab",
            Self::CloseTab { .. } => "close_tab",
            Self::DownloadFile { .. } => "download_file",
            Self::ExecuteCommand { .. } => "execute_command",
        }
    }
}

/// Binary payload handed to the dispatcher alongside a capture action.
///
/// This never crosses the generator boundary; it is produced by hardware
/// widgets in the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CapturePayload {
    /// Captured bytes.
    pub bytes: Vec<u8>,
    /// Filename override when the widget picked one.
    pub filename: Option<String>,
    /// MIME type when known.
    pub mime_type: Option<String>,
}

/// Live-app portion of the context object sent to the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentAppContext {
    /// Current application name.
    pub app_name: String,
    /// Current component forest.
    pub components: Vec<UiComponent>,
    /// Current in-memory app state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_data: Option<Value>,
    /// Current persistence key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_key: Option<String>,
}

/// Context object accompanying a regeneration prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationContext {
    /// Live state of the dispatching app; absent for top-level prompts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_app: Option<CurrentAppContext>,
    /// Stored data fetched by the app's `dataKey`, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_data: Option<Value>,
    /// The substituted user prompt that triggered this generation.
    pub user_action: String,
}

/// Error raised when an externally supplied schema payload cannot be ingested.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The payload is not valid JSON for [`AppSchema`].
    #[error("malformed app schema payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Parses an externally produced JSON value into an [`AppSchema`].
///
/// Unknown component kinds and extra props are tolerated; only a payload that
/// cannot satisfy the schema envelope itself is rejected.
///
/// # Errors
///
/// Returns [`SchemaError::Malformed`] when the envelope does not deserialize.
pub fn parse_app_schema(value: Value) -> Result<AppSchema, SchemaError> {
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn action_wire_tags_match_the_generator_contract() {
        let action = Action::CaptureVideo {
            filename: "clip_${timestamp}.webm".to_string(),
            mime_type: Some("video/webm".to_string()),
        };
        let wire = serde_json::to_value(&action).expect("serialize action");
        assert_eq!(
            wire,
            json!({
                "type": "capture_video",
                "filename": "clip_${timestamp}.webm",
                "mimeType": "video/webm"
            })
        );

        let parsed: Action = serde_json::from_value(json!({
            "type": "save_to_system",
            "dataType": "contact",
            "data": { "name": "Ada" }
        }))
        .expect("deserialize action");
        assert_eq!(
            parsed,
            Action::SaveToSystem {
                data_type: SystemDataType::Contact,
                data: json!({ "name": "Ada" }),
            }
        );
    }

    #[test]
    fn generate_target_uses_self_and_new_window_tokens() {
        let wire = serde_json::to_value(Action::Generate {
            prompt: "add a note".to_string(),
            target: GenerateTarget::Current,
        })
        .expect("serialize");
        assert_eq!(wire["target"], json!("self"));

        let parsed: Action = serde_json::from_value(json!({
            "type": "generate",
            "prompt": "open settings",
            "target": "new_window"
        }))
        .expect("deserialize");
        assert_eq!(
            parsed,
            Action::Generate {
                prompt: "open settings".to_string(),
                target: GenerateTarget::NewWindow,
            }
        );
    }

    #[test]
    fn unknown_component_kinds_round_trip_as_opaque_widgets() {
        let wire = json!({ "type": "weather-card", "props": { "location": "Oslo" } });
        let node: UiComponent = serde_json::from_value(wire.clone()).expect("deserialize");
        assert_eq!(
            node,
            UiComponent::Widget(WidgetComponent {
                kind: "weather-card".to_string(),
                props: json!({ "location": "Oslo" }),
            })
        );
        assert_eq!(serde_json::to_value(&node).expect("serialize"), wire);
    }

    #[test]
    fn tab_container_props_parse_with_nested_components() {
        let node: UiComponent = serde_json::from_value(json!({
            "type": "tab-container",
            "props": {
                "tabs": [
                    { "id": "home", "label": "Home", "components": [
                        { "type": "header", "props": { "title": "Hi" } }
                    ]}
                ],
                "activeTab": "home"
            }
        }))
        .expect("deserialize");
        let UiComponent::TabContainer(props) = node else {
            panic!("expected tab container");
        };
        assert_eq!(props.active_tab.as_deref(), Some("home"));
        assert_eq!(props.tabs.len(), 1);
        assert_eq!(props.tabs[0].components.len(), 1);
    }

    #[test]
    fn malformed_container_props_degrade_to_an_opaque_widget() {
        let node: UiComponent = serde_json::from_value(json!({
            "type": "tab-container",
            "props": { "tabs": "not-a-list" }
        }))
        .expect("deserialize");
        assert_eq!(node.kind(), TAB_CONTAINER_KIND);
        assert!(matches!(node, UiComponent::Widget(_)));
    }

    #[test]
    fn generated_app_flattens_its_schema_on_the_wire() {
        let app = GeneratedApp {
            id: 7,
            position: WindowPosition { x: 120.0, y: 80.0 },
            z_index: 11,
            schema: AppSchema {
                app_name: "Notes".to_string(),
                icon: "<svg/>".to_string(),
                layout: AppLayout::ListView,
                components: Vec::new(),
                data_key: Some("notes-data".to_string()),
                app_data: Some(json!({ "notes": [] })),
                hardware_access: None,
                system_integration: Some(true),
            },
        };
        let wire = serde_json::to_value(&app).expect("serialize");
        assert_eq!(wire["appName"], json!("Notes"));
        assert_eq!(wire["zIndex"], json!(11));
        assert_eq!(wire["layout"], json!("list-view"));
        assert_eq!(wire["dataKey"], json!("notes-data"));

        let parsed: GeneratedApp = serde_json::from_value(wire).expect("deserialize");
        assert_eq!(parsed, app);
    }
}
