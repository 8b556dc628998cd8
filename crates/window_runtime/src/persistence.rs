//! Layout snapshot persistence.
//!
//! The whole desktop layout lives under one key-value entry. Loading is
//! strictly best effort: a missing, malformed, or version-skewed snapshot
//! logs and yields a fresh desktop rather than an error.

use platform_services::{KeyValueStore, StorageError};
use tracing::warn;

use crate::model::{ShellSnapshot, SHELL_LAYOUT_SCHEMA_VERSION};

/// Key-value entry holding the serialized [`ShellSnapshot`].
pub const SHELL_LAYOUT_KEY: &str = "generative-os.layout.v1";

/// Loads the persisted layout snapshot, if one is usable.
pub async fn load_shell_snapshot(store: &dyn KeyValueStore) -> Option<ShellSnapshot> {
    let value = match store.get(SHELL_LAYOUT_KEY).await {
        Ok(Some(value)) => value,
        Ok(None) => return None,
        Err(err) => {
            warn!(%err, "layout snapshot load failed, starting fresh");
            return None;
        }
    };
    let snapshot: ShellSnapshot = match serde_json::from_value(value) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!(%err, "layout snapshot malformed, starting fresh");
            return None;
        }
    };
    if snapshot.schema_version != SHELL_LAYOUT_SCHEMA_VERSION {
        warn!(
            found = snapshot.schema_version,
            expected = SHELL_LAYOUT_SCHEMA_VERSION,
            "layout snapshot version mismatch, starting fresh"
        );
        return None;
    }
    Some(snapshot)
}

/// Persists the layout snapshot, replacing any previous one.
pub async fn persist_shell_snapshot(
    store: &dyn KeyValueStore,
    snapshot: &ShellSnapshot,
) -> Result<(), StorageError> {
    let value = serde_json::to_value(snapshot)
        .map_err(|err| StorageError::Malformed(err.to_string()))?;
    store.set(SHELL_LAYOUT_KEY, value).await
}

#[cfg(test)]
mod tests {
    use app_schema::{AppLayout, AppSchema, GeneratedApp, WindowPosition};
    use futures::executor::block_on;
    use platform_services::MemoryKeyValueStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::{WindowSize, WindowSnapshot};

    fn snapshot() -> ShellSnapshot {
        ShellSnapshot {
            schema_version: SHELL_LAYOUT_SCHEMA_VERSION,
            windows: vec![WindowSnapshot {
                app: GeneratedApp {
                    id: 3,
                    position: WindowPosition { x: 96.0, y: 104.0 },
                    z_index: 12,
                    schema: AppSchema {
                        app_name: "Todo".to_string(),
                        icon: "\u{2705}".to_string(),
                        layout: AppLayout::SingleView,
                        components: Vec::new(),
                        data_key: Some("todo-data".to_string()),
                        app_data: None,
                        hardware_access: None,
                        system_integration: None,
                    },
                },
                size: WindowSize::default(),
                minimized: false,
                maximized: false,
            }],
        }
    }

    #[test]
    fn snapshot_round_trips_through_the_store() {
        let store = MemoryKeyValueStore::default();
        block_on(persist_shell_snapshot(&store, &snapshot())).expect("persist");
        assert_eq!(block_on(load_shell_snapshot(&store)), Some(snapshot()));
    }

    #[test]
    fn empty_store_loads_nothing() {
        let store = MemoryKeyValueStore::default();
        assert_eq!(block_on(load_shell_snapshot(&store)), None);
    }

    #[test]
    fn malformed_snapshot_is_discarded() {
        let store = MemoryKeyValueStore::default();
        block_on(store.set(SHELL_LAYOUT_KEY, json!("not a snapshot"))).expect("set");
        assert_eq!(block_on(load_shell_snapshot(&store)), None);
    }

    #[test]
    fn version_skewed_snapshot_is_discarded() {
        let store = MemoryKeyValueStore::default();
        let mut skewed = snapshot();
        skewed.schema_version = SHELL_LAYOUT_SCHEMA_VERSION + 1;
        block_on(persist_shell_snapshot(&store, &skewed)).expect("persist");
        assert_eq!(block_on(load_shell_snapshot(&store)), None);
    }
}
