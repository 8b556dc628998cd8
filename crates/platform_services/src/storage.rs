//! Key-value persistence contract and adapters.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

use serde_json::Value;

use crate::error::StorageError;

/// Object-safe boxed future used by [`KeyValueStore`] methods.
pub type KeyValueFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Keyed JSON-value store shared by every window (`dataKey` namespace).
///
/// Concurrent writes to the same key are last-write-wins; no transaction
/// boundary is provided at this layer.
pub trait KeyValueStore {
    /// Loads the value stored under `key`, if any.
    fn get<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, Result<Option<Value>, StorageError>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set<'a>(&'a self, key: &'a str, value: Value)
        -> KeyValueFuture<'a, Result<(), StorageError>>;

    /// Removes the value stored under `key`.
    fn remove<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, Result<(), StorageError>>;

    /// Lists every stored key.
    fn keys<'a>(&'a self) -> KeyValueFuture<'a, Result<Vec<String>, StorageError>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op store for unsupported targets and baseline tests.
pub struct NoopKeyValueStore;

impl KeyValueStore for NoopKeyValueStore {
    fn get<'a>(&'a self, _key: &'a str) -> KeyValueFuture<'a, Result<Option<Value>, StorageError>> {
        Box::pin(async { Ok(None) })
    }

    fn set<'a>(
        &'a self,
        _key: &'a str,
        _value: Value,
    ) -> KeyValueFuture<'a, Result<(), StorageError>> {
        Box::pin(async { Ok(()) })
    }

    fn remove<'a>(&'a self, _key: &'a str) -> KeyValueFuture<'a, Result<(), StorageError>> {
        Box::pin(async { Ok(()) })
    }

    fn keys<'a>(&'a self) -> KeyValueFuture<'a, Result<Vec<String>, StorageError>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory store keyed by string, for tests and the simulator host.
pub struct MemoryKeyValueStore {
    inner: Rc<RefCell<HashMap<String, Value>>>,
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, Result<Option<Value>, StorageError>> {
        Box::pin(async move { Ok(self.inner.borrow().get(key).cloned()) })
    }

    fn set<'a>(
        &'a self,
        key: &'a str,
        value: Value,
    ) -> KeyValueFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            self.inner.borrow_mut().insert(key.to_string(), value);
            Ok(())
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            self.inner.borrow_mut().remove(key);
            Ok(())
        })
    }

    fn keys<'a>(&'a self) -> KeyValueFuture<'a, Result<Vec<String>, StorageError>> {
        Box::pin(async move {
            let mut keys: Vec<String> = self.inner.borrow().keys().cloned().collect();
            keys.sort();
            Ok(keys)
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn memory_store_round_trips_and_lists_sorted_keys() {
        let store = MemoryKeyValueStore::default();
        let store_obj: &dyn KeyValueStore = &store;

        block_on(store_obj.set("todo-data", json!({ "items": [1] }))).expect("set");
        block_on(store_obj.set("album-data", json!([]))).expect("set");

        assert_eq!(
            block_on(store_obj.get("todo-data")).expect("get"),
            Some(json!({ "items": [1] }))
        );
        assert_eq!(
            block_on(store_obj.keys()).expect("keys"),
            vec!["album-data".to_string(), "todo-data".to_string()]
        );

        block_on(store_obj.remove("todo-data")).expect("remove");
        assert_eq!(block_on(store_obj.get("todo-data")).expect("get"), None);
    }

    #[test]
    fn noop_store_is_empty_and_successful() {
        let store = NoopKeyValueStore;
        let store_obj: &dyn KeyValueStore = &store;
        block_on(store_obj.set("k", json!(1))).expect("set");
        assert_eq!(block_on(store_obj.get("k")).expect("get"), None);
        assert_eq!(block_on(store_obj.keys()).expect("keys"), Vec::<String>::new());
    }
}
