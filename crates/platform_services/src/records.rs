//! System-wide record store contract: mailbox, contacts, notes, calendar,
//! files, and per-app data scoped by `dataKey`.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StorageError;

/// Object-safe boxed future used by [`SystemRecordStore`] methods.
pub type RecordStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Generated identifier for an appended record.
pub type RecordId = u64;

/// A stored file entry: captured media, recordings, and uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Filename, already free of placeholder tokens.
    pub name: String,
    /// MIME type of the payload.
    pub mime_type: String,
    /// Payload size in bytes.
    pub size: u64,
    /// File payload.
    pub bytes: Vec<u8>,
    /// Classification tags (for example `camera`, `photo`).
    pub tags: Vec<String>,
    /// Virtual folder the file lives in.
    pub folder: String,
}

/// Store for records shared across every generated app.
///
/// Append operations return a generated id. All failures are [`StorageError`];
/// the runtime logs them and continues.
pub trait SystemRecordStore {
    /// Appends a mailbox record.
    fn add_email<'a>(&'a self, email: Value) -> RecordStoreFuture<'a, Result<RecordId, StorageError>>;

    /// Appends an address-book record.
    fn add_contact<'a>(
        &'a self,
        contact: Value,
    ) -> RecordStoreFuture<'a, Result<RecordId, StorageError>>;

    /// Appends a notes record.
    fn add_note<'a>(&'a self, note: Value) -> RecordStoreFuture<'a, Result<RecordId, StorageError>>;

    /// Appends a calendar event record.
    fn add_calendar_event<'a>(
        &'a self,
        event: Value,
    ) -> RecordStoreFuture<'a, Result<RecordId, StorageError>>;

    /// Appends a file record.
    fn add_file<'a>(
        &'a self,
        file: FileRecord,
    ) -> RecordStoreFuture<'a, Result<RecordId, StorageError>>;

    /// Lists every stored file record.
    fn list_files<'a>(&'a self) -> RecordStoreFuture<'a, Result<Vec<FileRecord>, StorageError>>;

    /// Replaces the app-data payload stored for `data_key`, attributed to `app_id`.
    fn set_app_data<'a>(
        &'a self,
        data_key: &'a str,
        app_id: &'a str,
        data: Value,
    ) -> RecordStoreFuture<'a, Result<(), StorageError>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op record store for unsupported targets.
pub struct NoopRecordStore;

impl SystemRecordStore for NoopRecordStore {
    fn add_email<'a>(
        &'a self,
        _email: Value,
    ) -> RecordStoreFuture<'a, Result<RecordId, StorageError>> {
        Box::pin(async { Ok(0) })
    }

    fn add_contact<'a>(
        &'a self,
        _contact: Value,
    ) -> RecordStoreFuture<'a, Result<RecordId, StorageError>> {
        Box::pin(async { Ok(0) })
    }

    fn add_note<'a>(
        &'a self,
        _note: Value,
    ) -> RecordStoreFuture<'a, Result<RecordId, StorageError>> {
        Box::pin(async { Ok(0) })
    }

    fn add_calendar_event<'a>(
        &'a self,
        _event: Value,
    ) -> RecordStoreFuture<'a, Result<RecordId, StorageError>> {
        Box::pin(async { Ok(0) })
    }

    fn add_file<'a>(
        &'a self,
        _file: FileRecord,
    ) -> RecordStoreFuture<'a, Result<RecordId, StorageError>> {
        Box::pin(async { Ok(0) })
    }

    fn list_files<'a>(&'a self) -> RecordStoreFuture<'a, Result<Vec<FileRecord>, StorageError>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn set_app_data<'a>(
        &'a self,
        _data_key: &'a str,
        _app_id: &'a str,
        _data: Value,
    ) -> RecordStoreFuture<'a, Result<(), StorageError>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Default)]
struct MemoryRecordState {
    next_id: RecordId,
    emails: Vec<(RecordId, Value)>,
    contacts: Vec<(RecordId, Value)>,
    notes: Vec<(RecordId, Value)>,
    events: Vec<(RecordId, Value)>,
    files: Vec<(RecordId, FileRecord)>,
    app_data: HashMap<String, (String, Value)>,
}

impl MemoryRecordState {
    fn next_id(&mut self) -> RecordId {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory record store for tests and the simulator host.
pub struct MemoryRecordStore {
    inner: Rc<RefCell<MemoryRecordState>>,
}

impl MemoryRecordStore {
    /// Returns every stored mailbox record.
    pub fn emails(&self) -> Vec<Value> {
        self.inner.borrow().emails.iter().map(|(_, v)| v.clone()).collect()
    }

    /// Returns every stored notes record.
    pub fn notes(&self) -> Vec<Value> {
        self.inner.borrow().notes.iter().map(|(_, v)| v.clone()).collect()
    }

    /// Returns every stored file record.
    pub fn files(&self) -> Vec<FileRecord> {
        self.inner.borrow().files.iter().map(|(_, f)| f.clone()).collect()
    }

    /// Returns the app-data payload stored for `data_key`, if any.
    pub fn app_data(&self, data_key: &str) -> Option<Value> {
        self.inner
            .borrow()
            .app_data
            .get(data_key)
            .map(|(_, v)| v.clone())
    }
}

impl SystemRecordStore for MemoryRecordStore {
    fn add_email<'a>(&'a self, email: Value) -> RecordStoreFuture<'a, Result<RecordId, StorageError>> {
        Box::pin(async move {
            let mut state = self.inner.borrow_mut();
            let id = state.next_id();
            state.emails.push((id, email));
            Ok(id)
        })
    }

    fn add_contact<'a>(
        &'a self,
        contact: Value,
    ) -> RecordStoreFuture<'a, Result<RecordId, StorageError>> {
        Box::pin(async move {
            let mut state = self.inner.borrow_mut();
            let id = state.next_id();
            state.contacts.push((id, contact));
            Ok(id)
        })
    }

    fn add_note<'a>(&'a self, note: Value) -> RecordStoreFuture<'a, Result<RecordId, StorageError>> {
        Box::pin(async move {
            let mut state = self.inner.borrow_mut();
            let id = state.next_id();
            state.notes.push((id, note));
            Ok(id)
        })
    }

    fn add_calendar_event<'a>(
        &'a self,
        event: Value,
    ) -> RecordStoreFuture<'a, Result<RecordId, StorageError>> {
        Box::pin(async move {
            let mut state = self.inner.borrow_mut();
            let id = state.next_id();
            state.events.push((id, event));
            Ok(id)
        })
    }

    fn add_file<'a>(
        &'a self,
        file: FileRecord,
    ) -> RecordStoreFuture<'a, Result<RecordId, StorageError>> {
        Box::pin(async move {
            let mut state = self.inner.borrow_mut();
            let id = state.next_id();
            state.files.push((id, file));
            Ok(id)
        })
    }

    fn list_files<'a>(&'a self) -> RecordStoreFuture<'a, Result<Vec<FileRecord>, StorageError>> {
        Box::pin(async move { Ok(self.files()) })
    }

    fn set_app_data<'a>(
        &'a self,
        data_key: &'a str,
        app_id: &'a str,
        data: Value,
    ) -> RecordStoreFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            self.inner
                .borrow_mut()
                .app_data
                .insert(data_key.to_string(), (app_id.to_string(), data));
            Ok(())
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
    fn memory_store_appends_records_with_fresh_ids() {
        let store = MemoryRecordStore::default();
        let store_obj: &dyn SystemRecordStore = &store;

        let first = block_on(store_obj.add_note(json!({ "title": "a" }))).expect("add note");
        let second = block_on(store_obj.add_email(json!({ "subject": "b" }))).expect("add email");
        assert_eq!((first, second), (1, 2));
        assert_eq!(store.notes(), vec![json!({ "title": "a" })]);
        assert_eq!(store.emails(), vec![json!({ "subject": "b" })]);
    }

    #[test]
    fn app_data_is_replaced_wholesale_per_data_key() {
        let store = MemoryRecordStore::default();
        let store_obj: &dyn SystemRecordStore = &store;

        block_on(store_obj.set_app_data("todo-data", "app_1", json!({ "items": [1] })))
            .expect("set");
        block_on(store_obj.set_app_data("todo-data", "app_1", json!({ "items": [1, 2] })))
            .expect("set");
        assert_eq!(store.app_data("todo-data"), Some(json!({ "items": [1, 2] })));
    }

    #[test]
    fn file_records_round_trip_through_list_files() {
        let store = MemoryRecordStore::default();
        let store_obj: &dyn SystemRecordStore = &store;
        let record = FileRecord {
            name: "photo_1.jpeg".to_string(),
            mime_type: "image/jpeg".to_string(),
            size: 3,
            bytes: vec![1, 2, 3],
            tags: vec!["camera".to_string(), "photo".to_string()],
            folder: "photos".to_string(),
        };

        block_on(store_obj.add_file(record.clone())).expect("add file");
        assert_eq!(block_on(store_obj.list_files()).expect("list"), vec![record]);
    }
}
