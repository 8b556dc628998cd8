//! Typed collaborator contracts for the generative window runtime.
//!
//! This crate is the capability boundary between the runtime core and the
//! outside world: the schema generator, the key-value store, the system-wide
//! record store, and hardware access. Every service is an object-safe trait
//! whose async methods return boxed local futures, so concrete adapters
//! (remote AI clients, IndexedDB bridges, OS integrations) stay out of the
//! core and in-memory fakes drop in for tests.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod generator;
pub mod hardware;
pub mod records;
pub mod storage;
pub mod time;

pub use error::{GenerationError, HardwareError, StorageError};
pub use generator::{FixedSchemaGenerator, GeneratorFuture, NoopSchemaGenerator, SchemaGenerator};
pub use hardware::{
    AudioRecording, GeoLocation, HardwareFuture, HardwareService, MemoryHardwareService,
    NoopHardwareService, SelectedFile,
};
pub use records::{
    FileRecord, MemoryRecordStore, NoopRecordStore, RecordId, RecordStoreFuture, SystemRecordStore,
};
pub use storage::{KeyValueFuture, KeyValueStore, MemoryKeyValueStore, NoopKeyValueStore};
pub use time::{next_monotonic_timestamp_ms, unix_time_ms_now};
