//! Error taxonomy shared by all collaborator services.

use thiserror::Error;

/// Failure of the external schema generator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The remote call failed before producing content.
    #[error("generator request failed: {0}")]
    RequestFailed(String),
    /// The generator produced content that is not a valid app schema.
    #[error("generator returned a malformed schema: {0}")]
    MalformedResponse(String),
    /// No generator is configured in this environment.
    #[error("schema generation is unavailable")]
    Unavailable,
}

/// Failure of the persistence layer.
///
/// The runtime treats every storage failure as non-fatal: it logs and falls
/// back to in-memory state where possible.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The underlying store rejected or lost the operation.
    #[error("storage backend error: {0}")]
    Backend(String),
    /// A stored payload could not be decoded.
    #[error("stored payload is malformed: {0}")]
    Malformed(String),
}

/// Failure of a hardware collaborator call.
///
/// Permission denial is not an error: denied capabilities surface as
/// `Ok(None)` / `Ok(false)` results so widgets can degrade inline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HardwareError {
    /// The device or capability is missing on this host.
    #[error("hardware capability unavailable: {0}")]
    Unavailable(String),
    /// The operation started but failed mid-flight.
    #[error("hardware operation failed: {0}")]
    Failed(String),
}
