//! Error types for kvbridge
//!
//! Failures are kept apart from expected outcomes: `NotFound` surfaces as
//! `Ok(None)` / `Ok(false)` and an early scan stop as `ScanOutcome`, never as
//! a `KvError`.

use std::convert::Infallible;

use thiserror::Error;
use tracing::warn;

use crate::ffi;
use crate::status::Status;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for engine operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // Engine Faults
    // -------------------------------------------------------------------------
    #[error("Engine operation failed: {0}")]
    Failed(String),

    #[error("Unknown engine failure (status {code}): {message}")]
    UnknownFailure { code: i32, message: String },

    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // -------------------------------------------------------------------------
    // Open-Time Errors
    // -------------------------------------------------------------------------
    #[error("Config parsing error: {0}")]
    ConfigParsing(String),

    #[error("Engine not found: {0}")]
    EngineNotFound(String),

    #[error("Wrong engine name: {0}")]
    WrongEngineName(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("{op} returned unexpected status {status}")]
    UnexpectedStatus { op: &'static str, status: Status },
}

impl KvError {
    /// Build the error for a failure status reported by the engine
    ///
    /// `code` is the raw value so unlisted codes keep their number in the
    /// message. Statuses that are outcomes rather than faults become
    /// `UnexpectedStatus`: the caller asked for a failure where the operation
    /// had no failure to report.
    pub fn from_status(op: &'static str, code: i32, message: String) -> Self {
        match Status::from_raw(code) {
            Status::Failed => KvError::Failed(message),
            Status::OutOfMemory => KvError::OutOfMemory(message),
            Status::InvalidArgument => KvError::InvalidArgument(message),
            Status::ConfigParsingError => KvError::ConfigParsing(message),
            Status::EngineNotFound => KvError::EngineNotFound(message),
            Status::WrongEngineName => KvError::WrongEngineName(message),
            Status::UnknownFailure => KvError::UnknownFailure { code, message },
            status @ (Status::Ok | Status::NotFound | Status::StoppedByUser) => {
                KvError::UnexpectedStatus { op, status }
            }
        }
    }

    /// Error for a failure status the engine just reported
    ///
    /// Picks up the engine's last error message and logs the failure.
    pub(crate) fn engine_failure(op: &'static str, code: i32) -> Self {
        let message = ffi::last_error_message();
        warn!(op, status = %Status::from_raw(code), %message, "engine operation failed");
        KvError::from_status(op, code, message)
    }

    /// Error for any operation attempted on a closed handle
    pub(crate) fn closed() -> Self {
        KvError::InvalidArgument("database is closed".to_string())
    }

    /// The status this error corresponds to
    pub fn status(&self) -> Status {
        match self {
            KvError::Failed(_) => Status::Failed,
            KvError::UnknownFailure { .. } => Status::UnknownFailure,
            KvError::OutOfMemory(_) => Status::OutOfMemory,
            KvError::InvalidArgument(_) => Status::InvalidArgument,
            KvError::ConfigParsing(_) => Status::ConfigParsingError,
            KvError::EngineNotFound(_) => Status::EngineNotFound,
            KvError::WrongEngineName(_) => Status::WrongEngineName,
            KvError::UnexpectedStatus { status, .. } => *status,
        }
    }
}

/// Failure of a callback-driven scan
///
/// Either the engine reported a fault, or the caller's callback returned an
/// error, which is handed back unchanged.
#[derive(Debug, Error)]
pub enum ScanError<E> {
    /// The engine (or the handle) failed
    #[error(transparent)]
    Engine(#[from] KvError),

    /// The callback returned `Err`; the scan stopped at that entry
    #[error("Scan callback failed: {0}")]
    Callback(#[source] E),
}

impl<E> ScanError<E> {
    /// The callback's error, if that is what stopped the scan
    pub fn into_callback(self) -> Option<E> {
        match self {
            ScanError::Callback(e) => Some(e),
            ScanError::Engine(_) => None,
        }
    }

    /// The engine error, if the engine failed
    pub fn engine(&self) -> Option<&KvError> {
        match self {
            ScanError::Engine(e) => Some(e),
            ScanError::Callback(_) => None,
        }
    }
}

impl From<ScanError<Infallible>> for KvError {
    fn from(e: ScanError<Infallible>) -> Self {
        match e {
            ScanError::Engine(e) => e,
            ScanError::Callback(never) => match never {},
        }
    }
}
