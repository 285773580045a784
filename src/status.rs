//! Status codes
//!
//! The closed result table shared by the native engine and the binding layer.
//!
//! ## Raw Codes
//! ```text
//! ┌────────┬─────────────────────┐
//! │ Code   │ Status              │
//! ├────────┼─────────────────────┤
//! │ 0      │ Ok                  │
//! │ 1      │ Failed              │
//! │ 2      │ NotFound            │
//! │ 4      │ InvalidArgument     │
//! │ 5      │ ConfigParsingError  │
//! │ 7      │ StoppedByUser       │
//! │ 8      │ OutOfMemory         │
//! │ 9      │ WrongEngineName     │
//! │ 10     │ EngineNotFound      │
//! │ 11     │ UnknownFailure      │
//! └────────┴─────────────────────┘
//! ```
//!
//! Any other raw value decodes to `UnknownFailure`.

use std::fmt;
use std::os::raw::c_int;

/// Result status of a single engine call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    Ok = 0,
    Failed = 1,
    NotFound = 2,
    InvalidArgument = 4,
    ConfigParsingError = 5,
    StoppedByUser = 7,
    OutOfMemory = 8,
    WrongEngineName = 9,
    EngineNotFound = 10,
    UnknownFailure = 11,
}

impl Status {
    /// Decode a raw status returned across the native boundary
    pub fn from_raw(code: c_int) -> Self {
        match code {
            0 => Status::Ok,
            1 => Status::Failed,
            2 => Status::NotFound,
            4 => Status::InvalidArgument,
            5 => Status::ConfigParsingError,
            7 => Status::StoppedByUser,
            8 => Status::OutOfMemory,
            9 => Status::WrongEngineName,
            10 => Status::EngineNotFound,
            _ => Status::UnknownFailure,
        }
    }

    /// Raw code as handed to native callers
    pub fn as_raw(self) -> c_int {
        self as c_int
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }

    /// True for outcomes that are expected results rather than faults
    ///
    /// `NotFound` is a negative answer and `StoppedByUser` is a caller-requested
    /// end of a scan. Whether either is acceptable depends on the operation.
    pub fn is_outcome(self) -> bool {
        matches!(self, Status::Ok | Status::NotFound | Status::StoppedByUser)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Ok => "OK",
            Status::Failed => "FAILED",
            Status::NotFound => "NOT_FOUND",
            Status::InvalidArgument => "INVALID_ARGUMENT",
            Status::ConfigParsingError => "CONFIG_PARSING_ERROR",
            Status::StoppedByUser => "STOPPED_BY_USER",
            Status::OutOfMemory => "OUT_OF_MEMORY",
            Status::WrongEngineName => "WRONG_ENGINE_NAME",
            Status::EngineNotFound => "ENGINE_NOT_FOUND",
            Status::UnknownFailure => "UNKNOWN_FAILURE",
        };
        f.write_str(name)
    }
}
