//! Unified error codes
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Session / command errors
//! - 9xxx: Store / system errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient
/// serialization and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 4xxx: Session ====================
    /// Cart is empty (submit on an empty cart)
    CartEmpty = 4001,
    /// Request not found
    RequestNotFound = 4002,
    /// Table is locked (bill requested, awaiting settlement)
    TableLocked = 4003,

    // ==================== 9xxx: Store / System ====================
    /// Internal error
    InternalError = 9000,
    /// Store unreachable (connectivity loss, retry-eligible)
    StoreUnavailable = 9001,
    /// Store operation timed out (retry-eligible)
    StoreTimeout = 9002,
    /// Store rejected the write (constraint or backend failure)
    StoreRejected = 9003,
    /// Archival sequence left unverified destructive steps
    ArchiveIncomplete = 9004,
}

impl ErrorCode {
    /// Default human-readable message for this code
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::Unknown => "Unknown error",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field missing",
            ErrorCode::ValueOutOfRange => "Value out of range",
            ErrorCode::CartEmpty => "Cart is empty",
            ErrorCode::RequestNotFound => "Request not found",
            ErrorCode::TableLocked => "Table is locked",
            ErrorCode::InternalError => "Internal error",
            ErrorCode::StoreUnavailable => "Store unavailable",
            ErrorCode::StoreTimeout => "Store operation timed out",
            ErrorCode::StoreRejected => "Store rejected the operation",
            ErrorCode::ArchiveIncomplete => "Archival sequence incomplete",
        }
    }

    /// Transient errors are connectivity-class failures that a retry with
    /// backoff may resolve. Rejections and validation failures are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorCode::StoreUnavailable | ErrorCode::StoreTimeout)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, *self as u16)
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> u16 {
        code as u16
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            1 => ErrorCode::Unknown,
            2 => ErrorCode::ValidationFailed,
            3 => ErrorCode::NotFound,
            4 => ErrorCode::AlreadyExists,
            5 => ErrorCode::InvalidRequest,
            7 => ErrorCode::RequiredField,
            8 => ErrorCode::ValueOutOfRange,
            4001 => ErrorCode::CartEmpty,
            4002 => ErrorCode::RequestNotFound,
            4003 => ErrorCode::TableLocked,
            9000 => ErrorCode::InternalError,
            9001 => ErrorCode::StoreUnavailable,
            9002 => ErrorCode::StoreTimeout,
            9003 => ErrorCode::StoreRejected,
            9004 => ErrorCode::ArchiveIncomplete,
            other => return Err(format!("unknown error code: {}", other)),
        };
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_through_u16() {
        for code in [
            ErrorCode::ValidationFailed,
            ErrorCode::TableLocked,
            ErrorCode::StoreUnavailable,
            ErrorCode::ArchiveIncomplete,
        ] {
            let raw: u16 = code.into();
            assert_eq!(ErrorCode::try_from(raw).unwrap(), code);
        }
    }

    #[test]
    fn transient_classification() {
        assert!(ErrorCode::StoreUnavailable.is_transient());
        assert!(ErrorCode::StoreTimeout.is_transient());
        assert!(!ErrorCode::StoreRejected.is_transient());
        assert!(!ErrorCode::ValidationFailed.is_transient());
    }
}
