//! Exit codes following sysexits.h conventions.
//!
//! These codes provide semantic meaning for different failure modes,
//! enabling scripts and CI systems to handle errors appropriately.

use metasupply_core::{ErrorKind, IdentityError, RegistryError, SessionError, ValidationError};

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid arguments, blank required fields).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data error (registry rejected the record, superseded version).
/// Maps to EX_DATAERR from sysexits.h.
pub const REJECTED: i32 = 65;

/// Record not found.
/// Maps to EX_NOINPUT from sysexits.h.
pub const NOT_FOUND: i32 = 66;

/// Service unavailable (registry unreachable, local store unreadable).
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const NETWORK_ERROR: i32 = 69;

/// Registry replied with something that is not a valid response.
/// Maps to EX_PROTOCOL from sysexits.h.
pub const PROTOCOL_ERROR: i32 = 76;

/// Login failed or was cancelled.
/// Maps to EX_NOPERM from sysexits.h.
pub const LOGIN_FAILED: i32 = 77;

/// Represents an exit code with optional error context.
#[derive(Debug)]
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let code = err.chain().find_map(classify).unwrap_or(GENERAL_ERROR);
        Self {
            code,
            message: Some(format!("{err:#}")),
        }
    }
}

fn classify(cause: &(dyn std::error::Error + 'static)) -> Option<i32> {
    if let Some(e) = cause.downcast_ref::<SessionError>() {
        return Some(match e {
            SessionError::Identity(_) => LOGIN_FAILED,
            SessionError::Registry(e) => for_kind(e.kind()),
            SessionError::NotFound(_) => NOT_FOUND,
        });
    }
    if let Some(e) = cause.downcast_ref::<RegistryError>() {
        return Some(for_kind(e.kind()));
    }
    if cause.is::<ValidationError>() {
        return Some(USAGE_ERROR);
    }
    if cause.is::<IdentityError>() {
        return Some(LOGIN_FAILED);
    }
    None
}

fn for_kind(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Validation => USAGE_ERROR,
        ErrorKind::ServiceRejected | ErrorKind::Superseded => REJECTED,
        ErrorKind::Unreachable => NETWORK_ERROR,
        ErrorKind::MalformedResponse => PROTOCOL_ERROR,
    }
}
