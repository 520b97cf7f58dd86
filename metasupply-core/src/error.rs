use thiserror::Error;

use crate::record::RecordId;

/// Fields a submission must carry before it may reach the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Filename,
    Model,
    Dataset,
}

impl std::fmt::Display for RequiredField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Filename => write!(f, "filename"),
            Self::Model => write!(f, "model"),
            Self::Dataset => write!(f, "dataset"),
        }
    }
}

/// Local validation failure. Never reaches the remote service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field '{0}' is empty")]
    EmptyField(RequiredField),

    #[error("Unknown search field '{0}' (expected filename, dataset or model)")]
    UnknownSearchField(String),
}

/// Violation of the registry wire format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("Optional value encoded with {0} elements (expected 0 or 1)")]
    OptionArity(usize),

    #[error("Unexpected reply shape: {0}")]
    Shape(String),
}

/// Failure below the wire format: the remote could not be reached or did not
/// produce a body at all.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Registry unreachable: {0}")]
    Unreachable(String),

    #[error("Registry returned an unreadable body: {0}")]
    InvalidBody(String),

    #[cfg(feature = "network")]
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Coarse classification of registry failures, as surfaced to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    ServiceRejected,
    Unreachable,
    MalformedResponse,
    Superseded,
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Registry rejected the request: {0}")]
    ServiceRejected(String),

    #[error("Registry unreachable: {0}")]
    Unreachable(String),

    #[error("Malformed registry response: {0}")]
    MalformedResponse(String),

    #[error("Version {previous} has already been superseded")]
    Superseded { previous: RecordId },
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::ServiceRejected(_) => ErrorKind::ServiceRejected,
            Self::Unreachable(_) => ErrorKind::Unreachable,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::Superseded { .. } => ErrorKind::Superseded,
        }
    }
}

impl From<WireError> for RegistryError {
    fn from(e: WireError) -> Self {
        Self::MalformedResponse(e.to_string())
    }
}

impl From<TransportError> for RegistryError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Unreachable(msg) => Self::Unreachable(msg),
            TransportError::InvalidBody(msg) => Self::MalformedResponse(msg),
            #[cfg(feature = "network")]
            TransportError::Http(err) => {
                if err.is_decode() {
                    Self::MalformedResponse(err.to_string())
                } else {
                    Self::Unreachable(err.to_string())
                }
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            RegistryError::from(ValidationError::EmptyField(RequiredField::Model)).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            RegistryError::ServiceRejected("no".into()).kind(),
            ErrorKind::ServiceRejected
        );
        assert_eq!(
            RegistryError::from(TransportError::Unreachable("down".into())).kind(),
            ErrorKind::Unreachable
        );
        assert_eq!(
            RegistryError::from(TransportError::InvalidBody("<html>".into())).kind(),
            ErrorKind::MalformedResponse
        );
        assert_eq!(
            RegistryError::from(WireError::OptionArity(2)).kind(),
            ErrorKind::MalformedResponse
        );
    }

    #[test]
    fn test_validation_message_names_field() {
        let err = ValidationError::EmptyField(RequiredField::Dataset);
        assert_eq!(err.to_string(), "Required field 'dataset' is empty");
    }
}
