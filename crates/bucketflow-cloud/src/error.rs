//! Error types for the bucket reconciler and its provider gateway

use std::fmt;
use thiserror::Error;

/// Errors returned by a [`BucketGateway`](crate::BucketGateway) implementation.
///
/// `NotFound` is kept as its own variant so callers can match on it instead
/// of inspecting status codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The addressed bucket (or sub-resource) does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Request was rate limited or failed with a transient server error
    #[error("throttled: {0}")]
    Throttled(String),

    /// Provider rejected the request
    #[error("{}", format_api_error(code.as_deref(), message))]
    Api {
        code: Option<String>,
        message: String,
    },

    /// Request never produced a provider response
    #[error("transport error: {0}")]
    Transport(String),
}

fn format_api_error(code: Option<&str>, message: &str) -> String {
    match code {
        Some(code) => format!("{}: {}", code, message),
        None => message.to_string(),
    }
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound(_))
    }

    /// Whether a gateway-level retry may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Throttled(_) | GatewayError::Transport(_))
    }
}

/// Lifecycle step that issued a failing gateway call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateBucket,
    ReadBucket,
    DeleteBucket,
    PutWebsite,
    DeleteWebsite,
    FetchTags,
    PutTags,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateBucket => write!(f, "creating S3 bucket"),
            Operation::ReadBucket => write!(f, "reading S3 bucket"),
            Operation::DeleteBucket => write!(f, "deleting S3 bucket"),
            Operation::PutWebsite => write!(f, "putting S3 website"),
            Operation::DeleteWebsite => write!(f, "deleting S3 website"),
            Operation::FetchTags => write!(f, "fetching S3 bucket tags"),
            Operation::PutTags => write!(f, "putting S3 bucket tags"),
        }
    }
}

/// Bucket controller errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("error {operation} \"{bucket}\": {source}")]
    Gateway {
        operation: Operation,
        bucket: String,
        #[source]
        source: GatewayError,
    },

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub(crate) fn gateway(
        operation: Operation,
        bucket: impl Into<String>,
        source: GatewayError,
    ) -> Self {
        CloudError::Gateway {
            operation,
            bucket: bucket.into(),
            source,
        }
    }

    /// Whether the underlying gateway error was a not-found status
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::Gateway { source, .. } if source.is_not_found())
    }

    /// The underlying gateway error, if any
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            CloudError::Gateway { source, .. } => Some(source),
            _ => None,
        }
    }

    /// The lifecycle step a gateway failure is attributed to
    pub fn operation(&self) -> Option<Operation> {
        match self {
            CloudError::Gateway { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_annotated_with_bucket_and_operation() {
        let err = CloudError::gateway(
            Operation::ReadBucket,
            "b1",
            GatewayError::Api {
                code: Some("AccessDenied".to_string()),
                message: "denied".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "error reading S3 bucket \"b1\": AccessDenied: denied"
        );
        assert_eq!(err.operation(), Some(Operation::ReadBucket));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_survives_wrapping() {
        let err = CloudError::gateway(
            Operation::DeleteBucket,
            "gone",
            GatewayError::NotFound("NoSuchBucket".to_string()),
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn test_retryable_variants() {
        assert!(GatewayError::Throttled("SlowDown".into()).is_retryable());
        assert!(GatewayError::Transport("reset".into()).is_retryable());
        assert!(!GatewayError::NotFound("x".into()).is_retryable());
        assert!(
            !GatewayError::Api {
                code: None,
                message: "bad".into()
            }
            .is_retryable()
        );
    }
}
