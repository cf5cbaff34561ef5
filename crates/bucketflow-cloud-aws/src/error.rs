//! S3 error classification
//!
//! Maps AWS SDK errors onto [`GatewayError`] using the error code and HTTP
//! status instead of string matching on the Debug format.

use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use bucketflow_cloud::GatewayError;

/// S3 error codes meaning the bucket or sub-resource is absent
const NOT_FOUND_CODES: &[&str] = &[
    "NoSuchBucket",
    "NotFound",
    "NoSuchTagSet",
    "NoSuchWebsiteConfiguration",
];

/// S3 error codes worth retrying with backoff
const THROTTLING_CODES: &[&str] = &[
    "SlowDown",
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "ServiceUnavailable",
    "InternalError",
    "RequestTimeout",
];

/// Error code returned by GetBucketTagging for a bucket without tags
pub(crate) const NO_SUCH_TAG_SET: &str = "NoSuchTagSet";

/// Error code returned by CreateBucket when this account already owns the bucket
pub(crate) const BUCKET_ALREADY_OWNED_BY_YOU: &str = "BucketAlreadyOwnedByYou";

/// Classify an S3 error from its code, message and HTTP status.
pub fn classify_s3_error(
    code: Option<&str>,
    message: Option<&str>,
    status: Option<u16>,
) -> GatewayError {
    // Some SDK errors carry an empty message; fall back to the code
    let message = message
        .filter(|m| !m.is_empty())
        .or(code)
        .unwrap_or("Unknown error")
        .to_string();

    match (code, status) {
        (Some(c), _) if NOT_FOUND_CODES.contains(&c) => GatewayError::NotFound(message),
        (Some(c), _) if THROTTLING_CODES.contains(&c) => GatewayError::Throttled(message),
        (None, Some(404)) => GatewayError::NotFound(message),
        (None, Some(s)) if s == 429 || s >= 500 => GatewayError::Throttled(message),
        _ => GatewayError::Api {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify an SDK error returned by any S3 operation.
pub fn classify_sdk_error<E>(error: &SdkError<E, HttpResponse>) -> GatewayError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    match error {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            GatewayError::Transport(DisplayErrorContext(error).to_string())
        }
        SdkError::ConstructionFailure(_) => GatewayError::Api {
            code: None,
            message: DisplayErrorContext(error).to_string(),
        },
        _ => {
            let status = error.raw_response().map(|r| r.status().as_u16());
            classify_s3_error(error.code(), error.message(), status)
        }
    }
}

/// Error code to user-friendly suggestion mapping
const SUGGESTIONS: &[(&str, &str)] = &[
    (
        "BucketAlreadyExists",
        "Bucket names are global across all accounts. Choose another name.",
    ),
    (
        "BucketAlreadyOwnedByYou",
        "The bucket already exists in this account. Import it into state or pick another name.",
    ),
    (
        "BucketNotEmpty",
        "Empty the bucket before deleting it.",
    ),
    (
        "IllegalLocationConstraintException",
        "The configured region does not match the endpoint. Check AWS_REGION.",
    ),
    (
        "InvalidBucketName",
        "Bucket names must be 3-63 lowercase letters, digits, dots or hyphens.",
    ),
    (
        "AccessDenied",
        "Check the IAM permissions of the configured credentials.",
    ),
];

/// Get a user-friendly suggestion for a gateway error, if available.
pub fn suggestion(error: &GatewayError) -> Option<&'static str> {
    match error {
        GatewayError::Api { code: Some(c), .. } => SUGGESTIONS
            .iter()
            .find(|(code, _)| code == c)
            .map(|(_, s)| *s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_codes() {
        for code in NOT_FOUND_CODES {
            let err = classify_s3_error(Some(code), Some("msg"), Some(404));
            assert!(err.is_not_found(), "Expected NotFound for code: {code}");
        }
    }

    #[test]
    fn head_bucket_404_without_code() {
        // HeadBucket responses have no body, so only the status is known
        let err = classify_s3_error(None, None, Some(404));
        assert!(err.is_not_found());
    }

    #[test]
    fn throttling_codes() {
        for code in THROTTLING_CODES {
            let err = classify_s3_error(Some(code), Some("msg"), Some(503));
            assert!(err.is_retryable(), "Expected retryable for code: {code}");
            assert!(matches!(err, GatewayError::Throttled(_)));
        }
        assert!(classify_s3_error(None, None, Some(500)).is_retryable());
        assert!(classify_s3_error(None, None, Some(429)).is_retryable());
    }

    #[test]
    fn unknown_and_missing_codes() {
        let err = classify_s3_error(Some("AccessDenied"), Some("Access Denied"), Some(403));
        assert_eq!(
            err,
            GatewayError::Api {
                code: Some("AccessDenied".to_string()),
                message: "Access Denied".to_string(),
            }
        );

        let err = classify_s3_error(None, Some(""), Some(400));
        assert_eq!(
            err,
            GatewayError::Api {
                code: None,
                message: "Unknown error".to_string(),
            }
        );
    }

    #[test]
    fn empty_message_falls_back_to_code() {
        let err = classify_s3_error(Some("MalformedXML"), Some(""), Some(400));
        assert_eq!(err.to_string(), "MalformedXML: MalformedXML");
    }

    #[test]
    fn suggestions_for_known_codes() {
        for (code, _) in SUGGESTIONS {
            let err = GatewayError::Api {
                code: Some(code.to_string()),
                message: "msg".to_string(),
            };
            assert!(suggestion(&err).is_some(), "No suggestion for code: {code}");
        }
        assert!(suggestion(&GatewayError::Throttled("x".into())).is_none());
    }
}
