//! BucketFlow AWS S3 gateway
//!
//! Implements [`bucketflow_cloud::BucketGateway`] on top of `aws-sdk-s3`.
//!
//! ## Features
//!
//! - Region-aware bucket creation (no location constraint in `us-east-1`)
//! - Website configuration put/delete
//! - Full-replace tagging, with an empty set mapped to DeleteBucketTagging
//! - Error classification into not-found, throttled and API failures
//! - Bounded exponential backoff for throttling and transport errors
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use bucketflow_cloud::{BucketReconciler, ProviderConfig};
//! use bucketflow_cloud_aws::S3Gateway;
//!
//! let gateway = S3Gateway::new("ap-northeast-1").await;
//! let reconciler = BucketReconciler::new(
//!     Arc::new(gateway),
//!     ProviderConfig::new("ap-northeast-1"),
//! );
//! ```

pub mod context;
pub mod error;
pub mod gateway;
pub mod retry;

pub use context::AwsContext;
pub use error::{classify_s3_error, classify_sdk_error, suggestion};
pub use gateway::S3Gateway;
pub use retry::with_retry;
