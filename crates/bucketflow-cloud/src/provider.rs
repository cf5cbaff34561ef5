//! Provider gateway trait definition

use crate::error::GatewayResult;
use crate::model::CannedAcl;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Region in which a bucket may be created without a location constraint.
///
/// S3 rejects a CreateBucket request that states this region explicitly.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Bucket-level RPC surface of an object-storage provider
///
/// Every call is a single attempt from the reconciler's point of view;
/// transport retries belong to the implementation.
#[async_trait]
pub trait BucketGateway: Send + Sync {
    /// Returns the provider name (e.g., "aws-s3")
    fn name(&self) -> &str;

    async fn create_bucket(&self, request: &CreateBucketRequest) -> GatewayResult<()>;

    /// Existence check; a missing bucket is reported as `GatewayError::NotFound`
    async fn head_bucket(&self, bucket: &str) -> GatewayResult<()>;

    async fn delete_bucket(&self, bucket: &str) -> GatewayResult<()>;

    async fn put_bucket_website(
        &self,
        bucket: &str,
        website: &WebsiteConfiguration,
    ) -> GatewayResult<()>;

    async fn delete_bucket_website(&self, bucket: &str) -> GatewayResult<()>;

    async fn get_bucket_tags(&self, bucket: &str) -> GatewayResult<Vec<Tag>>;

    /// Replace the whole tag set; an empty slice clears it
    async fn put_bucket_tags(&self, bucket: &str, tags: &[Tag]) -> GatewayResult<()>;
}

/// Parameters of a CreateBucket call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBucketRequest {
    pub bucket: String,
    pub acl: CannedAcl,
    /// `None` when the bucket goes to [`DEFAULT_REGION`]
    pub location_constraint: Option<String>,
}

/// Static website hosting configuration
///
/// Both fields empty is a valid configuration (provider defaults apply).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteConfiguration {
    pub index_suffix: Option<String>,
    pub error_key: Option<String>,
}

/// One wire-format tag entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Per-process provider settings, read once and injected into the reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub region: String,
}

impl ProviderConfig {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }

    /// Location constraint to send on CreateBucket
    pub fn location_constraint(&self) -> Option<&str> {
        if self.region == DEFAULT_REGION {
            None
        } else {
            Some(&self.region)
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REGION)
    }
}

/// Retry configuration for gateway implementations
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,

    /// Initial delay between retries
    pub initial_delay: std::time::Duration,

    /// Maximum delay between retries
    pub max_delay: std::time::Duration,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Single attempt, no retry
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Delay to wait after the given (1-based) failed attempt
    pub fn delay_for(&self, attempt: u32) -> std::time::Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        std::time::Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: std::time::Duration::from_secs(1),
            max_delay: std::time::Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}
