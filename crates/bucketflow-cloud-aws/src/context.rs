//! Shared AWS configuration context
//!
//! Loads the AWS SDK configuration once per process so the region is read
//! a single time and every client shares it.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use std::sync::Arc;

/// Shared AWS configuration context for creating service clients.
///
/// # Example
/// ```ignore
/// let aws = AwsContext::new("ap-northeast-1").await;
/// let gateway = S3Gateway::from_context(&aws);
/// ```
#[derive(Clone)]
pub struct AwsContext {
    config: Arc<SdkConfig>,
    region: String,
}

impl AwsContext {
    /// Load AWS configuration for the specified region.
    ///
    /// Credentials come from the environment, config files or IAM roles.
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        Self {
            config: Arc::new(config),
            region: region.to_string(),
        }
    }

    /// Get the underlying SDK config for direct client construction.
    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Create an S3 client from this context.
    pub fn s3_client(&self) -> aws_sdk_s3::Client {
        aws_sdk_s3::Client::new(self.sdk_config())
    }
}

impl std::fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsContext")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires AWS credentials"]
    async fn test_context_creation() {
        let ctx = AwsContext::new("eu-west-1").await;
        assert_eq!(ctx.region(), "eu-west-1");
        assert!(format!("{:?}", ctx).contains("eu-west-1"));
    }
}
