//! Static website hosting reconciliation

use crate::error::{CloudError, Operation, Result};
use crate::provider::{BucketGateway, WebsiteConfiguration};
use tracing::debug;

/// Build the website configuration to submit. Empty documents are left out.
pub fn website_configuration(
    index_document: Option<&str>,
    error_document: Option<&str>,
) -> WebsiteConfiguration {
    WebsiteConfiguration {
        index_suffix: index_document
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        error_key: error_document
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    }
}

/// Put or delete the website configuration of `bucket`.
///
/// The decision depends only on the three inputs, never on remote state, so
/// one call converges from any starting point.
pub async fn reconcile_website(
    gateway: &dyn BucketGateway,
    bucket: &str,
    enabled: bool,
    index_document: Option<&str>,
    error_document: Option<&str>,
) -> Result<()> {
    if enabled {
        let config = website_configuration(index_document, error_document);
        debug!(bucket = %bucket, ?config, "S3 put bucket website");

        gateway
            .put_bucket_website(bucket, &config)
            .await
            .map_err(|e| CloudError::gateway(Operation::PutWebsite, bucket, e))
    } else {
        debug!(bucket = %bucket, "S3 delete bucket website");

        match gateway.delete_bucket_website(bucket).await {
            Ok(()) => Ok(()),
            // Nothing configured is the state we want
            Err(e) if e.is_not_found() => {
                debug!(bucket = %bucket, "No website configuration to delete");
                Ok(())
            }
            Err(e) => Err(CloudError::gateway(Operation::DeleteWebsite, bucket, e)),
        }
    }
}
