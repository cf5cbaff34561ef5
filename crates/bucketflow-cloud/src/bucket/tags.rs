//! Bucket tag reconciliation
//!
//! Tags are never patched. Every pass pushes the complete desired mapping
//! and the provider overwrites whatever was there.

use crate::error::{CloudError, Operation, Result};
use crate::model::Tags;
use crate::provider::BucketGateway;
use tracing::debug;

/// Replace the remote tag set with `desired`; an empty mapping clears it
pub async fn reconcile_tags(
    gateway: &dyn BucketGateway,
    identity: &str,
    desired: &Tags,
) -> Result<()> {
    let wire = desired.to_wire();
    debug!(bucket = %identity, count = wire.len(), "S3 put bucket tags");

    gateway
        .put_bucket_tags(identity, &wire)
        .await
        .map_err(|e| CloudError::gateway(Operation::PutTags, identity, e))
}

/// Fetch the remote tag set as a mapping
pub async fn fetch_tags(gateway: &dyn BucketGateway, identity: &str) -> Result<Tags> {
    let wire = gateway
        .get_bucket_tags(identity)
        .await
        .map_err(|e| CloudError::gateway(Operation::FetchTags, identity, e))?;

    debug!(bucket = %identity, count = wire.len(), "S3 fetched bucket tags");
    Ok(Tags::from_wire(wire))
}
