//! S3 bucket resource lifecycle
//!
//! [`BucketReconciler`] drives one bucket through create, read, update and
//! delete against a [`BucketGateway`]. Every gateway call is attempted once
//! and the first failure aborts the enclosing operation; a later pass
//! retries the whole operation.
//!
//! ```text
//! create ──► update ──► tags ──► website ──► read
//!                                            │
//!                         head (not found clears identity)
//!                         fetch tags ──► observed.tags
//! ```

pub mod tags;
pub mod website;

use crate::error::{CloudError, Operation, Result};
use crate::model::{BucketDesiredState, BucketObservedState};
use crate::provider::{BucketGateway, CreateBucketRequest, ProviderConfig};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use tags::{fetch_tags, reconcile_tags};
pub use website::{reconcile_website, website_configuration};

/// Lifecycle reconciler for the bucket resource
///
/// Holds no state between calls. Callers must not run two passes for the
/// same bucket concurrently.
pub struct BucketReconciler {
    gateway: Arc<dyn BucketGateway>,
    config: ProviderConfig,
}

impl BucketReconciler {
    pub fn new(gateway: Arc<dyn BucketGateway>, config: ProviderConfig) -> Self {
        Self { gateway, config }
    }

    /// Create the bucket, then converge website and tags.
    ///
    /// Identity is recorded in `observed` as soon as CreateBucket succeeds,
    /// so it survives a failure in the converging update.
    pub async fn create(
        &self,
        desired: &BucketDesiredState,
        observed: &mut BucketObservedState,
    ) -> Result<()> {
        if observed.exists() {
            return Err(CloudError::Precondition(format!(
                "bucket \"{}\" already has identity \"{}\"",
                desired.name, observed.identity
            )));
        }
        desired.validate()?;

        let request = CreateBucketRequest {
            bucket: desired.name.clone(),
            acl: desired.acl,
            location_constraint: self.config.location_constraint().map(str::to_string),
        };
        debug!(
            bucket = %request.bucket,
            acl = %request.acl,
            location = ?request.location_constraint,
            "S3 bucket create"
        );

        self.gateway
            .create_bucket(&request)
            .await
            .map_err(|e| CloudError::gateway(Operation::CreateBucket, &desired.name, e))?;

        // The bucket name is the identity
        observed.identity = desired.name.clone();
        info!(bucket = %observed.identity, region = %self.config.region, "Created S3 bucket");

        self.update(desired, observed).await
    }

    /// Converge tags, then website, then refresh observed state
    pub async fn update(
        &self,
        desired: &BucketDesiredState,
        observed: &mut BucketObservedState,
    ) -> Result<()> {
        let identity = require_identity(observed, "update")?.to_string();

        reconcile_tags(self.gateway.as_ref(), &identity, &desired.tags).await?;

        reconcile_website(
            self.gateway.as_ref(),
            &desired.name,
            desired.website,
            desired.index_document.as_deref(),
            desired.error_document.as_deref(),
        )
        .await?;

        self.read(observed).await
    }

    /// Refresh observed state.
    ///
    /// A bucket reported as not found clears the identity without failing;
    /// the tag fetch still runs and its error is returned.
    pub async fn read(&self, observed: &mut BucketObservedState) -> Result<()> {
        let identity = require_identity(observed, "read")?.to_string();

        match self.gateway.head_bucket(&identity).await {
            Ok(()) => debug!(bucket = %identity, "S3 bucket exists"),
            Err(e) if e.is_not_found() => {
                warn!(bucket = %identity, "S3 bucket not found, clearing identity");
                observed.identity.clear();
            }
            Err(e) => return Err(CloudError::gateway(Operation::ReadBucket, identity, e)),
        }

        observed.tags = fetch_tags(self.gateway.as_ref(), &identity).await?;
        Ok(())
    }

    /// Delete the bucket. The caller drops the record on success.
    pub async fn delete(&self, observed: &BucketObservedState) -> Result<()> {
        let identity = require_identity(observed, "delete")?;

        info!(bucket = %identity, "S3 delete bucket");
        self.gateway
            .delete_bucket(identity)
            .await
            .map_err(|e| CloudError::gateway(Operation::DeleteBucket, identity, e))
    }
}

fn require_identity<'a>(observed: &'a BucketObservedState, operation: &str) -> Result<&'a str> {
    if observed.identity.is_empty() {
        return Err(CloudError::Precondition(format!(
            "{} called on a bucket without identity",
            operation
        )));
    }
    Ok(&observed.identity)
}
