//! BucketFlow Cloud
//!
//! Declarative lifecycle management for object-storage buckets.
//! A desired bucket description (name, ACL, static website hosting, tags)
//! is reconciled against the provider, and the observed state is reported
//! back to the caller for persistence.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 BucketFlow CLI                   │
//! │          (plan / apply / refresh / destroy)      │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               bucketflow-cloud                   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │        BucketReconciler                   │   │
//! │  │  create / read / update / delete          │   │
//! │  │  tags (full replace) · website            │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │   Planning   │  │  State Mgmt  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │ trait BucketGateway
//! ┌───────▼───────┐
//! │    aws-s3     │
//! │    gateway    │
//! └───────────────┘
//! ```

pub mod action;
pub mod bucket;
pub mod error;
pub mod fields;
pub mod model;
pub mod provider;
pub mod state;

// Re-exports
pub use action::{Action, ActionResult, ActionType, ApplyResult, Plan, PlanSummary, plan_bucket};
pub use bucket::BucketReconciler;
pub use error::{CloudError, GatewayError, GatewayResult, Operation, Result};
pub use fields::FieldAccessor;
pub use model::{BucketDesiredState, BucketObservedState, CannedAcl, Tags};
pub use provider::{
    BucketGateway, CreateBucketRequest, DEFAULT_REGION, ProviderConfig, RetryConfig, Tag,
    WebsiteConfiguration,
};
pub use state::{
    BUCKET_RESOURCE_TYPE, GlobalState, ResourceData, ResourceStatus, StateLock, StateManager,
};
