//! Field accessor contract and typed adapters
//!
//! The state framework exposes a resource as named fields. The reconciler
//! never reads fields by name; [`BucketDesiredState::from_fields`] and
//! [`BucketObservedState::from_fields`] convert at the boundary.

use crate::error::{CloudError, Result};
use crate::model::{BucketDesiredState, BucketObservedState, CannedAcl, Tags};

pub const FIELD_BUCKET: &str = "bucket";
pub const FIELD_ACL: &str = "acl";
pub const FIELD_WEBSITE: &str = "website";
pub const FIELD_INDEX_DOCUMENT: &str = "index_document";
pub const FIELD_ERROR_DOCUMENT: &str = "error_document";
pub const FIELD_TAGS: &str = "tags";

/// Typed get/set over one resource record
pub trait FieldAccessor {
    /// String field; `None` when unset
    fn get_string(&self, field: &str) -> Option<String>;

    /// Boolean field; `None` when unset
    fn get_bool(&self, field: &str) -> Option<bool>;

    /// String mapping field; `None` when unset
    fn get_map(&self, field: &str) -> Option<Tags>;

    fn set_map(&mut self, field: &str, value: Tags);

    /// Resource identity; empty means "not created"
    fn id(&self) -> String;

    fn set_id(&mut self, id: &str);
}

impl BucketDesiredState {
    /// Read the desired state, applying schema defaults
    pub fn from_fields(fields: &dyn FieldAccessor) -> Result<Self> {
        let name = fields
            .get_string(FIELD_BUCKET)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CloudError::InvalidConfig(format!("{} is required", FIELD_BUCKET)))?;

        let acl = match fields.get_string(FIELD_ACL) {
            Some(acl) if !acl.is_empty() => acl.parse::<CannedAcl>()?,
            _ => CannedAcl::default(),
        };

        Ok(Self {
            name,
            acl,
            website: fields.get_bool(FIELD_WEBSITE).unwrap_or(false),
            index_document: fields
                .get_string(FIELD_INDEX_DOCUMENT)
                .filter(|s| !s.is_empty()),
            error_document: fields
                .get_string(FIELD_ERROR_DOCUMENT)
                .filter(|s| !s.is_empty()),
            tags: fields.get_map(FIELD_TAGS).unwrap_or_default(),
        })
    }
}

impl BucketObservedState {
    pub fn from_fields(fields: &dyn FieldAccessor) -> Self {
        Self {
            identity: fields.id(),
            tags: fields.get_map(FIELD_TAGS).unwrap_or_default(),
        }
    }

    /// Write identity and observed tags back into the record
    pub fn write_to(&self, fields: &mut dyn FieldAccessor) {
        fields.set_id(&self.identity);
        fields.set_map(FIELD_TAGS, self.tags.clone());
    }
}
