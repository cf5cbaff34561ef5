//! Typed desired and observed state of a bucket resource

use crate::error::CloudError;
use crate::provider::Tag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Canned ACL applied when the bucket is created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CannedAcl {
    #[default]
    Private,
    PublicRead,
    PublicReadWrite,
    AuthenticatedRead,
}

impl CannedAcl {
    pub fn as_str(&self) -> &'static str {
        match self {
            CannedAcl::Private => "private",
            CannedAcl::PublicRead => "public-read",
            CannedAcl::PublicReadWrite => "public-read-write",
            CannedAcl::AuthenticatedRead => "authenticated-read",
        }
    }
}

impl std::fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CannedAcl {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(CannedAcl::Private),
            "public-read" => Ok(CannedAcl::PublicRead),
            "public-read-write" => Ok(CannedAcl::PublicReadWrite),
            "authenticated-read" => Ok(CannedAcl::AuthenticatedRead),
            other => Err(CloudError::InvalidConfig(format!(
                "unsupported acl: {}",
                other
            ))),
        }
    }
}

/// Tag mapping with unique keys, iterated in key order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Wire representation, sorted by key
    pub fn to_wire(&self) -> Vec<Tag> {
        self.0.iter().map(|(k, v)| Tag::new(k, v)).collect()
    }

    /// Build a mapping from a wire list. A repeated key keeps its last value.
    pub fn from_wire(tags: impl IntoIterator<Item = Tag>) -> Self {
        Self(tags.into_iter().map(|t| (t.key, t.value)).collect())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<BTreeMap<String, String>> for Tags {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl From<Tags> for BTreeMap<String, String> {
    fn from(tags: Tags) -> Self {
        tags.0
    }
}

/// Declarative input for one bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketDesiredState {
    /// Bucket name, also the resource identity once created
    pub name: String,

    /// Creation-time ACL
    #[serde(default)]
    pub acl: CannedAcl,

    /// Enable static website hosting
    #[serde(default)]
    pub website: bool,

    #[serde(default)]
    pub index_document: Option<String>,

    #[serde(default)]
    pub error_document: Option<String>,

    #[serde(default)]
    pub tags: Tags,
}

impl BucketDesiredState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_acl(mut self, acl: CannedAcl) -> Self {
        self.acl = acl;
        self
    }

    pub fn with_website(
        mut self,
        index_document: Option<&str>,
        error_document: Option<&str>,
    ) -> Self {
        self.website = true;
        self.index_document = index_document.map(str::to_string);
        self.error_document = error_document.map(str::to_string);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key, value);
        self
    }

    /// Check fields that must hold before any gateway call
    pub fn validate(&self) -> crate::Result<()> {
        if self.name.is_empty() {
            return Err(CloudError::InvalidConfig(
                "bucket name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Observed state, refreshed by Read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketObservedState {
    /// Empty when the bucket is not known to exist remotely
    #[serde(default)]
    pub identity: String,

    #[serde(default)]
    pub tags: Tags,
}

impl BucketObservedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            tags: Tags::new(),
        }
    }

    pub fn exists(&self) -> bool {
        !self.identity.is_empty()
    }
}
