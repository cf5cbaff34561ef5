//! Bucket file parsing
//!
//! ```kdl
//! bucket "site-assets" {
//!     acl "public-read"
//!     website #true
//!     index-document "index.html"
//!     error-document "404.html"
//!     tags {
//!         env "prod"
//!         team "web"
//!     }
//! }
//! ```

use crate::error::{FlowError, Result};
use bucketflow_cloud::{BucketDesiredState, CannedAcl, Tags};
use kdl::{KdlDocument, KdlNode};
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

/// Load and parse a bucket file
pub fn load_bucket_file(path: &Path) -> Result<Vec<BucketDesiredState>> {
    let content = std::fs::read_to_string(path).map_err(|source| FlowError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_kdl_string(&content)
}

/// Parse every `bucket` node of a document, in declaration order
pub fn parse_kdl_string(content: &str) -> Result<Vec<BucketDesiredState>> {
    let doc: KdlDocument = content.parse()?;

    let mut seen = HashSet::new();
    let mut buckets = Vec::new();

    for node in doc.nodes() {
        match node.name().value() {
            "bucket" => {
                let bucket = parse_bucket(node)?;
                if !seen.insert(bucket.name.clone()) {
                    return Err(FlowError::DuplicateBucket(bucket.name));
                }
                buckets.push(bucket);
            }
            other => warn!(node = %other, "Ignoring unknown top-level node"),
        }
    }

    Ok(buckets)
}

/// Parse one `bucket` node
pub fn parse_bucket(node: &KdlNode) -> Result<BucketDesiredState> {
    let name = first_string(node)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| FlowError::InvalidConfig("bucket requires a name".to_string()))?;

    let mut bucket = BucketDesiredState::new(name);

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "acl" => {
                    let acl = first_string(child).ok_or_else(|| {
                        FlowError::InvalidConfig(format!("bucket \"{}\": acl requires a value", name))
                    })?;
                    bucket.acl = acl.parse::<CannedAcl>()?;
                }
                "website" => {
                    // bare `website` enables hosting
                    bucket.website = match child.entries().first() {
                        None => true,
                        Some(entry) => entry.value().as_bool().ok_or_else(|| {
                            FlowError::InvalidConfig(format!(
                                "bucket \"{}\": website expects #true or #false",
                                name
                            ))
                        })?,
                    };
                }
                "index_document" | "index-document" => {
                    bucket.index_document = first_string(child)
                        .filter(|s| !s.is_empty())
                        .map(|s| s.to_string());
                }
                "error_document" | "error-document" => {
                    bucket.error_document = first_string(child)
                        .filter(|s| !s.is_empty())
                        .map(|s| s.to_string());
                }
                "tags" => {
                    bucket.tags = parse_tags(name, child)?;
                }
                other => warn!(bucket = %name, node = %other, "Ignoring unknown bucket setting"),
            }
        }
    }

    bucket.validate()?;
    Ok(bucket)
}

/// `tags` block: child node name is the key, its first argument the value
fn parse_tags(bucket: &str, node: &KdlNode) -> Result<Tags> {
    let mut tags = Tags::new();

    if let Some(children) = node.children() {
        for tag in children.nodes() {
            let key = tag.name().value();
            let value = first_string(tag).ok_or_else(|| {
                FlowError::InvalidConfig(format!(
                    "bucket \"{}\": tag {} requires a string value",
                    bucket, key
                ))
            })?;
            if tags.insert(key, value).is_some() {
                return Err(FlowError::InvalidConfig(format!(
                    "bucket \"{}\": tag {} is set more than once",
                    bucket, key
                )));
            }
        }
    }

    Ok(tags)
}

fn first_string(node: &KdlNode) -> Option<&str> {
    node.entries().first().and_then(|e| e.value().as_string())
}
