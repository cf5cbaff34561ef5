//! Persisted resource state
//!
//! Manages the `.bucketflow/state.json` file which records, per bucket, the
//! last applied desired fields, the identity and the observed tags.

use crate::error::{CloudError, Result};
use crate::fields::{
    FIELD_ACL, FIELD_BUCKET, FIELD_ERROR_DOCUMENT, FIELD_INDEX_DOCUMENT, FIELD_TAGS,
    FIELD_WEBSITE, FieldAccessor,
};
use crate::model::{BucketDesiredState, Tags};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

const STATE_VERSION: u32 = 1;
const STATE_DIR: &str = ".bucketflow";
const STATE_FILE: &str = "state.json";
const STATE_BACKUP: &str = "state.json.backup";
const LOCK_FILE: &str = "lock.json";

/// Resource type recorded for buckets
pub const BUCKET_RESOURCE_TYPE: &str = "aws_s3_bucket";

/// Global state containing every managed bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalState {
    /// State file version
    pub version: u32,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    /// Resources indexed by bucket name
    pub resources: HashMap<String, ResourceData>,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            resources: HashMap::new(),
        }
    }
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a resource
    pub fn set_resource(&mut self, key: String, data: ResourceData) {
        self.resources.insert(key, data);
        self.updated_at = Utc::now();
    }

    /// Remove a resource
    pub fn remove_resource(&mut self, key: &str) -> Option<ResourceData> {
        let result = self.resources.remove(key);
        if result.is_some() {
            self.updated_at = Utc::now();
        }
        result
    }

    pub fn get_resource(&self, key: &str) -> Option<&ResourceData> {
        self.resources.get(key)
    }

    /// Keys in a stable order, for sequential reconciliation
    pub fn keys_sorted(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.resources.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// State record of a single resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceData {
    /// Provider-side identity; empty when the resource is not known to exist
    #[serde(default)]
    pub id: String,

    /// Resource type
    pub resource_type: String,

    /// Outcome of the last reconciliation pass
    pub status: ResourceStatus,

    /// Named fields (desired inputs plus observed tags)
    pub attributes: HashMap<String, serde_json::Value>,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ResourceData {
    pub fn new(resource_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            resource_type: resource_type.into(),
            status: ResourceStatus::Unknown,
            attributes: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// New bucket record holding the given desired fields
    pub fn from_desired(desired: &BucketDesiredState) -> Self {
        let mut data = Self::new(BUCKET_RESOURCE_TYPE);
        data.set_desired(desired);
        data
    }

    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn set_status(&mut self, status: ResourceStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Record the desired fields as applied
    pub fn set_desired(&mut self, desired: &BucketDesiredState) {
        self.set_attribute(FIELD_BUCKET, serde_json::json!(desired.name));
        self.set_attribute(FIELD_ACL, serde_json::json!(desired.acl.as_str()));
        self.set_attribute(FIELD_WEBSITE, serde_json::json!(desired.website));
        self.set_optional(FIELD_INDEX_DOCUMENT, desired.index_document.as_deref());
        self.set_optional(FIELD_ERROR_DOCUMENT, desired.error_document.as_deref());
        self.set_map(FIELD_TAGS, desired.tags.clone());
    }

    fn set_optional(&mut self, key: &str, value: Option<&str>) {
        match value {
            Some(v) => self.set_attribute(key, serde_json::json!(v)),
            None => {
                self.attributes.remove(key);
                self.updated_at = Utc::now();
            }
        }
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.attributes.insert(key.into(), value);
        self.updated_at = Utc::now();
    }

    pub fn get_attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

impl FieldAccessor for ResourceData {
    fn get_string(&self, field: &str) -> Option<String> {
        self.get_attribute(field)
    }

    fn get_bool(&self, field: &str) -> Option<bool> {
        self.get_attribute(field)
    }

    fn get_map(&self, field: &str) -> Option<Tags> {
        self.get_attribute(field)
    }

    fn set_map(&mut self, field: &str, value: Tags) {
        match serde_json::to_value(value) {
            Ok(v) => self.set_attribute(field, v),
            Err(e) => tracing::warn!("Failed to encode field {}: {}", field, e),
        }
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
        self.updated_at = Utc::now();
    }
}

/// Outcome of the last reconciliation pass for a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Remote state converged with the recorded desired state
    Ready,
    /// Existence check reported the resource gone; it must be re-created
    Missing,
    /// Last pass failed part-way; the next pass retries it
    Failed,
    /// Status is unknown
    Unknown,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceStatus::Ready => write!(f, "ready"),
            ResourceStatus::Missing => write!(f, "missing"),
            ResourceStatus::Failed => write!(f, "failed"),
            ResourceStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// State manager for reading/writing state files
pub struct StateManager {
    /// Project root directory
    project_root: PathBuf,
}

impl StateManager {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    fn state_dir(&self) -> PathBuf {
        self.project_root.join(STATE_DIR)
    }

    fn state_path(&self) -> PathBuf {
        self.state_dir().join(STATE_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.state_dir().join(STATE_BACKUP)
    }

    fn lock_path(&self) -> PathBuf {
        self.state_dir().join(LOCK_FILE)
    }

    async fn ensure_state_dir(&self) -> Result<()> {
        let dir = self.state_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created state directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the current state
    pub async fn load(&self) -> Result<GlobalState> {
        let path = self.state_path();
        if !path.exists() {
            tracing::debug!("State file not found, returning empty state");
            return Ok(GlobalState::new());
        }

        let content = fs::read_to_string(&path).await?;
        let state: GlobalState = serde_json::from_str(&content)?;

        if state.version > STATE_VERSION {
            return Err(CloudError::StateError(format!(
                "State file version {} is newer than supported version {}",
                state.version, STATE_VERSION
            )));
        }

        tracing::debug!("Loaded state with {} resources", state.resources.len());
        Ok(state)
    }

    /// Save the state, keeping the previous file as a backup
    pub async fn save(&self, state: &GlobalState) -> Result<()> {
        self.ensure_state_dir().await?;

        let path = self.state_path();
        let backup = self.backup_path();

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
            tracing::debug!("Created state backup");
        }

        let content = serde_json::to_string_pretty(state)?;
        fs::write(&path, content).await?;

        tracing::debug!("Saved state with {} resources", state.resources.len());
        Ok(())
    }

    /// Acquire a lock for exclusive access
    ///
    /// Holding the lock keeps two processes from reconciling the same
    /// buckets at once.
    pub async fn acquire_lock(&self) -> Result<StateLock> {
        self.ensure_state_dir().await?;

        let lock_path = self.lock_path();

        if lock_path.exists() {
            let content = fs::read_to_string(&lock_path).await?;
            let lock_info: LockInfo = serde_json::from_str(&content)?;

            // Locks older than an hour are considered stale
            let age = Utc::now().signed_duration_since(lock_info.acquired_at);
            if age.num_hours() < 1 {
                return Err(CloudError::LockError(format!(
                    "State is locked by {} since {}",
                    lock_info.holder, lock_info.acquired_at
                )));
            }

            tracing::warn!("Removing stale lock from {}", lock_info.holder);
        }

        let lock_info = LockInfo {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            acquired_at: Utc::now(),
        };

        let content = serde_json::to_string_pretty(&lock_info)?;
        fs::write(&lock_path, content).await?;

        tracing::debug!("Acquired state lock");
        Ok(StateLock {
            lock_path,
            released: false,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    acquired_at: DateTime<Utc>,
}

/// RAII guard for state lock
pub struct StateLock {
    lock_path: PathBuf,
    released: bool,
}

impl StateLock {
    /// Release the lock
    pub async fn release(mut self) -> Result<()> {
        if !self.released {
            if self.lock_path.exists() {
                fs::remove_file(&self.lock_path).await?;
                tracing::debug!("Released state lock");
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released && self.lock_path.exists() {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}
