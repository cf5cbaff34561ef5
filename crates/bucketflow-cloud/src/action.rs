//! Planned actions for bucket resources

use crate::error::Result;
use crate::model::BucketDesiredState;
use crate::state::{BUCKET_RESOURCE_TYPE, ResourceData, ResourceStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Represents a planned action for a bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Unique identifier for the action
    pub id: String,

    /// Type of action to perform
    pub action_type: ActionType,

    /// Resource type (e.g., "aws_s3_bucket")
    pub resource_type: String,

    /// Resource identifier (the bucket name)
    pub resource_id: String,

    /// Description of the action
    pub description: String,

    /// Additional details about the action
    pub details: HashMap<String, serde_json::Value>,
}

impl Action {
    fn new(action_type: ActionType, resource_id: &str, description: String) -> Self {
        Self {
            id: format!("{}-{}", action_type, resource_id),
            action_type,
            resource_type: BUCKET_RESOURCE_TYPE.to_string(),
            resource_id: resource_id.to_string(),
            description,
            details: HashMap::new(),
        }
    }

    fn with_detail(mut self, key: &str, value: serde_json::Value) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }
}

/// Type of action to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a new resource
    Create,
    /// Update mutable fields in place
    Update,
    /// Delete and re-create (a creation-only field changed)
    Replace,
    /// Delete a resource
    Delete,
    /// No changes needed; observed state is still refreshed
    NoOp,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Replace => write!(f, "replace"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Decide the lifecycle operation for one bucket.
///
/// `prior` is the persisted record. A record without identity is treated as
/// absent remotely. Returns `None` when there is nothing to manage.
pub fn plan_bucket(
    desired: Option<&BucketDesiredState>,
    prior: Option<&ResourceData>,
) -> Result<Option<Action>> {
    let prior = prior.filter(|p| !p.id.is_empty());

    let action = match (desired, prior) {
        (None, None) => None,
        (Some(desired), None) => Some(
            Action::new(
                ActionType::Create,
                &desired.name,
                format!("Create S3 bucket {}", desired.name),
            )
            .with_detail("acl", serde_json::json!(desired.acl.as_str())),
        ),
        (None, Some(prior)) => Some(Action::new(
            ActionType::Delete,
            &prior.id,
            format!("Delete S3 bucket {}", prior.id),
        )),
        (Some(desired), Some(prior)) => {
            let applied = BucketDesiredState::from_fields(prior)?;

            let mut force_new = Vec::new();
            if applied.name != desired.name {
                force_new.push("bucket");
            }
            if applied.acl != desired.acl {
                force_new.push("acl");
            }

            let mut changed = Vec::new();
            if applied.website != desired.website {
                changed.push("website");
            }
            if applied.index_document != desired.index_document {
                changed.push("index_document");
            }
            if applied.error_document != desired.error_document {
                changed.push("error_document");
            }
            // Recorded tags are the observed ones, so drift shows up here
            if applied.tags != desired.tags {
                changed.push("tags");
            }
            // A pass that failed part-way may have left remote fields unconverged
            if changed.is_empty() && prior.status == ResourceStatus::Failed {
                changed.push("retry");
            }

            if !force_new.is_empty() {
                Some(
                    Action::new(
                        ActionType::Replace,
                        &desired.name,
                        format!(
                            "Replace S3 bucket {} ({} forces replacement)",
                            desired.name,
                            force_new.join(", ")
                        ),
                    )
                    .with_detail("forces_replacement", serde_json::json!(force_new)),
                )
            } else if !changed.is_empty() {
                Some(
                    Action::new(
                        ActionType::Update,
                        &desired.name,
                        format!("Update S3 bucket {} ({})", desired.name, changed.join(", ")),
                    )
                    .with_detail("changed", serde_json::json!(changed)),
                )
            } else {
                Some(Action::new(
                    ActionType::NoOp,
                    &desired.name,
                    format!("S3 bucket {} is up to date", desired.name),
                ))
            }
        }
    };

    Ok(action)
}

/// Result of applying actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Successfully applied actions
    pub succeeded: Vec<ActionResult>,

    /// Failed actions
    pub failed: Vec<ActionResult>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn add_success(&mut self, action_id: String, message: String) {
        self.succeeded.push(ActionResult {
            action_id,
            success: true,
            message,
            error: None,
        });
    }

    pub fn add_failure(&mut self, action_id: String, error: String) {
        self.failed.push(ActionResult {
            action_id,
            success: false,
            message: String::new(),
            error: Some(error),
        });
    }
}

impl Default for ApplyResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a single action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// ID of the action
    pub action_id: String,

    /// Whether the action succeeded
    pub success: bool,

    /// Success message
    pub message: String,

    /// Error message if failed
    pub error: Option<String>,
}

/// Plan containing all actions to be applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// List of actions to perform
    pub actions: Vec<Action>,

    /// Whether the plan has any changes
    pub has_changes: bool,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        let has_changes = actions.iter().any(|a| a.action_type != ActionType::NoOp);
        Self {
            actions,
            has_changes,
        }
    }

    pub fn empty() -> Self {
        Self {
            actions: Vec::new(),
            has_changes: false,
        }
    }

    /// Get actions by type
    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    /// Summary of the plan
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            update: self.actions_by_type(ActionType::Update).len(),
            replace: self.actions_by_type(ActionType::Replace).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
            no_change: self.actions_by_type(ActionType::NoOp).len(),
        }
    }
}

/// Summary of planned actions
#[derive(Debug, Clone)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub replace: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to replace, {} to delete, {} unchanged",
            self.create, self.update, self.replace, self.delete, self.no_change
        )
    }
}
