//! Plan and apply bucket changes against persisted state
//!
//! Buckets are reconciled one at a time. The state file is saved after
//! every bucket so a crash never loses the identity of a created bucket.

use crate::error::Result;
use bucketflow_cloud::{
    Action, ActionType, ApplyResult, BucketDesiredState, BucketObservedState, BucketReconciler,
    CloudError, GatewayError, GlobalState, Operation, Plan, ResourceData, ResourceStatus,
    StateManager, plan_bucket,
};
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{error, info, warn};

type CloudResult<T> = bucketflow_cloud::Result<T>;

/// Maps a provider error to a user-facing hint
pub type Advisor = fn(&GatewayError) -> Option<&'static str>;

/// Compute the plan for the declared buckets against the recorded state.
///
/// Declared buckets come first in declaration order, followed by recorded
/// buckets that are no longer declared, sorted by name.
pub fn build_plan(desired: &[BucketDesiredState], state: &GlobalState) -> Result<Plan> {
    let mut actions = Vec::new();
    let declared: HashSet<&str> = desired.iter().map(|d| d.name.as_str()).collect();

    for bucket in desired {
        if let Some(action) = plan_bucket(Some(bucket), state.get_resource(&bucket.name))? {
            actions.push(action);
        }
    }

    for key in state.keys_sorted() {
        if declared.contains(key.as_str()) {
            continue;
        }
        if let Some(action) = plan_bucket(None, state.get_resource(&key))? {
            actions.push(action);
        }
    }

    Ok(Plan::new(actions))
}

/// Executes plans through a [`BucketReconciler`]
pub struct Engine {
    reconciler: BucketReconciler,
    advisor: Option<Advisor>,
}

impl Engine {
    pub fn new(reconciler: BucketReconciler) -> Self {
        Self {
            reconciler,
            advisor: None,
        }
    }

    /// Attach hints to failures reported in [`ApplyResult`]
    pub fn with_advisor(mut self, advisor: Advisor) -> Self {
        self.advisor = Some(advisor);
        self
    }

    /// Apply every action of `plan`, saving state after each one.
    ///
    /// A failing action is recorded in the result and does not stop the
    /// remaining buckets. Only state persistence errors abort the run.
    pub async fn apply(
        &self,
        plan: &Plan,
        desired: &[BucketDesiredState],
        state: &mut GlobalState,
        store: &StateManager,
    ) -> Result<ApplyResult> {
        let started = Instant::now();
        let mut result = ApplyResult::new();
        let by_name: HashMap<&str, &BucketDesiredState> =
            desired.iter().map(|d| (d.name.as_str(), d)).collect();

        // Records without identity that are no longer declared carry nothing
        let forgotten: Vec<String> = state
            .resources
            .iter()
            .filter(|(key, data)| data.id.is_empty() && !by_name.contains_key(key.as_str()))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &forgotten {
            state.remove_resource(key);
        }

        for action in &plan.actions {
            info!(action = %action.id, "{}", action.description);
            let outcome = self
                .apply_action(action, by_name.get(action.resource_id.as_str()).copied(), state)
                .await;
            self.record(&mut result, &action.id, outcome);
            store.save(state).await?;
        }

        result.duration_ms = started.elapsed().as_millis() as u64;
        Ok(result)
    }

    /// Read every recorded bucket and store what was observed
    pub async fn refresh(
        &self,
        state: &mut GlobalState,
        store: &StateManager,
    ) -> Result<ApplyResult> {
        let started = Instant::now();
        let mut result = ApplyResult::new();

        for key in state.keys_sorted() {
            let has_identity = state
                .get_resource(&key)
                .is_some_and(|data| !data.id.is_empty());
            if !has_identity {
                continue;
            }
            let outcome = self.read(&key, state).await;
            self.record(&mut result, &format!("refresh-{}", key), outcome);
            store.save(state).await?;
        }

        result.duration_ms = started.elapsed().as_millis() as u64;
        Ok(result)
    }

    /// Delete every recorded bucket
    pub async fn destroy(
        &self,
        state: &mut GlobalState,
        store: &StateManager,
    ) -> Result<ApplyResult> {
        let started = Instant::now();
        let mut result = ApplyResult::new();

        for key in state.keys_sorted() {
            let has_identity = state
                .get_resource(&key)
                .is_some_and(|data| !data.id.is_empty());
            if !has_identity {
                state.remove_resource(&key);
                continue;
            }
            let outcome = self.delete(&key, state).await;
            self.record(&mut result, &format!("delete-{}", key), outcome);
            store.save(state).await?;
        }

        result.duration_ms = started.elapsed().as_millis() as u64;
        Ok(result)
    }

    async fn apply_action(
        &self,
        action: &Action,
        desired: Option<&BucketDesiredState>,
        state: &mut GlobalState,
    ) -> CloudResult<String> {
        let key = action.resource_id.as_str();

        match action.action_type {
            ActionType::Create => self.create(require_desired(desired, key)?, state).await,
            ActionType::Update => self.update(require_desired(desired, key)?, state).await,
            ActionType::NoOp => self.read(key, state).await,
            ActionType::Replace => {
                let desired = require_desired(desired, key)?;
                self.delete(key, state).await?;
                self.create(desired, state)
                    .await
                    .map(|message| message.replacen("created", "replaced", 1))
            }
            ActionType::Delete => self.delete(key, state).await,
        }
    }

    async fn create(
        &self,
        desired: &BucketDesiredState,
        state: &mut GlobalState,
    ) -> CloudResult<String> {
        let mut observed = BucketObservedState::new();

        let result = self.reconciler.create(desired, &mut observed).await;
        match result {
            // CreateBucket never succeeded, keep the record as it was
            Err(e) if !created(&e) => Err(e),
            result => {
                let mut record = ResourceData::from_desired(desired);
                let status = settle(&mut record, &observed, result);
                state.set_resource(desired.name.clone(), record);
                status.map(|s| describe("created", s))
            }
        }
    }

    async fn update(
        &self,
        desired: &BucketDesiredState,
        state: &mut GlobalState,
    ) -> CloudResult<String> {
        let mut record = recorded(state, &desired.name)?;
        let mut observed = BucketObservedState::from_fields(&record);

        let result = self.reconciler.update(desired, &mut observed).await;
        record.set_desired(desired);
        let status = settle(&mut record, &observed, result);
        state.set_resource(desired.name.clone(), record);
        status.map(|s| describe("updated", s))
    }

    async fn read(&self, key: &str, state: &mut GlobalState) -> CloudResult<String> {
        let mut record = recorded(state, key)?;
        let mut observed = BucketObservedState::from_fields(&record);

        let result = self.reconciler.read(&mut observed).await;
        let status = settle(&mut record, &observed, result);
        state.set_resource(key.to_string(), record);
        status.map(|s| describe("refreshed", s))
    }

    async fn delete(&self, key: &str, state: &mut GlobalState) -> CloudResult<String> {
        let record = recorded(state, key)?;
        let observed = BucketObservedState::from_fields(&record);

        match self.reconciler.delete(&observed).await {
            Ok(()) => {
                state.remove_resource(key);
                Ok("deleted".to_string())
            }
            Err(e) if e.is_not_found() => {
                warn!(bucket = %key, "S3 bucket already gone, dropping record");
                state.remove_resource(key);
                Ok("already deleted".to_string())
            }
            Err(e) => {
                let mut record = record;
                record.set_status(ResourceStatus::Failed);
                state.set_resource(key.to_string(), record);
                Err(e)
            }
        }
    }

    fn record(&self, result: &mut ApplyResult, action_id: &str, outcome: CloudResult<String>) {
        match outcome {
            Ok(message) => {
                info!(action = %action_id, "{}", message);
                result.add_success(action_id.to_string(), message);
            }
            Err(e) => {
                error!(action = %action_id, error = %e, "Action failed");
                result.add_failure(action_id.to_string(), self.explain(&e));
            }
        }
    }

    fn explain(&self, e: &CloudError) -> String {
        let hint = self
            .advisor
            .zip(e.gateway_error())
            .and_then(|(advisor, source)| advisor(source));
        match hint {
            Some(hint) => format!("{}\nhint: {}", e, hint),
            None => e.to_string(),
        }
    }
}

/// Write the observed state into the record and derive its status.
///
/// A not-found that already cleared the identity is not a failure: the
/// bucket is recorded as missing and the next plan re-creates it.
fn settle(
    record: &mut ResourceData,
    observed: &BucketObservedState,
    result: CloudResult<()>,
) -> CloudResult<ResourceStatus> {
    observed.write_to(record);

    let status = match result {
        Ok(()) if observed.exists() => ResourceStatus::Ready,
        Ok(()) => ResourceStatus::Missing,
        Err(e) if e.is_not_found() && !observed.exists() => ResourceStatus::Missing,
        Err(e) => {
            record.set_status(ResourceStatus::Failed);
            return Err(e);
        }
    };

    record.set_status(status);
    Ok(status)
}

/// Whether a failed create got past CreateBucket
fn created(e: &CloudError) -> bool {
    e.operation()
        .is_some_and(|operation| operation != Operation::CreateBucket)
}

fn describe(verb: &str, status: ResourceStatus) -> String {
    match status {
        ResourceStatus::Missing => format!("{}, bucket missing remotely", verb),
        _ => verb.to_string(),
    }
}

fn require_desired<'a>(
    desired: Option<&'a BucketDesiredState>,
    key: &str,
) -> CloudResult<&'a BucketDesiredState> {
    desired.ok_or_else(|| {
        CloudError::InvalidConfig(format!("bucket \"{}\" is not declared", key))
    })
}

fn recorded(state: &GlobalState, key: &str) -> CloudResult<ResourceData> {
    state
        .get_resource(key)
        .cloned()
        .ok_or_else(|| CloudError::StateError(format!("no record for bucket \"{}\"", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bucketflow_cloud::{CannedAcl, FieldAccessor};

    fn record(desired: &BucketDesiredState) -> ResourceData {
        let mut data = ResourceData::from_desired(desired).with_status(ResourceStatus::Ready);
        data.set_id(&desired.name);
        data
    }

    #[test]
    fn test_plan_orders_declared_then_orphans() {
        let mut state = GlobalState::new();
        state.set_resource("old-b".into(), record(&BucketDesiredState::new("old-b")));
        state.set_resource("old-a".into(), record(&BucketDesiredState::new("old-a")));

        let desired = vec![BucketDesiredState::new("zeta"), BucketDesiredState::new("alpha")];
        let plan = build_plan(&desired, &state).unwrap();

        let ids: Vec<&str> = plan.actions.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["create-zeta", "create-alpha", "delete-old-a", "delete-old-b"]
        );
    }

    #[test]
    fn test_plan_skips_forgotten_records() {
        let mut state = GlobalState::new();
        state.set_resource(
            "gone".into(),
            ResourceData::from_desired(&BucketDesiredState::new("gone"))
                .with_status(ResourceStatus::Missing),
        );

        let plan = build_plan(&[], &state).unwrap();
        assert!(plan.actions.is_empty());
        assert!(!plan.has_changes);
    }

    #[test]
    fn test_plan_mixed_actions() {
        let unchanged = BucketDesiredState::new("same");
        let before = BucketDesiredState::new("acl");
        let after = before.clone().with_acl(CannedAcl::PublicRead);

        let mut state = GlobalState::new();
        state.set_resource("same".into(), record(&unchanged));
        state.set_resource("acl".into(), record(&before));

        let plan = build_plan(&[unchanged, after], &state).unwrap();
        let summary = plan.summary();
        assert_eq!(summary.no_change, 1);
        assert_eq!(summary.replace, 1);
        assert!(plan.has_changes);
    }

    #[test]
    fn test_created_only_after_create_bucket() {
        let gateway = |operation| CloudError::Gateway {
            operation,
            bucket: "b1".into(),
            source: GatewayError::NotFound("NoSuchBucket".into()),
        };
        assert!(!created(&gateway(Operation::CreateBucket)));
        assert!(!created(&CloudError::InvalidConfig("bad".into())));
        assert!(created(&gateway(Operation::ReadBucket)));
        assert!(created(&gateway(Operation::FetchTags)));
    }

    #[test]
    fn test_settle_statuses() {
        let desired = BucketDesiredState::new("b1");

        let mut data = ResourceData::from_desired(&desired);
        let status = settle(&mut data, &BucketObservedState::with_identity("b1"), Ok(()));
        assert_eq!(status.unwrap(), ResourceStatus::Ready);
        assert_eq!(data.id, "b1");

        let mut data = record(&desired);
        let status = settle(&mut data, &BucketObservedState::new(), Ok(()));
        assert_eq!(status.unwrap(), ResourceStatus::Missing);
        assert_eq!(data.id, "");

        let mut data = record(&desired);
        let status = settle(
            &mut data,
            &BucketObservedState::with_identity("b1"),
            Err(CloudError::Precondition("boom".into())),
        );
        assert!(status.is_err());
        assert_eq!(data.status, ResourceStatus::Failed);
    }
}
