pub mod apply;
pub mod destroy;
pub mod plan;
pub mod refresh;

use anyhow::Context;
use bucketflow::{Engine, load_bucket_file};
use bucketflow_cloud::{
    ActionType, ApplyResult, BucketDesiredState, BucketReconciler, Plan, ProviderConfig,
};
use bucketflow_cloud_aws::S3Gateway;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Locate and parse the bucket file
pub fn load_desired(config: Option<&Path>) -> anyhow::Result<(PathBuf, Vec<BucketDesiredState>)> {
    let path = match config {
        Some(path) => path.to_path_buf(),
        None => bucketflow_config::find_bucket_file()?,
    };
    let buckets = load_bucket_file(&path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    Ok((path, buckets))
}

/// Build an engine backed by S3 in `region`
pub async fn connect(region: &str) -> Engine {
    println!("{} {}", "Connecting to S3 in".blue(), region.cyan());
    let gateway = S3Gateway::new(region).await;
    let config = ProviderConfig::new(gateway.region());
    let reconciler = BucketReconciler::new(Arc::new(gateway), config);
    Engine::new(reconciler).with_advisor(bucketflow_cloud_aws::suggestion)
}

pub fn print_plan(plan: &Plan) {
    if plan.actions.is_empty() {
        println!("{}", "No buckets declared or recorded.".yellow());
        return;
    }

    println!();
    for action in &plan.actions {
        let marker = match action.action_type {
            ActionType::Create => "+".green(),
            ActionType::Update => "~".yellow(),
            ActionType::Replace => "-/+".red(),
            ActionType::Delete => "-".red(),
            ActionType::NoOp => "=".dimmed(),
        };
        println!("  {} {}", marker, action.description);
    }

    println!();
    println!("{} {}", "Plan:".bold(), plan.summary());
}

pub fn print_result(result: &ApplyResult) -> anyhow::Result<()> {
    println!();
    for ok in &result.succeeded {
        println!("  {} {}: {}", "✓".green(), ok.action_id, ok.message);
    }
    for failed in &result.failed {
        println!(
            "  {} {}: {}",
            "✗".red(),
            failed.action_id,
            failed.error.as_deref().unwrap_or("unknown error")
        );
    }

    println!();
    println!(
        "{} {} succeeded, {} failed ({} ms)",
        "Done:".bold(),
        result.succeeded.len(),
        result.failed.len(),
        result.duration_ms
    );

    if !result.is_success() {
        anyhow::bail!("{} action(s) failed", result.failed.len());
    }
    Ok(())
}
