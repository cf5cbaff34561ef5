use super::{connect, print_result};
use bucketflow_cloud::StateManager;
use colored::Colorize;
use std::path::Path;

pub async fn handle(project_root: &Path, region: &str, yes: bool) -> anyhow::Result<()> {
    let store = StateManager::new(project_root);
    let lock = store.acquire_lock().await?;
    let mut state = store.load().await?;

    let targets: Vec<String> = state
        .keys_sorted()
        .into_iter()
        .filter(|key| state.get_resource(key).is_some_and(|d| !d.id.is_empty()))
        .collect();

    if targets.is_empty() {
        println!("{}", "No recorded buckets to destroy.".yellow());
        lock.release().await?;
        return Ok(());
    }

    println!();
    println!("{}", format!("Buckets to delete ({}):", targets.len()).bold());
    for key in &targets {
        println!("  {} {}", "-".red(), key);
    }

    if !yes {
        println!();
        println!(
            "{}",
            "Warning: buckets must be empty before S3 deletes them.".yellow()
        );
        println!("Run with --yes to delete them.");
        lock.release().await?;
        return Ok(());
    }

    let engine = connect(region).await;
    let result = engine.destroy(&mut state, &store).await;
    lock.release().await?;

    print_result(&result?)
}
