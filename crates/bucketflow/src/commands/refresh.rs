use super::{connect, print_result};
use bucketflow_cloud::StateManager;
use colored::Colorize;
use std::path::Path;

pub async fn handle(project_root: &Path, region: &str) -> anyhow::Result<()> {
    let store = StateManager::new(project_root);
    let lock = store.acquire_lock().await?;
    let mut state = store.load().await?;

    if state.resources.values().all(|data| data.id.is_empty()) {
        println!("{}", "No recorded buckets to refresh.".yellow());
        lock.release().await?;
        return Ok(());
    }

    let engine = connect(region).await;
    let result = engine.refresh(&mut state, &store).await;
    lock.release().await?;

    print_result(&result?)
}
