use super::{connect, load_desired, print_plan, print_result};
use bucketflow::build_plan;
use bucketflow_cloud::StateManager;
use colored::Colorize;
use std::path::Path;

pub async fn handle(
    project_root: &Path,
    config: Option<&Path>,
    region: &str,
    yes: bool,
) -> anyhow::Result<()> {
    let (path, desired) = load_desired(config)?;
    println!("📄 {}", path.display().to_string().cyan());

    let store = StateManager::new(project_root);
    let lock = store.acquire_lock().await?;
    let mut state = store.load().await?;

    let plan = build_plan(&desired, &state)?;
    print_plan(&plan);

    if plan.actions.is_empty() {
        lock.release().await?;
        return Ok(());
    }

    if plan.has_changes && !yes {
        println!();
        println!("{}", "Run with --yes to apply these changes.".yellow());
        lock.release().await?;
        return Ok(());
    }

    let engine = connect(region).await;
    let result = engine.apply(&plan, &desired, &mut state, &store).await;
    lock.release().await?;

    print_result(&result?)
}
