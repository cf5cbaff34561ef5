use super::{load_desired, print_plan};
use bucketflow::build_plan;
use bucketflow_cloud::StateManager;
use colored::Colorize;
use std::path::Path;

pub async fn handle(project_root: &Path, config: Option<&Path>) -> anyhow::Result<()> {
    let (path, desired) = load_desired(config)?;
    println!("📄 {}", path.display().to_string().cyan());

    let state = StateManager::new(project_root).load().await?;
    let plan = build_plan(&desired, &state)?;
    print_plan(&plan);

    if !plan.has_changes {
        println!("{}", "No changes. Buckets match the bucket file.".green());
    }
    Ok(())
}
