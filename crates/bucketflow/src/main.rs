mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bucketflow")]
#[command(about = "Declarative S3 buckets from a KDL file", long_about = None)]
struct Cli {
    /// AWS region (falls back to AWS_DEFAULT_REGION, then us-east-1)
    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,

    /// Bucket file (default: discovered bucket.kdl)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the changes apply would make
    Plan,
    /// Create, update, replace and delete buckets to match the bucket file
    Apply {
        /// Apply without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Read every recorded bucket and update the state file
    Refresh,
    /// Delete every recorded bucket
    Destroy {
        /// Delete without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so plan output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let region = bucketflow_config::resolve_region(cli.region.as_deref());
    let project_root = std::env::current_dir()?;

    match cli.command {
        Commands::Plan => {
            commands::plan::handle(&project_root, cli.config.as_deref()).await?;
        }
        Commands::Apply { yes } => {
            commands::apply::handle(&project_root, cli.config.as_deref(), &region, yes).await?;
        }
        Commands::Refresh => {
            commands::refresh::handle(&project_root, &region).await?;
        }
        Commands::Destroy { yes } => {
            commands::destroy::handle(&project_root, &region, yes).await?;
        }
        Commands::Version => {
            println!("bucketflow {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
