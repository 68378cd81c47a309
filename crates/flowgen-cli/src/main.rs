//! flowgen CLI tool.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "flowgen")]
#[command(about = "Generate GitHub Actions workflows for a monorepo", long_about = None)]
struct Cli {
    /// Repository root (defaults to the nearest directory containing .git)
    #[arg(long, global = true)]
    repo_root: Option<PathBuf>,

    /// Project type configuration file (defaults to flowgen.kdl in the repository root)
    #[arg(long, global = true, env = "FLOWGEN_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate the workflow directory
    Generate {
        /// Output directory (defaults to .github/workflows in the repository root)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Check configuration and project declarations without writing anything
    Validate,
    /// Print the materialized jobs of each workflow
    Plan {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let options = commands::LoadOptions {
        repo_root: cli.repo_root,
        config: cli.config,
    };

    match cli.command {
        Commands::Generate { out_dir } => {
            commands::generate::run(options, out_dir).await?;
        }
        Commands::Validate => {
            commands::validate(options).await?;
        }
        Commands::Plan { json } => {
            commands::plan::run(options, json).await?;
        }
    }

    Ok(())
}
