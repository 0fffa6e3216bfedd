use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sigcheck::config::SIGCHECK_DIR;
use sigcheck::logging::{LogConfig, init_logging};

mod cmd;

#[derive(Parser)]
#[command(name = "sigcheck")]
#[command(version, about = "Gated signature forgery detection: detect, clean, verify")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print one JSON report per evaluation pass instead of styled text
    #[arg(long, global = true)]
    pub json: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new sigcheck project
    Init,
    /// List the reference signatures available for selection
    Signatures,
    /// Walk one session through detection, cleaning and verification
    Run {
        /// Reference signature file name, as listed by `sigcheck signatures`
        #[arg(short, long)]
        signature: Option<String>,

        /// Document image to upload (png, jpg, jpeg)
        #[arg(short, long)]
        document: Option<PathBuf>,

        /// Confirm every stage without prompting
        #[arg(long)]
        yes: bool,
    },
    /// Remove the stage results and uploaded documents
    Clean,
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default sigcheck.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let _ = dotenvy::from_path(project_dir.join(".env"));

    let sigcheck_dir = project_dir.join(SIGCHECK_DIR);
    let _log_guard = init_logging(LogConfig {
        app_name: "sigcheck",
        verbose: cli.verbose,
        log_dir: sigcheck_dir.is_dir().then(|| sigcheck_dir.join("logs")),
    })?;

    match &cli.command {
        Commands::Init => cmd::cmd_init(&project_dir)?,
        Commands::Signatures => cmd::cmd_signatures(&cli, &project_dir)?,
        Commands::Run {
            signature,
            document,
            yes,
        } => {
            cmd::cmd_run(
                &cli,
                project_dir,
                signature.as_deref(),
                document.as_deref(),
                *yes,
            )
            .await?;
        }
        Commands::Clean => cmd::cmd_clean(&cli, &project_dir)?,
        Commands::Config { command } => cmd::cmd_config(&project_dir, command.clone())?,
    }

    Ok(())
}
