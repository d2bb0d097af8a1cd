//! Stepwise - a bounded-iteration reasoning agent

use clap::{Parser, Subcommand};
use tracing::error;

mod commands;

use commands::{init_command, run_command, status_command};

/// Stepwise - a reasoning agent for your terminal
#[derive(Parser)]
#[command(name = "stepwise")]
#[command(about = "A bounded-iteration reasoning agent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config and workspace
    Init,
    /// Run a task, or start an interactive task prompt
    Run {
        /// Task to run; without it an interactive prompt starts
        #[arg(short, long)]
        task: Option<String>,
        /// Echo intermediate thoughts and observations
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show configuration status
    Status,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            if let Err(e) = init_command().await {
                error!("Init failed: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Run { task, verbose } => {
            if let Err(e) = run_command(task, verbose).await {
                error!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Status => {
            if let Err(e) = status_command().await {
                error!("Status failed: {}", e);
                std::process::exit(1);
            }
        }
    }
}
