use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use corkboard::geometry::Size;
use corkboard::logging::{LogConfig, LogFormat, init_logging};

mod cmd;

#[derive(Parser)]
#[command(name = "corkboard")]
#[command(version, about = "Drag, clamp, stack and sync note cards on a board")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the legal rectangle for an item inside a container
    Bounds {
        /// Item size as WIDTHxHEIGHT
        #[arg(long)]
        item: Size,
        /// Container size as WIDTHxHEIGHT
        #[arg(long)]
        container: Size,
        /// Margin kept between items and the container edges
        #[arg(long)]
        margin: Option<i32>,
        /// Also clamp this top-left position into the bounds
        #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
        clamp: Option<Vec<i32>>,
    },
    /// Persist one item position to the backend
    Move {
        id: i64,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },
    /// Replay a recorded pointer trace against a board snapshot
    Replay {
        /// Snapshot JSON file. Fetched from the backend when omitted
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// JSON array of pointer events
        #[arg(long)]
        trace: PathBuf,
        /// Accept every position update locally instead of calling the backend
        #[arg(long)]
        offline: bool,
        /// Board size as WIDTHxHEIGHT (overrides board.toml)
        #[arg(long)]
        container: Option<Size>,
    },
    /// View, validate or initialize configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone, Copy)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
    /// Write a default board.toml
    Init,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_verbosity(cli.verbose).with_format(cli.log_format))?;

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Bounds {
            item,
            container,
            margin,
            clamp,
        } => cmd::cmd_bounds(*item, *container, *margin, clamp.as_deref())?,
        Commands::Move { id, x, y } => cmd::cmd_move(&project_dir, *id, *x, *y).await?,
        Commands::Replay {
            snapshot,
            trace,
            offline,
            container,
        } => {
            cmd::cmd_replay(
                &project_dir,
                snapshot.as_deref(),
                trace,
                *offline,
                *container,
            )
            .await?
        }
        Commands::Config { command } => cmd::cmd_config(&project_dir, *command)?,
    }

    Ok(())
}
