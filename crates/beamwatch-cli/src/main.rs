mod cmd_scan;
mod cmd_watch;
mod display;

use std::path::PathBuf;

use beamwatch_core::Layout;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "BEAMWATCH_LOG";

#[derive(Parser)]
#[command(
    name = "beamwatch",
    version,
    about = "Follow a refinement pipeline's output and show each result in a model viewer"
)]
struct Cli {
    /// Log at debug level (overridden by BEAMWATCH_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll a directory and present each newly completed result group
    Watch {
        /// Directory the pipeline writes into (defaults to the current directory)
        dir: Option<PathBuf>,
        /// Seconds between scans
        #[arg(long)]
        interval: Option<u64>,
        /// File arrangement: flat or nested
        #[arg(long)]
        layout: Option<Layout>,
        /// Load anomalous difference maps instead of the layout default
        #[arg(long)]
        anomalous: bool,
        /// Companion XML-RPC port
        #[arg(long)]
        port: Option<u16>,
        /// Seconds to wait for each companion command
        #[arg(long)]
        timeout: Option<u64>,
        /// Display only; never contact a companion
        #[arg(long)]
        no_companion: bool,
        /// JSON config file (defaults to beamwatch.json in DIR, if present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Companion program and arguments (after --)
        #[arg(last = true)]
        companion_cmd: Vec<String>,
    },
    /// Scan once and list the complete result groups, oldest first
    Scan {
        /// Directory to scan (defaults to the current directory)
        dir: Option<PathBuf>,
        /// File arrangement: flat or nested
        #[arg(long, default_value = "flat")]
        layout: Layout,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let cwd = std::env::current_dir()?;

    match cli.cmd {
        Command::Watch {
            dir,
            interval,
            layout,
            anomalous,
            port,
            timeout,
            no_companion,
            config,
            companion_cmd,
        } => cmd_watch::execute(cmd_watch::WatchParams {
            directory: dir.unwrap_or(cwd),
            interval,
            layout,
            anomalous,
            port,
            timeout,
            no_companion,
            config: config.as_deref(),
            companion_cmd,
        }),
        Command::Scan { dir, layout, json } => {
            cmd_scan::execute(&dir.unwrap_or(cwd), layout, json)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
