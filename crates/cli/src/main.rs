use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use stageline_cli::snapshot::DEFAULT_SNAPSHOT_PATH;
use stageline_cli::{CliResult, Command, Inputs};
use stageline_core::KaitenConfig;
use stageline_core::sync::DEFAULT_CARD_LIMIT;

/// Environment variable name for the project snapshot path
const STL_PROJECT_ENV: &str = "STL_PROJECT";

/// Stageline - project timelines and progress from Kaiten boards
#[derive(Parser)]
#[command(name = "stl")]
#[command(version = "0.1.0")]
#[command(about = "Project timelines and progress from Kaiten boards", long_about = None)]
struct Args {
    /// Path to the project snapshot (can also be set via STL_PROJECT env var)
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    /// Board card dump: a response file or a directory of <board_id>.json files
    #[arg(long, global = true, env = "STL_CARDS")]
    cards: Option<PathBuf>,

    /// Viewport width in pixels used to scale the timeline
    #[arg(long, global = true, env = "STL_VIEWPORT_WIDTH")]
    width: Option<f64>,

    /// Kaiten workspace domain, for diagnostics
    #[arg(long, global = true, env = "STL_KAITEN_DOMAIN")]
    domain: Option<String>,

    /// Maximum number of cards to read from the board
    #[arg(long, global = true, env = "STL_CARD_LIMIT", default_value_t = DEFAULT_CARD_LIMIT)]
    limit: usize,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Option<Command>,
}

/// Get the snapshot path from command line, environment variable, or default.
///
/// Priority:
/// 1. Command line --project argument
/// 2. STL_PROJECT environment variable (if non-empty)
/// 3. `stageline.json` in the working directory
fn resolve_project_path(cli_project: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_project {
        return path;
    }

    if let Ok(env_path) = std::env::var(STL_PROJECT_ENV)
        && !env_path.is_empty()
    {
        return PathBuf::from(env_path);
    }

    PathBuf::from(DEFAULT_SNAPSHOT_PATH)
}

/// Initialize logging from the RUST_LOG environment variable
///
/// Examples:
/// - `RUST_LOG=trace` - show all trace logs, including row placement
/// - `RUST_LOG=debug` - show debug and above
/// - `RUST_LOG=stageline_core=debug` - debug logs from the engine only
/// - `RUST_LOG=warn` - show warn and above (default)
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run_app().await {
        eprintln!("error: {}", e.full_message());
        process::exit(1);
    }
}

/// Main application logic - separated for testability
async fn run_app() -> CliResult<()> {
    let args = Args::parse();
    run_with_args(&args).await
}

fn inputs_from_args(args: &Args) -> Inputs {
    let mut inputs = Inputs::new(resolve_project_path(args.project.clone())).with_kaiten_config(
        KaitenConfig {
            domain: args.domain.clone(),
            card_limit: args.limit,
        },
    );
    if let Some(cards) = &args.cards {
        inputs = inputs.with_cards(cards);
    }
    if let Some(width) = args.width {
        inputs = inputs.with_viewport_width(width);
    }
    inputs
}

/// Run the application with the given arguments
async fn run_with_args(args: &Args) -> CliResult<()> {
    match &args.command {
        Some(cmd) => {
            let inputs = inputs_from_args(args);
            let output = cmd.execute(&inputs).await?;
            println!("{}", output);
        }
        None => {
            println!("Welcome to Stageline!");
            println!("Use 'stl --help' for usage information.");
        }
    }

    Ok(())
}
