//! Argument parsing and command dispatch for the `publicdata` CLI.

use std::io;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use publicdata_providers::Language;

use crate::client::{AppContext, CliResult, parse_language};
use crate::commands::fetch::handle_fetch;
use crate::commands::manifest::{handle_manifest_create, handle_manifest_validate};
use crate::commands::search::handle_search;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_OUTPUT_DIR: &str = "./data";
/// Default logging directive when `RUST_LOG` is not provided.
const DEFAULT_LOG_LEVEL: &str = "info";

/// Parses CLI arguments, executes the requested command, and returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = match AppContext::from_cli(&cli) {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            return err.exit_code();
        }
    };

    match dispatch(cli, &ctx).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

/// Install the tracing subscriber, logging to stderr so command output on
/// stdout stays clean.
fn init_logging(verbose: bool) {
    let directive = if verbose { "debug" } else { DEFAULT_LOG_LEVEL };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    let _ = fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

async fn dispatch(cli: Cli, ctx: &AppContext) -> CliResult<()> {
    match cli.command {
        Command::Search(args) => handle_search(ctx, args).await,
        Command::Fetch(args) => handle_fetch(ctx, args).await,
        Command::Manifest(manifest) => match manifest {
            ManifestCommand::Create(args) => handle_manifest_create(&args),
            ManifestCommand::Validate(args) => handle_manifest_validate(&args),
        },
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "publicdata",
    about = "Discover, download, and verify Canadian public datasets"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "PUBLICDATA_TIMEOUT",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        help = "Per-request timeout in seconds"
    )]
    pub(crate) timeout: u64,
    #[arg(short, long, global = true, help = "Log at debug level")]
    pub(crate) verbose: bool,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    Search(SearchArgs),
    Fetch(FetchArgs),
    #[command(subcommand)]
    Manifest(ManifestCommand),
}

#[derive(Debug, Args)]
pub(crate) struct SearchArgs {
    #[arg(help = "Query matched against dataset titles and descriptions")]
    pub(crate) query: String,
    #[arg(
        short,
        long,
        value_parser = ["statcan", "cmhc"],
        help = "Restrict results to one provider"
    )]
    pub(crate) provider: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct FetchArgs {
    #[arg(value_parser = ["statcan", "cmhc"], help = "Dataset provider")]
    pub(crate) provider: String,
    #[arg(help = "Table identifier for statcan, landing page URL for cmhc")]
    pub(crate) dataset_id: String,
    #[arg(
        short,
        long,
        env = "PUBLICDATA_OUTPUT_DIR",
        default_value = DEFAULT_OUTPUT_DIR,
        help = "Directory downloads are written into"
    )]
    pub(crate) output: PathBuf,
    #[arg(short, long, help = "Keep only assets whose format or title matches")]
    pub(crate) format: Option<String>,
    #[arg(
        long,
        value_parser = parse_language,
        default_value = "en",
        help = "Publication language"
    )]
    pub(crate) language: Language,
    #[arg(long, help = "Re-download files that already exist")]
    pub(crate) no_skip_existing: bool,
    #[arg(short, long, help = "Write a run manifest into the output directory")]
    pub(crate) manifest: bool,
}

#[derive(Debug, Subcommand)]
pub(crate) enum ManifestCommand {
    Create(ManifestCreateArgs),
    Validate(ManifestValidateArgs),
}

#[derive(Debug, Args)]
pub(crate) struct ManifestCreateArgs {
    #[arg(
        short,
        long,
        help = "JSON file holding an array of dataset records"
    )]
    pub(crate) datasets_file: PathBuf,
    #[arg(
        short,
        long,
        env = "PUBLICDATA_OUTPUT_DIR",
        default_value = DEFAULT_OUTPUT_DIR,
        help = "Directory the manifest is written into"
    )]
    pub(crate) output: PathBuf,
}

#[derive(Debug, Args)]
pub(crate) struct ManifestValidateArgs {
    #[arg(
        short,
        long,
        default_value = "./data/manifest.json",
        help = "Manifest file to check"
    )]
    pub(crate) manifest_file: PathBuf,
}
