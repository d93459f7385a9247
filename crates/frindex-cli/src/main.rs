#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "fri: Federal Register agency-year index",
    long_about = None
)]
struct Cli {
    /// Log at debug level unless `FRINDEX_LOG` says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format: pretty, text, or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Index database path (overrides config and `FRINDEX_DB`).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.format, self.json)
    }

    fn db_override(&self) -> Option<PathBuf> {
        self.db
            .clone()
            .or_else(|| env::var_os("FRINDEX_DB").map(PathBuf::from))
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Create the config and index database",
        long_about = "Write .frindex/config.toml (unless present) and create or migrate the index database.",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    fri init\n\n    # Reset the config to the default template\n    fri init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Load agencies, plans and entries from a JSON bundle",
        after_help = "EXAMPLES:\n    # Import a bundle\n    fri import --file bundle.json\n\n    # Emit machine-readable output\n    fri import --file bundle.json --format json"
    )]
    Import(cmd::import::ImportArgs),

    #[command(
        next_help_heading = "Read",
        about = "List the years an index can be built for"
    )]
    Years,

    #[command(
        next_help_heading = "Read",
        about = "Show the year index of agencies",
        long_about = "Show every agency with entries in the year, grouped by first letter, with entry and needs-attention counts.",
        after_help = "EXAMPLES:\n    # Full year\n    fri index --year 2020\n\n    # Only entries published through June\n    fri index --year 2020 --max-date 2020-06-30"
    )]
    Index(cmd::index::IndexArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one agency-year by document type and grouping",
        after_help = "EXAMPLES:\n    # By slug\n    fri agency environmental-protection-agency --year 2020\n\n    # By id, as JSON\n    fri agency 145 --year 2020 --format json"
    )]
    Agency(cmd::agency::AgencyArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show a single grouping of an agency-year",
        after_help = "EXAMPLES:\n    # A subject grouping of rules\n    fri grouping environmental-protection-agency --year 2020 --type RULE --header \"Air quality\""
    )]
    Grouping(cmd::grouping::GroupingArgs),

    #[command(
        next_help_heading = "Review",
        about = "Record the last reviewed issue for an agency-year",
        after_help = "EXAMPLES:\n    # Mark everything through June 1 as reviewed\n    fri checkpoint environmental-protection-agency --year 2020 --date 2020-06-01"
    )]
    Checkpoint(cmd::checkpoint::CheckpointArgs),

    #[command(
        next_help_heading = "Review",
        about = "Recompute cached needs-attention counts",
        after_help = "EXAMPLES:\n    # Every agency in 2020\n    fri update-cache --year 2020\n\n    # One agency\n    fri update-cache --year 2020 --agency environmental-protection-agency"
    )]
    UpdateCache(cmd::update_cache::UpdateCacheArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate zsh completions\n    fri completions zsh > ~/.zfunc/_fri"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

const fn default_log_filter(verbose: bool, debug_env: bool) -> &'static str {
    if verbose || debug_env {
        "frindex=debug,info"
    } else {
        "frindex=info,warn"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("FRINDEX_LOG").unwrap_or_else(|_| {
        EnvFilter::new(default_log_filter(verbose, env::var("DEBUG").is_ok()))
    });

    let format = env::var("FRINDEX_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_root = env::current_dir()?;
    let output = cli.output_mode();

    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args, &mut command, &mut std::io::stdout());
    }

    let db_override = cli.db_override();
    let ctx = cmd::CmdContext::load(&project_root, db_override.as_deref(), output)?;

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, &ctx),
        Commands::Import(args) => cmd::import::run_import(args, &ctx),
        Commands::Years => cmd::years::run_years(&ctx),
        Commands::Index(args) => cmd::index::run_index(args, &ctx),
        Commands::Agency(args) => cmd::agency::run_agency(args, &ctx),
        Commands::Grouping(args) => cmd::grouping::run_grouping(args, &ctx),
        Commands::Checkpoint(args) => cmd::checkpoint::run_checkpoint(args, &ctx),
        Commands::UpdateCache(args) => cmd::update_cache::run_update_cache(args, &ctx),
        Commands::Completions(_) => Ok(()),
    }
}
