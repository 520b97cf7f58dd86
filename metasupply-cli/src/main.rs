//! MetaSupply CLI - versioned file-metadata registry client.

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgGroup, Args, Parser, Subcommand};
use colored::Colorize;
use metasupply_core::ForkPolicy;
use tracing_subscriber::{fmt, EnvFilter};

mod backend;
mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Invalid arguments or blank required field
  65  Registry rejected the record
  66  Record not found
  69  Registry unreachable
  76  Malformed registry response
  77  Login failed";

#[derive(Parser)]
#[command(name = "metasupply")]
#[command(author, version, about = "Versioned file-metadata registry client", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command. Unset options fall back to the
/// `METASUPPLY_*` environment variables.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Use a local registry file instead of the remote service
    #[arg(long, global = true, value_name = "PATH")]
    pub local: Option<PathBuf>,

    /// Registry base URL
    #[arg(long, global = true, value_name = "URL")]
    pub registry: Option<String>,

    /// Principal to act as
    #[arg(long, global = true, value_name = "TEXT")]
    pub principal: Option<String>,

    /// Fork handling: `allow` permits several revisions of one version,
    /// `reject-superseded` refuses to revise a version that already has a successor
    #[arg(long, global = true, value_name = "POLICY", value_parser = parse_fork_policy)]
    pub fork_policy: Option<ForkPolicy>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Register metadata for a new file
    Upload {
        /// Human name of the file
        #[arg(long)]
        filename: String,

        /// Model that produced the file
        #[arg(long)]
        model: String,

        /// Dataset the model was trained or prompted with
        #[arg(long)]
        dataset: String,

        /// Prompt or description
        #[arg(long, default_value = "")]
        prompt: String,
    },

    /// Create the next version of a record
    #[command(group(ArgGroup::new("changes").required(true).multiple(true)))]
    Update {
        /// Id of the version to supersede
        #[arg(value_name = "ID")]
        id: String,

        /// New model
        #[arg(long, group = "changes")]
        model: Option<String>,

        /// New dataset
        #[arg(long, group = "changes")]
        dataset: Option<String>,

        /// New prompt
        #[arg(long, group = "changes")]
        prompt: Option<String>,
    },

    /// List your files with their version history
    List {
        /// Follow previous-hash links and report broken chains
        #[arg(long)]
        verified: bool,
    },

    /// Search your records
    Search {
        /// Case-insensitive substring; empty matches everything
        #[arg(value_name = "TERM", default_value = "")]
        term: String,

        /// Field to search: filename, dataset or model
        #[arg(long, default_value = "filename")]
        by: String,
    },

    /// Show one record by id
    Show {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Print the scannable payload of a record
    Payload {
        #[arg(value_name = "ID")]
        id: String,
    },
}

fn parse_fork_policy(value: &str) -> std::result::Result<ForkPolicy, String> {
    value.parse()
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("metasupply_core=debug,metasupply=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let global = cli.global;
    match cli.command {
        Commands::Upload {
            filename,
            model,
            dataset,
            prompt,
        } => commands::upload::execute(&global, filename, model, dataset, prompt).await,
        Commands::Update {
            id,
            model,
            dataset,
            prompt,
        } => commands::update::execute(&global, id, model, dataset, prompt).await,
        Commands::List { verified } => commands::list::execute(&global, verified).await,
        Commands::Search { term, by } => commands::search::execute(&global, term, by).await,
        Commands::Show { id } => commands::show::execute(&global, id).await,
        Commands::Payload { id } => commands::payload::execute(&global, id).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let exit = match run(cli).await {
        Ok(()) => ExitCode::success(),
        Err(err) => ExitCode::from_anyhow(&err),
    };

    if let Some(message) = &exit.message {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }
    std::process::exit(exit.code);
}
