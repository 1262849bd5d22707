mod commands;
mod config;
mod rows;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::commands::push::PushArgs;
use crate::config::TomlProfileStore;

#[derive(Parser)]
#[command(name = "jsonify")]
#[command(about = "Turn exported control rows into JSON and push them to GitHub")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress log output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write rows to a JSON document, or append them to an existing one
    Convert {
        /// Rows to convert: a JSON array of objects or one object per line
        #[arg(long)]
        rows: PathBuf,
        /// Output document
        #[arg(long)]
        output: PathBuf,
        /// Append to the existing document instead of replacing it
        #[arg(long)]
        append: bool,
    },
    /// Push a document and any companion files to a GitHub repository
    Push(PushArgs),
    /// Inspect the saved push profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Show the saved profile (token masked)
    Show,
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,hyper=info,reqwest=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn profile_store() -> Result<TomlProfileStore> {
    let path = config::profile_path().context("could not determine config directory")?;
    Ok(TomlProfileStore::new(path))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Convert {
            rows,
            output,
            append,
        } => commands::convert::run(&rows, &output, append),
        Command::Push(args) => {
            let profiles = profile_store()?;
            let saved = profiles.load_or_warn();
            commands::push::run(
                &args,
                &profiles,
                saved,
                config::github_token(),
                config::api_base_url(),
            )
            .await
            .map(|_| ())
        }
        Command::Profile {
            action: ProfileAction::Show,
        } => {
            let profiles = profile_store()?;
            commands::profile::show(profiles.path(), profiles.load_or_warn().as_ref());
            Ok(())
        }
    }
}
