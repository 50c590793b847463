mod commands;
mod error;
mod util;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use crate::commands::{load_dialing_table, reconcile, users, variations, Context};
use crate::error::{exit_code_for, report_error};
use kairo_config as config;
use kairo_store::{paths, Store};

#[derive(Debug, Parser)]
#[command(
    name = "kairo",
    version,
    about = "Match address books against registered users"
)]
struct Cli {
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(flatten)]
    Directory(DirectoryCommand),
    /// Print the lookup tokens generated for a phone number
    Variations(variations::VariationsArgs),
}

/// Commands that need the user directory.
#[derive(Debug, Subcommand)]
enum DirectoryCommand {
    /// Register a user in the directory
    #[command(name = "add-user")]
    AddUser(users::AddUserArgs),
    #[command(name = "list-users")]
    ListUsers,
    #[command(name = "remove-user")]
    RemoveUser(users::RemoveUserArgs),
    /// Match an uploaded contact list against the directory
    Reconcile(reconcile::ReconcileArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_logging(verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, verbose);
            exit_code_for(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        db_path,
        config: config_path,
        json,
        verbose,
        command,
    } = cli;

    let app_config = config::load(config_path.clone()).with_context(|| "load config")?;
    if verbose {
        match config::resolve_config_path(config_path) {
            Ok(path) => {
                if path.exists() {
                    debug!(path = %path.display(), "config resolved");
                } else {
                    debug!(path = %path.display(), "config missing, using defaults");
                }
            }
            Err(err) => {
                debug!(error = %err, "config unavailable");
            }
        }
    }
    let dialing = load_dialing_table(&app_config)?;
    debug!(rules = dialing.len(), "dialing table loaded");

    let command = match command {
        Command::Variations(args) => return variations::print_variations(&dialing, json, args),
        Command::Directory(command) => command,
    };

    let db_path = paths::resolve_db_path(db_path).with_context(|| "resolve database path")?;
    debug!(path = %db_path.display(), "database path resolved");

    let store =
        Store::open(&db_path).with_context(|| format!("open database {}", db_path.display()))?;
    store.migrate().with_context(|| "run migrations")?;

    let ctx = Context {
        store: &store,
        db_path: &db_path,
        json,
        config: &app_config,
        dialing: &dialing,
    };

    match command {
        DirectoryCommand::AddUser(args) => users::add_user(&ctx, args),
        DirectoryCommand::ListUsers => users::list_users(&ctx),
        DirectoryCommand::RemoveUser(args) => users::remove_user(&ctx, args),
        DirectoryCommand::Reconcile(args) => reconcile::reconcile(&ctx, args),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}
