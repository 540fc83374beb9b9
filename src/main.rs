//! pallet - a small, file-based package manager.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pallet::policy::Policy;

mod cmd;

#[derive(Parser)]
#[command(name = "pallet")]
#[command(author, version, about = "pallet - a small, file-based package manager")]
pub struct Cli {
    /// Path to the catalog database (overrides PALLET_DB and the default
    /// under the pallet home directory).
    #[arg(long, global = true, env = "PALLET_DB")]
    db: Option<PathBuf>,

    /// Include full error chains in output.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and install one or more package scripts.
    Install {
        /// Package script files to build and install.
        #[arg(required = true)]
        scripts: Vec<PathBuf>,
        /// Skip the fatal error on unmet dependencies.
        #[arg(long)]
        no_deps: bool,
        /// Reserved; intended to bypass file conflicts. Not implemented.
        #[arg(long)]
        force: bool,
    },
    /// Remove one or more installed packages.
    Remove {
        /// Package names to remove.
        #[arg(required = true)]
        packages: Vec<String>,
        /// Skip the fatal error on dependencies that would break.
        #[arg(long)]
        no_deps: bool,
        /// Allow removal of files whose content has drifted from the
        /// recorded hash (backed up via rename-to-temp).
        #[arg(long)]
        hard: bool,
    },
    /// Query the catalog for installed packages.
    Query {
        /// Package names to query (a SQL-LIKE pattern is also accepted,
        /// e.g. `test%`); queries every installed package if omitted.
        packages: Vec<String>,
        /// List the files owned by each matched package.
        #[arg(long)]
        files: bool,
        /// Show manifest details (version, maintainer, dependencies).
        #[arg(long)]
        info: bool,
    },
    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: clap_complete::Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let db = cli.db.clone().unwrap_or_else(pallet::default_db_path);

    let result = match cli.command {
        Commands::Install {
            scripts,
            no_deps,
            force,
        } => {
            let mut policy = Policy::new(db);
            policy.no_deps = no_deps;
            policy.force = force;
            policy.debug = cli.debug;
            cmd::install::install(&scripts, &policy)
        }
        Commands::Remove {
            packages,
            no_deps,
            hard,
        } => {
            let mut policy = Policy::new(db);
            policy.no_deps = no_deps;
            policy.hard_remove = hard;
            policy.debug = cli.debug;
            cmd::remove::remove(&packages, &policy)
        }
        Commands::Query {
            packages,
            files,
            info,
        } => {
            let policy = Policy::new(db);
            cmd::query::query(&packages, files, info, &policy)
        }
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            Ok(())
        }
    };

    if let Err(err) = result {
        report_error(&err, cli.debug);
        std::process::exit(1);
    }
}

/// Renders a fatal error: the top-level message by default, the full
/// causal chain when the `debug` policy flag is set.
fn report_error(err: &anyhow::Error, debug: bool) {
    if debug {
        eprintln!("error: {err:?}");
    } else {
        eprintln!("error: {err}");
    }
}
