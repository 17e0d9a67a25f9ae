//! tambo - dairy farm survey store
//!
//! Command-line front end over the survey database: submit section forms,
//! list and delete records, import and export section files, and show
//! computed summaries.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tambo::config::{Overrides, TamboConfig};
use tambo_logging::{init_logging, LogConfig};
use tracing::debug;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "tambo", about = "Dairy farm survey store", version)]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Database file (overrides TAMBO_DB and config.toml)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Home directory for config, database and logs (overrides TAMBO_HOME)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show database location, farms and per-section row counts
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Show resolved configuration
    Config {
        #[arg(long)]
        json: bool,
    },

    /// Validate and save a section form (JSON object of form key -> value)
    Submit {
        /// Section key (e.g. datos_generales, rebano, transporte)
        section: String,

        /// JSON file holding the form
        #[arg(short, long)]
        file: PathBuf,

        /// Farm the record belongs to (default: most recent farm)
        #[arg(long)]
        farm: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// List a section's records for a farm
    List {
        section: String,

        /// Farm id (default: most recent farm)
        #[arg(long)]
        farm: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Delete the most recently created record of a section
    DeleteLast {
        section: String,

        #[arg(long)]
        json: bool,
    },

    /// Export a farm's survey as tables, CSV files or JSON
    Export {
        /// Farm id (default: most recent farm)
        #[arg(long)]
        farm: Option<String>,

        /// Write <section>.csv files into this directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Import a directory of <section>.csv files
    Import {
        dir: PathBuf,

        /// Attach section rows to this farm when no farm file is present
        #[arg(long)]
        farm: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Show computed farm and herd figures
    Summary {
        /// Farm id (default: most recent farm)
        #[arg(long)]
        farm: Option<String>,

        #[arg(long)]
        json: bool,
    },
}

fn run_command(command: Commands, config: &TamboConfig) -> anyhow::Result<()> {
    match command {
        Commands::Status { json } => cli::status::run(cli::status::StatusArgs { json }, config),
        Commands::Config { json } => cli::config::run(cli::config::ConfigArgs { json }, config),
        Commands::Submit {
            section,
            file,
            farm,
            json,
        } => cli::records::submit(
            cli::records::SubmitArgs {
                section,
                file,
                farm,
                json,
            },
            config,
        ),
        Commands::List {
            section,
            farm,
            json,
        } => cli::records::list(
            cli::records::ListArgs {
                section,
                farm,
                json,
            },
            config,
        ),
        Commands::DeleteLast { section, json } => cli::records::delete_last(
            cli::records::DeleteLastArgs { section, json },
            config,
        ),
        Commands::Export { farm, out, json } => {
            cli::transfer::export(cli::transfer::ExportArgs { farm, out, json }, config)
        }
        Commands::Import { dir, farm, json } => {
            cli::transfer::import(cli::transfer::ImportArgs { dir, farm, json }, config)
        }
        Commands::Summary { farm, json } => {
            cli::summary::run(cli::summary::SummaryArgs { farm, json }, config)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match TamboConfig::load(&Overrides::from_env(cli.home.clone(), cli.db.clone())) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{:?}", err);
            return ExitCode::from(1);
        }
    };

    let _log_guard = match init_logging(LogConfig {
        app_name: "tambo",
        log_dir: &config.log_dir,
        verbose: cli.verbose,
        filter: config.log_filter.as_deref(),
    }) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: failed to initialize logging: {:#}", err);
            None
        }
    };
    debug!(database = %config.database_path.display(), "Configuration resolved");

    match run_command(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:?}", err);
            ExitCode::from(1)
        }
    }
}
