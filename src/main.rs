use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use subject_fields::{load_csv, EngineConfig, EvaluationMode, SqliteStore};

#[derive(Parser, Debug)]
#[command(name = "subject-fields")]
#[command(version)]
#[command(about = "Compute derived indicators for subjects from stored timed values", long_about = None)]
struct Cli {
    /// JSON config file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the configured database path
    #[arg(long, value_name = "DB")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import timed values from CSV into the database
    Import {
        /// subject_type,subject,provider,attribute,timestamp,value[,caveat]
        csv: PathBuf,
    },

    /// Evaluate every configured field for one subject and print JSON
    Evaluate {
        /// Subject code (e.g., E01000001)
        #[arg(short, long)]
        subject: String,

        /// Subject type label; defaults to the configured one
        #[arg(long)]
        subject_type: Option<String>,

        /// Lenient evaluation mode
        #[arg(long, conflicts_with = "strict")]
        lenient: bool,

        /// Strict evaluation mode
        #[arg(long)]
        strict: bool,
    },
}

/// Initialize tracing subscriber; RUST_LOG overrides the configured filter
fn init_tracing(filter: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(database) = cli.database {
        config.database = database;
    }

    init_tracing(&config.log_filter);

    match cli.command {
        Command::Import { csv } => run_import(&config, &csv),
        Command::Evaluate {
            subject,
            subject_type,
            lenient,
            strict,
        } => {
            let mode = match (lenient, strict) {
                (true, _) => EvaluationMode::Lenient,
                (_, true) => EvaluationMode::Strict,
                _ => EvaluationMode::Unspecified,
            };
            let subject_type = subject_type.unwrap_or_else(|| config.default_subject_type.clone());
            run_evaluate(&config, &subject_type, &subject, mode)
        }
    }
}

fn run_import(config: &EngineConfig, csv: &Path) -> Result<()> {
    let values = load_csv(csv, &config.default_provider)?;
    info!(rows = values.len(), csv = ?csv, "Loaded CSV");

    let store = SqliteStore::open(&config.database)?;
    store.insert_timed_values(&values)?;

    let count = store.count_timed_values()?;
    info!(count, database = ?config.database, "Import complete");
    Ok(())
}

fn run_evaluate(config: &EngineConfig, subject_type: &str, code: &str, mode: EvaluationMode) -> Result<()> {
    let store = SqliteStore::open(&config.database)?;

    let Some(subject) = store.find_subject(subject_type, code)? else {
        bail!("Unknown subject {}:{}", subject_type, code);
    };

    let mut records = Vec::with_capacity(config.fields.len());
    for spec in &config.fields {
        let field = spec.build();
        match field.json_value_for_subject(&subject, &store, mode) {
            Ok(record) => records.push(record.to_json()?),
            Err(e) => warn!(field = field.label(), subject = %subject, error = %e, "Field skipped"),
        }
    }

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
