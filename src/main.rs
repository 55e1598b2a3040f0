//! strata - inspect and append to a strata write-ahead log

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use std::path::PathBuf;
use strata::config::StorageConfig;
use strata::database::Database;
use strata::storage::StorageResult;

/// strata - storage core command line
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Data directory
    #[arg(short = 'D', long, default_value = "./strata_data")]
    data_dir: PathBuf,

    /// Block size in bytes
    #[arg(short, long, default_value = "400")]
    block_size: usize,

    /// Number of buffers in the pool
    #[arg(short, long, default_value = "8")]
    pool_size: usize,

    /// Log file name inside the data directory
    #[arg(short, long, default_value = "strata.log")]
    log_file: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append string records to the log and flush them
    Append {
        /// Records to append, in order
        #[arg(required = true)]
        records: Vec<String>,
    },
    /// Print every log record, newest first
    Dump,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = StorageConfig {
        block_size: args.block_size,
        pool_size: args.pool_size,
        log_file: args.log_file.clone(),
        ..StorageConfig::new(&args.data_dir)
    };
    let db = Database::open(&config)
        .with_context(|| format!("Failed to open database at {}", args.data_dir.display()))?;
    let log = db.log_manager();

    match args.command {
        Command::Append { records } => {
            for record in &records {
                let lsn = log
                    .append(record.as_bytes())
                    .with_context(|| format!("Failed to append {:?}", record))?;
                println!("{}", lsn);
            }
            log.flush(log.latest_lsn()).context("Failed to flush log")?;
            println!(
                "{} record(s) flushed to {}",
                records.len(),
                db.file_manager().db_dir().join(log.log_file()).display()
            );
        }
        Command::Dump => {
            println!(
                "{}",
                db.file_manager().db_dir().join(log.log_file()).display()
            );
            let records = log
                .iterator()?
                .collect::<StorageResult<Vec<_>>>()
                .context("Failed to read log")?;
            for record in &records {
                println!("{:>5}  {}", record.len(), String::from_utf8_lossy(record));
            }
            println!("{} record(s)", records.len());
        }
    }

    Ok(())
}
