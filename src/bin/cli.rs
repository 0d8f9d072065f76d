//! StowKV CLI
//!
//! Command-line interface for inspecting and editing a store file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use stowkv::{Config, OpenMode, ReadAccess, StowError};
use tracing_subscriber::{fmt, EnvFilter};

/// StowKV CLI
#[derive(Parser, Debug)]
#[command(name = "stowkv-cli")]
#[command(about = "CLI for StowKV store files")]
#[command(version)]
struct Args {
    /// Store file; `.stow` is appended if missing
    #[arg(short, long, default_value = "./store.stow")]
    file: PathBuf,

    /// Skip checksum verification on open and on reads
    #[arg(long)]
    no_verify: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair, creating the file if needed
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// List keys in insertion order
    Keys {
        /// Newest first
        #[arg(short, long)]
        reverse: bool,
    },

    /// Print the number of live keys
    Len,

    /// Rewrite the file with only its live entries
    Compact,

    /// Scan the file and report damage without modifying it
    Check,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(StowError::KeyNotFound) => {
            eprintln!("key not found");
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(mut args: Args) -> stowkv::Result<()> {
    args.file = stowkv::with_extension(&args.file);
    let config = Config::builder().verify_checksums(!args.no_verify).build();

    match args.command {
        Commands::Get { key } => {
            let store = stowkv::open(&args.file, OpenMode::ReadOnly, config)?;
            let value: Vec<u8> = store.get(key.as_str())?;
            println!("{}", String::from_utf8_lossy(&value));
            store.close()
        }

        Commands::Set { key, value } => {
            let mut store = stowkv::Store::open(&args.file, stowkv::WriteMode::Create, config)?;
            store.set(key.as_str(), value.as_str())?;
            store.close()
        }

        Commands::Del { key } => {
            let mut store =
                stowkv::Store::open(&args.file, stowkv::WriteMode::Existing, config)?;
            store.delete(key.as_str())?;
            store.close()
        }

        Commands::Keys { reverse } => {
            let store = stowkv::open(&args.file, OpenMode::ReadOnly, config)?;
            let keys: Vec<_> = if reverse {
                store.raw_keys().rev().collect()
            } else {
                store.raw_keys().collect()
            };
            for key in keys {
                println!("{}", String::from_utf8_lossy(key));
            }
            Ok(())
        }

        Commands::Len => {
            let store = stowkv::open(&args.file, OpenMode::ReadOnly, config)?;
            println!("{}", store.len());
            Ok(())
        }

        Commands::Compact => {
            let mut store =
                stowkv::Store::open(&args.file, stowkv::WriteMode::Existing, config)?;
            let stats = store.compact()?;
            println!(
                "{} live entries, {} -> {} bytes ({} reclaimed)",
                stats.live_entries,
                stats.bytes_before,
                stats.bytes_after,
                stats.bytes_reclaimed()
            );
            store.close()
        }

        Commands::Check => {
            let report = stowkv::check(&args.file, !args.no_verify)?;
            println!(
                "{} records, {} tombstones, {} corrupted, {}/{} bytes scanned",
                report.records_read,
                report.tombstones,
                report.records_corrupted,
                report.scanned_bytes,
                report.file_size
            );
            for warning in &report.warnings {
                println!("warning: {}", warning);
            }
            Ok(())
        }
    }
}
