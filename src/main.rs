//! ADIF Logbook CLI - load ADIF logs and query the contact database.

use std::path::PathBuf;

use adif_logbook::{
    Config, ContactStats, ContactStore, ScanReport, StoredContact, ingest_files, scan_directory,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// ADIF Logbook - load amateur radio contact logs and query them
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "ADIF_LOGBOOK_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the config file)
    #[arg(long, global = true, env = "ADIF_LOGBOOK_DB")]
    database: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load all ADIF files from the upload directory
    Load {
        /// Upload directory (overrides the config file)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Scan even if the database already exists
        #[arg(long)]
        force: bool,
    },

    /// Load the given ADIF files
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List contacts, newest first
    List {
        /// Only contacts logged by this station callsign
        #[arg(long)]
        station: Option<String>,
    },

    /// Find contacts whose station or contact callsign contains QUERY
    Search { query: String },

    /// Show contact statistics
    Stats {
        /// Only contacts logged by this station callsign
        #[arg(long)]
        station: Option<String>,
    },

    /// List the station callsigns present in the log
    Stations,
}

/// A contact listing together with the statistics for the same scope.
#[derive(Serialize)]
struct Listing<'a> {
    stats: &'a ContactStats,
    contacts: &'a [StoredContact],
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(database) = args.database {
        config.storage.database_path = database;
    }

    let store = ContactStore::new(&config.storage);
    run(args.command, &config, &store, args.json)
}

fn run(command: Command, config: &Config, store: &ContactStore, json: bool) -> Result<()> {
    match command {
        Command::Load { dir, force } => {
            let dir = dir.unwrap_or_else(|| config.ingest.upload_dir.clone());
            if store.exists() && config.ingest.skip_if_database_exists && !force {
                info!(
                    "Database {} already exists, skipping upload scan",
                    store.path().display()
                );
                return Ok(());
            }
            info!("Loading ADIF files from {}", dir.display());
            let report = scan_directory(store, &dir)
                .with_context(|| format!("Failed to scan {}", dir.display()))?;
            print_report(&report, json)
        }
        Command::Import { files } => print_report(&ingest_files(store, files), json),
        Command::List { station } => {
            let (contacts, stats) = match station.as_deref() {
                Some(call) => (store.filter_by_station(call), store.station_stats(call)),
                None => (store.list_all(), store.global_stats()),
            };
            print_listing(&contacts, &stats, json)
        }
        Command::Search { query } => {
            let contacts = store.search(&query);
            print_listing(&contacts, &store.global_stats(), json)
        }
        Command::Stats { station } => {
            let stats = match station.as_deref() {
                Some(call) => store.station_stats(call),
                None => store.global_stats(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("{}", stats);
            }
            Ok(())
        }
        Command::Stations => {
            let stations = store.list_station_identities();
            if json {
                println!("{}", serde_json::to_string_pretty(&stations)?);
            } else {
                for station in stations {
                    println!("{}", station);
                }
            }
            Ok(())
        }
    }
}

fn print_report(report: &ScanReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", report);
    }
    Ok(())
}

fn print_listing(contacts: &[StoredContact], stats: &ContactStats, json: bool) -> Result<()> {
    if json {
        let listing = Listing { stats, contacts };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if !stats.available {
        println!("Error: the contact database is inaccessible. Load some ADIF files first.");
        return Ok(());
    }

    println!("{}", stats);
    println!();
    for contact in contacts {
        println!("{}", contact);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use adif_logbook::StorageConfig;
    use std::fs;

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from(["adif-logbook", "stats", "--station", "K1ABC", "--json"])
            .unwrap();
        assert!(args.json);
        assert!(matches!(
            args.command,
            Command::Stats { station: Some(ref s) } if s == "K1ABC"
        ));

        assert!(Args::try_parse_from(["adif-logbook", "import"]).is_err());

        let args = Args::try_parse_from(["adif-logbook", "list", "--database", "qsos.db"]).unwrap();
        assert_eq!(args.database, Some(PathBuf::from("qsos.db")));
        assert!(matches!(args.command, Command::List { station: None }));
    }

    #[test]
    fn test_load_skips_existing_database() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("uploads");
        fs::create_dir(&uploads).unwrap();
        fs::write(
            uploads.join("log.adi"),
            "<call:4>W1AW<band:3>20m<mode:3>SSB<qso_date:8>20230101<time_on:4>1200<station_callsign:5>K1ABC<EOR>",
        )
        .unwrap();

        let mut config = Config::default();
        config.storage = StorageConfig::with_database(dir.path().join("contacts.db"));
        config.ingest.upload_dir = uploads;
        let store = ContactStore::new(&config.storage);

        let load = || Command::Load {
            dir: None,
            force: false,
        };
        run(load(), &config, &store, false).unwrap();
        assert_eq!(store.list_all().len(), 1);

        // Second run sees the database and does nothing.
        run(load(), &config, &store, false).unwrap();
        assert_eq!(store.list_all().len(), 1);

        let force = Command::Load {
            dir: None,
            force: true,
        };
        run(force, &config, &store, false).unwrap();
        assert_eq!(store.list_all().len(), 2);
    }
}
