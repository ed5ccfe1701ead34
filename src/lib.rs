//! ADIF Logbook - load amateur radio contact logs into SQLite and query them.
//!
//! This crate provides:
//! - A tolerant nom-based parser for ADIF (`.adi`/`.adif`) logs
//! - A SQLite contact store with search, per-station filtering and statistics
//! - A directory scan that loads every log file from an upload folder
//!
//! # Example
//!
//! ```rust,no_run
//! use adif_logbook::{ContactStore, StorageConfig, parser::parse};
//!
//! let log = "<call:4>W1AW<band:3>20m<mode:3>SSB<qso_date:8>20230101\
//!            <time_on:4>1200<station_callsign:5>K1ABC<EOR>";
//!
//! let store = ContactStore::new(&StorageConfig::with_database("contact_logs.db"));
//! store.ingest(parse(log)).expect("Failed to store contacts");
//!
//! println!("{}", store.station_stats("K1ABC"));
//! ```

pub mod config;
pub mod contact;
pub mod ingest;
pub mod parser;
pub mod stats;
pub mod store;

pub use config::{Config, IngestConfig, StorageConfig};
pub use contact::{ContactRecord, StoredContact};
pub use ingest::{IngestError, ScanReport, ingest_file, ingest_files, scan_directory};
pub use parser::{ParseError, looks_like_adif, parse};
pub use stats::{ContactStats, MostActive, StatsScope};
pub use store::{ContactStore, StoreError};
