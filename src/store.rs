//! SQLite-backed contact store.
//!
//! All contacts live in a single `logs` table. Every operation opens its own
//! connection and drops it before returning, so a `ContactStore` holds no open
//! handle and can be shared or called in a loop freely.
//!
//! Writes report failures as [`StoreError`]. Reads never fail: if the database
//! file or table is missing, or SQLite reports any other error, the condition is
//! logged and an empty list or [`ContactStats::unavailable`] is returned.

use std::borrow::Borrow;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, ToSql, params};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::StorageConfig;
use crate::contact::{ContactRecord, StoredContact};
use crate::stats::{ContactStats, MostActive, StatsScope};

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS logs (
        id INTEGER PRIMARY KEY,
        station_callsign TEXT NOT NULL,
        contact_callsign TEXT NOT NULL,
        band TEXT NOT NULL,
        mode TEXT NOT NULL,
        qso_date TEXT NOT NULL,
        time_on TEXT NOT NULL
    )";

const INSERT_CONTACT: &str = "
    INSERT INTO logs (station_callsign, contact_callsign, band, mode, qso_date, time_on)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

const SELECT_CONTACTS: &str = "
    SELECT id, station_callsign, contact_callsign, band, mode, qso_date, time_on
    FROM logs";

/// Newest first; rows with equal date and time keep insertion order.
const CONTACT_ORDER: &str = " ORDER BY qso_date DESC, time_on DESC, id ASC";

const SEARCH_FILTER: &str =
    " WHERE station_callsign LIKE ?1 ESCAPE '\\' OR contact_callsign LIKE ?1 ESCAPE '\\'";

const STATION_FILTER: &str = " WHERE station_callsign = ?1";

/// Errors from the write path of the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to open contact database {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Persistent store of contacts.
#[derive(Debug, Clone)]
pub struct ContactStore {
    path: PathBuf,
}

impl ContactStore {
    /// Create a store for the database configured in `config`.
    ///
    /// Nothing is opened or created until the first operation.
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            path: config.database_path.clone(),
        }
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the database file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn open_write(&self) -> Result<Connection, StoreError> {
        Connection::open(&self.path).map_err(|source| StoreError::Open {
            path: self.path.clone(),
            source,
        })
    }

    /// Read connections never create the database file.
    fn open_read(&self) -> Result<Connection, StoreError> {
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| StoreError::Open {
            path: self.path.clone(),
            source,
        })
    }

    /// Create the `logs` table if it does not exist.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        let conn = self.open_write()?;
        create_schema(&conn)
    }

    /// Insert records as new rows in a single transaction.
    ///
    /// Creates the schema first if needed. Records are not deduplicated against
    /// existing rows. Returns the number of rows inserted; on error nothing from
    /// this call is kept.
    pub fn ingest<I>(&self, records: I) -> Result<usize, StoreError>
    where
        I: IntoIterator,
        I::Item: Borrow<ContactRecord>,
    {
        let mut conn = self.open_write()?;
        create_schema(&conn)?;

        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(INSERT_CONTACT)?;
            for record in records {
                let r = record.borrow();
                stmt.execute(params![
                    r.station_callsign,
                    r.contact_callsign,
                    r.band,
                    r.mode,
                    r.qso_date,
                    r.time_on,
                ])?;
                inserted += 1;
            }
        }
        tx.commit()?;

        info!("Stored {} contacts in {}", inserted, self.path.display());
        Ok(inserted)
    }

    /// All contacts, newest first.
    pub fn list_all(&self) -> Vec<StoredContact> {
        self.contacts_or_empty("list contacts", "", &[])
    }

    /// Contacts whose station or contact callsign contains `query`.
    ///
    /// Matching is ASCII case-insensitive and `%`/`_` are taken literally. An
    /// empty query matches every contact.
    pub fn search(&self, query: &str) -> Vec<StoredContact> {
        if query.is_empty() {
            return self.list_all();
        }
        let pattern = format!("%{}%", escape_like(query));
        self.contacts_or_empty("search contacts", SEARCH_FILTER, &[&pattern])
    }

    /// Contacts logged by exactly `callsign`.
    pub fn filter_by_station(&self, callsign: &str) -> Vec<StoredContact> {
        self.contacts_or_empty("filter contacts by station", STATION_FILTER, &[&callsign])
    }

    /// Statistics over every contact.
    pub fn global_stats(&self) -> ContactStats {
        self.stats(StatsScope::All)
    }

    /// Statistics over the contacts logged by `callsign`.
    pub fn station_stats(&self, callsign: &str) -> ContactStats {
        self.stats(StatsScope::Station(callsign))
    }

    /// Total, distinct and most-active contact figures for `scope`.
    pub fn stats(&self, scope: StatsScope<'_>) -> ContactStats {
        match self.try_stats(scope) {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Failed to compute contact statistics: {}", e);
                ContactStats::unavailable()
            }
        }
    }

    /// Distinct station callsigns in sorted order.
    pub fn list_station_identities(&self) -> Vec<String> {
        match self.try_station_identities() {
            Ok(stations) => stations,
            Err(e) => {
                warn!("Failed to list station callsigns: {}", e);
                Vec::new()
            }
        }
    }

    fn contacts_or_empty(
        &self,
        action: &str,
        filter: &str,
        params: &[&dyn ToSql],
    ) -> Vec<StoredContact> {
        match self.try_contacts(filter, params) {
            Ok(contacts) => contacts,
            Err(e) => {
                warn!("Failed to {}: {}", action, e);
                Vec::new()
            }
        }
    }

    fn try_contacts(
        &self,
        filter: &str,
        params: &[&dyn ToSql],
    ) -> Result<Vec<StoredContact>, StoreError> {
        let conn = self.open_read()?;
        let sql = format!("{SELECT_CONTACTS}{filter}{CONTACT_ORDER}");
        let mut stmt = conn.prepare(&sql)?;
        let contacts = stmt
            .query_map(params, row_to_contact)?
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Read {} contacts", contacts.len());
        Ok(contacts)
    }

    fn try_stats(&self, scope: StatsScope<'_>) -> Result<ContactStats, StoreError> {
        let conn = self.open_read()?;

        let (filter, params): (&str, Vec<&dyn ToSql>) = match &scope {
            StatsScope::All => ("", Vec::new()),
            StatsScope::Station(callsign) => (STATION_FILTER, vec![callsign as &dyn ToSql]),
        };

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM logs{filter}"),
            params.as_slice(),
            |row| row.get(0),
        )?;

        let unique: i64 = conn.query_row(
            &format!("SELECT COUNT(DISTINCT contact_callsign) FROM logs{filter}"),
            params.as_slice(),
            |row| row.get(0),
        )?;

        // Ties on the count go to the smallest callsign. A blank top callsign
        // reports as no data.
        let most_active = conn
            .query_row(
                &format!(
                    "SELECT contact_callsign, COUNT(*) AS cnt FROM logs{filter}
                     GROUP BY contact_callsign
                     ORDER BY cnt DESC, contact_callsign ASC
                     LIMIT 1"
                ),
                params.as_slice(),
                |row| {
                    Ok(MostActive {
                        callsign: row.get(0)?,
                        count: to_count(row.get(1)?),
                    })
                },
            )
            .optional()?
            .filter(|m| !m.callsign.is_empty());

        Ok(ContactStats {
            total_contacts: to_count(total),
            unique_contacts: to_count(unique),
            most_active,
            available: true,
        })
    }

    fn try_station_identities(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.open_read()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT station_callsign FROM logs ORDER BY station_callsign")?;
        let stations = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(stations)
    }
}

fn create_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(CREATE_TABLE)?;
    Ok(())
}

fn row_to_contact(row: &Row<'_>) -> rusqlite::Result<StoredContact> {
    Ok(StoredContact {
        id: row.get(0)?,
        record: ContactRecord {
            station_callsign: row.get(1)?,
            contact_callsign: row.get(2)?,
            band: row.get(3)?,
            mode: row.get(4)?,
            qso_date: row.get(5)?,
            time_on: row.get(6)?,
        },
    })
}

/// SQLite counts are never negative.
fn to_count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

/// Escape `LIKE` wildcards so the query is matched as a literal substring.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
