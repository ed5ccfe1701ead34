//! Data structures representing logged contacts.
//!
//! A [`ContactRecord`] is what the parser produces from one ADIF record; a
//! [`StoredContact`] is the same record after the store has assigned it a row id.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single QSO with the six fields this logbook tracks.
///
/// Every field is required. Date and time are kept exactly as they appeared in
/// the source log (typically `YYYYMMDD` and `HHMM` or `HHMMSS`).
///
/// # Example
///
/// A raw ADIF record like:
/// ```text
/// <call:4>W1AW<band:3>20m<mode:3>SSB<qso_date:8>20230101<time_on:4>1200<station_callsign:5>K1ABC<EOR>
/// ```
///
/// Would be parsed into a `ContactRecord` with:
/// - `station_callsign`: "K1ABC"
/// - `contact_callsign`: "W1AW"
/// - `band`: "20m"
/// - `mode`: "SSB"
/// - `qso_date`: "20230101"
/// - `time_on`: "1200"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactRecord {
    /// Callsign of the logging station.
    pub station_callsign: String,

    /// Callsign of the remote station worked (the ADIF `call` field).
    pub contact_callsign: String,

    /// Band, e.g. "20m".
    pub band: String,

    /// Mode, e.g. "SSB" or "CW".
    pub mode: String,

    /// QSO date as written in the source.
    pub qso_date: String,

    /// Start time as written in the source.
    pub time_on: String,
}

impl fmt::Display for ContactRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {:<10} -> {:<10} {:>5} {}",
            self.qso_date,
            self.time_on,
            self.station_callsign,
            self.contact_callsign,
            self.band,
            self.mode
        )
    }
}

/// A contact with its row id in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredContact {
    /// Store-assigned identifier, unique per row.
    pub id: i64,
    /// The contact data.
    #[serde(flatten)]
    pub record: ContactRecord,
}

impl fmt::Display for StoredContact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:<6} {}", self.id, self.record)
    }
}
