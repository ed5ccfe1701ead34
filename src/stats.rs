//! Contact statistics.
//!
//! This module defines the result of the store's aggregation queries. The same
//! three metrics are reported for the whole log or for a single station; the
//! [`StatsScope`] selects which rows are counted.

use serde::Serialize;
use std::fmt;

/// Label shown when there is no most-active contact.
pub const NO_DATA: &str = "No Data";

/// Which rows a statistics query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsScope<'a> {
    /// Every stored contact.
    All,
    /// Contacts logged by one station callsign (exact match).
    Station(&'a str),
}

/// The contact callsign worked most often, with its count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MostActive {
    pub callsign: String,
    pub count: u64,
}

impl fmt::Display for MostActive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.callsign, self.count)
    }
}

/// Aggregate figures over a set of contacts.
///
/// When several callsigns share the highest count, `most_active` holds the
/// lexicographically smallest of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactStats {
    /// Number of contacts in scope.
    pub total_contacts: u64,

    /// Number of distinct contact callsigns in scope.
    pub unique_contacts: u64,

    /// Most frequently worked contact callsign, if any.
    pub most_active: Option<MostActive>,

    /// False when the store could not be read and the figures are zeroed.
    pub available: bool,
}

impl ContactStats {
    /// Zeroed statistics for a scope with no contacts.
    pub fn empty() -> Self {
        Self {
            total_contacts: 0,
            unique_contacts: 0,
            most_active: None,
            available: true,
        }
    }

    /// Zeroed statistics substituted when the store cannot be read.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::empty()
        }
    }

    /// The most-active contact as `CALL (count)`, or [`NO_DATA`].
    pub fn most_active_label(&self) -> String {
        self.most_active
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| NO_DATA.to_string())
    }
}

impl fmt::Display for ContactStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.available {
            writeln!(f, "(contact database unavailable)")?;
        }
        writeln!(f, "Total contacts: {}", self.total_contacts)?;
        writeln!(f, "Unique stations: {}", self.unique_contacts)?;
        write!(f, "Most active contact: {}", self.most_active_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_active_label() {
        let stats = ContactStats {
            total_contacts: 3,
            unique_contacts: 2,
            most_active: Some(MostActive {
                callsign: "W1AW".to_string(),
                count: 2,
            }),
            available: true,
        };
        assert_eq!(stats.most_active_label(), "W1AW (2)");
    }

    #[test]
    fn test_empty_and_unavailable() {
        let empty = ContactStats::empty();
        assert!(empty.available);
        assert_eq!(empty.total_contacts, 0);
        assert_eq!(empty.most_active_label(), NO_DATA);

        let unavailable = ContactStats::unavailable();
        assert!(!unavailable.available);
        assert_eq!(unavailable.unique_contacts, 0);
        assert_eq!(unavailable.most_active_label(), NO_DATA);
    }

    #[test]
    fn test_display() {
        let text = ContactStats::unavailable().to_string();
        assert!(text.contains("unavailable"));
        assert!(text.contains("Total contacts: 0"));
        assert!(text.ends_with("Most active contact: No Data"));
    }
}
