//! Data models for the appearance report.
//!
//! This module contains the records read from the database, the counts
//! derived from them, and the report handed to the renderer.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single appearance of a panelist on a show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppearanceRecord {
    /// Database identifier of the panelist.
    pub participant_id: i64,
    /// Display name of the panelist.
    pub name: String,
    /// Air date of the show.
    pub date: NaiveDate,
}

impl AppearanceRecord {
    /// Creates a new appearance record.
    pub fn new(participant_id: i64, name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            participant_id,
            name: name.into(),
            date,
        }
    }

    /// Calendar year of the appearance.
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// Number of appearances a panelist made in one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearlyCount {
    pub participant_id: i64,
    pub year: i32,
    pub count: u32,
}

/// One row of the report: a panelist and their per-year counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantAppearances {
    /// Database identifier of the panelist.
    pub participant_id: i64,
    /// Display name of the panelist.
    pub name: String,
    /// Counts for every year with at least one appearance, ascending by year.
    pub counts: Vec<YearlyCount>,
}

impl ParticipantAppearances {
    /// Total appearances across all years.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|c| u64::from(c.count)).sum()
    }

    /// Count for a given year, if the panelist appeared that year.
    pub fn count_for(&self, year: i32) -> Option<u32> {
        self.counts
            .binary_search_by_key(&year, |c| c.year)
            .ok()
            .map(|idx| self.counts[idx].count)
    }

    /// First and last year with an appearance.
    pub fn year_span(&self) -> Option<(i32, i32)> {
        match (self.counts.first(), self.counts.last()) {
            (Some(first), Some(last)) => Some((first.year, last.year)),
            _ => None,
        }
    }
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Heading shown at the top of the report.
    pub title: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Human-readable label of the data source (database name and host).
    pub source: String,
    /// Google Analytics property code, embedded when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ga_property_code: Option<String>,
}

/// The complete appearance report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Metadata about the report.
    pub metadata: ReportMetadata,
    /// Column years, ascending.
    pub years: Vec<i32>,
    /// Report rows, sorted by display name.
    pub participants: Vec<ParticipantAppearances>,
    /// Sum of every count in the report.
    pub total_appearances: u64,
}

/// Everything the loader pulls from the database in one run.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// One record per (panelist, show) pair.
    pub records: Vec<AppearanceRecord>,
    /// Distinct show years present in the database, ascending.
    pub show_years: Vec<i32>,
}
