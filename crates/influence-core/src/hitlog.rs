//! Hit-log CSV reader.
//!
//! # Format
//!
//! ```text
//! page_name,page_url,user_id,timestamp
//! Article A,/articles/a,u001,2025-10-27 10:00:00
//! Register,/register,u001,2025-10-27 10:05:00
//! ```
//!
//! - Columns are matched by header name; extra columns are ignored.
//! - Every field is trimmed of surrounding whitespace.
//! - All four fields are required and must be non-empty.
//! - Timestamps are RFC 3339 (`2025-10-27T10:00:00Z`, any offset) or naive
//!   `YYYY-MM-DD HH:MM:SS[.fff]` (space or `T` separator), read as UTC.
//!
//! A single bad row fails the whole read; nothing is partially accepted.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::event::Event;

/// Header columns of a hit log, in canonical order.
pub const HITLOG_COLUMNS: [&str; 4] = ["page_name", "page_url", "user_id", "timestamp"];

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur while reading a hit log.
#[derive(Debug, thiserror::Error)]
pub enum HitlogError {
    /// The hit log file could not be opened.
    #[error("failed to open hit log {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The CSV layer rejected the input (bad quoting, invalid UTF-8, I/O).
    #[error("hit log CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A row is missing a required field or has an unparsable value.
    #[error("hit log line {line}: {reason}")]
    Parse {
        /// 1-based line number in the source (the header is line 1).
        line: u64,
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Read every event from the hit log at `path`.
///
/// # Errors
///
/// Returns [`HitlogError::Open`] if the file cannot be opened,
/// [`HitlogError::Csv`] on malformed CSV, and [`HitlogError::Parse`] on the
/// first row with a missing field or bad timestamp.
#[instrument]
pub fn read_hitlog_path(path: &Path) -> Result<Vec<Event>, HitlogError> {
    let file = File::open(path).map_err(|source| HitlogError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_hitlog(file)
}

/// Read every event from a CSV stream.
///
/// # Errors
///
/// Returns [`HitlogError::Csv`] on malformed CSV and [`HitlogError::Parse`]
/// on the first row with a missing field or bad timestamp.
pub fn read_hitlog<R: Read>(reader: R) -> Result<Vec<Event>, HitlogError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut record = csv::StringRecord::new();
    let mut events = Vec::new();

    while rdr.read_record(&mut record)? {
        let line = record.position().map_or(0, csv::Position::line);
        let row: HitRow = record.deserialize(Some(&headers))?;
        events.push(row.into_event(line)?);
    }

    debug!(events = events.len(), "hit log read");
    Ok(events)
}

/// Parse a hit-log timestamp into UTC.
///
/// # Errors
///
/// Returns a human-readable reason when no supported format matches.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("unparsable timestamp '{raw}'"))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Raw CSV row; every column optional so a missing one is reported with
/// its line number instead of as an opaque deserialize error.
#[derive(Debug, Deserialize)]
struct HitRow {
    #[serde(default)]
    page_name: Option<String>,
    #[serde(default)]
    page_url: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

impl HitRow {
    fn into_event(self, line: u64) -> Result<Event, HitlogError> {
        let page_name = required(self.page_name, "page_name", line)?;
        let page_url = required(self.page_url, "page_url", line)?;
        let user_id = required(self.user_id, "user_id", line)?;
        let raw_ts = required(self.timestamp, "timestamp", line)?;
        let timestamp =
            parse_timestamp(&raw_ts).map_err(|reason| HitlogError::Parse { line, reason })?;

        Ok(Event {
            article_title: page_name,
            article_url: page_url,
            user_id,
            timestamp,
        })
    }
}

fn required(value: Option<String>, column: &str, line: u64) -> Result<String, HitlogError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(HitlogError::Parse {
            line,
            reason: format!("missing {column}"),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
