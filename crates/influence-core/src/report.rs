//! Ranking CSV writer.
//!
//! # Format
//!
//! ```text
//! page_name,page_url,total
//! Article A,/articles/a,2
//! ```
//!
//! The header is always written, even for an empty ranking. Output is
//! deterministic: the same [`Ranking`] always produces the same bytes.
//!
//! The whole document is rendered in memory, written to a sibling temp
//! file, then renamed over the destination. A failure at any step leaves
//! the previous destination contents (or no file) in place.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, instrument};

use crate::rank::Ranking;

/// Header columns of a ranking report.
pub const REPORT_COLUMNS: [&str; 3] = ["page_name", "page_url", "total"];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while writing a ranking report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// A row could not be encoded as CSV.
    #[error("failed to encode ranking row: {0}")]
    Encode(#[from] csv::Error),

    /// Flushing the in-memory CSV buffer failed.
    #[error("failed to flush ranking buffer: {0}")]
    Flush(#[source] io::Error),

    /// The destination could not be created or written.
    #[error("failed to write ranking to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub bytes: usize,
    /// BLAKE3 hash of the written bytes.
    pub content_hash: String,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Render a ranking as CSV bytes.
///
/// # Errors
///
/// Returns [`ReportError::Encode`] or [`ReportError::Flush`] if the CSV
/// writer fails.
pub fn render_ranking_csv(ranking: &Ranking) -> Result<Vec<u8>, ReportError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    wtr.write_record(REPORT_COLUMNS)?;
    for row in ranking {
        let total = row.total.to_string();
        wtr.write_record([row.page_name.as_str(), row.page_url.as_str(), total.as_str()])?;
    }

    wtr.into_inner()
        .map_err(|err| ReportError::Flush(err.into_error()))
}

/// Write a ranking to `path`, creating parent directories as needed.
///
/// An existing file is replaced atomically via a sibling `.tmp` file.
///
/// # Errors
///
/// Returns [`ReportError::Write`] if the directory or file cannot be
/// written, or an encoding error from [`render_ranking_csv`].
#[instrument(skip(ranking), fields(rows = ranking.len()))]
pub fn write_ranking(path: &Path, ranking: &Ranking) -> Result<ReportSummary, ReportError> {
    let bytes = render_ranking_csv(ranking)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let tmp = temp_path(path);
    let persisted = fs::write(&tmp, &bytes).and_then(|()| fs::rename(&tmp, path));
    if let Err(source) = persisted {
        // Best effort; the write error is what gets reported.
        let _ = fs::remove_file(&tmp);
        return Err(ReportError::Write {
            path: path.to_path_buf(),
            source,
        });
    }

    let summary = ReportSummary {
        path: path.to_path_buf(),
        rows: ranking.len(),
        bytes: bytes.len(),
        content_hash: content_hash(&bytes),
    };
    info!(
        path = %summary.path.display(),
        rows = summary.rows,
        hash = %summary.content_hash,
        "ranking written"
    );
    Ok(summary)
}

/// `.<name>.tmp` next to `path`.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "report".into(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.tmp"))
}

/// `blake3:<hex>` digest of report bytes.
#[must_use]
pub fn content_hash(bytes: &[u8]) -> String {
    format!("blake3:{}", blake3::hash(bytes))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::ArticleTitles;
    use crate::tally::Tally;
    use tempfile::TempDir;

    fn ranking() -> Ranking {
        let tally: Tally = [("/articles/a", 2), ("/articles/b", 1)].into_iter().collect();
        let mut titles = ArticleTitles::new();
        titles.insert("/articles/a", "Budget 2025: what it means");
        titles.insert("/articles/b", "Markets, rates, and you");
        Ranking::build(&tally, &titles).unwrap()
    }

    #[test]
    fn renders_header_and_rows_in_order() {
        let csv = String::from_utf8(render_ranking_csv(&ranking()).unwrap()).unwrap();
        assert_eq!(
            csv,
            "page_name,page_url,total\n\
             Budget 2025: what it means,/articles/a,2\n\
             \"Markets, rates, and you\",/articles/b,1\n"
        );
    }

    #[test]
    fn empty_ranking_still_has_header() {
        let csv = String::from_utf8(render_ranking_csv(&Ranking::default()).unwrap()).unwrap();
        assert_eq!(csv, "page_name,page_url,total\n");
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("outputs/nested/top.csv");
        let summary = write_ranking(&path, &ranking()).unwrap();

        assert!(path.exists());
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.bytes, fs::read(&path).unwrap().len());
        assert!(summary.content_hash.starts_with("blake3:"));
    }

    #[test]
    fn rewriting_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("top.csv");

        let first = write_ranking(&path, &ranking()).unwrap();
        let first_bytes = fs::read(&path).unwrap();
        let second = write_ranking(&path, &ranking()).unwrap();

        assert_eq!(first_bytes, fs::read(&path).unwrap());
        assert_eq!(first.content_hash, second.content_hash);
    }

    #[test]
    fn unwritable_destination_is_a_write_error() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should go.
        let path = dir.path().join("taken");
        fs::create_dir(&path).unwrap();

        let err = write_ranking(&path, &ranking()).unwrap_err();
        assert!(matches!(err, ReportError::Write { .. }));
        assert!(!temp_path(&path).exists(), "temp file cleaned up");
    }

    #[test]
    fn failed_replace_keeps_previous_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("top.csv");
        write_ranking(&path, &ranking()).unwrap();
        let before = fs::read(&path).unwrap();

        // Occupy the temp slot with a directory so the write step fails.
        fs::create_dir(temp_path(&path)).unwrap();
        let err = write_ranking(&path, &Ranking::default()).unwrap_err();

        assert!(matches!(err, ReportError::Write { .. }));
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn successful_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("top.csv");
        write_ranking(&path, &ranking()).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, [std::ffi::OsString::from("top.csv")]);
    }
}
