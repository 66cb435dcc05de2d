//! Turning a [`Tally`] into an ordered report.
//!
//! Rows are ordered by `total` descending, then `page_url` ascending. The
//! url tie-break makes the order total: two rows only compare equal when
//! they are the same article.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use tracing::instrument;

use crate::event::Event;
use crate::tally::Tally;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while building a ranking.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RankingError {
    /// The tally credits an article nobody supplied a title for.
    #[error("no title known for ranked article {url}")]
    MissingMetadata {
        /// The article url present in the tally.
        url: String,
    },
}

// ---------------------------------------------------------------------------
// ArticleTitles
// ---------------------------------------------------------------------------

/// Display titles keyed by article url.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleTitles {
    by_url: HashMap<String, String>,
}

impl ArticleTitles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect titles from events. The first title seen for a url wins.
    #[must_use]
    pub fn from_events(events: &[Event]) -> Self {
        let mut titles = Self::new();
        for event in events {
            titles.insert(&event.article_url, &event.article_title);
        }
        titles
    }

    /// Record a title unless the url already has one.
    pub fn insert(&mut self, url: &str, title: &str) {
        if !self.by_url.contains_key(url) {
            self.by_url.insert(url.to_string(), title.to_string());
        }
    }

    #[must_use]
    pub fn get(&self, url: &str) -> Option<&str> {
        self.by_url.get(url).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// One output row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedArticle {
    pub page_name: String,
    pub page_url: String,
    pub total: u64,
}

/// Report order: `total` descending, then `page_url` ascending.
fn report_order(a: &RankedArticle, b: &RankedArticle) -> Ordering {
    b.total
        .cmp(&a.total)
        .then_with(|| a.page_url.cmp(&b.page_url))
}

/// Articles in report order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Ranking {
    rows: Vec<RankedArticle>,
}

impl Ranking {
    /// Rank every article in `tally` that has at least one credit.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::MissingMetadata`] if a credited article has
    /// no entry in `titles`.
    #[instrument(skip_all, fields(articles = tally.len()))]
    pub fn build(tally: &Tally, titles: &ArticleTitles) -> Result<Self, RankingError> {
        let mut rows = tally
            .iter()
            .filter(|(_, total)| *total > 0)
            .map(|(url, total)| {
                let title = titles
                    .get(url)
                    .ok_or_else(|| RankingError::MissingMetadata {
                        url: url.to_string(),
                    })?;
                Ok(RankedArticle {
                    page_name: title.to_string(),
                    page_url: url.to_string(),
                    total,
                })
            })
            .collect::<Result<Vec<_>, RankingError>>()?;

        rows.sort_by(report_order);
        Ok(Self { rows })
    }

    /// The first `n` rows.
    #[must_use]
    pub fn top(&self, n: usize) -> &[RankedArticle] {
        &self.rows[..n.min(self.rows.len())]
    }

    #[must_use]
    pub fn rows(&self) -> &[RankedArticle] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedArticle> {
        self.rows.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<'a> IntoIterator for &'a Ranking {
    type Item = &'a RankedArticle;
    type IntoIter = std::slice::Iter<'a, RankedArticle>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
