//! Hit-log event model.
//!
//! An [`Event`] is one row of the hit log: a user loading a page at an
//! instant. Registration is an ordinary page load whose url is the
//! configured registration marker (see [`crate::journey::JourneyRules`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default url of the registration page.
pub const DEFAULT_REGISTRATION_URL: &str = "/register";

/// Default url prefix identifying rankable articles.
pub const DEFAULT_ARTICLE_PREFIX: &str = "/articles/";

/// A single page view or registration observation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    /// Display title of the page (`page_name` in the hit log).
    pub article_title: String,
    /// Page identifier (`page_url` in the hit log); the ranking key.
    pub article_url: String,
    /// Opaque user identifier.
    pub user_id: String,
    /// When the page was loaded, normalized to UTC.
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Build an event from its four fields.
    #[must_use]
    pub fn new(
        article_title: impl Into<String>,
        article_url: impl Into<String>,
        user_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            article_title: article_title.into(),
            article_url: article_url.into(),
            user_id: user_id.into(),
            timestamp,
        }
    }
}

/// How a page participates in a journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    /// A rankable article; added to the journey's candidate set.
    Article,
    /// The registration marker; flushes the candidate set.
    Registration,
    /// Any other page (home, search, ...); ignored.
    Other,
}

impl PageKind {
    /// Whether the page takes part in journeys at all.
    #[must_use]
    pub const fn is_tracked(self) -> bool {
        !matches!(self, Self::Other)
    }
}
