//! Journey aggregation strategies.
//!
//! # Overview
//!
//! Two interchangeable ways of turning a hit log into a [`Tally`]:
//!
//! - [`timestamp::TimestampAggregator`] walks each user's time-ordered
//!   event list directly.
//! - [`graph::GraphAggregator`] first builds a page-transition graph
//!   ([`graph::JourneyGraph`]) and walks each user's edge sequence.
//!
//! Both apply the rule in [`crate::journey`] and must produce identical
//! tallies for any input. Callers choose through [`Approach`].

pub mod graph;
pub mod timestamp;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::event::Event;
use crate::journey::JourneyRules;
use crate::tally::Tally;

pub use graph::{GraphAggregator, JourneyGraph};
pub use timestamp::TimestampAggregator;

/// Capability shared by every aggregation strategy.
pub trait JourneyAggregator {
    /// Short stable name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Compute the per-article tally for `events` under `rules`.
    ///
    /// `events` may be in any order. Well-formed events never fail.
    fn aggregate(&self, events: &[Event], rules: &JourneyRules) -> Tally;
}

/// Which aggregation strategy a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Approach {
    /// Direct per-user walk over timestamp-ordered events.
    #[default]
    Timestamp,
    /// Walk over a page-transition graph.
    Graph,
}

impl Approach {
    /// All approaches, in declaration order.
    pub const ALL: [Self; 2] = [Self::Timestamp, Self::Graph];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Graph => "graph",
        }
    }

    /// The aggregator implementing this approach.
    #[must_use]
    pub fn aggregator(self) -> &'static dyn JourneyAggregator {
        match self {
            Self::Timestamp => &TimestampAggregator,
            Self::Graph => &GraphAggregator,
        }
    }

    /// Run the selected aggregator.
    #[must_use]
    pub fn aggregate(self, events: &[Event], rules: &JourneyRules) -> Tally {
        self.aggregator().aggregate(events, rules)
    }
}

impl fmt::Display for Approach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Approach {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timestamp" => Ok(Self::Timestamp),
            "graph" => Ok(Self::Graph),
            _ => Err(ConfigError::UnknownApproach(s.to_string())),
        }
    }
}
