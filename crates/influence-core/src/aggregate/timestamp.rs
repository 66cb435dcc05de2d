//! Direct journey walk over timestamp-ordered events.

use tracing::{debug, instrument};

use super::JourneyAggregator;
use crate::event::Event;
use crate::journey::{JourneyRules, JourneyState, partition_by_user};
use crate::tally::Tally;

/// Walks each user's events in time order, crediting candidate articles at
/// every registration the policy allows.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampAggregator;

impl JourneyAggregator for TimestampAggregator {
    fn name(&self) -> &'static str {
        "timestamp"
    }

    #[instrument(skip_all, fields(events = events.len(), policy = %rules.policy))]
    fn aggregate(&self, events: &[Event], rules: &JourneyRules) -> Tally {
        let mut tally = Tally::new();
        let journeys = partition_by_user(events);
        let user_count = journeys.len();

        for journey in journeys {
            let mut state = JourneyState::new();
            for event in journey.events {
                let url = event.article_url.as_str();
                let tracking = state.visit(url, rules.classify(url), rules.policy, |credited| {
                    tally.credit(credited);
                });
                if !tracking {
                    break;
                }
            }
        }

        debug!(users = user_count, articles = tally.len(), "timestamp aggregation complete");
        tally
    }
}
