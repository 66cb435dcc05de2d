//! Property tests: both aggregators agree and the tally obeys its invariants.

use std::collections::HashSet;

use influence_core::{
    Approach, GraphAggregator, JourneyAggregator, JourneyRules, RegistrationPolicy, Tally,
    TimestampAggregator,
};
use proptest::prelude::*;

use generators::*;

const POLICIES: [RegistrationPolicy; 2] =
    [RegistrationPolicy::FirstOnly, RegistrationPolicy::EveryCycle];

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn graph_and_timestamp_tallies_are_identical(events in arb_events(), rules in arb_rules()) {
        prop_assert_eq!(
            TimestampAggregator.aggregate(&events, &rules),
            GraphAggregator.aggregate(&events, &rules)
        );
    }

    #[test]
    fn marker_is_never_credited(events in arb_events(), rules in arb_rules()) {
        let tally = GraphAggregator.aggregate(&events, &rules);
        prop_assert_eq!(tally.get(&rules.registration_url), 0);
    }

    #[test]
    fn aggregation_is_deterministic(events in arb_events()) {
        let rules = JourneyRules::default();
        for approach in Approach::ALL {
            prop_assert_eq!(
                approach.aggregate(&events, &rules),
                approach.aggregate(&events, &rules)
            );
        }
    }

    #[test]
    fn input_order_is_irrelevant_with_distinct_times(events in arb_events_distinct_times()) {
        let rules = JourneyRules::default();
        let mut reversed = events.clone();
        reversed.reverse();
        prop_assert_eq!(
            TimestampAggregator.aggregate(&events, &rules),
            TimestampAggregator.aggregate(&reversed, &rules)
        );
    }

    #[test]
    fn first_only_credits_each_user_at_most_once(events in arb_events()) {
        let tally = TimestampAggregator.aggregate(&events, &JourneyRules::default());
        let users: HashSet<&str> = events.iter().map(|e| e.user_id.as_str()).collect();
        let users = u64::try_from(users.len()).unwrap();
        for (url, count) in tally.iter() {
            prop_assert!(count <= users, "{url} credited {count} times");
        }
    }

    #[test]
    fn only_articles_are_credited(events in arb_events()) {
        for policy in POLICIES {
            let rules = JourneyRules::with_policy(policy).with_article_prefix("/articles/");
            let tally = TimestampAggregator.aggregate(&events, &rules);
            for (url, count) in tally.iter() {
                prop_assert!(url.starts_with("/articles/"), "unexpected key {url}");
                prop_assert!(count > 0);
            }
        }
    }

    #[test]
    fn every_cycle_never_credits_less(events in arb_events()) {
        let first = TimestampAggregator.aggregate(&events, &JourneyRules::default());
        let every = TimestampAggregator
            .aggregate(&events, &JourneyRules::with_policy(RegistrationPolicy::EveryCycle));
        for (url, count) in first.iter() {
            prop_assert!(every.get(url) >= count);
        }
    }

    #[test]
    fn per_user_partials_merge_to_the_whole(events in arb_events()) {
        let rules = JourneyRules::default();
        let whole = TimestampAggregator.aggregate(&events, &rules);

        let users: HashSet<&str> = events.iter().map(|e| e.user_id.as_str()).collect();
        let mut merged = Tally::new();
        for user in users {
            let slice: Vec<_> = events.iter().filter(|e| e.user_id == user).cloned().collect();
            merged.merge(TimestampAggregator.aggregate(&slice, &rules));
        }
        prop_assert_eq!(merged, whole);
    }
}
