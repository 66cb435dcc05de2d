//! Per-user journeys and the walk-and-flush rule shared by every aggregator.
//!
//! # Overview
//!
//! A journey is one user's chronologically ordered page views. Walking it,
//! each article is remembered in a candidate set; when the registration
//! marker is reached the whole set is credited (once per article) and
//! cleared. Revisits inside one cycle never inflate a count.
//!
//! ## Ordering
//!
//! Events are grouped by `user_id` and stable-sorted by timestamp, so two
//! events with the same instant keep their input order. Users come out in
//! order of first appearance, which keeps every downstream pass
//! reproducible.
//!
//! ## Registration policy
//!
//! [`RegistrationPolicy::FirstOnly`] stops tracking a user at their first
//! registration. [`RegistrationPolicy::EveryCycle`] keeps tracking, and each
//! later registration credits the articles read since the previous one.

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::event::{DEFAULT_REGISTRATION_URL, Event, PageKind};

// ---------------------------------------------------------------------------
// RegistrationPolicy
// ---------------------------------------------------------------------------

/// What happens to a user's journey after a registration flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegistrationPolicy {
    /// Only the journey leading to the first registration counts.
    #[default]
    FirstOnly,
    /// Every registration credits the articles read since the previous one.
    EveryCycle,
}

impl RegistrationPolicy {
    /// Stable lowercase name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstOnly => "first-only",
            Self::EveryCycle => "every-cycle",
        }
    }
}

impl fmt::Display for RegistrationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-only" | "first" => Ok(Self::FirstOnly),
            "every-cycle" | "every" => Ok(Self::EveryCycle),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// JourneyRules
// ---------------------------------------------------------------------------

/// Page classification plus registration policy for one run.
///
/// The default rules track every page: only the registration url is
/// special. Restricting journeys to one section of the site is opt-in via
/// [`JourneyRules::with_article_prefix`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyRules {
    /// Url of the registration marker page.
    pub registration_url: String,
    /// Prefix identifying rankable articles. Empty means every
    /// non-registration page is an article.
    pub article_prefix: String,
    /// Behaviour after a registration flush.
    pub policy: RegistrationPolicy,
}

impl Default for JourneyRules {
    fn default() -> Self {
        Self {
            registration_url: DEFAULT_REGISTRATION_URL.to_string(),
            article_prefix: String::new(),
            policy: RegistrationPolicy::default(),
        }
    }
}

impl JourneyRules {
    /// Default rules with a different registration policy.
    #[must_use]
    pub fn with_policy(policy: RegistrationPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Only urls starting with `prefix` count as articles.
    #[must_use]
    pub fn with_article_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.article_prefix = prefix.into();
        self
    }

    /// Classify a page url.
    #[must_use]
    pub fn classify(&self, url: &str) -> PageKind {
        if url == self.registration_url {
            PageKind::Registration
        } else if url.starts_with(&self.article_prefix) {
            PageKind::Article
        } else {
            PageKind::Other
        }
    }
}

// ---------------------------------------------------------------------------
// Partitioning
// ---------------------------------------------------------------------------

/// One user's events in walk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserJourney<'a> {
    pub user_id: &'a str,
    pub events: Vec<&'a Event>,
}

/// Group events by user and stable-sort each group by timestamp.
///
/// Users appear in order of their first event in `events`.
#[must_use]
pub fn partition_by_user(events: &[Event]) -> Vec<UserJourney<'_>> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut journeys: Vec<UserJourney<'_>> = Vec::new();

    for event in events {
        let slot = *slots.entry(event.user_id.as_str()).or_insert_with(|| {
            journeys.push(UserJourney {
                user_id: event.user_id.as_str(),
                events: Vec::new(),
            });
            journeys.len() - 1
        });
        journeys[slot].events.push(event);
    }

    for journey in &mut journeys {
        // `sort_by_key` is stable: equal timestamps keep input order.
        journey.events.sort_by_key(|event| event.timestamp);
    }

    journeys
}

// ---------------------------------------------------------------------------
// JourneyState
// ---------------------------------------------------------------------------

/// Candidate set for a single user's walk.
///
/// Generic over the page key so the timestamp aggregator can walk `&str`
/// urls and the graph aggregator can walk node indices.
#[derive(Debug, Clone)]
pub struct JourneyState<K> {
    seen: HashSet<K>,
    finished: bool,
}

impl<K> Default for JourneyState<K> {
    fn default() -> Self {
        Self {
            seen: HashSet::new(),
            finished: false,
        }
    }
}

impl<K: Eq + Hash + Copy> JourneyState<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the walk by one page.
    ///
    /// On a registration every candidate is passed to `credit` exactly once
    /// and the set is cleared. Returns `false` once the policy says the
    /// user is no longer tracked; further calls are no-ops.
    pub fn visit(
        &mut self,
        key: K,
        kind: PageKind,
        policy: RegistrationPolicy,
        mut credit: impl FnMut(K),
    ) -> bool {
        if self.finished {
            return false;
        }

        match kind {
            PageKind::Article => {
                self.seen.insert(key);
            }
            PageKind::Registration => {
                for candidate in self.seen.drain() {
                    credit(candidate);
                }
                if policy == RegistrationPolicy::FirstOnly {
                    self.finished = true;
                }
            }
            PageKind::Other => {}
        }

        !self.finished
    }

    /// Number of articles waiting for a registration.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::DEFAULT_ARTICLE_PREFIX;
    use chrono::{TimeZone, Utc};

    fn ev(user: &str, url: &str, secs: i64) -> Event {
        Event::new(url, url, user, Utc.timestamp_opt(secs, 0).unwrap())
    }

    #[test]
    fn classify_uses_marker_and_prefix() {
        let rules = JourneyRules::default().with_article_prefix(DEFAULT_ARTICLE_PREFIX);
        assert_eq!(rules.classify("/register"), PageKind::Registration);
        assert_eq!(rules.classify("/articles/a"), PageKind::Article);
        assert_eq!(rules.classify("/home"), PageKind::Other);
    }

    #[test]
    fn default_rules_make_every_page_an_article() {
        let rules = JourneyRules::default();
        assert!(rules.article_prefix.is_empty());
        assert_eq!(rules.classify("/a"), PageKind::Article);
        assert_eq!(rules.classify("/home"), PageKind::Article);
        assert_eq!(rules.classify("/register"), PageKind::Registration);
    }

    #[test]
    fn policy_parses_aliases_case_insensitively() {
        assert_eq!(
            "First-Only".parse::<RegistrationPolicy>().unwrap(),
            RegistrationPolicy::FirstOnly
        );
        assert_eq!(
            "every".parse::<RegistrationPolicy>().unwrap(),
            RegistrationPolicy::EveryCycle
        );
        assert!(matches!(
            "sometimes".parse::<RegistrationPolicy>(),
            Err(ConfigError::UnknownPolicy(raw)) if raw == "sometimes"
        ));
    }

    #[test]
    fn default_policy_is_first_only() {
        assert_eq!(RegistrationPolicy::default(), RegistrationPolicy::FirstOnly);
        assert_eq!(JourneyRules::default().policy, RegistrationPolicy::FirstOnly);
    }

    #[test]
    fn partition_groups_by_first_appearance() {
        let events = vec![ev("u2", "/a", 5), ev("u1", "/b", 1), ev("u2", "/c", 2)];
        let journeys = partition_by_user(&events);

        let users: Vec<&str> = journeys.iter().map(|j| j.user_id).collect();
        assert_eq!(users, ["u2", "u1"]);

        let u2: Vec<&str> = journeys[0]
            .events
            .iter()
            .map(|e| e.article_url.as_str())
            .collect();
        assert_eq!(u2, ["/c", "/a"], "sorted by timestamp");
    }

    #[test]
    fn partition_keeps_input_order_on_equal_timestamps() {
        let events = vec![ev("u1", "/x", 10), ev("u1", "/y", 10), ev("u1", "/w", 3)];
        let journeys = partition_by_user(&events);
        let order: Vec<&str> = journeys[0]
            .events
            .iter()
            .map(|e| e.article_url.as_str())
            .collect();
        assert_eq!(order, ["/w", "/x", "/y"]);
    }

    #[test]
    fn state_credits_each_article_once_per_cycle() {
        let mut state = JourneyState::new();
        let mut credited = Vec::new();
        let policy = RegistrationPolicy::FirstOnly;

        state.visit("a", PageKind::Article, policy, |k| credited.push(k));
        state.visit("a", PageKind::Article, policy, |k| credited.push(k));
        assert_eq!(state.pending(), 1);

        let tracking = state.visit("reg", PageKind::Registration, policy, |k| credited.push(k));
        assert!(!tracking);
        assert_eq!(credited, ["a"]);
        assert_eq!(state.pending(), 0);
    }

    #[test]
    fn first_only_ignores_later_cycles() {
        let mut state = JourneyState::new();
        let mut credited = Vec::new();
        let policy = RegistrationPolicy::FirstOnly;

        state.visit("reg", PageKind::Registration, policy, |k| credited.push(k));
        state.visit("a", PageKind::Article, policy, |k| credited.push(k));
        state.visit("reg", PageKind::Registration, policy, |k| credited.push(k));

        assert!(state.is_finished());
        assert!(credited.is_empty());
    }

    #[test]
    fn every_cycle_keeps_tracking() {
        let mut state = JourneyState::new();
        let mut credited = Vec::new();
        let policy = RegistrationPolicy::EveryCycle;

        state.visit("a", PageKind::Article, policy, |k| credited.push(k));
        state.visit("reg", PageKind::Registration, policy, |k| credited.push(k));
        state.visit("b", PageKind::Article, policy, |k| credited.push(k));
        let tracking = state.visit("reg", PageKind::Registration, policy, |k| credited.push(k));

        assert!(tracking);
        assert_eq!(credited, ["a", "b"]);
    }
}
