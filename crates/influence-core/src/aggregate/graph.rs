//! Page-transition graph and the graph-based journey aggregator.
//!
//! # Overview
//!
//! [`JourneyGraph`] is a [`petgraph`] directed graph with one node per
//! distinct tracked page and one edge per distinct transition between
//! consecutive pages in a user's journey. Repeated transitions bump the
//! edge's [`Transition::count`] instead of adding parallel edges.
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "some user loaded B right after A".
//!
//! ## User Paths
//!
//! Alongside the graph each user keeps a [`UserPath`]: the node their
//! journey starts at and the edges it follows, in chronological order.
//! Replaying a path yields exactly the user's tracked page sequence, so
//! the walk-and-flush rule can run over the graph and give the same tally
//! as [`super::TimestampAggregator`].
//!
//! ## Only Tracked Pages
//!
//! Pages classified [`PageKind::Other`] are dropped before linking, so an
//! article read between two unrelated pages is still linked to its
//! neighbouring articles.
//!
//! ## Storage
//!
//! Nodes and edges live in petgraph's index arena. Nodes hold no
//! references to each other; everything is addressed by [`NodeIndex`] and
//! [`EdgeIndex`]. The graph is rebuilt for every run.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::{debug, instrument};

use super::JourneyAggregator;
use crate::event::{Event, PageKind};
use crate::journey::{JourneyRules, JourneyState, partition_by_user};
use crate::tally::Tally;

// ---------------------------------------------------------------------------
// Node and edge weights
// ---------------------------------------------------------------------------

/// A page in the journey graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNode {
    pub url: String,
    /// Title from the first event seen for this url.
    pub title: String,
    pub kind: PageKind,
    /// Users credited with reading this page before registering.
    pub weight: u64,
}

/// A transition between two consecutive pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transition {
    /// How many times any user made this transition.
    pub count: u64,
}

/// One user's journey expressed against the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPath {
    pub user_id: String,
    /// First tracked page of the journey.
    pub start: NodeIndex,
    /// Transitions taken after `start`, in chronological order.
    pub edges: Vec<EdgeIndex>,
}

// ---------------------------------------------------------------------------
// JourneyGraph
// ---------------------------------------------------------------------------

/// Directed multigraph of page transitions.
#[derive(Debug, Clone)]
pub struct JourneyGraph {
    /// Directed graph: nodes = pages, edges = transitions.
    pub graph: DiGraph<PageNode, Transition>,
    /// Mapping from page url to petgraph `NodeIndex`.
    pub node_map: HashMap<String, NodeIndex>,
    /// Per-user paths, users in order of first appearance.
    pub paths: Vec<UserPath>,
}

impl JourneyGraph {
    /// Build the transition graph for `events` under `rules`.
    ///
    /// Events are grouped and ordered exactly as in
    /// [`crate::journey::partition_by_user`]. Node weights start at zero;
    /// call [`JourneyGraph::accumulate_weights`] to credit them.
    #[instrument(skip_all, fields(events = events.len()))]
    #[must_use]
    pub fn build(events: &[Event], rules: &JourneyRules) -> Self {
        let mut graph = DiGraph::<PageNode, Transition>::new();
        let mut node_map: HashMap<String, NodeIndex> = HashMap::new();
        let mut paths = Vec::new();

        for journey in partition_by_user(events) {
            let mut start = None;
            let mut edges = Vec::new();
            let mut prev: Option<NodeIndex> = None;

            for event in journey.events {
                let kind = rules.classify(&event.article_url);
                if !kind.is_tracked() {
                    continue;
                }

                let idx = *node_map
                    .entry(event.article_url.clone())
                    .or_insert_with(|| {
                        graph.add_node(PageNode {
                            url: event.article_url.clone(),
                            title: event.article_title.clone(),
                            kind,
                            weight: 0,
                        })
                    });

                match prev {
                    None => start = Some(idx),
                    Some(from) => edges.push(link(&mut graph, from, idx)),
                }
                prev = Some(idx);
            }

            if let Some(start) = start {
                paths.push(UserPath {
                    user_id: journey.user_id.to_string(),
                    start,
                    edges,
                });
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            users = paths.len(),
            "journey graph built"
        );

        Self {
            graph,
            node_map,
            paths,
        }
    }

    /// Replay every user path and credit node weights.
    ///
    /// Weights are reset first, so calling this twice gives the same result.
    pub fn accumulate_weights(&mut self, rules: &JourneyRules) {
        let Self { graph, paths, .. } = self;

        for node in graph.node_weights_mut() {
            node.weight = 0;
        }

        for path in paths.iter() {
            let mut state = JourneyState::new();
            let mut credited: Vec<NodeIndex> = Vec::new();

            for idx in replay(graph, path) {
                let tracking = state.visit(idx, graph[idx].kind, rules.policy, |node| {
                    credited.push(node);
                });
                if !tracking {
                    break;
                }
            }

            for idx in credited {
                graph[idx].weight += 1;
            }
        }
    }

    /// Article weights as a [`Tally`], omitting zero weights.
    #[must_use]
    pub fn tally(&self) -> Tally {
        self.graph
            .node_weights()
            .filter(|node| node.kind == PageKind::Article)
            .map(|node| (node.url.as_str(), node.weight))
            .collect()
    }

    /// Tracked page sequence of one user, rebuilt from their path.
    #[must_use]
    pub fn page_sequence(&self, user_id: &str) -> Option<Vec<&str>> {
        let path = self.paths.iter().find(|p| p.user_id == user_id)?;
        Some(
            replay(&self.graph, path)
                .map(|idx| self.graph[idx].url.as_str())
                .collect(),
        )
    }

    /// Return the number of nodes (pages) in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of distinct transitions in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up the `NodeIndex` for a page url.
    #[must_use]
    pub fn node_index(&self, url: &str) -> Option<NodeIndex> {
        self.node_map.get(url).copied()
    }

    /// Look up a page by url.
    #[must_use]
    pub fn page(&self, url: &str) -> Option<&PageNode> {
        self.node_index(url).map(|idx| &self.graph[idx])
    }

    /// How often users went from `from` straight to `to`.
    #[must_use]
    pub fn transition_count(&self, from: &str, to: &str) -> u64 {
        let (Some(a), Some(b)) = (self.node_index(from), self.node_index(to)) else {
            return 0;
        };
        self.graph
            .find_edge(a, b)
            .map_or(0, |edge| self.graph[edge].count)
    }

    /// BLAKE3 hash of the sorted `(from, to, count)` edge list.
    ///
    /// Independent of insertion order, so two runs over the same log agree.
    #[must_use]
    pub fn content_hash(&self) -> String {
        let mut edges: Vec<(&str, &str, u64)> = self
            .graph
            .edge_references()
            .map(|edge| {
                (
                    self.graph[edge.source()].url.as_str(),
                    self.graph[edge.target()].url.as_str(),
                    edge.weight().count,
                )
            })
            .collect();
        edges.sort_unstable();

        let mut hasher = blake3::Hasher::new();
        for (from, to, count) in edges {
            hasher.update(from.as_bytes());
            hasher.update(b"\x00");
            hasher.update(to.as_bytes());
            hasher.update(b"\x00");
            hasher.update(&count.to_le_bytes());
        }
        format!("blake3:{}", hasher.finalize())
    }
}

// ---------------------------------------------------------------------------
// GraphAggregator
// ---------------------------------------------------------------------------

/// Builds a [`JourneyGraph`], credits node weights, and reads the tally back.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphAggregator;

impl JourneyAggregator for GraphAggregator {
    fn name(&self) -> &'static str {
        "graph"
    }

    #[instrument(skip_all, fields(events = events.len(), policy = %rules.policy))]
    fn aggregate(&self, events: &[Event], rules: &JourneyRules) -> Tally {
        let mut graph = JourneyGraph::build(events, rules);
        graph.accumulate_weights(rules);
        let tally = graph.tally();
        debug!(articles = tally.len(), "graph aggregation complete");
        tally
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Add or reuse the `from → to` edge, bumping its count.
fn link(
    graph: &mut DiGraph<PageNode, Transition>,
    from: NodeIndex,
    to: NodeIndex,
) -> EdgeIndex {
    let edge = graph
        .find_edge(from, to)
        .unwrap_or_else(|| graph.add_edge(from, to, Transition::default()));
    graph[edge].count += 1;
    edge
}

/// Node sequence of a path: its start, then the target of each edge.
fn replay<'g>(
    graph: &'g DiGraph<PageNode, Transition>,
    path: &'g UserPath,
) -> impl Iterator<Item = NodeIndex> + 'g {
    std::iter::once(path.start).chain(path.edges.iter().filter_map(move |&edge| {
        graph.edge_endpoints(edge).map(|(_, target)| target)
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
