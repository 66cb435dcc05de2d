//! End-to-end runs: read → aggregate → rank → write.
//!
//! Every error is terminal. The output file is only written after the
//! ranking has been fully built, so a failed run leaves no output behind.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;
use tracing::{info, instrument};

use crate::aggregate::{Approach, JourneyGraph};
use crate::config::RankingConfig;
use crate::error::InfluenceError;
use crate::event::Event;
use crate::hitlog::read_hitlog_path;
use crate::journey::{JourneyRules, RegistrationPolicy};
use crate::rank::{ArticleTitles, Ranking};
use crate::report::{ReportSummary, write_ranking};
use crate::tally::Tally;
use crate::timing::StageTimings;

/// Result of a successful ranking run.
#[derive(Debug, Clone, Serialize)]
pub struct RankOutcome {
    pub approach: Approach,
    pub policy: RegistrationPolicy,
    pub events: usize,
    pub ranking: Ranking,
    pub report: ReportSummary,
}

/// Rank the articles in the hit log at `input` and write the report to
/// `output`.
///
/// # Errors
///
/// Returns the first reader, configuration, ranking, or writer error.
#[instrument(skip(config, timings), fields(approach = %config.approach, policy = %config.policy))]
pub fn run_rank(
    input: &Path,
    output: &Path,
    config: &RankingConfig,
    timings: &mut StageTimings,
) -> Result<RankOutcome, InfluenceError> {
    config.validate()?;
    let rules = config.rules();

    let events = timings.time("read", || read_hitlog_path(input))?;
    let tally = timings.time("aggregate", || config.approach.aggregate(&events, &rules));
    let ranking = timings.time("rank", || {
        Ranking::build(&tally, &ArticleTitles::from_events(&events))
    })?;
    let report = timings.time("write", || write_ranking(output, &ranking))?;

    info!(
        events = events.len(),
        articles = ranking.len(),
        credits = tally.total(),
        "ranking complete"
    );

    Ok(RankOutcome {
        approach: config.approach,
        policy: config.policy,
        events: events.len(),
        ranking,
        report,
    })
}

/// One article whose counts differ between approaches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TallyDifference {
    pub page_url: String,
    pub timestamp: u64,
    pub graph: u64,
}

/// Side-by-side result of both aggregators on one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub events: usize,
    pub policy: RegistrationPolicy,
    pub articles: usize,
    pub credits: u64,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub graph_hash: String,
    pub agree: bool,
    pub differences: Vec<TallyDifference>,
}

/// Run both aggregators over `events` and report any disagreement.
#[must_use]
#[instrument(skip_all, fields(events = events.len(), policy = %rules.policy))]
pub fn compare_approaches(events: &[Event], rules: &JourneyRules) -> Comparison {
    let by_timestamp = Approach::Timestamp.aggregate(events, rules);

    let mut graph = JourneyGraph::build(events, rules);
    graph.accumulate_weights(rules);
    let by_graph = graph.tally();

    let differences = diff_tallies(&by_timestamp, &by_graph);

    Comparison {
        events: events.len(),
        policy: rules.policy,
        articles: by_timestamp.len(),
        credits: by_timestamp.total(),
        graph_nodes: graph.node_count(),
        graph_edges: graph.edge_count(),
        graph_hash: graph.content_hash(),
        agree: differences.is_empty(),
        differences,
    }
}

/// Read the hit log at `input` and compare both aggregators on it.
///
/// # Errors
///
/// Returns configuration or reader errors.
pub fn run_compare(
    input: &Path,
    config: &RankingConfig,
    timings: &mut StageTimings,
) -> Result<Comparison, InfluenceError> {
    config.validate()?;
    let rules = config.rules();
    let events = timings.time("read", || read_hitlog_path(input))?;
    Ok(timings.time("compare", || compare_approaches(&events, &rules)))
}

fn diff_tallies(timestamp: &Tally, graph: &Tally) -> Vec<TallyDifference> {
    let urls: BTreeSet<&str> = timestamp
        .iter()
        .chain(graph.iter())
        .map(|(url, _)| url)
        .collect();

    urls.into_iter()
        .filter_map(|url| {
            let (t, g) = (timestamp.get(url), graph.get(url));
            (t != g).then(|| TallyDifference {
                page_url: url.to_string(),
                timestamp: t,
                graph: g,
            })
        })
        .collect()
}
