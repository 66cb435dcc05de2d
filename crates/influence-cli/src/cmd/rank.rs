//! `influence rank` — rank articles by registration influence and write the
//! report CSV.

use crate::cmd::resolve_ranking_config;
use crate::output::{OutputMode, fail, pretty_kv, pretty_rule, pretty_section, render_mode};
use clap::Args;
use influence_core::pipeline::{self, RankOutcome};
use influence_core::rank::RankedArticle;
use influence_core::timing::StageTimings;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct RankArgs {
    /// Hit-log CSV to read.
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    /// Destination for the ranking CSV (replaced if it exists).
    #[arg(short, long, value_name = "CSV")]
    pub output: PathBuf,

    /// Aggregation approach: timestamp or graph.
    #[arg(long)]
    pub approach: Option<String>,

    /// Registration policy: first-only or every-cycle.
    #[arg(long)]
    pub policy: Option<String>,

    /// Config file (defaults to ./influence.toml when present).
    #[arg(long, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Number of rows to print after writing.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

/// JSON shape of a finished rank run.
#[derive(Debug, Serialize)]
pub struct RankReport<'a> {
    pub approach: &'static str,
    pub policy: &'static str,
    pub events: usize,
    pub rows_written: usize,
    pub output: &'a Path,
    pub content_hash: &'a str,
    pub top: &'a [RankedArticle],
}

impl<'a> RankReport<'a> {
    fn new(outcome: &'a RankOutcome, top: usize) -> Self {
        Self {
            approach: outcome.approach.as_str(),
            policy: outcome.policy.as_str(),
            events: outcome.events,
            rows_written: outcome.report.rows,
            output: &outcome.report.path,
            content_hash: &outcome.report.content_hash,
            top: outcome.ranking.top(top),
        }
    }
}

/// Execute `influence rank`.
///
/// # Errors
///
/// Returns an error (after rendering it) if configuration, reading,
/// ranking, or writing fails.
pub fn run_rank(
    args: &RankArgs,
    output: OutputMode,
    project_root: &Path,
    timings: &mut StageTimings,
) -> anyhow::Result<()> {
    let config = resolve_ranking_config(
        project_root,
        args.config.as_deref(),
        args.approach.as_deref(),
        args.policy.as_deref(),
    )
    .map_err(|err| fail(output, err))?;

    let outcome = pipeline::run_rank(&args.input, &args.output, &config, timings)
        .map_err(|err| fail(output, err))?;

    let report = RankReport::new(&outcome, args.top);
    render_mode(output, &report, write_text, write_pretty)
}

fn write_text(report: &RankReport<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "Wrote {} rows to {}",
        report.rows_written,
        report.output.display()
    )?;
    if report.rows_written == 0 {
        return writeln!(w, "No influential articles found.");
    }
    for row in report.top {
        writeln!(w, "{}  {}  {}", row.total, row.page_url, row.page_name)?;
    }
    Ok(())
}

fn write_pretty(report: &RankReport<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Influence ranking")?;
    pretty_kv(w, "Approach", report.approach)?;
    pretty_kv(w, "Policy", report.policy)?;
    pretty_kv(w, "Events", report.events.to_string())?;
    pretty_kv(w, "Output", report.output.display().to_string())?;
    writeln!(
        w,
        "Wrote {} rows to {}",
        report.rows_written,
        report.output.display()
    )?;
    writeln!(w)?;

    if report.rows_written == 0 {
        return writeln!(w, "No influential articles found.");
    }
    if report.top.is_empty() {
        return Ok(());
    }

    pretty_section(w, &format!("Top {}", report.top.len()))?;
    writeln!(w, "{:>4}  {:>7}  {}", "#", "readers", "article")?;
    for (rank, row) in report.top.iter().enumerate() {
        writeln!(w, "{:>4}  {:>7}  {}", rank + 1, row.total, row.page_name)?;
        writeln!(w, "{:>4}  {:>7}  {}", "", "", row.page_url)?;
    }
    pretty_rule(w)
}
