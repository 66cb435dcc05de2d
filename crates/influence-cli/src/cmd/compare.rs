//! `influence compare` — run both aggregators on one log and check that
//! they agree.

use crate::cmd::resolve_ranking_config;
use crate::output::{CliError, OutputMode, fail, pretty_kv, pretty_section, render_error, render_mode};
use clap::Args;
use influence_core::error::ErrorCode;
use influence_core::pipeline::{self, Comparison};
use influence_core::timing::StageTimings;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Hit-log CSV to read.
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    /// Registration policy: first-only or every-cycle.
    #[arg(long)]
    pub policy: Option<String>,

    /// Config file (defaults to ./influence.toml when present).
    #[arg(long, value_name = "TOML")]
    pub config: Option<PathBuf>,
}

/// Execute `influence compare`.
///
/// # Errors
///
/// Returns an error if the log cannot be read or the approaches disagree.
pub fn run_compare(
    args: &CompareArgs,
    output: OutputMode,
    project_root: &Path,
    timings: &mut StageTimings,
) -> anyhow::Result<()> {
    let config = resolve_ranking_config(
        project_root,
        args.config.as_deref(),
        None,
        args.policy.as_deref(),
    )
    .map_err(|err| fail(output, err))?;

    let comparison =
        pipeline::run_compare(&args.input, &config, timings).map_err(|err| fail(output, err))?;

    render_mode(output, &comparison, write_text, write_pretty)?;

    if !comparison.agree {
        let code = ErrorCode::ApproachMismatch;
        render_error(
            output,
            &CliError::with_details(
                format!(
                    "{} article(s) tallied differently",
                    comparison.differences.len()
                ),
                code.hint().unwrap_or_default(),
                code.code(),
            ),
        )?;
        anyhow::bail!("{}", code.message());
    }
    Ok(())
}

fn write_text(c: &Comparison, w: &mut dyn Write) -> std::io::Result<()> {
    let verdict = if c.agree { "agree" } else { "disagree" };
    writeln!(
        w,
        "{verdict}  events={} articles={} credits={} nodes={} edges={}",
        c.events, c.articles, c.credits, c.graph_nodes, c.graph_edges
    )?;
    for diff in &c.differences {
        writeln!(
            w,
            "{}  timestamp={} graph={}",
            diff.page_url, diff.timestamp, diff.graph
        )?;
    }
    Ok(())
}

fn write_pretty(c: &Comparison, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Approach comparison")?;
    pretty_kv(w, "Policy", c.policy.as_str())?;
    pretty_kv(w, "Events", c.events.to_string())?;
    pretty_kv(w, "Articles", c.articles.to_string())?;
    pretty_kv(w, "Credits", c.credits.to_string())?;
    pretty_kv(
        w,
        "Graph",
        format!("{} pages, {} transitions", c.graph_nodes, c.graph_edges),
    )?;
    pretty_kv(w, "Graph hash", &c.graph_hash)?;
    writeln!(w)?;

    if c.agree {
        return writeln!(w, "✓ timestamp and graph tallies agree");
    }

    writeln!(w, "✗ timestamp and graph tallies disagree")?;
    for diff in &c.differences {
        writeln!(
            w,
            "  {:<40} timestamp={:<5} graph={}",
            diff.page_url, diff.timestamp, diff.graph
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use influence_core::RegistrationPolicy;
    use influence_core::pipeline::TallyDifference;

    fn comparison(differences: Vec<TallyDifference>) -> Comparison {
        Comparison {
            events: 8,
            policy: RegistrationPolicy::FirstOnly,
            articles: 2,
            credits: 4,
            graph_nodes: 4,
            graph_edges: 3,
            graph_hash: "blake3:ab".to_string(),
            agree: differences.is_empty(),
            differences,
        }
    }

    #[test]
    fn text_summary_for_agreement() {
        let mut buf = Vec::new();
        write_text(&comparison(Vec::new()), &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "agree  events=8 articles=2 credits=4 nodes=4 edges=3\n"
        );
    }

    #[test]
    fn text_lists_differences() {
        let diff = TallyDifference {
            page_url: "/articles/a".to_string(),
            timestamp: 2,
            graph: 1,
        };
        let mut buf = Vec::new();
        write_text(&comparison(vec![diff]), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("disagree"));
        assert!(text.contains("/articles/a  timestamp=2 graph=1"));
    }
}
