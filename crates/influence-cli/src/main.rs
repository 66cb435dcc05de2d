#![forbid(unsafe_code)]

mod cmd;
mod output;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use influence_core::timing::{StageTimings, timing_enabled_from_env};
use output::OutputMode;
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "influence: rank articles by how many readers went on to register",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit a per-stage timing report to stderr.
    #[arg(long, global = true)]
    timing: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Rank articles and write the report",
        long_about = "Read a hit log, count for every article how many distinct users viewed it \
                      before registering, and write the ranking as CSV.",
        after_help = "EXAMPLES:\n    # Rank with the default timestamp approach\n    influence rank --input hits.csv --output top.csv\n\n    # Use the graph approach and show the top 3\n    influence rank -i hits.csv -o top.csv --approach graph --top 3\n\n    # Credit every registration cycle\n    influence rank -i hits.csv -o top.csv --policy every-cycle\n\n    # Emit machine-readable output\n    influence rank -i hits.csv -o top.csv --json"
    )]
    Rank(cmd::rank::RankArgs),

    #[command(
        about = "Check that both approaches agree",
        long_about = "Run the timestamp and graph aggregators over the same hit log and report \
                      any article whose count differs. Exits non-zero on disagreement.",
        after_help = "EXAMPLES:\n    # Compare approaches on a log\n    influence compare --input hits.csv\n\n    # Compare under the every-cycle policy\n    influence compare -i hits.csv --policy every-cycle"
    )]
    Compare(cmd::compare::CompareArgs),

    #[command(
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    influence completions bash\n\n    # Generate zsh completions\n    influence completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("INFLUENCE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "influence=debug,info"
        } else {
            "influence=info,warn"
        })
    });

    let format = env::var("INFLUENCE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let mut timings = StageTimings::new(cli.timing || timing_enabled_from_env());
    let project_root = env::current_dir().context("failed to read the working directory")?;
    let output = cli.output_mode();

    let command_result = match cli.command {
        Commands::Rank(ref args) => {
            cmd::rank::run_rank(args, output, &project_root, &mut timings)
        }
        Commands::Compare(ref args) => {
            cmd::compare::run_compare(args, output, &project_root, &mut timings)
        }
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    };

    if timings.is_enabled() {
        if timings.is_empty() {
            eprintln!("timing report: no samples recorded");
        } else {
            eprintln!("timing report:");
            eprintln!("{}", timings.display_table());
            eprintln!("timing report (json):");
            eprintln!("{}", serde_json::to_string_pretty(&timings.to_json())?);
        }
    }

    command_result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_flag_parses_before_subcommand() {
        let cli = Cli::parse_from(["influence", "--timing", "compare", "-i", "hits.csv"]);
        assert!(cli.timing);
        assert!(matches!(cli.command, Commands::Compare(_)));
    }

    #[test]
    fn timing_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["influence", "compare", "-i", "hits.csv", "--timing"]);
        assert!(cli.timing);
    }

    #[test]
    fn json_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["influence", "rank", "-i", "a.csv", "-o", "b.csv", "--json"]);
        assert!(cli.json);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn format_flag_accepts_all_modes() {
        for (raw, mode) in [
            ("pretty", OutputMode::Pretty),
            ("text", OutputMode::Text),
            ("json", OutputMode::Json),
        ] {
            let cli = Cli::parse_from(["influence", "--format", raw, "compare", "-i", "x.csv"]);
            assert_eq!(cli.format, Some(mode));
        }
    }

    #[test]
    fn rank_defaults() {
        let cli = Cli::parse_from(["influence", "rank", "--input", "a.csv", "--output", "b.csv"]);
        let Commands::Rank(args) = cli.command else {
            panic!("expected rank");
        };
        assert_eq!(args.input.to_str(), Some("a.csv"));
        assert_eq!(args.output.to_str(), Some("b.csv"));
        assert_eq!(args.top, 10);
        assert!(args.approach.is_none());
        assert!(args.policy.is_none());
        assert!(args.config.is_none());
    }

    #[test]
    fn rank_accepts_unknown_approach_for_later_validation() {
        let cli = Cli::parse_from([
            "influence", "rank", "-i", "a.csv", "-o", "b.csv", "--approach", "pagerank",
        ]);
        let Commands::Rank(args) = cli.command else {
            panic!("expected rank");
        };
        assert_eq!(args.approach.as_deref(), Some("pagerank"));
    }

    #[test]
    fn rank_requires_input_and_output() {
        assert!(Cli::try_parse_from(["influence", "rank", "-i", "a.csv"]).is_err());
        assert!(Cli::try_parse_from(["influence", "rank", "-o", "b.csv"]).is_err());
    }

    #[test]
    fn completions_subcommand_parses() {
        let cli = Cli::parse_from(["influence", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Commands::Completions(cmd::completions::CompletionsArgs {
                shell: clap_complete::Shell::Bash,
            })
        ));
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
