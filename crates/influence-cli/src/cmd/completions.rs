use anyhow::Result;
use clap::Args;
use clap_complete::{Shell, generate};

/// Arguments for `influence completions`.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script generation.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write a completion script for `shell` to stdout.
///
/// # Errors
///
/// Currently infallible; returns `Result` to match the other commands.
pub fn run_completions(shell: Shell, command: &mut clap::Command) -> Result<()> {
    let mut out = std::io::stdout();
    generate(shell, command, "influence", &mut out);
    Ok(())
}
