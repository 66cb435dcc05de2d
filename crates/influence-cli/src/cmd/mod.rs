pub mod compare;
pub mod completions;
pub mod rank;

use std::path::Path;

use influence_core::config::{RankingConfig, RankingOverrides, resolve_config};
use influence_core::error::InfluenceError;

/// Resolve ranking settings: flags over environment over config file.
///
/// Flag values are parsed here rather than by clap so that an unknown
/// approach or policy surfaces with its stable error code.
///
/// # Errors
///
/// Returns a configuration error for unknown names or an unreadable file.
pub fn resolve_ranking_config(
    project_root: &Path,
    config_path: Option<&Path>,
    approach: Option<&str>,
    policy: Option<&str>,
) -> Result<RankingConfig, InfluenceError> {
    let overrides = RankingOverrides {
        approach: approach.map(str::parse).transpose()?,
        policy: policy.map(str::parse).transpose()?,
        ..RankingOverrides::default()
    };

    let resolved = resolve_config(project_root, config_path, |key| std::env::var(key).ok())?;
    let mut ranking = resolved.ranking;
    ranking.apply_overrides(overrides);
    Ok(ranking)
}
