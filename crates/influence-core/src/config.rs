//! Run configuration.
//!
//! # Resolution
//!
//! Precedence (highest wins):
//! 1. Explicit overrides (CLI flags), applied by the caller with
//!    [`RankingConfig::apply_overrides`].
//! 2. Environment: `INFLUENCE_APPROACH`, `INFLUENCE_POLICY`,
//!    `INFLUENCE_REGISTRATION_URL`, `INFLUENCE_ARTICLE_PREFIX`.
//! 3. A TOML file: the explicit `--config` path, else `./influence.toml`,
//!    else `<config dir>/influence/config.toml`.
//! 4. Built-in defaults.
//!
//! ```toml
//! [ranking]
//! approach = "timestamp"          # or "graph"
//! policy = "first-only"           # or "every-cycle"
//! registration_url = "/register"
//! article_prefix = "/articles/"
//! ```

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::Approach;
use crate::event::{DEFAULT_ARTICLE_PREFIX, DEFAULT_REGISTRATION_URL};
use crate::journey::{JourneyRules, RegistrationPolicy};

/// File name looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "influence.toml";

pub const ENV_APPROACH: &str = "INFLUENCE_APPROACH";
pub const ENV_POLICY: &str = "INFLUENCE_POLICY";
pub const ENV_REGISTRATION_URL: &str = "INFLUENCE_REGISTRATION_URL";
pub const ENV_ARTICLE_PREFIX: &str = "INFLUENCE_ARTICLE_PREFIX";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The approach name is not one of the known strategies.
    #[error("unknown approach '{0}' (expected 'timestamp' or 'graph')")]
    UnknownApproach(String),

    /// The registration policy name is not recognised.
    #[error("unknown registration policy '{0}' (expected 'first-only' or 'every-cycle')")]
    UnknownPolicy(String),

    /// A value is syntactically fine but unusable.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    /// The config file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Top-level config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub ranking: RankingConfig,
}

/// `[ranking]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default)]
    pub approach: Approach,
    #[serde(default)]
    pub policy: RegistrationPolicy,
    #[serde(default = "default_registration_url")]
    pub registration_url: String,
    #[serde(default = "default_article_prefix")]
    pub article_prefix: String,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            approach: Approach::default(),
            policy: RegistrationPolicy::default(),
            registration_url: default_registration_url(),
            article_prefix: default_article_prefix(),
        }
    }
}

/// Values supplied directly by the caller; `None` keeps the resolved value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankingOverrides {
    pub approach: Option<Approach>,
    pub policy: Option<RegistrationPolicy>,
    pub registration_url: Option<String>,
    pub article_prefix: Option<String>,
}

impl RankingConfig {
    /// Apply environment overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownApproach`] or
    /// [`ConfigError::UnknownPolicy`] for unrecognised names.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(raw) = lookup(ENV_APPROACH) {
            self.approach = raw.parse()?;
        }
        if let Some(raw) = lookup(ENV_POLICY) {
            self.policy = raw.parse()?;
        }
        if let Some(raw) = lookup(ENV_REGISTRATION_URL) {
            self.registration_url = raw;
        }
        if let Some(raw) = lookup(ENV_ARTICLE_PREFIX) {
            self.article_prefix = raw;
        }
        Ok(())
    }

    /// Apply caller overrides on top of file and environment values.
    pub fn apply_overrides(&mut self, overrides: RankingOverrides) {
        if let Some(approach) = overrides.approach {
            self.approach = approach;
        }
        if let Some(policy) = overrides.policy {
            self.policy = policy;
        }
        if let Some(url) = overrides.registration_url {
            self.registration_url = url;
        }
        if let Some(prefix) = overrides.article_prefix {
            self.article_prefix = prefix;
        }
    }

    /// Reject values the aggregators cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the registration url is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registration_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "registration_url",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Journey rules for the aggregators.
    #[must_use]
    pub fn rules(&self) -> JourneyRules {
        JourneyRules {
            registration_url: self.registration_url.clone(),
            article_prefix: self.article_prefix.clone(),
            policy: self.policy,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Config after file discovery and environment overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub ranking: RankingConfig,
    /// File the values came from, if any.
    pub source: Option<PathBuf>,
}

/// Parse a config file.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str::<ConfigFile>(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Locate the config file to use, if any.
///
/// An explicit path is returned as-is (it must exist when loaded). Otherwise
/// `<cwd>/influence.toml`, then the user config dir, are probed.
#[must_use]
pub fn discover_config(cwd: &Path, explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let project = cwd.join(PROJECT_CONFIG_FILE);
    if project.exists() {
        return Some(project);
    }

    dirs::config_dir()
        .map(|dir| dir.join("influence/config.toml"))
        .filter(|path| path.exists())
}

/// Resolve configuration from file and environment.
///
/// # Errors
///
/// Propagates file, parse, and environment errors; see [`ConfigError`].
pub fn resolve_config(
    cwd: &Path,
    explicit: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig, ConfigError> {
    let source = discover_config(cwd, explicit);
    let mut ranking = match &source {
        Some(path) => load_config_file(path)?.ranking,
        None => RankingConfig::default(),
    };
    ranking.apply_env(lookup)?;

    debug!(
        source = ?source,
        approach = %ranking.approach,
        policy = %ranking.policy,
        "configuration resolved"
    );

    Ok(ResolvedConfig { ranking, source })
}

fn default_registration_url() -> String {
    DEFAULT_REGISTRATION_URL.to_string()
}

fn default_article_prefix() -> String {
    DEFAULT_ARTICLE_PREFIX.to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
