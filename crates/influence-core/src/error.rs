use std::fmt;

use crate::config::ConfigError;
use crate::hitlog::HitlogError;
use crate::rank::RankingError;
use crate::report::ReportError;

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    HitlogUnreadable,
    HitlogMalformed,
    ConfigUnreadable,
    ConfigParseError,
    UnknownApproach,
    UnknownPolicy,
    InvalidConfigValue,
    MissingMetadata,
    ReportWriteFailed,
    ApproachMismatch,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::HitlogUnreadable => "E1001",
            Self::HitlogMalformed => "E1002",
            Self::ConfigUnreadable => "E2001",
            Self::ConfigParseError => "E2002",
            Self::UnknownApproach => "E2003",
            Self::UnknownPolicy => "E2004",
            Self::InvalidConfigValue => "E2005",
            Self::MissingMetadata => "E3001",
            Self::ReportWriteFailed => "E4001",
            Self::ApproachMismatch => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::HitlogUnreadable => "Hit log could not be read",
            Self::HitlogMalformed => "Hit log row is malformed",
            Self::ConfigUnreadable => "Config file could not be read",
            Self::ConfigParseError => "Config file parse error",
            Self::UnknownApproach => "Unknown aggregation approach",
            Self::UnknownPolicy => "Unknown registration policy",
            Self::InvalidConfigValue => "Invalid configuration value",
            Self::MissingMetadata => "Ranked article has no title",
            Self::ReportWriteFailed => "Ranking report write failed",
            Self::ApproachMismatch => "Aggregation approaches disagree",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::HitlogUnreadable => Some("Check the --input path and file permissions."),
            Self::HitlogMalformed => Some(
                "Every row needs page_name, page_url, user_id, and a timestamp like 2025-10-27 10:00:00.",
            ),
            Self::ConfigUnreadable => Some("Check the --config path."),
            Self::ConfigParseError => Some("Fix syntax in the [ranking] section and retry."),
            Self::UnknownApproach => Some("Use --approach timestamp or --approach graph."),
            Self::UnknownPolicy => Some("Use --policy first-only or --policy every-cycle."),
            Self::InvalidConfigValue => None,
            Self::MissingMetadata => Some("Ensure every article row carries a page_name."),
            Self::ReportWriteFailed => Some("Check disk space and write permissions for --output."),
            Self::ApproachMismatch => Some("Report a bug with the input log attached."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Any failure of an influence run.
#[derive(Debug, thiserror::Error)]
pub enum InfluenceError {
    #[error(transparent)]
    Hitlog(#[from] HitlogError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ranking(#[from] RankingError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

impl InfluenceError {
    /// The stable code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Hitlog(err) => match err {
                HitlogError::Open { .. } => ErrorCode::HitlogUnreadable,
                HitlogError::Csv(_) | HitlogError::Parse { .. } => ErrorCode::HitlogMalformed,
            },
            Self::Config(err) => match err {
                ConfigError::UnknownApproach(_) => ErrorCode::UnknownApproach,
                ConfigError::UnknownPolicy(_) => ErrorCode::UnknownPolicy,
                ConfigError::InvalidValue { .. } => ErrorCode::InvalidConfigValue,
                ConfigError::Read { .. } => ErrorCode::ConfigUnreadable,
                ConfigError::Parse { .. } => ErrorCode::ConfigParseError,
            },
            Self::Ranking(RankingError::MissingMetadata { .. }) => ErrorCode::MissingMetadata,
            Self::Report(_) => ErrorCode::ReportWriteFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const ALL: [ErrorCode; 11] = [
        ErrorCode::HitlogUnreadable,
        ErrorCode::HitlogMalformed,
        ErrorCode::ConfigUnreadable,
        ErrorCode::ConfigParseError,
        ErrorCode::UnknownApproach,
        ErrorCode::UnknownPolicy,
        ErrorCode::InvalidConfigValue,
        ErrorCode::MissingMetadata,
        ErrorCode::ReportWriteFailed,
        ErrorCode::ApproachMismatch,
        ErrorCode::InternalUnexpected,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let raw = code.code();
            assert_eq!(raw.len(), 5);
            assert!(raw.starts_with('E'));
            assert!(raw.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn errors_map_to_codes() {
        let err = InfluenceError::from(ConfigError::UnknownApproach("x".to_string()));
        assert_eq!(err.code(), ErrorCode::UnknownApproach);

        let err = InfluenceError::from(HitlogError::Parse {
            line: 2,
            reason: "missing user_id".to_string(),
        });
        assert_eq!(err.code(), ErrorCode::HitlogMalformed);
        assert_eq!(err.to_string(), "hit log line 2: missing user_id");

        let err = InfluenceError::from(RankingError::MissingMetadata {
            url: "/a".to_string(),
        });
        assert_eq!(err.code(), ErrorCode::MissingMetadata);
    }
}
