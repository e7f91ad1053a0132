//! Error type of the kws build tooling

use std::path::PathBuf;

use kws_error::codes;
use kws_foundation::Diagnostics;
use thiserror::Error;

/// Errors raised while loading, elaborating or emitting a configuration
#[derive(Debug, Error)]
pub enum BuildError {
    /// Configuration file could not be read or written
    #[error("{action} {path}: {source}")]
    Io {
        /// What was attempted
        action: &'static str,
        /// File involved
        path:   PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for the schema
    #[error("failed to parse {path}: {source}")]
    Toml {
        /// File involved
        path:   PathBuf,
        /// Underlying error
        #[source]
        source: Box<toml::de::Error>,
    },

    /// A `maximum` or `layout` key names no object class
    #[error("unknown object class `{0}`")]
    UnknownObjectClass(String),

    /// The `target` key names no preset
    #[error("unknown target profile `{0}` (known: {known})", known = kws_foundation::PRESET_NAMES.join(", "))]
    UnknownTarget(String),

    /// A byte size string could not be parsed
    #[error("invalid byte size `{0}`")]
    InvalidByteSize(String),

    /// A stack allocator hook is not a valid Rust path
    #[error("invalid hook symbol `{0}`")]
    InvalidSymbol(String),

    /// The configuration failed one or more rules
    #[error("configuration rejected with {} diagnostic(s):\n{0}", .0.len())]
    Rejected(Diagnostics),

    /// Missing build script environment
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    /// Report serialization failed
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl BuildError {
    /// Numeric code in the shared kws code space
    #[must_use]
    pub fn code(&self) -> u16 {
        match self {
            Self::Io { .. } | Self::MissingEnv(_) => codes::IO_ERROR,
            Self::Toml { .. } | Self::Json(_) => codes::PARSE_ERROR,
            Self::UnknownObjectClass(_) => codes::UNKNOWN_OBJECT_CLASS,
            Self::UnknownTarget(_) => codes::UNKNOWN_TARGET_PROFILE,
            Self::InvalidByteSize(_) => codes::INVALID_BYTE_SIZE,
            Self::InvalidSymbol(_) => codes::INVALID_SYMBOL_PATH,
            Self::Rejected(diagnostics) => diagnostics
                .first_error()
                .map_or(codes::VALIDATION_ERROR, |error| error.code),
        }
    }
}

impl From<Diagnostics> for BuildError {
    fn from(diagnostics: Diagnostics) -> Self {
        Self::Rejected(diagnostics)
    }
}

/// Result alias for build operations
pub type BuildResult<T> = Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use kws_foundation::ConfigDiagnostic;

    use super::*;

    #[test]
    fn test_rejected_uses_first_diagnostic_code() {
        let error = BuildError::from(Diagnostics::from(ConfigDiagnostic::KeyValuePairsBelowKeys {
            keys:  4,
            pairs: 2,
        }));
        assert_eq!(error.code(), codes::KEY_VALUE_PAIRS_BELOW_KEYS);
        assert!(error.to_string().contains("KWS1001"));
    }

    #[test]
    fn test_unknown_target_lists_presets() {
        let message = BuildError::UnknownTarget("m68k".into()).to_string();
        assert!(message.contains("m68k"));
        assert!(message.contains("aarch64"));
    }
}
