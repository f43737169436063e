//! Error types.
//!
//! None of these ever reach a caller of the strategy hooks: backend faults
//! degrade to a miss (reads) or are swallowed (writes), and directive faults
//! degrade to [`Directive::Uncached`](crate::directive::Directive::Uncached).

use thiserror::Error;

/// A fault reported by a cache backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("cache backend timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("cache value for {key} could not be decoded: {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A malformed directive declaration found while resolving.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectiveError {
    #[error("{entity}.{method}: identity field name is empty")]
    EmptyIdentityField { entity: String, method: String },

    #[error("{entity}.{method}: reference lookup declares no reference fields")]
    NoReferenceFields { entity: String, method: String },

    #[error("{entity}.{method}: primary method {target} is not declared")]
    UnknownPrimary {
        entity: String,
        method: String,
        target: String,
    },

    #[error("{entity}.{method}: {target} is not a primary lookup")]
    NotPrimary {
        entity: String,
        method: String,
        target: String,
    },
}

/// A settings value that failed to parse.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}
