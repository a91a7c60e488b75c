use std::io;

use thiserror::Error;

use crate::types::LocationString;

/// Error type for shard resolution, location access, and sidecar parsing failures.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Weights were supplied but not one per source.
    #[error("weight count ({weights}) does not match source count ({sources})")]
    WeightCardinality {
        /// Number of `::`-separated sources.
        sources: usize,
        /// Number of `::`-separated weights.
        weights: usize,
    },
    /// A weight is not a finite, non-negative number.
    #[error("invalid sampling weight '{0}': expected a non-negative number")]
    InvalidWeight(String),
    /// The data location has an empty `::` segment.
    #[error("empty source in data location '{0}'")]
    EmptySource(String),
    /// A resharder sidecar exists but cannot be used.
    #[error("malformed shard metadata at '{path}': {reason}")]
    Metadata {
        /// Sidecar location.
        path: LocationString,
        /// Parse or template failure.
        reason: String,
    },
    /// A top-level source produced no descriptor components.
    #[error("no shards found under '{0}'")]
    NoShards(LocationString),
    /// Listing or reading a location failed.
    #[error("location '{location}' is unavailable: {reason}")]
    SourceUnavailable {
        /// Location that failed.
        location: LocationString,
        /// Underlying failure.
        reason: String,
    },
    /// No object store client is registered for the scheme.
    #[error("no object store client registered for scheme '{0}'")]
    UnsupportedScheme(String),
    /// A digit suffix does not fit in `u64`.
    #[error("shard index in '{0}' does not fit in 64 bits")]
    ShardIndexOverflow(String),
    /// Local filesystem failure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Invalid resolver configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Error type for the training launcher glue.
#[derive(Debug, Error)]
pub enum TrainError {
    /// Shard resolution failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// The requested scale has no preset.
    #[error("unknown scale '{scale}', available scales: {available}")]
    UnknownScale {
        /// Requested scale name.
        scale: String,
        /// Comma-separated preset names.
        available: String,
    },
    /// The trainer could not be started.
    #[error("trainer '{program}' failed: {reason}")]
    Trainer {
        /// Trainer program.
        program: String,
        /// Spawn failure.
        reason: String,
    },
    /// The trainer finished without leaving its final checkpoint.
    #[error("did not find the checkpoint at {0}")]
    MissingCheckpoint(String),
    /// Filesystem failure while reading presets or writing the record.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Malformed preset overrides or run record.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
