//! Shard descriptor resolution.
//!
//! Ownership model:
//! - `ShardResolver` owns the configuration and location registry for one run.
//! - `MultiSourceCombiner` splits compound inputs and aligns weights.
//! - `ShardTreeWalker` resolves one source; it consults `MetadataShortcut` for
//!   resharded subdirectories and the grouping helpers for plain shard files.
//! - `SourceFormatter` renders every leaf token for its scheme.
//!
//! Everything is rebuilt per call and no state survives between runs, so
//! resolving an unchanged tree twice yields byte-identical strings.

use serde::Serialize;

use crate::config::ResolverConfig;
use crate::constants::descriptor::SOURCE_SEPARATOR;
use crate::errors::ResolveError;
use crate::transport::LocationResolver;

/// Compound-source splitting and weight alignment.
pub mod combiner;
/// Leaf token rendering (local passthrough, cloud pipe form).
pub mod format;
/// Shard name bucketing and range compaction.
pub mod grouping;
/// Resharder sidecar shortcut.
pub mod shortcut;
/// Python-style shard name templates.
pub mod template;
/// Recursive per-source directory walk.
pub mod walker;
/// Sampling weight parsing.
pub mod weights;

pub use combiner::MultiSourceCombiner;
pub use format::SourceFormatter;
pub use grouping::{ShardGroup, compact_shard_names, group_shard_names};
pub use shortcut::{MetadataShortcut, ShardMetadata};
pub use walker::{ShardTreeWalker, WalkOutput};
pub use weights::WeightSpec;

/// Final descriptor and aligned weights handed to the data loader.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ShardSources {
    /// `::`-joined shard descriptor.
    pub descriptor: String,
    /// `::`-joined weights, one per descriptor component; `None` means uniform.
    pub weights: Option<String>,
}

impl ShardSources {
    /// Descriptor components in order.
    pub fn components(&self) -> Vec<&str> {
        self.descriptor.split(SOURCE_SEPARATOR).collect()
    }
}

/// Entry point for resolving data locations into shard descriptors.
#[derive(Clone, Debug, Default)]
pub struct ShardResolver {
    config: ResolverConfig,
    locations: LocationResolver,
}

impl ShardResolver {
    /// Resolver using the default location registry (`S3Client` for `s3://`).
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            locations: LocationResolver::default(),
        }
    }

    /// Replace the location registry, e.g. to plug in another object store client.
    pub fn with_locations(mut self, locations: LocationResolver) -> Self {
        self.locations = locations;
        self
    }

    /// Configuration used for every resolution.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `raw` (optionally `::`-compound) with optional `::` weights.
    pub fn resolve(&self, raw: &str, weights: Option<&str>) -> Result<ShardSources, ResolveError> {
        self.config.validate()?;
        MultiSourceCombiner::new(&self.config, &self.locations).resolve(raw, weights)
    }
}

/// Resolve with the default configuration.
pub fn resolve_shards(raw: &str, weights: Option<&str>) -> Result<ShardSources, ResolveError> {
    ShardResolver::default().resolve(raw, weights)
}
