use serde::Deserialize;
use tracing::debug;

use crate::config::ResolverConfig;
use crate::errors::ResolveError;
use crate::resolve::format::SourceFormatter;
use crate::resolve::grouping::split_trailing_digits;
use crate::resolve::template::render_shard_name;
use crate::transport::{Location, strip_extension};
use crate::types::ShardToken;

/// Resharder sidecar describing a densely numbered output directory.
///
/// Only the two fields below are read; anything else in the file is ignored.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ShardMetadata {
    /// Number of output shards, indexed `0..output_shard_count`.
    pub output_shard_count: u64,
    /// Template rendering an index into a shard file name, e.g. `{:08d}.tar`.
    pub output_shard_format: String,
}

impl ShardMetadata {
    /// Parse sidecar JSON, rejecting a zero shard count.
    pub fn from_json(raw: &str) -> Result<Self, String> {
        let metadata: ShardMetadata = serde_json::from_str(raw).map_err(|err| err.to_string())?;
        if metadata.output_shard_count == 0 {
            return Err("output_shard_count must be positive".to_string());
        }
        Ok(metadata)
    }

    /// Range pattern (relative to the sidecar's directory) covering every shard.
    ///
    /// When the first and last names share a non-digit prefix the range only
    /// spans the digits (`part-{00000..00049}.tar`); otherwise it spans the
    /// whole stem (`{a0..b9}.tar`).
    pub fn range_pattern(&self, extension: &str) -> Result<String, String> {
        let first = render_shard_name(&self.output_shard_format, 0)?;
        let last = render_shard_name(&self.output_shard_format, self.output_shard_count - 1)?;
        let first_stem = strip_extension(&first, extension).unwrap_or(&first);
        let last_stem = strip_extension(&last, extension).unwrap_or(&last);
        let (first_prefix, first_digits) = split_trailing_digits(first_stem);
        let (last_prefix, last_digits) = split_trailing_digits(last_stem);
        if first_prefix == last_prefix && !first_digits.is_empty() && !last_digits.is_empty() {
            return Ok(format!(
                "{first_prefix}{{{first_digits}..{last_digits}}}.{extension}"
            ));
        }
        Ok(format!("{{{first_stem}..{last_stem}}}.{extension}"))
    }
}

/// Synthesizes a directory's range token from its resharder sidecar.
#[derive(Clone, Copy, Debug)]
pub struct MetadataShortcut<'a> {
    config: &'a ResolverConfig,
}

impl<'a> MetadataShortcut<'a> {
    /// Shortcut reading `config.metadata_file` sidecars.
    pub fn new(config: &'a ResolverConfig) -> Self {
        Self { config }
    }

    /// Formatted range token for `dir`, or `None` when it has no sidecar.
    ///
    /// A sidecar that exists but cannot be parsed is an error.
    pub fn try_shortcut(&self, dir: &dyn Location) -> Result<Option<ShardToken>, ResolveError> {
        let sidecar = dir.join(&self.config.metadata_file);
        if !sidecar.exists()? {
            return Ok(None);
        }
        let metadata_error = |reason: String| ResolveError::Metadata {
            path: sidecar.as_str().to_string(),
            reason,
        };
        let raw = sidecar.read_to_string()?;
        let metadata = ShardMetadata::from_json(&raw).map_err(metadata_error)?;
        let pattern = metadata
            .range_pattern(&self.config.shard_extension)
            .map_err(metadata_error)?;
        debug!(
            location = %dir.as_str(),
            shards = metadata.output_shard_count,
            pattern = %pattern,
            "using resharder metadata"
        );
        let target = dir.join(&pattern);
        Ok(Some(SourceFormatter::new(self.config).format(target.as_ref())))
    }
}
