use tracing::debug;

use crate::config::ResolverConfig;
use crate::constants::descriptor::SOURCE_SEPARATOR;
use crate::errors::ResolveError;
use crate::resolve::format::SourceFormatter;
use crate::resolve::grouping::compact_shard_names;
use crate::resolve::shortcut::MetadataShortcut;
use crate::transport::Location;
use crate::types::{ShardToken, WeightValue};

/// Tokens resolved for one source, with the source weight replicated per token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalkOutput {
    /// Descriptor components in resolution order.
    pub tokens: Vec<ShardToken>,
    /// One copy of the source weight per token, when a weight was supplied.
    pub weights: Option<Vec<WeightValue>>,
}

impl WalkOutput {
    /// `::`-joined descriptor.
    pub fn descriptor(&self) -> String {
        self.tokens.join(SOURCE_SEPARATOR)
    }

    /// `::`-joined weights, if any.
    pub fn weight_string(&self) -> Option<String> {
        self.weights
            .as_ref()
            .map(|weights| weights.join(SOURCE_SEPARATOR))
    }
}

/// Depth-first resolver for a single source location.
///
/// At each level, shard archives are compacted into range tokens, subdirectories
/// with a resharder sidecar contribute their shortcut token, and any other
/// subdirectory is walked recursively and flattened into the parent's tokens.
#[derive(Clone, Copy, Debug)]
pub struct ShardTreeWalker<'a> {
    config: &'a ResolverConfig,
}

impl<'a> ShardTreeWalker<'a> {
    /// Walker matching shards by `config.shard_extension`.
    pub fn new(config: &'a ResolverConfig) -> Self {
        Self { config }
    }

    /// Resolve `location` into tokens, replicating `weight` once per token.
    ///
    /// A location that yields no tokens at all is `ResolveError::NoShards`.
    pub fn walk(
        &self,
        location: &dyn Location,
        weight: Option<&str>,
    ) -> Result<WalkOutput, ResolveError> {
        let tokens = if self.is_shard(location) {
            vec![SourceFormatter::new(self.config).format(location)]
        } else {
            self.directory_tokens(location)?
        };
        if tokens.is_empty() {
            return Err(ResolveError::NoShards(location.as_str().to_string()));
        }
        let weights = weight.map(|weight| vec![weight.to_string(); tokens.len()]);
        Ok(WalkOutput { tokens, weights })
    }

    fn is_shard(&self, location: &dyn Location) -> bool {
        location.extension() == Some(self.config.shard_extension.as_str())
    }

    fn directory_tokens(&self, dir: &dyn Location) -> Result<Vec<ShardToken>, ResolveError> {
        let shortcut = MetadataShortcut::new(self.config);
        let mut tokens = Vec::new();
        let mut shard_names = Vec::new();
        for child in dir.list()? {
            if self.is_shard(child.as_ref()) {
                shard_names.push(child.as_str().to_string());
            } else if child.is_dir()? {
                match shortcut.try_shortcut(child.as_ref())? {
                    Some(token) => tokens.push(token),
                    None => {
                        let nested = self.directory_tokens(child.as_ref())?;
                        if nested.is_empty() {
                            debug!(location = %child.as_str(), "skipping directory without shards");
                        }
                        tokens.extend(nested);
                    }
                }
            }
        }

        let formatter = SourceFormatter::new(self.config);
        let scheme = dir.scheme();
        let ranges = compact_shard_names(&shard_names, &self.config.shard_extension)?;
        debug!(
            location = %dir.as_str(),
            shards = shard_names.len(),
            ranges = ranges.len(),
            nested = tokens.len(),
            "resolved directory"
        );
        tokens.extend(
            ranges
                .iter()
                .map(|range| formatter.format_raw(scheme, range)),
        );
        Ok(tokens)
    }
}
