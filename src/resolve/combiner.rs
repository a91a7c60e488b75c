use tracing::info;

use crate::config::ResolverConfig;
use crate::constants::descriptor::SOURCE_SEPARATOR;
use crate::errors::ResolveError;
use crate::resolve::ShardSources;
use crate::resolve::walker::ShardTreeWalker;
use crate::resolve::weights::WeightSpec;
use crate::transport::LocationResolver;
use crate::types::{ShardToken, WeightValue};

/// Resolves `::`-joined compound locations source by source.
#[derive(Clone, Copy, Debug)]
pub struct MultiSourceCombiner<'a> {
    config: &'a ResolverConfig,
    locations: &'a LocationResolver,
}

impl<'a> MultiSourceCombiner<'a> {
    /// Combiner over `config` that opens sources through `locations`.
    pub fn new(config: &'a ResolverConfig, locations: &'a LocationResolver) -> Self {
        Self { config, locations }
    }

    /// Resolve every source in `raw` and re-join descriptors and weights.
    ///
    /// When `weights` is present it must hold exactly one entry per source;
    /// anything else fails before any source is touched.
    pub fn resolve(&self, raw: &str, weights: Option<&str>) -> Result<ShardSources, ResolveError> {
        let sources: Vec<&str> = raw.split(SOURCE_SEPARATOR).collect();
        if sources.iter().any(|source| source.is_empty()) {
            return Err(ResolveError::EmptySource(raw.to_string()));
        }
        let weights = weights.map(WeightSpec::parse).transpose()?;
        if let Some(spec) = &weights {
            spec.check_cardinality(sources.len())?;
        }

        let walker = ShardTreeWalker::new(self.config);
        let mut tokens: Vec<ShardToken> = Vec::new();
        let mut joined_weights: Option<Vec<WeightValue>> = weights.as_ref().map(|_| Vec::new());
        for (idx, source) in sources.iter().enumerate() {
            let weight = weights
                .as_ref()
                .map(|spec| spec.values()[idx].as_str());
            let location = self.locations.resolve(source);
            let output = walker.walk(location.as_ref(), weight)?;
            info!(
                source = %source,
                components = output.tokens.len(),
                weight = weight.unwrap_or("uniform"),
                "resolved data source"
            );
            tokens.extend(output.tokens);
            if let (Some(all), Some(source_weights)) = (joined_weights.as_mut(), output.weights) {
                all.extend(source_weights);
            }
        }

        Ok(ShardSources {
            descriptor: tokens.join(SOURCE_SEPARATOR),
            weights: joined_weights.map(|all| all.join(SOURCE_SEPARATOR)),
        })
    }
}
