use tracing::warn;

use crate::config::ResolverConfig;
use crate::constants::descriptor::{PIPE_PREFIX, PIPE_STDOUT_TARGET};
use crate::transport::{Location, Scheme};
use crate::types::ShardToken;

/// Renders leaf locations into descriptor tokens.
///
/// Local paths pass through unchanged. Cloud URIs become
/// `pipe:<copy-command> <uri> -` so the loader reads every source as a stream.
#[derive(Clone, Copy, Debug)]
pub struct SourceFormatter<'a> {
    config: &'a ResolverConfig,
}

impl<'a> SourceFormatter<'a> {
    /// Formatter using the copy commands in `config`.
    pub fn new(config: &'a ResolverConfig) -> Self {
        Self { config }
    }

    /// Token for a single location.
    pub fn format(&self, location: &dyn Location) -> ShardToken {
        self.format_raw(location.scheme(), location.as_str())
    }

    /// Format a path or pattern string that belongs to `scheme`.
    pub fn format_raw(&self, scheme: Scheme<'_>, raw: &str) -> ShardToken {
        match scheme {
            Scheme::Local => raw.to_string(),
            Scheme::Cloud(name) => match self.config.copy_commands.get(name) {
                Some(command) => format!("{PIPE_PREFIX}{command} {raw} {PIPE_STDOUT_TARGET}"),
                None => {
                    warn!(scheme = name, uri = raw, "no copy command for scheme; emitting bare uri");
                    raw.to_string()
                }
            },
        }
    }
}
