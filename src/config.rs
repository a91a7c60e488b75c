use std::collections::BTreeMap;

use crate::constants::cloud::{GS_COPY_COMMAND, GS_SCHEME, S3_COPY_COMMAND, S3_SCHEME};
use crate::constants::descriptor::DEFAULT_SHARD_EXTENSION;
use crate::constants::shortcut::DEFAULT_METADATA_FILE;
use crate::errors::ResolveError;
use crate::types::SchemeName;

/// Top-level shard resolution configuration.
#[derive(Clone, Debug)]
pub struct ResolverConfig {
    /// Extension (without the dot) identifying shard archives.
    pub shard_extension: String,
    /// File name of the resharder sidecar checked in each subdirectory.
    pub metadata_file: String,
    /// Copy command used to stream objects, keyed by cloud scheme.
    ///
    /// Cloud tokens whose scheme has no entry are emitted as bare URIs.
    pub copy_commands: BTreeMap<SchemeName, String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        let mut copy_commands = BTreeMap::new();
        copy_commands.insert(S3_SCHEME.to_string(), S3_COPY_COMMAND.to_string());
        copy_commands.insert(GS_SCHEME.to_string(), GS_COPY_COMMAND.to_string());
        Self {
            shard_extension: DEFAULT_SHARD_EXTENSION.to_string(),
            metadata_file: DEFAULT_METADATA_FILE.to_string(),
            copy_commands,
        }
    }
}

impl ResolverConfig {
    /// Override the shard archive extension. A leading dot is ignored.
    pub fn with_shard_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.shard_extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Override the sidecar metadata file name.
    pub fn with_metadata_file(mut self, metadata_file: impl Into<String>) -> Self {
        self.metadata_file = metadata_file.into();
        self
    }

    /// Set the copy command for one cloud scheme.
    pub fn with_copy_command(
        mut self,
        scheme: impl Into<SchemeName>,
        command: impl Into<String>,
    ) -> Self {
        self.copy_commands.insert(scheme.into(), command.into());
        self
    }

    /// Reject configurations that cannot produce a usable descriptor.
    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.shard_extension.is_empty() {
            return Err(ResolveError::Configuration(
                "shard extension must not be empty".to_string(),
            ));
        }
        if self.metadata_file.is_empty() || self.metadata_file.contains('/') {
            return Err(ResolveError::Configuration(format!(
                "metadata file '{}' must be a plain file name",
                self.metadata_file
            )));
        }
        if let Some((scheme, _)) = self
            .copy_commands
            .iter()
            .find(|(_, command)| command.trim().is_empty())
        {
            return Err(ResolveError::Configuration(format!(
                "copy command for scheme '{scheme}' must not be empty"
            )));
        }
        Ok(())
    }
}

/// Parse a `SCHEME=COMMAND` pair as accepted by `--copy-command`.
pub fn parse_copy_command(raw: &str) -> Result<(SchemeName, String), String> {
    let (scheme, command) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SCHEME=COMMAND, got '{raw}'"))?;
    let scheme = scheme.trim();
    let command = command.trim();
    if scheme.is_empty() || !scheme.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(format!("invalid scheme '{scheme}'"));
    }
    if command.is_empty() {
        return Err(format!("copy command for scheme '{scheme}' must not be empty"));
    }
    Ok((scheme.to_string(), command.to_string()))
}
