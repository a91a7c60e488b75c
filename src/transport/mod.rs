//! Uniform access to local directories and cloud object prefixes.
//!
//! Ownership model:
//! - `Location` is the scheme-agnostic handle every resolver component uses.
//! - `LocationResolver` classifies raw strings and owns the per-scheme
//!   `ObjectStoreClient` registry that cloud locations delegate to.
//! - Concrete handles (`LocalLocation`, `CloudLocation`) are never named by
//!   the resolver itself.

use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::constants::cloud::{AWS_CLI_PROGRAM_ENV, S3_SCHEME};
use crate::errors::ResolveError;
use crate::types::SchemeName;

/// Cloud object prefixes backed by an object store client.
pub mod cloud;
/// Local filesystem locations.
pub mod fs;
/// `object_store`-backed S3 client.
pub mod s3;

pub use cloud::{
    AwsCliClient, CloudLocation, EntryKind, InMemoryObjectStore, ObjectEntry, ObjectStoreClient,
};
pub use fs::LocalLocation;
pub use s3::S3Client;

/// Boxed location handle returned by resolution and listing.
pub type DynLocation = Box<dyn Location>;

/// Where a location lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme<'a> {
    /// A path on the local filesystem.
    Local,
    /// A URI with the given scheme name (for example `s3`).
    Cloud(&'a str),
}

/// Scheme-agnostic view over a file or directory.
///
/// All operations behave the same way for every scheme from the caller's
/// point of view. Access failures surface from `exists`, `is_dir`, `list`,
/// and `read_to_string`, never from construction.
pub trait Location: fmt::Debug {
    /// Raw string form (path or URI).
    fn as_str(&self) -> &str;
    /// Scheme of this location.
    fn scheme(&self) -> Scheme<'_>;
    /// Final path component, if any.
    fn file_name(&self) -> Option<&str>;
    /// Final dot-suffix of the file name, without the dot.
    fn extension(&self) -> Option<&str> {
        self.file_name().and_then(extension_of)
    }
    /// Child location named `name`.
    fn join(&self, name: &str) -> DynLocation;
    /// Whether anything exists at this location.
    fn exists(&self) -> Result<bool, ResolveError>;
    /// Whether this location is a directory (or a non-empty object prefix).
    fn is_dir(&self) -> Result<bool, ResolveError>;
    /// Direct children, sorted by name.
    fn list(&self) -> Result<Vec<DynLocation>, ResolveError>;
    /// Full contents decoded as UTF-8.
    fn read_to_string(&self) -> Result<String, ResolveError>;
}

/// Return the final dot-suffix of `name` without the dot.
///
/// Leading-dot names (`.hidden`) and names ending in a dot have no extension.
pub fn extension_of(name: &str) -> Option<&str> {
    let idx = name.rfind('.')?;
    if idx == 0 || idx + 1 == name.len() {
        return None;
    }
    Some(&name[idx + 1..])
}

/// Remove a trailing `.<extension>` from `raw`, if present.
pub fn strip_extension<'a>(raw: &'a str, extension: &str) -> Option<&'a str> {
    raw.strip_suffix(extension)
        .and_then(|rest| rest.strip_suffix('.'))
}

fn uri_scheme_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\w+)://").expect("static URI scheme pattern"))
}

/// Scheme name of `raw` when it looks like `scheme://...`.
pub fn cloud_scheme(raw: &str) -> Option<&str> {
    uri_scheme_pattern()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|scheme| scheme.as_str())
}

/// Classifies raw location strings and builds scheme-specific handles.
#[derive(Clone)]
pub struct LocationResolver {
    clients: BTreeMap<SchemeName, Arc<dyn ObjectStoreClient>>,
}

impl Default for LocationResolver {
    /// Registers an `s3://` client: the AWS CLI when `$SHARDSOURCE_AWS_CLI`
    /// is set, otherwise the native `object_store` client.
    fn default() -> Self {
        let client: Arc<dyn ObjectStoreClient> = if env::var_os(AWS_CLI_PROGRAM_ENV).is_some() {
            Arc::new(AwsCliClient::from_env())
        } else {
            Arc::new(S3Client::from_env())
        };
        Self::empty().with_client(S3_SCHEME, client)
    }
}

impl fmt::Debug for LocationResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationResolver")
            .field("schemes", &self.clients.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl LocationResolver {
    /// Resolver with no object store clients registered.
    pub fn empty() -> Self {
        Self {
            clients: BTreeMap::new(),
        }
    }

    /// Register (or replace) the client used for `scheme://` URIs.
    pub fn with_client(
        mut self,
        scheme: impl Into<SchemeName>,
        client: Arc<dyn ObjectStoreClient>,
    ) -> Self {
        self.clients.insert(scheme.into(), client);
        self
    }

    /// Classify `raw` as a cloud URI or local path. Performs no I/O.
    pub fn resolve(&self, raw: &str) -> DynLocation {
        match cloud_scheme(raw) {
            Some(scheme) => Box::new(CloudLocation::new(
                raw,
                scheme,
                self.clients.get(scheme).cloned(),
            )),
            None => Box::new(LocalLocation::new(raw)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_of_follows_final_suffix_rules() {
        assert_eq!(extension_of("shard_0001.tar"), Some("tar"));
        assert_eq!(extension_of("archive.tar.gz"), Some("gz"));
        assert_eq!(extension_of(".tar"), None);
        assert_eq!(extension_of("trailing."), None);
        assert_eq!(extension_of("plain"), None);
    }

    #[test]
    fn strip_extension_requires_dot() {
        assert_eq!(strip_extension("/d/shard_01.tar", "tar"), Some("/d/shard_01"));
        assert_eq!(strip_extension("/d/guitar", "tar"), None);
    }

    #[test]
    fn cloud_scheme_matches_word_scheme_prefix() {
        assert_eq!(cloud_scheme("s3://bucket/key"), Some("s3"));
        assert_eq!(cloud_scheme("gs://bucket"), Some("gs"));
        assert_eq!(cloud_scheme("/local/s3://odd"), None);
        assert_eq!(cloud_scheme("relative/dir"), None);
    }

    #[test]
    fn resolver_classifies_without_touching_storage() {
        let resolver = LocationResolver::empty();
        let local = resolver.resolve("/does/not/exist");
        assert_eq!(local.scheme(), Scheme::Local);
        assert_eq!(local.as_str(), "/does/not/exist");

        let cloud = resolver.resolve("s3://bucket/pool/");
        assert_eq!(cloud.scheme(), Scheme::Cloud("s3"));
        assert_eq!(cloud.as_str(), "s3://bucket/pool");
        assert!(matches!(
            cloud.list(),
            Err(ResolveError::UnsupportedScheme(scheme)) if scheme == "s3"
        ));
    }
}
