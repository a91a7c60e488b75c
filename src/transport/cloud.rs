use std::collections::BTreeMap;
use std::env;
use std::process::{Command, Output};
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::constants::cloud::{AWS_CLI_PROGRAM, AWS_CLI_PROGRAM_ENV};
use crate::errors::ResolveError;
use crate::transport::{DynLocation, Location, Scheme};
use crate::types::{LocationString, SchemeName};

/// Kind of a listed cloud entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// A stored object.
    Object,
    /// A common prefix, treated as a directory.
    Prefix,
}

/// One direct child returned by an object store listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Child name relative to the listed prefix, without a trailing slash.
    pub name: String,
    /// Whether the child is an object or a prefix.
    pub kind: EntryKind,
}

impl ObjectEntry {
    /// Object entry named `name`.
    pub fn object(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Object,
        }
    }

    /// Prefix entry named `name`.
    pub fn prefix(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Prefix,
        }
    }
}

/// Blocking, read-only access to one object store scheme.
pub trait ObjectStoreClient: Send + Sync {
    /// Direct children of the prefix `uri` (a trailing slash is implied).
    fn list(&self, uri: &str) -> Result<Vec<ObjectEntry>, ResolveError>;
    /// Whether an object or non-empty prefix exists at `uri`.
    fn exists(&self, uri: &str) -> Result<bool, ResolveError>;
    /// Full object contents decoded as UTF-8.
    fn read_to_string(&self, uri: &str) -> Result<String, ResolveError>;
}

/// Cloud object or prefix, addressed by URI.
#[derive(Clone)]
pub struct CloudLocation {
    uri: LocationString,
    scheme: SchemeName,
    kind: Option<EntryKind>,
    client: Option<Arc<dyn ObjectStoreClient>>,
}

impl std::fmt::Debug for CloudLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudLocation")
            .field("uri", &self.uri)
            .field("kind", &self.kind)
            .field("has_client", &self.client.is_some())
            .finish()
    }
}

impl CloudLocation {
    /// Wrap `uri`; trailing slashes after the bucket are dropped.
    pub fn new(
        uri: &str,
        scheme: impl Into<SchemeName>,
        client: Option<Arc<dyn ObjectStoreClient>>,
    ) -> Self {
        let scheme = scheme.into();
        let root_len = scheme.len() + "://".len();
        let trimmed = uri.trim_end_matches('/');
        let uri = if trimmed.len() > root_len {
            trimmed.to_string()
        } else {
            uri.to_string()
        };
        Self {
            uri,
            scheme,
            kind: None,
            client,
        }
    }

    fn child(&self, name: &str, kind: Option<EntryKind>) -> CloudLocation {
        CloudLocation {
            uri: format!("{}/{}", self.uri.trim_end_matches('/'), name),
            scheme: self.scheme.clone(),
            kind,
            client: self.client.clone(),
        }
    }

    fn client(&self) -> Result<&Arc<dyn ObjectStoreClient>, ResolveError> {
        self.client
            .as_ref()
            .ok_or_else(|| ResolveError::UnsupportedScheme(self.scheme.clone()))
    }
}

impl Location for CloudLocation {
    fn as_str(&self) -> &str {
        &self.uri
    }

    fn scheme(&self) -> Scheme<'_> {
        Scheme::Cloud(&self.scheme)
    }

    fn file_name(&self) -> Option<&str> {
        let root_len = self.scheme.len() + "://".len();
        let path = self.uri.get(root_len..)?;
        match path.rsplit_once('/') {
            Some((_, name)) if !name.is_empty() => Some(name),
            _ => None,
        }
    }

    fn join(&self, name: &str) -> DynLocation {
        Box::new(self.child(name, None))
    }

    fn exists(&self) -> Result<bool, ResolveError> {
        if self.kind.is_some() {
            return Ok(true);
        }
        self.client()?.exists(&self.uri)
    }

    fn is_dir(&self) -> Result<bool, ResolveError> {
        match self.kind {
            Some(kind) => Ok(kind == EntryKind::Prefix),
            None => Ok(!self.client()?.list(&self.uri)?.is_empty()),
        }
    }

    fn list(&self) -> Result<Vec<DynLocation>, ResolveError> {
        let mut entries = self.client()?.list(&self.uri)?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(location = %self.uri, entries = entries.len(), "listed cloud prefix");
        Ok(entries
            .into_iter()
            .map(|entry| Box::new(self.child(&entry.name, Some(entry.kind))) as DynLocation)
            .collect())
    }

    fn read_to_string(&self) -> Result<String, ResolveError> {
        self.client()?.read_to_string(&self.uri)
    }
}

/// Split `scheme://bucket/key` into bucket and key (without a trailing slash).
///
/// The key is empty for a bucket root.
pub fn split_object_uri(uri: &str) -> Option<(&str, &str)> {
    let (_, rest) = uri.split_once("://")?;
    let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
    if bucket.is_empty() {
        return None;
    }
    Some((bucket, key.trim_end_matches('/')))
}

pub(crate) fn bucket_and_key(uri: &str) -> Result<(&str, &str), ResolveError> {
    split_object_uri(uri).ok_or_else(|| ResolveError::SourceUnavailable {
        location: uri.to_string(),
        reason: "expected scheme://bucket/key".to_string(),
    })
}

/// `aws s3api list-objects-v2 --output json` response, reduced to what listing needs.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListObjectsOutput {
    #[serde(default)]
    contents: Option<Vec<ListedObject>>,
    #[serde(default)]
    common_prefixes: Option<Vec<ListedPrefix>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListedObject {
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListedPrefix {
    prefix: String,
}

impl ListObjectsOutput {
    fn parse(stdout: &str) -> Result<Self, String> {
        if stdout.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(stdout).map_err(|err| format!("unreadable listing: {err}"))
    }

    fn object_keys(&self) -> impl Iterator<Item = &str> {
        self.contents.iter().flatten().map(|object| object.key.as_str())
    }

    fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.common_prefixes
            .iter()
            .flatten()
            .map(|prefix| prefix.prefix.as_str())
    }

    /// Direct children of `prefix` (which ends in `/` unless empty).
    fn children(&self, prefix: &str) -> Vec<ObjectEntry> {
        let mut entries = Vec::new();
        for common in self.prefixes() {
            let name = common.strip_prefix(prefix).unwrap_or(common).trim_end_matches('/');
            if !name.is_empty() {
                entries.push(ObjectEntry::prefix(name));
            }
        }
        for key in self.object_keys() {
            let name = key.strip_prefix(prefix).unwrap_or(key);
            // Zero-byte "folder" markers list as the prefix itself.
            if !name.is_empty() && !name.contains('/') {
                entries.push(ObjectEntry::object(name));
            }
        }
        entries
    }
}

/// Object store client that shells out to the AWS CLI.
///
/// Listings go through `aws s3api list-objects-v2` with JSON output; reads
/// stream through `aws s3 cp <uri> -`.
#[derive(Clone, Debug)]
pub struct AwsCliClient {
    program: String,
}

impl AwsCliClient {
    /// Client invoking `program` (for example `aws` or an absolute path).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Client using `$SHARDSOURCE_AWS_CLI`, falling back to `aws` on `PATH`.
    pub fn from_env() -> Self {
        Self::new(env::var(AWS_CLI_PROGRAM_ENV).unwrap_or_else(|_| AWS_CLI_PROGRAM.to_string()))
    }

    fn run(&self, uri: &str, args: &[&str]) -> Result<Output, ResolveError> {
        debug!(program = %self.program, ?args, "invoking aws cli");
        Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|err| ResolveError::SourceUnavailable {
                location: uri.to_string(),
                reason: format!("failed to run '{}': {err}", self.program),
            })
    }

    fn list_objects(
        &self,
        uri: &str,
        bucket: &str,
        prefix: &str,
    ) -> Result<ListObjectsOutput, ResolveError> {
        let mut args = vec!["s3api", "list-objects-v2", "--bucket", bucket];
        if !prefix.is_empty() {
            args.extend(["--prefix", prefix]);
        }
        args.extend(["--delimiter", "/", "--output", "json"]);
        let output = self.run(uri, &args)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            // Exits non-zero without output when nothing matches.
            if stdout.trim().is_empty() && output.stderr.is_empty() {
                return Ok(ListObjectsOutput::default());
            }
            return Err(ResolveError::SourceUnavailable {
                location: uri.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        ListObjectsOutput::parse(&stdout).map_err(|reason| ResolveError::SourceUnavailable {
            location: uri.to_string(),
            reason,
        })
    }
}

impl ObjectStoreClient for AwsCliClient {
    fn list(&self, uri: &str) -> Result<Vec<ObjectEntry>, ResolveError> {
        let (bucket, key) = bucket_and_key(uri)?;
        let prefix = if key.is_empty() {
            String::new()
        } else {
            format!("{key}/")
        };
        Ok(self.list_objects(uri, bucket, &prefix)?.children(&prefix))
    }

    fn exists(&self, uri: &str) -> Result<bool, ResolveError> {
        let (bucket, key) = bucket_and_key(uri)?;
        if key.is_empty() {
            return Ok(!self.list(uri)?.is_empty());
        }
        // A key-prefix listing also returns siblings such as `meta.json.bak`.
        let listing = self.list_objects(uri, bucket, key)?;
        let dir_prefix = format!("{key}/");
        Ok(listing.object_keys().any(|found| found == key)
            || listing.prefixes().any(|found| found == dir_prefix))
    }

    fn read_to_string(&self, uri: &str) -> Result<String, ResolveError> {
        let output = self.run(uri, &["s3", "cp", uri, "-"])?;
        if !output.status.success() {
            return Err(ResolveError::SourceUnavailable {
                location: uri.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        String::from_utf8(output.stdout).map_err(|err| ResolveError::SourceUnavailable {
            location: uri.to_string(),
            reason: format!("object is not valid UTF-8: {err}"),
        })
    }
}

/// In-memory object store keyed by full object URI.
///
/// Prefixes are implied by object keys, as in real object stores.
#[derive(Clone, Debug, Default)]
pub struct InMemoryObjectStore {
    objects: BTreeMap<LocationString, String>,
}

impl InMemoryObjectStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object with `contents` at `uri`.
    pub fn with_object(mut self, uri: impl Into<LocationString>, contents: impl Into<String>) -> Self {
        self.insert(uri, contents);
        self
    }

    /// Add or replace the object at `uri`.
    pub fn insert(&mut self, uri: impl Into<LocationString>, contents: impl Into<String>) {
        self.objects.insert(uri.into(), contents.into());
    }
}

impl ObjectStoreClient for InMemoryObjectStore {
    fn list(&self, uri: &str) -> Result<Vec<ObjectEntry>, ResolveError> {
        let prefix = format!("{}/", uri.trim_end_matches('/'));
        let mut children: BTreeMap<String, EntryKind> = BTreeMap::new();
        for key in self.objects.keys().filter(|key| key.starts_with(&prefix)) {
            let rest = &key[prefix.len()..];
            match rest.split_once('/') {
                Some((dir, _)) => {
                    children.insert(dir.to_string(), EntryKind::Prefix);
                }
                None => {
                    children.entry(rest.to_string()).or_insert(EntryKind::Object);
                }
            }
        }
        Ok(children
            .into_iter()
            .map(|(name, kind)| ObjectEntry { name, kind })
            .collect())
    }

    fn exists(&self, uri: &str) -> Result<bool, ResolveError> {
        let prefix = format!("{}/", uri.trim_end_matches('/'));
        Ok(self.objects.contains_key(uri) || self.objects.keys().any(|key| key.starts_with(&prefix)))
    }

    fn read_to_string(&self, uri: &str) -> Result<String, ResolveError> {
        self.objects
            .get(uri)
            .cloned()
            .ok_or_else(|| ResolveError::SourceUnavailable {
                location: uri.to_string(),
                reason: "no such object".to_string(),
            })
    }
}
