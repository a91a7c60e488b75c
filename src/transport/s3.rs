use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{Error as StoreError, ObjectStore};
use tokio::runtime::Builder as RuntimeBuilder;
use tracing::debug;

use crate::errors::ResolveError;
use crate::transport::cloud::{ObjectEntry, ObjectStoreClient, bucket_and_key};

type StoreFactory = dyn Fn(&str) -> Result<Arc<dyn ObjectStore>, StoreError> + Send + Sync;

/// `s3://` client built on the `object_store` crate.
///
/// Every call blocks on a current-thread runtime, so the resolver itself
/// stays synchronous. Buckets without a registered store are opened with
/// `AmazonS3Builder::from_env`, which reads the usual `AWS_*` variables.
#[derive(Clone)]
pub struct S3Client {
    stores: BTreeMap<String, Arc<dyn ObjectStore>>,
    factory: Arc<StoreFactory>,
}

impl fmt::Debug for S3Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Client")
            .field("registered_buckets", &self.stores.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for S3Client {
    fn default() -> Self {
        Self::from_env()
    }
}

impl S3Client {
    /// Client opening buckets from AWS environment configuration.
    pub fn from_env() -> Self {
        Self {
            stores: BTreeMap::new(),
            factory: Arc::new(|bucket: &str| -> Result<Arc<dyn ObjectStore>, StoreError> {
                let store = AmazonS3Builder::from_env()
                    .with_bucket_name(bucket)
                    .build()?;
                Ok(Arc::new(store) as Arc<dyn ObjectStore>)
            }),
        }
    }

    /// Serve `bucket` from `store` instead of opening it from the environment.
    pub fn with_bucket_store(mut self, bucket: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        self.stores.insert(bucket.into(), store);
        self
    }

    fn store(&self, uri: &str, bucket: &str) -> Result<Arc<dyn ObjectStore>, ResolveError> {
        match self.stores.get(bucket) {
            Some(store) => Ok(Arc::clone(store)),
            None => (self.factory)(bucket).map_err(|err| unavailable(uri, err)),
        }
    }

    fn block_on<F: Future>(&self, uri: &str, future: F) -> Result<F::Output, ResolveError> {
        let runtime = RuntimeBuilder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| unavailable(uri, err))?;
        Ok(runtime.block_on(future))
    }
}

fn unavailable(uri: &str, err: impl ToString) -> ResolveError {
    ResolveError::SourceUnavailable {
        location: uri.to_string(),
        reason: err.to_string(),
    }
}

fn object_path(uri: &str, key: &str) -> Result<ObjectPath, ResolveError> {
    ObjectPath::parse(key).map_err(|err| unavailable(uri, err))
}

impl ObjectStoreClient for S3Client {
    fn list(&self, uri: &str) -> Result<Vec<ObjectEntry>, ResolveError> {
        let (bucket, key) = bucket_and_key(uri)?;
        let store = self.store(uri, bucket)?;
        let prefix = if key.is_empty() {
            None
        } else {
            Some(object_path(uri, key)?)
        };
        let listing = self
            .block_on(uri, store.list_with_delimiter(prefix.as_ref()))?
            .map_err(|err| unavailable(uri, err))?;
        debug!(
            location = %uri,
            prefixes = listing.common_prefixes.len(),
            objects = listing.objects.len(),
            "listed s3 prefix"
        );
        let mut entries = Vec::new();
        for common in &listing.common_prefixes {
            if let Some(name) = common.filename() {
                entries.push(ObjectEntry::prefix(name));
            }
        }
        for object in &listing.objects {
            if let Some(name) = object.location.filename() {
                entries.push(ObjectEntry::object(name));
            }
        }
        Ok(entries)
    }

    fn exists(&self, uri: &str) -> Result<bool, ResolveError> {
        let (bucket, key) = bucket_and_key(uri)?;
        if key.is_empty() {
            return Ok(!self.list(uri)?.is_empty());
        }
        let store = self.store(uri, bucket)?;
        let path = object_path(uri, key)?;
        match self.block_on(uri, store.head(&path))? {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound { .. }) => Ok(!self.list(uri)?.is_empty()),
            Err(err) => Err(unavailable(uri, err)),
        }
    }

    fn read_to_string(&self, uri: &str) -> Result<String, ResolveError> {
        let (bucket, key) = bucket_and_key(uri)?;
        let store = self.store(uri, bucket)?;
        let path = object_path(uri, key)?;
        let bytes = self
            .block_on(uri, async { store.get(&path).await?.bytes().await })?
            .map_err(|err| unavailable(uri, err))?;
        String::from_utf8(bytes.to_vec()).map_err(|err| {
            unavailable(uri, format!("object is not valid UTF-8: {err}"))
        })
    }
}
