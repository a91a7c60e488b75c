use std::fs;
use std::sync::Arc;

use shardsource::{
    InMemoryObjectStore, LocationResolver, ResolveError, ResolverConfig, ShardResolver,
    resolve_shards,
};
use tempfile::tempdir;

fn in_memory_resolver(store: InMemoryObjectStore) -> ShardResolver {
    ShardResolver::new(ResolverConfig::default())
        .with_locations(LocationResolver::empty().with_client("s3", Arc::new(store)))
}

#[test]
fn single_cloud_archive_becomes_a_pipe() {
    let sources = resolve_shards("s3://b/x.tar", None).unwrap();
    assert_eq!(sources.descriptor, "pipe:aws s3 cp s3://b/x.tar -");
}

#[test]
fn cloud_tree_resolves_ranges_and_sidecars() {
    let store = InMemoryObjectStore::new()
        .with_object("s3://bucket/data/shard_00.tar", "")
        .with_object("s3://bucket/data/shard_01.tar", "")
        .with_object("s3://bucket/data/shard_02.tar", "")
        .with_object("s3://bucket/data/index.json", "{}")
        .with_object(
            "s3://bucket/data/resharded/meta.json",
            r#"{"output_shard_count": 8, "output_shard_format": "{:08d}.tar"}"#,
        );
    let resolver = in_memory_resolver(store);

    let sources = resolver.resolve("s3://bucket/data/", Some("3")).unwrap();
    assert_eq!(
        sources.components(),
        vec![
            "pipe:aws s3 cp s3://bucket/data/resharded/{00000000..00000007}.tar -",
            "pipe:aws s3 cp s3://bucket/data/shard_{00..02}.tar -",
        ]
    );
    assert_eq!(sources.weights.as_deref(), Some("3::3"));
}

#[test]
fn local_and_cloud_sources_mix() {
    let temp = tempdir().unwrap();
    for idx in 0..2 {
        fs::write(temp.path().join(format!("l_{idx}.tar")), b"").unwrap();
    }
    // A lone `c_3.tar` still yields a range starting at zero.
    let store = InMemoryObjectStore::new().with_object("s3://bucket/r/c_3.tar", "");
    let resolver = in_memory_resolver(store);

    let local = temp.path().to_string_lossy().into_owned();
    let raw = format!("{local}::s3://bucket/r");
    let sources = resolver.resolve(&raw, Some("1::4")).unwrap();
    assert_eq!(
        sources.components(),
        vec![
            temp.path().join("l_{0..1}.tar").to_string_lossy().into_owned(),
            "pipe:aws s3 cp s3://bucket/r/c_{0..3}.tar -".to_string(),
        ]
    );
    assert_eq!(sources.weights.as_deref(), Some("1::4"));
}

#[test]
fn custom_copy_command_is_used_for_pipes() {
    let resolver = ShardResolver::new(
        ResolverConfig::default().with_copy_command("s3", "s5cmd cat"),
    );
    let sources = resolver.resolve("s3://b/x.tar", None).unwrap();
    assert_eq!(sources.descriptor, "pipe:s5cmd cat s3://b/x.tar -");
}

#[test]
fn unregistered_scheme_cannot_be_listed() {
    let resolver = ShardResolver::new(ResolverConfig::default())
        .with_locations(LocationResolver::empty());
    let err = resolver.resolve("gs://bucket/prefix", None).unwrap_err();
    assert!(matches!(err, ResolveError::UnsupportedScheme(scheme) if scheme == "gs"));
}

#[test]
fn empty_cloud_prefix_has_no_shards() {
    let resolver = in_memory_resolver(InMemoryObjectStore::new());
    let err = resolver.resolve("s3://bucket/missing", None).unwrap_err();
    assert!(matches!(err, ResolveError::NoShards(_)));
}
