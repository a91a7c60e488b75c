use std::fs;
use std::path::Path;

use shardsource::{ResolveError, ResolverConfig, ShardResolver, resolve_shards};
use tempfile::tempdir;

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"").unwrap();
}

fn touch_range(dir: &Path, prefix: &str, width: usize, count: u64) {
    for idx in 0..count {
        touch(&dir.join(format!("{prefix}{idx:0width$}.tar")));
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn dense_directory_collapses_to_one_range() {
    let temp = tempdir().unwrap();
    touch_range(temp.path(), "shard_", 4, 100);

    let sources = resolve_shards(&display(temp.path()), None).unwrap();
    assert_eq!(
        sources.descriptor,
        display(&temp.path().join("shard_{0000..0099}.tar"))
    );
    assert_eq!(sources.weights, None);
}

#[test]
fn prefixes_get_separate_ranges_and_other_files_are_ignored() {
    let temp = tempdir().unwrap();
    touch_range(temp.path(), "a_", 2, 3);
    touch_range(temp.path(), "b_", 3, 5);
    touch(&temp.path().join("README.md"));
    touch(&temp.path().join("stats.json"));

    let sources = resolve_shards(&display(temp.path()), None).unwrap();
    assert_eq!(
        sources.components(),
        vec![
            display(&temp.path().join("a_{00..02}.tar")),
            display(&temp.path().join("b_{000..004}.tar")),
        ]
    );
}

#[test]
fn resharded_subdirectory_uses_sidecar_without_listing_shards() {
    let temp = tempdir().unwrap();
    touch_range(temp.path(), "shard_", 4, 2);
    let sub = temp.path().join("sub");
    fs::create_dir_all(&sub).unwrap();
    fs::write(
        sub.join("meta.json"),
        r#"{"output_shard_count": 50, "output_shard_format": "part-{:05d}.tar", "source": "resharder"}"#,
    )
    .unwrap();

    let sources = resolve_shards(&display(temp.path()), Some("2")).unwrap();
    assert_eq!(
        sources.components(),
        vec![
            display(&sub.join("part-{00000..00049}.tar")),
            display(&temp.path().join("shard_{0000..0001}.tar")),
        ]
    );
    assert_eq!(sources.weights.as_deref(), Some("2::2"));
}

#[test]
fn nested_directories_are_flattened_into_the_parent() {
    let temp = tempdir().unwrap();
    touch_range(&temp.path().join("x").join("y"), "deep_", 1, 3);
    fs::create_dir_all(temp.path().join("empty")).unwrap();

    let sources = resolve_shards(&display(temp.path()), None).unwrap();
    assert_eq!(
        sources.descriptor,
        display(&temp.path().join("x").join("y").join("deep_{0..2}.tar"))
    );
}

#[test]
fn compound_sources_replicate_weights_per_token() {
    let temp = tempdir().unwrap();
    let dir_a = temp.path().join("dirA");
    let dir_b = temp.path().join("dirB");
    touch_range(&dir_a, "s_", 2, 4);
    touch_range(&dir_b, "p_", 2, 2);
    touch_range(&dir_b, "q_", 2, 2);

    let raw = format!("{}::{}", display(&dir_a), display(&dir_b));
    let sources = resolve_shards(&raw, Some("1::2")).unwrap();
    assert_eq!(
        sources.components(),
        vec![
            display(&dir_a.join("s_{00..03}.tar")),
            display(&dir_b.join("p_{00..01}.tar")),
            display(&dir_b.join("q_{00..01}.tar")),
        ]
    );
    assert_eq!(sources.weights.as_deref(), Some("1::2::2"));
}

#[test]
fn weight_count_mismatch_fails_before_touching_the_filesystem() {
    let err = resolve_shards("/does/not/exist::/nor/this", Some("1")).unwrap_err();
    assert!(matches!(
        err,
        ResolveError::WeightCardinality {
            sources: 2,
            weights: 1
        }
    ));
}

#[test]
fn directory_without_shards_is_an_error() {
    let temp = tempdir().unwrap();
    touch(&temp.path().join("notes.txt"));
    let err = resolve_shards(&display(temp.path()), None).unwrap_err();
    assert!(matches!(err, ResolveError::NoShards(_)));
}

#[test]
fn gaps_are_covered_by_the_range() {
    let temp = tempdir().unwrap();
    for idx in [0u32, 1, 7] {
        touch(&temp.path().join(format!("s_{idx:02}.tar")));
    }
    let sources = resolve_shards(&display(temp.path()), None).unwrap();
    assert_eq!(sources.descriptor, display(&temp.path().join("s_{00..07}.tar")));
}

#[test]
fn resolution_is_idempotent() {
    let temp = tempdir().unwrap();
    touch_range(temp.path(), "shard_", 3, 12);
    touch_range(&temp.path().join("nested"), "n_", 2, 4);

    let first = resolve_shards(&display(temp.path()), Some("0.5")).unwrap();
    let second = resolve_shards(&display(temp.path()), Some("0.5")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn custom_extension_selects_other_archives() {
    let temp = tempdir().unwrap();
    for idx in 0..3 {
        touch(&temp.path().join(format!("chunk_{idx}.zip")));
        touch(&temp.path().join(format!("chunk_{idx}.tar")));
    }
    let resolver = ShardResolver::new(ResolverConfig::default().with_shard_extension(".zip"));
    let sources = resolver.resolve(&display(temp.path()), None).unwrap();
    assert_eq!(sources.descriptor, display(&temp.path().join("chunk_{0..2}.zip")));
}

#[cfg(unix)]
#[test]
fn dangling_symlink_does_not_abort_resolution() {
    let temp = tempdir().unwrap();
    touch_range(temp.path(), "shard_", 4, 3);
    std::os::unix::fs::symlink(temp.path().join("gone"), temp.path().join("latest")).unwrap();

    let sources = resolve_shards(&display(temp.path()), None).unwrap();
    assert_eq!(
        sources.descriptor,
        display(&temp.path().join("shard_{0000..0002}.tar"))
    );
}
