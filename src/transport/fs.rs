use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::errors::ResolveError;
use crate::transport::{DynLocation, Location, Scheme};

/// Location on the local filesystem.
#[derive(Clone, Debug)]
pub struct LocalLocation {
    path: PathBuf,
    raw: String,
}

impl LocalLocation {
    /// Wrap `path` without checking that it exists.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let raw = path.to_string_lossy().into_owned();
        Self { path, raw }
    }

    /// Underlying filesystem path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, reason: impl ToString) -> ResolveError {
        ResolveError::SourceUnavailable {
            location: self.raw.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Path of the symlink behind `err` when its target does not exist.
fn dangling_link(err: &walkdir::Error) -> Option<PathBuf> {
    if err.loop_ancestor().is_some() {
        return None;
    }
    if err.io_error()?.kind() != ErrorKind::NotFound {
        return None;
    }
    let path = err.path()?;
    let is_link = fs::symlink_metadata(path).ok()?.file_type().is_symlink();
    is_link.then(|| path.to_path_buf())
}

impl Location for LocalLocation {
    fn as_str(&self) -> &str {
        &self.raw
    }

    fn scheme(&self) -> Scheme<'_> {
        Scheme::Local
    }

    fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }

    fn join(&self, name: &str) -> DynLocation {
        Box::new(LocalLocation::new(self.path.join(name)))
    }

    fn exists(&self) -> Result<bool, ResolveError> {
        self.path.try_exists().map_err(|err| self.unavailable(err))
    }

    fn is_dir(&self) -> Result<bool, ResolveError> {
        match fs::metadata(&self.path) {
            Ok(metadata) => Ok(metadata.is_dir()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(self.unavailable(err)),
        }
    }

    /// Lists direct children in file-name order, following symlinks.
    ///
    /// Dangling symlinks are listed as plain entries; other errors are fatal.
    fn list(&self) -> Result<Vec<DynLocation>, ResolveError> {
        let walker = WalkDir::new(&self.path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();
        let mut children: Vec<DynLocation> = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => children.push(Box::new(LocalLocation::new(entry.into_path()))),
                Err(err) => match dangling_link(&err) {
                    Some(link) => {
                        debug!(location = %link.display(), "listing dangling symlink");
                        children.push(Box::new(LocalLocation::new(link)));
                    }
                    None => return Err(self.unavailable(err)),
                },
            }
        }
        Ok(children)
    }

    fn read_to_string(&self) -> Result<String, ResolveError> {
        fs::read_to_string(&self.path).map_err(|err| self.unavailable(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn list_returns_children_sorted_by_name() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        for name in ["charlie.tar", "alpha.tar", "bravo.txt"] {
            fs::write(root.join(name), name.as_bytes()).unwrap();
        }
        fs::create_dir(root.join("delta")).unwrap();
        fs::write(root.join("delta").join("nested.tar"), b"x").unwrap();

        let location = LocalLocation::new(root);
        let names: Vec<String> = location
            .list()
            .unwrap()
            .iter()
            .filter_map(|child| child.file_name().map(str::to_string))
            .collect();
        assert_eq!(names, vec!["alpha.tar", "bravo.txt", "charlie.tar", "delta"]);
    }

    #[test]
    fn list_of_missing_directory_is_unavailable() {
        let temp = tempdir().unwrap();
        let missing = LocalLocation::new(temp.path().join("missing"));
        assert!(!missing.exists().unwrap());
        assert!(!missing.is_dir().unwrap());
        assert!(matches!(
            missing.list(),
            Err(ResolveError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn join_and_extension_follow_path_rules() {
        let temp = tempdir().unwrap();
        let location = LocalLocation::new(temp.path());
        let child = location.join("shard_0007.tar");
        assert_eq!(child.file_name(), Some("shard_0007.tar"));
        assert_eq!(child.extension(), Some("tar"));
        assert_eq!(
            child.as_str(),
            temp.path().join("shard_0007.tar").to_string_lossy()
        );
    }

    #[test]
    fn read_to_string_reads_file_contents() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("meta.json"), "{}").unwrap();
        let location = LocalLocation::new(temp.path()).join("meta.json");
        assert!(location.exists().unwrap());
        assert_eq!(location.read_to_string().unwrap(), "{}");
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_listed_but_not_a_directory() {
        use std::os::unix::fs::symlink;

        let temp = tempdir().unwrap();
        let root = temp.path();
        for idx in 0..3 {
            fs::write(root.join(format!("shard_{idx:04}.tar")), b"").unwrap();
        }
        symlink(root.join("gone"), root.join("latest")).unwrap();

        let children = LocalLocation::new(root).list().unwrap();
        let names: Vec<&str> = children.iter().filter_map(|child| child.file_name()).collect();
        assert_eq!(
            names,
            vec!["latest", "shard_0000.tar", "shard_0001.tar", "shard_0002.tar"]
        );
        assert!(!children[0].is_dir().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loop_is_still_fatal() {
        use std::os::unix::fs::symlink;

        let temp = tempdir().unwrap();
        let root = temp.path().join("root");
        fs::create_dir(&root).unwrap();
        symlink(&root, root.join("again")).unwrap();
        assert!(matches!(
            LocalLocation::new(&root).list(),
            Err(ResolveError::SourceUnavailable { .. })
        ));
    }
}
