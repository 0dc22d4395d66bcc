//! Publish walker: discovers the set of local files a deployment should
//! upload, applying exclusion globs and ordering uploads smallest-first so
//! early progress feedback arrives quickly.

pub mod exclude;

use std::fs;
use std::path::{Path, PathBuf};

use exclude::ExclusionSet;

/// Coarse classification of a file under the local build directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// The `app_offline.htm` marker file, handled specially by the
    /// coordinator (uploaded first, removed last).
    AppOffline,
    Regular,
}

/// A single file discovered under the build directory, with its remote
/// destination path already computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishFile {
    pub local_path: PathBuf,
    pub remote_relative_path: String,
    pub size: u64,
    pub kind: FileKind,
}

#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("build directory does not exist: {0}")]
    MissingRoot(PathBuf),
}

/// Walks `root`, applying `exclusions`, and returns the files to publish in
/// smallest-first order (so small files land first for fast feedback), with
/// `app_offline.htm` (if present and not excluded) always first regardless
/// of size.
///
/// # Errors
///
/// Returns [`WalkError::MissingRoot`] if `root` doesn't exist, or
/// [`WalkError::Io`] if directory traversal fails.
pub fn walk_publish_files(
    root: &Path,
    exclusions: &ExclusionSet,
) -> Result<Vec<PublishFile>, WalkError> {
    if !root.exists() {
        return Err(WalkError::MissingRoot(root.to_path_buf()));
    }

    let mut files = Vec::new();
    collect_recursive(root, root, exclusions, &mut files)?;

    files.sort_by(|a, b| {
        let a_offline = a.kind == FileKind::AppOffline;
        let b_offline = b.kind == FileKind::AppOffline;
        match (a_offline, b_offline) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => a.size.cmp(&b.size),
        }
    });

    Ok(files)
}

fn collect_recursive(
    root: &Path,
    dir: &Path,
    exclusions: &ExclusionSet,
    out: &mut Vec<PublishFile>,
) -> Result<(), WalkError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let relative = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");

        if exclusions.is_excluded(&relative) {
            continue;
        }

        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_recursive(root, &path, exclusions, out)?;
        } else if file_type.is_file() {
            let size = entry.metadata()?.len();
            let kind = if relative == "app_offline.htm" {
                FileKind::AppOffline
            } else {
                FileKind::Regular
            };
            out.push(PublishFile {
                local_path: path,
                remote_relative_path: relative,
                size,
                kind,
            });
        }
    }
    Ok(())
}

/// Returns whether `files` contains an `app_offline.htm` marker.
#[must_use]
pub fn has_app_offline_marker(files: &[PublishFile]) -> bool {
    files.iter().any(|f| f.kind == FileKind::AppOffline)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn write_file(dir: &Path, relative: &str, content: &[u8]) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_walk_sorts_smallest_first() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "big.js", &vec![0_u8; 1000]);
        write_file(dir.path(), "small.css", &vec![0_u8; 10]);

        let files = walk_publish_files(dir.path(), &ExclusionSet::new(&[]).unwrap()).unwrap();
        assert_eq!(files[0].remote_relative_path, "small.css");
        assert_eq!(files[1].remote_relative_path, "big.js");
    }

    #[test]
    fn test_walk_puts_app_offline_first_regardless_of_size() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "tiny.txt", &vec![0_u8; 1]);
        write_file(dir.path(), "app_offline.htm", &vec![0_u8; 500]);

        let files = walk_publish_files(dir.path(), &ExclusionSet::new(&[]).unwrap()).unwrap();
        assert_eq!(files[0].remote_relative_path, "app_offline.htm");
        assert_eq!(files[0].kind, FileKind::AppOffline);
    }

    #[test]
    fn test_walk_applies_exclusions() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "app.js", b"content");
        write_file(dir.path(), "app.js.map", b"content");

        let exclusions = ExclusionSet::new(&["*.map".to_string()]).unwrap();
        let files = walk_publish_files(dir.path(), &exclusions).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].remote_relative_path, "app.js");
    }

    #[test]
    fn test_walk_recurses_into_subdirectories() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "assets/css/site.css", b"body{}");

        let files = walk_publish_files(dir.path(), &ExclusionSet::new(&[]).unwrap()).unwrap();
        assert_eq!(files[0].remote_relative_path, "assets/css/site.css");
    }

    #[test]
    fn test_walk_missing_root_errors() {
        let result = walk_publish_files(Path::new("/no/such/dir"), &ExclusionSet::new(&[]).unwrap());
        assert!(matches!(result, Err(WalkError::MissingRoot(_))));
    }

    #[test]
    fn test_has_app_offline_marker() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "app_offline.htm", b"offline");
        let files = walk_publish_files(dir.path(), &ExclusionSet::new(&[]).unwrap()).unwrap();
        assert!(has_app_offline_marker(&files));
    }
}
