//! Remote inventory: a bounded breadth-first listing of the remote root,
//! used to diff against the local publish set for cleanup of stale remote
//! files and to avoid redundant `make_dir_all` calls.

use std::collections::VecDeque;

use crate::driver::{Driver, DriverError};

/// Maximum directories visited during a single inventory walk, guarding
/// against pathological remote trees (symlink cycles, huge fan-out).
const MAX_DIRECTORIES_VISITED: usize = 10_000;

/// A flattened view of everything under the remote root.
#[derive(Debug, Clone, Default)]
pub struct RemoteInventory {
    /// Relative paths (forward-slash separated, relative to the remote root)
    /// of every remote file.
    pub files: Vec<String>,
    /// Relative paths of every remote directory.
    pub directories: Vec<String>,
    pub directories_visited: usize,
    pub truncated: bool,
}

impl RemoteInventory {
    /// Returns the remote files with no counterpart in `local_relative_paths`,
    /// i.e. files that a cleanup pass should consider removing.
    #[must_use]
    pub fn stale_files<'a>(&'a self, local_relative_paths: &[String]) -> Vec<&'a str> {
        self.files
            .iter()
            .map(std::string::String::as_str)
            .filter(|remote| !local_relative_paths.iter().any(|local| local == remote))
            .collect()
    }
}

/// Walks the remote tree rooted at `remote_root` breadth-first, bounded by
/// [`MAX_DIRECTORIES_VISITED`].
///
/// # Errors
///
/// Returns [`DriverError`] if any directory listing fails.
pub async fn build_remote_inventory(
    driver: &mut dyn Driver,
    remote_root: &str,
) -> Result<RemoteInventory, DriverError> {
    let mut inventory = RemoteInventory::default();
    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(String::new());

    while let Some(relative_dir) = queue.pop_front() {
        if inventory.directories_visited >= MAX_DIRECTORIES_VISITED {
            inventory.truncated = true;
            break;
        }
        inventory.directories_visited += 1;

        let remote_path = join_remote(remote_root, &relative_dir);
        let entries = driver.list_dir(&remote_path).await?;

        for entry in entries {
            let child_relative = if relative_dir.is_empty() {
                entry.name.clone()
            } else {
                format!("{relative_dir}/{}", entry.name)
            };

            if entry.is_dir {
                inventory.directories.push(child_relative.clone());
                queue.push_back(child_relative);
            } else {
                inventory.files.push(child_relative);
            }
        }
    }

    Ok(inventory)
}

fn join_remote(root: &str, relative: &str) -> String {
    if relative.is_empty() {
        root.to_string()
    } else {
        format!("{}/{relative}", root.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_files_excludes_files_present_locally() {
        let inventory = RemoteInventory {
            files: vec!["app.js".to_string(), "old.js".to_string()],
            directories: Vec::new(),
            directories_visited: 1,
            truncated: false,
        };
        let stale = inventory.stale_files(&["app.js".to_string()]);
        assert_eq!(stale, vec!["old.js"]);
    }

    #[test]
    fn test_join_remote_root_with_empty_relative() {
        assert_eq!(join_remote("/var/www", ""), "/var/www");
    }

    #[test]
    fn test_join_remote_root_with_nested_relative() {
        assert_eq!(join_remote("/var/www/", "assets/js"), "/var/www/assets/js");
    }
}
