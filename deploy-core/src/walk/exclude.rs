//! Exclusion pattern matching for the publish walker.

use glob::Pattern;

#[derive(Debug, thiserror::Error)]
#[error("invalid exclusion pattern {pattern}: {source}")]
pub struct ExclusionError {
    pattern: String,
    #[source]
    source: glob::PatternError,
}

/// A compiled set of glob exclusion patterns, matched against a file's
/// path relative to the build root (forward-slash separated).
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    patterns: Vec<Pattern>,
}

impl ExclusionSet {
    /// Compiles `patterns` into an [`ExclusionSet`].
    ///
    /// # Errors
    ///
    /// Returns [`ExclusionError`] if any pattern fails to parse as a glob.
    pub fn new(patterns: &[String]) -> Result<Self, ExclusionError> {
        let compiled = patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|source| ExclusionError {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns: compiled })
    }

    /// Returns whether `relative_path` matches any exclusion pattern. A
    /// pattern without a `/` matches against the file's base name as well as
    /// the full relative path, so `*.map` excludes `app.js.map` anywhere in
    /// the tree.
    #[must_use]
    pub fn is_excluded(&self, relative_path: &str) -> bool {
        let basename = relative_path.rsplit('/').next().unwrap_or(relative_path);
        self.patterns.iter().any(|pattern| {
            pattern.matches(relative_path) || (!pattern.as_str().contains('/') && pattern.matches(basename))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basename_pattern_matches_nested_files() {
        let set = ExclusionSet::new(&["*.map".to_string()]).unwrap();
        assert!(set.is_excluded("assets/js/app.js.map"));
        assert!(!set.is_excluded("assets/js/app.js"));
    }

    #[test]
    fn test_path_pattern_matches_only_full_path() {
        let set = ExclusionSet::new(&["node_modules/**".to_string()]).unwrap();
        assert!(set.is_excluded("node_modules/left-pad/index.js"));
        assert!(!set.is_excluded("src/node_modules_helper.js"));
    }

    #[test]
    fn test_invalid_pattern_errors() {
        let result = ExclusionSet::new(&["[".to_string()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_exclusion_set_excludes_nothing() {
        let set = ExclusionSet::new(&[]).unwrap();
        assert!(!set.is_excluded("anything.txt"));
    }
}
