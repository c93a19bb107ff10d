//! `.iconignore` support.
//!
//! The ignore file uses gitignore syntax: `#` comments, blank lines, `**`
//! globs and directory-only patterns ending in `/`. Matching is delegated to
//! the `ignore` crate's gitignore matcher, rooted at the workspace root.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};

/// Compiled ignore patterns for one workspace root.
#[derive(Debug, Clone)]
pub struct IgnoreFilter {
    root: PathBuf,
    matcher: Gitignore,
    /// Ignore file the patterns were read from, if it existed.
    source: Option<PathBuf>,
}

impl IgnoreFilter {
    /// Load patterns from `ignore_file` plus `extra_patterns`.
    ///
    /// A missing ignore file is an empty pattern set. Invalid lines are logged
    /// and skipped; the rest of the file still applies.
    pub fn load(root: &Path, ignore_file: &Path, extra_patterns: &[String]) -> Self {
        let mut builder = GitignoreBuilder::new(root);
        let mut source = None;

        if ignore_file.is_file() {
            if let Some(err) = builder.add(ignore_file) {
                crate::warn_event!(
                    "ignore", "problem reading {}: {err}",
                    ignore_file.display()
                );
            }
            source = Some(ignore_file.to_path_buf());
        } else {
            crate::debug_event!("ignore", "no ignore file", "{}", ignore_file.display());
        }

        for pattern in extra_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                crate::warn_event!("ignore", "invalid pattern '{pattern}': {e}");
            }
        }

        let matcher = match builder.build() {
            Ok(matcher) => matcher,
            Err(e) => {
                crate::warn_event!("ignore", "failed to compile patterns: {e}");
                Gitignore::empty()
            }
        };

        crate::debug_event!(
            "ignore",
            "loaded",
            "{} patterns from {}",
            matcher.len(),
            ignore_file.display()
        );

        Self {
            root: root.to_path_buf(),
            matcher,
            source,
        }
    }

    /// Whether a file path (relative to the root, or absolute under it) is ignored.
    pub fn matches(&self, path: &Path) -> bool {
        self.is_ignored(path, false)
    }

    /// Whether a directory is ignored.
    pub fn matches_dir(&self, path: &Path) -> bool {
        self.is_ignored(path, true)
    }

    fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        let relative = if path.is_absolute() {
            match path.strip_prefix(&self.root) {
                Ok(rel) => rel,
                // Outside the workspace: nothing here applies.
                Err(_) => return false,
            }
        } else {
            path
        };

        if relative.as_os_str().is_empty() {
            return false;
        }

        self.matcher
            .matched_path_or_any_parents(relative, is_dir)
            .is_ignore()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Number of compiled patterns.
    pub fn len(&self) -> usize {
        self.matcher.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matcher.is_empty()
    }
}
