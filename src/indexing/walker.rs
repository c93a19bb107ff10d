//! File system walker for discovering icon candidates.
//!
//! Walks the configured roots depth-first, pruning anything the
//! [`IgnoreFilter`] matches before it is opened, and classifies files by
//! extension into standalone SVGs and source files (inline SVG / usages).
//!
//! The walk is a lazy, blocking iterator; calling [`FileScanner::scan`] again
//! restarts it from the top. Async callers go through [`FileScanner::discover`]. Symlinks are followed, but every file is yielded at most
//! once per walk (tracked by canonical path) and directory loops are skipped.

use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::IgnoreFilter;
use crate::config::ScanConfig;
use crate::error::{IndexError, IndexResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    /// Standalone `.svg` file.
    Svg,
    /// Source file that may contain inline SVG or icon references.
    Source,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub kind: CandidateKind,
}

/// A candidate with its content loaded.
#[derive(Debug, Clone)]
pub struct SourceText {
    pub path: PathBuf,
    pub kind: CandidateKind,
    pub content: String,
}

/// Extension tables shared with every walk.
#[derive(Debug)]
struct Extensions {
    svg: HashSet<String>,
    source: HashSet<String>,
}

impl Extensions {
    fn classify(&self, path: &Path) -> Option<CandidateKind> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if self.svg.contains(&ext) {
            Some(CandidateKind::Svg)
        } else if self.source.contains(&ext) {
            Some(CandidateKind::Source)
        } else {
            None
        }
    }
}

/// Discovers SVG files and source files under a set of roots.
#[derive(Debug, Clone)]
pub struct FileScanner {
    filter: Arc<IgnoreFilter>,
    extensions: Arc<Extensions>,
    follow_links: bool,
    max_file_size: u64,
}

impl FileScanner {
    pub fn new(config: &ScanConfig, filter: Arc<IgnoreFilter>) -> Self {
        let normalize = |exts: &[String]| -> HashSet<String> {
            exts.iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect()
        };
        Self {
            filter,
            extensions: Arc::new(Extensions {
                svg: normalize(&config.svg_extensions),
                source: normalize(&config.source_extensions),
            }),
            follow_links: config.follow_links,
            max_file_size: config.max_file_size,
        }
    }

    /// Swap in a reloaded ignore filter.
    pub fn set_filter(&mut self, filter: Arc<IgnoreFilter>) {
        self.filter = filter;
    }

    pub fn filter(&self) -> &IgnoreFilter {
        &self.filter
    }

    /// Classify a path by extension.
    pub fn classify(&self, path: &Path) -> Option<CandidateKind> {
        self.extensions.classify(path)
    }

    /// Whether a single path would be produced by a walk.
    pub fn accepts(&self, path: &Path) -> bool {
        self.classify(path).is_some() && !self.filter.matches(path)
    }

    /// Walk `roots`, yielding candidates lazily in depth-first, name-sorted order.
    pub fn scan(&self, roots: &[PathBuf]) -> CandidateIter {
        let mut roots_iter = roots.iter().filter(|r| r.exists());
        let Some(first) = roots_iter.next() else {
            return CandidateIter::empty(self.extensions.clone());
        };

        let mut builder = WalkBuilder::new(first);
        for root in roots_iter {
            builder.add(root);
        }

        let filter = self.filter.clone();
        builder
            .standard_filters(false)
            .hidden(true) // skip dot-directories such as .git and .iconscope
            .follow_links(self.follow_links)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                if is_dir {
                    !filter.matches_dir(entry.path())
                } else {
                    !filter.matches(entry.path())
                }
            });

        CandidateIter {
            walk: Some(builder.build()),
            extensions: self.extensions.clone(),
            visited: HashSet::new(),
        }
    }

    /// Run a full walk of `roots` on the blocking pool and collect the candidates.
    pub async fn discover(&self, roots: Vec<PathBuf>) -> IndexResult<Vec<Candidate>> {
        let scanner = self.clone();
        tokio::task::spawn_blocking(move || scanner.scan(&roots).collect())
            .await
            .map_err(|e| IndexError::Walk(e.to_string()))
    }

    /// Read a candidate's content.
    ///
    /// Oversized source files are skipped (`Ok(None)`); SVG files are always read.
    pub async fn read(&self, candidate: &Candidate) -> IndexResult<Option<SourceText>> {
        let path = &candidate.path;
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| IndexError::io(path, e))?;

        if candidate.kind == CandidateKind::Source && metadata.len() > self.max_file_size {
            crate::debug_event!(
                "scan",
                "skipped large file",
                "{} ({} bytes)",
                path.display(),
                metadata.len()
            );
            return Ok(None);
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| IndexError::io(path, e))?;
        let content = String::from_utf8(bytes).map_err(|e| IndexError::Parse {
            path: path.clone(),
            reason: format!("not valid UTF-8: {e}"),
        })?;

        Ok(Some(SourceText {
            path: path.clone(),
            kind: candidate.kind,
            content,
        }))
    }
}

/// Lazy candidate sequence produced by [`FileScanner::scan`].
pub struct CandidateIter {
    walk: Option<ignore::Walk>,
    extensions: Arc<Extensions>,
    /// Canonical paths already yielded, so symlinked duplicates appear once.
    visited: HashSet<PathBuf>,
}

impl CandidateIter {
    fn empty(extensions: Arc<Extensions>) -> Self {
        Self {
            walk: None,
            extensions,
            visited: HashSet::new(),
        }
    }
}

impl Iterator for CandidateIter {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        let walk = self.walk.as_mut()?;
        for result in walk.by_ref() {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    // Includes symlink loops; the rest of the walk continues.
                    crate::warn_event!("scan", "walk error: {e}");
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let Some(kind) = self.extensions.classify(path) else {
                continue;
            };

            let real = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            if !self.visited.insert(real) {
                crate::debug_event!("scan", "already visited", "{}", path.display());
                continue;
            }

            return Some(Candidate {
                path: path.to_path_buf(),
                kind,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn scanner(root: &Path) -> FileScanner {
        let config = ScanConfig::default();
        let filter = IgnoreFilter::load(
            root,
            &root.join(&config.ignore_file),
            &config.ignore_patterns,
        );
        FileScanner::new(&config, Arc::new(filter))
    }

    #[test]
    fn test_walk_classifies_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("icons")).unwrap();
        fs::write(root.join("icons/arrow.svg"), "<svg></svg>").unwrap();
        fs::write(root.join("App.tsx"), "<Icon name=\"arrow\" />").unwrap();
        fs::write(root.join("notes.txt"), "ignored").unwrap();

        let found: Vec<_> = scanner(root).scan(&[root.to_path_buf()]).collect();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].kind, CandidateKind::Source);
        assert!(found[0].path.ends_with("App.tsx"));
        assert_eq!(found[1].kind, CandidateKind::Svg);
        assert!(found[1].path.ends_with("icons/arrow.svg"));
    }

    #[test]
    fn test_walk_respects_ignore_file() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("vendor")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join(".iconignore"), "vendor/\n").unwrap();
        fs::write(root.join("vendor/x.svg"), "<svg></svg>").unwrap();
        fs::write(root.join("node_modules/pkg/y.svg"), "<svg></svg>").unwrap();
        fs::write(root.join("keep.svg"), "<svg></svg>").unwrap();

        let found: Vec<_> = scanner(root).scan(&[root.to_path_buf()]).collect();
        assert_eq!(found.len(), 1);
        assert!(found[0].path.ends_with("keep.svg"));
    }

    #[test]
    fn test_walk_is_restartable() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("a.svg"), "<svg></svg>").unwrap();
        fs::write(root.join("b.svg"), "<svg></svg>").unwrap();

        let scanner = scanner(root);
        let first: Vec<_> = scanner.scan(&[root.to_path_buf()]).collect();
        let second: Vec<_> = scanner.scan(&[root.to_path_buf()]).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_overlapping_roots_yield_once() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/a.svg"), "<svg></svg>").unwrap();

        let found: Vec<_> = scanner(root)
            .scan(&[root.to_path_buf(), root.join("src")])
            .collect();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_discover_matches_walk() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("icons")).unwrap();
        fs::write(root.join("icons/a.svg"), "<svg></svg>").unwrap();
        fs::write(root.join("App.vue"), "<svg-icon name=\"a\" />").unwrap();

        let scanner = scanner(root);
        let walked: Vec<_> = scanner.scan(&[root.to_path_buf()]).collect();
        let discovered = scanner.discover(vec![root.to_path_buf()]).await.unwrap();
        assert_eq!(discovered, walked);
        assert_eq!(discovered.len(), 2);
    }

    #[test]
    fn test_missing_roots() {
        let temp = TempDir::new().unwrap();
        let found: Vec<_> = scanner(temp.path())
            .scan(&[temp.path().join("does-not-exist")])
            .collect();
        assert!(found.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_is_skipped() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("a/icon.svg"), "<svg></svg>").unwrap();
        std::os::unix::fs::symlink(root, root.join("a/loop")).unwrap();

        let found: Vec<_> = scanner(root).scan(&[root.to_path_buf()]).collect();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_read_reports_unreadable() {
        let temp = TempDir::new().unwrap();
        let scanner = scanner(temp.path());
        let missing = Candidate {
            path: temp.path().join("gone.svg"),
            kind: CandidateKind::Svg,
        };
        assert!(matches!(
            scanner.read(&missing).await,
            Err(IndexError::Io { .. })
        ));
    }
}
