//! Host editor collaborator.
//!
//! Jumping to a source location and rewriting references on rename go through
//! [`EditorHost`]. Ranges are byte offsets into the document text as last
//! read; callers editing one document several times apply edits back to front.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("Cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Edit range {start}..{end} is outside {path} ({len} bytes)")]
    InvalidRange {
        path: PathBuf,
        start: usize,
        end: usize,
        len: usize,
    },
}

pub type HostResult<T> = Result<T, HostError>;

#[async_trait]
pub trait EditorHost: Send + Sync {
    async fn open_document(&self, path: &Path) -> HostResult<String>;

    /// Replace the byte range `range` of `path` with `text`.
    async fn apply_edit(&self, path: &Path, range: (usize, usize), text: &str) -> HostResult<()>;

    /// Bring `path:line` into view.
    async fn reveal(&self, path: &Path, line: u32) -> HostResult<()>;
}

/// Host backed directly by the filesystem, for command-line use.
///
/// `reveal` prints `path:line` so terminals and editors can follow it.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsHost;

#[async_trait]
impl EditorHost for FsHost {
    async fn open_document(&self, path: &Path) -> HostResult<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| HostError::Open {
                path: path.to_path_buf(),
                source,
            })
    }

    async fn apply_edit(&self, path: &Path, range: (usize, usize), text: &str) -> HostResult<()> {
        let mut content = self.open_document(path).await?;
        let (start, end) = range;
        if start > end
            || end > content.len()
            || !content.is_char_boundary(start)
            || !content.is_char_boundary(end)
        {
            return Err(HostError::InvalidRange {
                path: path.to_path_buf(),
                start,
                end,
                len: content.len(),
            });
        }
        content.replace_range(start..end, text);
        tokio::fs::write(path, content)
            .await
            .map_err(|source| HostError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    async fn reveal(&self, path: &Path, line: u32) -> HostResult<()> {
        println!("{}:{line}", path.display());
        Ok(())
    }
}
