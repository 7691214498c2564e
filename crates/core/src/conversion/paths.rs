//! Output path derivation and best-effort file cleanup.

use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::warn;

use super::types::{OutputFormat, LOSSLESS_EXTENSION, LOSSY_EXTENSION};

/// Deterministic output locations for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub lossless: PathBuf,
    pub lossy: PathBuf,
}

impl OutputPaths {
    /// Same directory and base name as `source`, differing extension.
    pub fn for_source(source: &Path) -> Self {
        Self {
            lossless: source.with_extension(LOSSLESS_EXTENSION),
            lossy: source.with_extension(LOSSY_EXTENSION),
        }
    }

    /// Directory the outputs are written to.
    pub fn output_dir(&self) -> Option<&Path> {
        self.lossless.parent().filter(|p| !p.as_os_str().is_empty())
    }

    /// Files kept for `format`, lossless first.
    pub fn kept(&self, format: OutputFormat) -> Vec<PathBuf> {
        match format {
            OutputFormat::Lossless => vec![self.lossless.clone()],
            OutputFormat::Lossy => vec![self.lossy.clone()],
            OutputFormat::Both => vec![self.lossless.clone(), self.lossy.clone()],
        }
    }

    pub fn both(&self) -> [&Path; 2] {
        [&self.lossless, &self.lossy]
    }
}

/// Whether `path` carries the lossy extension.
pub fn is_lossy_output(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(LOSSY_EXTENSION))
        .unwrap_or(false)
}

/// Removes `path`; a file that is already gone is not an error.
pub async fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Identity of the files a source writes to.
///
/// Aliases of one file (`./a.ncm`, `sub/../a.ncm`, symlinks, absolute and
/// relative spellings) and sources differing only in extension case map to
/// the same key. Sources that cannot be resolved fall back to a lexically
/// normalized absolute path.
pub fn output_key(source: &Path) -> PathBuf {
    key_from(std::fs::canonicalize(source), source)
}

/// [`output_key`] without blocking the runtime.
pub async fn resolve_output_key(source: &Path) -> PathBuf {
    key_from(tokio::fs::canonicalize(source).await, source)
}

fn key_from(resolved: io::Result<PathBuf>, source: &Path) -> PathBuf {
    let resolved = resolved.unwrap_or_else(|_| {
        let absolute = std::path::absolute(source).unwrap_or_else(|_| source.to_path_buf());
        normalize_lexically(&absolute)
    });
    resolved.with_extension(LOSSLESS_EXTENSION)
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Best-effort removal; failures are logged and swallowed.
pub async fn discard(path: &Path) {
    if let Err(e) = remove_if_exists(path).await {
        warn!(path = %path.display(), error = %e, "Cleanup failed");
    }
}
