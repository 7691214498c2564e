//! Turns command line paths into validated conversion jobs.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use ncmconv_core::conversion::has_source_extension;
use ncmconv_core::{ConversionJob, OutputFormat};

/// Jobs accepted from the command line, plus whatever was turned away.
#[derive(Debug, Default)]
pub struct Inputs {
    pub jobs: Vec<ConversionJob>,
    pub rejected: Vec<(PathBuf, String)>,
}

/// Validates every path. Directories are expanded one level to the `.ncm`
/// files they contain, in name order.
pub fn collect_jobs(paths: &[PathBuf], format: OutputFormat) -> Inputs {
    let mut inputs = Inputs::default();

    for path in paths {
        if path.is_dir() {
            match ncm_files_in(path) {
                Ok(files) => {
                    debug!(dir = %path.display(), count = files.len(), "Expanded directory");
                    for file in files {
                        accept(&mut inputs, file, format);
                    }
                }
                Err(e) => reject(&mut inputs, path, e.to_string()),
            }
        } else {
            accept(&mut inputs, path.clone(), format);
        }
    }

    inputs
}

fn ncm_files_in(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_source_extension(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn accept(inputs: &mut Inputs, path: PathBuf, format: OutputFormat) {
    match ConversionJob::validated(&path, format) {
        Ok(job) => inputs.jobs.push(job),
        Err(e) => reject(inputs, &path, e.to_string()),
    }
}

fn reject(inputs: &mut Inputs, path: &Path, reason: String) {
    warn!(path = %path.display(), reason = %reason, "Skipping input");
    inputs.rejected.push((path.to_path_buf(), reason));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn test_files_are_validated() {
        let dir = TempDir::new().unwrap();
        let good = touch(&dir, "a.ncm");
        let wrong = touch(&dir, "a.mp3");
        let missing = dir.path().join("gone.ncm");

        let inputs = collect_jobs(&[good.clone(), wrong.clone(), missing.clone()], OutputFormat::Lossy);

        assert_eq!(inputs.jobs.len(), 1);
        assert_eq!(inputs.jobs[0].source_path, good);
        assert_eq!(inputs.jobs[0].requested_format, OutputFormat::Lossy);

        let rejected: Vec<_> = inputs.rejected.iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(rejected, vec![wrong, missing]);
    }

    #[test]
    fn test_directory_expansion() {
        let dir = TempDir::new().unwrap();
        let b = touch(&dir, "b.ncm");
        let a = touch(&dir, "A.NCM");
        touch(&dir, "cover.jpg");
        std::fs::create_dir(dir.path().join("nested.ncm")).unwrap();

        let inputs = collect_jobs(&[dir.path().to_path_buf()], OutputFormat::Both);

        let sources: Vec<_> = inputs.jobs.iter().map(|j| j.source_path.clone()).collect();
        assert_eq!(sources, vec![a, b]);
        assert!(inputs.rejected.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let inputs = collect_jobs(&[], OutputFormat::Lossless);
        assert!(inputs.jobs.is_empty());
        assert!(inputs.rejected.is_empty());
    }
}
