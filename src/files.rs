//! Candidate file discovery and reading
//!
//! Both scan phases walk a directory tree in a reproducible order (sorted by
//! file name) and read each selected file as text.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob::Pattern;
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

/// Errors raised while scanning a tree
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("{} is not a valid directory", .0.display())]
    InvalidDirectory(PathBuf),

    #[error("Error reading file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Summary of one scan phase
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Files that were read successfully
    pub files_scanned: usize,
    /// Files that could not be read; they contributed nothing
    pub failures: Vec<ScanError>,
    /// Matches produced (declarations or attributions, depending on phase)
    pub matches: usize,
}

impl ScanOutcome {
    pub fn files_failed(&self) -> usize {
        self.failures.len()
    }
}

/// Which files under a root take part in a scan
#[derive(Debug, Clone)]
pub struct FileSelection {
    extensions: Vec<String>,
    exclude: Vec<Pattern>,
}

impl FileSelection {
    /// Select files by extension (without the leading dot)
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_string())
                .collect(),
            exclude: Vec::new(),
        }
    }

    /// Skip files whose path relative to the scanned root matches any pattern
    pub fn with_exclude(mut self, exclude: Vec<Pattern>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Check a path relative to the scanned root
    pub fn is_selected(&self, relative: &Path) -> bool {
        let has_extension = relative
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext));
        if !has_extension {
            return false;
        }

        let relative = relative.to_string_lossy().replace('\\', "/");
        !self.exclude.iter().any(|p| p.matches(&relative))
    }

    /// All selected files under `root`, in walk order
    ///
    /// Every entry is visited, hidden ones included. Entries that cannot be
    /// inspected are recorded as failures when their name would have been
    /// selected (a dangling `foo.c` link), and only logged otherwise.
    pub fn files(&self, root: &Path) -> CandidateFiles {
        let mut candidates = CandidateFiles::default();

        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if entry.file_type().is_file()
                        && self.is_selected(path.strip_prefix(root).unwrap_or(path))
                    {
                        candidates.paths.push(entry.into_path());
                    }
                }
                Err(e) => {
                    let selected = e
                        .path()
                        .is_some_and(|p| self.is_selected(p.strip_prefix(root).unwrap_or(p)));
                    if selected {
                        let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                        candidates.failures.push(ScanError::Read {
                            path,
                            source: io::Error::from(e),
                        });
                    } else {
                        warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    }
                }
            }
        }

        candidates
    }
}

/// Files selected by a walk, plus the selected names that could not be inspected
#[derive(Debug, Default)]
pub struct CandidateFiles {
    pub paths: Vec<PathBuf>,
    pub failures: Vec<ScanError>,
}

/// Fail unless `path` exists and is a directory
pub fn ensure_directory(path: &Path) -> Result<(), ScanError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ScanError::InvalidDirectory(path.to_path_buf()))
    }
}

/// Read a file as text
///
/// Invalid UTF-8 is replaced rather than rejected; the matchers only look
/// for ASCII tokens.
pub fn read_text(path: &Path) -> Result<String, ScanError> {
    let bytes = fs::read(path).map_err(|source| ScanError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}
