//! Export registry builder
//!
//! Walks the source tree and registers every exported function definition.
//! Files are scanned in parallel; declarations are merged afterwards in walk
//! order so that the last declaration of a name wins deterministically.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::files::{FileSelection, ScanError, ScanOutcome, ensure_directory, read_text};
use crate::matcher::ExportMatcher;
use crate::registry::Registry;

/// An exported function found in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub param_count: usize,
}

/// Builds a [`Registry`] from a source tree
#[derive(Debug, Clone)]
pub struct ExportScanner {
    matcher: ExportMatcher,
    selection: FileSelection,
}

impl ExportScanner {
    pub fn new(matcher: ExportMatcher, selection: FileSelection) -> Self {
        Self { matcher, selection }
    }

    /// Extract declarations from one file's text, in line order
    pub fn scan_text(&self, text: &str) -> Vec<Declaration> {
        text.lines()
            .filter_map(|line| self.matcher.match_line(line.trim()))
            .map(|found| Declaration {
                name: found.name.to_string(),
                param_count: found.param_count(),
            })
            .collect()
    }

    fn scan_file(&self, path: &Path) -> Result<Vec<Declaration>, ScanError> {
        let text = read_text(path)?;
        Ok(self.scan_text(&text))
    }

    /// Scan every selected file under `root` into a fresh registry
    ///
    /// Unreadable files are logged and recorded in the outcome; they do not
    /// stop the scan. Only an invalid `root` is an error.
    pub fn build(&self, root: &Path) -> Result<(Registry, ScanOutcome), ScanError> {
        ensure_directory(root)?;

        let candidates = self.selection.files(root);
        debug!(
            "Scanning {} source files under {}",
            candidates.paths.len(),
            root.display()
        );

        let (registry, mut outcome) = self.build_from(&candidates.paths);
        for e in candidates.failures {
            warn!("{}", e);
            outcome.failures.push(e);
        }

        Ok((registry, outcome))
    }

    /// Scan `files` in parallel and merge their declarations in list order
    fn build_from(&self, files: &[PathBuf]) -> (Registry, ScanOutcome) {
        let results: Vec<_> = files.par_iter().map(|path| self.scan_file(path)).collect();

        let mut registry = Registry::new();
        let mut outcome = ScanOutcome::default();
        for result in results {
            match result {
                Ok(declarations) => {
                    outcome.files_scanned += 1;
                    outcome.matches += declarations.len();
                    for declaration in declarations {
                        registry.declare(&declaration.name, declaration.param_count);
                    }
                }
                Err(e) => {
                    warn!("{}", e);
                    outcome.failures.push(e);
                }
            }
        }

        (registry, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn scanner() -> ExportScanner {
        ExportScanner::new(
            ExportMatcher::new("MJB_EXPORT").unwrap(),
            FileSelection::new(&["c", "h"]),
        )
    }

    #[test]
    fn test_scan_text_trims_lines() {
        let text = "
            #include \"mojibake.h\"

            MJB_EXPORT int foo(void) {
                return 0;
            }

              MJB_EXPORT int bar(int x, int y) {  \t
            MJB_EXPORT int baz(int x);
        ";

        let declarations = scanner().scan_text(text);
        assert_eq!(
            declarations,
            vec![
                Declaration {
                    name: "foo".to_string(),
                    param_count: 0
                },
                Declaration {
                    name: "bar".to_string(),
                    param_count: 2
                },
            ]
        );
    }

    #[test]
    fn test_build_registers_sources_and_headers() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.c"), "MJB_EXPORT int foo(void) {\n").unwrap();
        fs::write(dir.path().join("b.h"), "MJB_EXPORT int bar(int x) {\n").unwrap();
        fs::write(dir.path().join("c.txt"), "MJB_EXPORT int baz(int x) {\n").unwrap();

        let (registry, outcome) = scanner().build(dir.path()).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("foo").unwrap().param_count, 0);
        assert_eq!(registry.get("bar").unwrap().param_count, 1);
        assert!(!registry.contains("baz"));
        assert_eq!(outcome.files_scanned, 2);
        assert_eq!(outcome.matches, 2);
        assert_eq!(outcome.files_failed(), 0);
    }

    #[test]
    fn test_build_last_declaration_wins() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.c"), "MJB_EXPORT int foo(int a) {\n").unwrap();
        fs::write(dir.path().join("b.c"), "MJB_EXPORT int foo(int a, int b) {\n").unwrap();

        let (registry, _) = scanner().build(dir.path()).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("foo").unwrap().param_count, 2);
    }

    #[test]
    fn test_build_from_skips_unreadable_file() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.c");
        let c = dir.path().join("c.c");
        fs::write(&a, "MJB_EXPORT int foo(void) {\n").unwrap();
        fs::write(&c, "MJB_EXPORT int baz(int x) {\n").unwrap();
        let missing = dir.path().join("b.c");

        let (registry, outcome) = scanner().build_from(&[a, missing.clone(), c]);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("foo"));
        assert_eq!(registry.get("baz").unwrap().param_count, 1);
        assert_eq!(outcome.files_scanned, 2);
        assert_eq!(outcome.files_failed(), 1);
        assert!(matches!(
            &outcome.failures[0],
            ScanError::Read { path, .. } if *path == missing
        ));
    }

    #[test]
    fn test_build_scans_hidden_entries() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".generated")).unwrap();
        fs::write(
            dir.path().join(".generated").join("api.c"),
            "MJB_EXPORT int foo(void) {\n",
        )
        .unwrap();
        fs::write(dir.path().join(".inline.h"), "MJB_EXPORT int bar(void) {\n").unwrap();

        let (registry, outcome) = scanner().build(dir.path()).unwrap();
        assert!(registry.contains("foo"));
        assert!(registry.contains("bar"));
        assert_eq!(outcome.files_scanned, 2);
    }

    #[test]
    fn test_build_rejects_missing_root() {
        let dir = TempDir::new().unwrap();
        let result = scanner().build(&dir.path().join("nope"));
        assert!(matches!(result, Err(ScanError::InvalidDirectory(_))));
    }
}
