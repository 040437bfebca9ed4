//! Assertion attribution
//!
//! Walks the test tree and credits each assertion to a registered function.
//! When an assertion's first argument is not itself registered (a local
//! result variable, a wrapper helper), the hit is carried forward to the
//! last function credited in the same file, or to the one named by a target
//! directive.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::files::{FileSelection, ScanError, ScanOutcome, ensure_directory, read_text};
use crate::matcher::{AssertionLine, AssertionMatcher};
use crate::registry::Registry;

/// A single credit of `amount` hits to `name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub name: String,
    pub amount: u64,
}

/// Per-file state threaded through the line loop
///
/// `target` only ever holds a registered name. `count` applies to the next
/// successful attribution and then falls back to 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributionCursor {
    target: Option<String>,
    count: u64,
}

impl Default for AttributionCursor {
    fn default() -> Self {
        Self {
            target: None,
            count: 1,
        }
    }
}

impl AttributionCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Advance the cursor over one classified line
    ///
    /// Returns the attribution the line produces, if any. Directives never
    /// produce one.
    pub fn apply(&mut self, line: AssertionLine<'_>, registry: &Registry) -> Option<Attribution> {
        match line {
            AssertionLine::SetTarget(name) => {
                self.target = registry.contains(name).then(|| name.to_string());
                None
            }
            AssertionLine::SetCount(count) => {
                self.count = count;
                None
            }
            AssertionLine::Assertion(key) => {
                let name = if registry.contains(key) {
                    self.target = Some(key.to_string());
                    key
                } else {
                    self.target.as_deref().filter(|t| registry.contains(t))?
                };

                let attribution = Attribution {
                    name: name.to_string(),
                    amount: self.count,
                };
                self.count = 1;
                Some(attribution)
            }
        }
    }
}

/// Credits test assertions to a [`Registry`]
#[derive(Debug, Clone)]
pub struct Attributor {
    matcher: AssertionMatcher,
    selection: FileSelection,
}

impl Attributor {
    pub fn new(matcher: AssertionMatcher, selection: FileSelection) -> Self {
        Self { matcher, selection }
    }

    /// Attributions for one test file's text, in line order
    ///
    /// The registry is only read; a fresh cursor is used for the text.
    pub fn scan_text(&self, text: &str, registry: &Registry) -> Vec<Attribution> {
        let mut cursor = AttributionCursor::new();
        text.lines()
            .filter_map(|line| self.matcher.classify(line.trim()))
            .filter_map(|line| cursor.apply(line, registry))
            .collect()
    }

    fn scan_file(&self, path: &Path, registry: &Registry) -> Result<Vec<Attribution>, ScanError> {
        let text = read_text(path)?;
        Ok(self.scan_text(&text, registry))
    }

    /// Scan every selected file under `root` and add the hits to `registry`
    ///
    /// Unreadable files are logged and recorded in the outcome; they do not
    /// stop the scan. Only an invalid `root` is an error.
    pub fn attribute(&self, root: &Path, registry: &mut Registry) -> Result<ScanOutcome, ScanError> {
        ensure_directory(root)?;

        let candidates = self.selection.files(root);
        debug!(
            "Scanning {} test files under {}",
            candidates.paths.len(),
            root.display()
        );

        let mut outcome = self.attribute_files(&candidates.paths, registry);
        for e in candidates.failures {
            warn!("{}", e);
            outcome.failures.push(e);
        }

        Ok(outcome)
    }

    /// Scan `files` in parallel against the registry as it stood before this
    /// call, then apply the hits in list order
    fn attribute_files(&self, files: &[PathBuf], registry: &mut Registry) -> ScanOutcome {
        let snapshot: &Registry = registry;
        let results: Vec<_> = files
            .par_iter()
            .map(|path| self.scan_file(path, snapshot))
            .collect();

        let mut outcome = ScanOutcome::default();
        for result in results {
            match result {
                Ok(attributions) => {
                    outcome.files_scanned += 1;
                    outcome.matches += attributions.len();
                    for attribution in attributions {
                        registry.record_usage(&attribution.name, attribution.amount);
                    }
                }
                Err(e) => {
                    warn!("{}", e);
                    outcome.failures.push(e);
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Markers;
    use std::fs;
    use tempfile::TempDir;

    fn registry(names: &[&str]) -> Registry {
        let mut registry = Registry::new();
        for name in names {
            registry.declare(name, 0);
        }
        registry
    }

    fn attributor() -> Attributor {
        Attributor::new(
            AssertionMatcher::new(&Markers::default()).unwrap(),
            FileSelection::new(&["c"]),
        )
    }

    fn hit(name: &str, amount: u64) -> Attribution {
        Attribution {
            name: name.to_string(),
            amount,
        }
    }

    #[test]
    fn test_cursor_direct_hit() {
        let registry = registry(&["foo"]);
        let mut cursor = AttributionCursor::new();

        let result = cursor.apply(AssertionLine::Assertion("foo"), &registry);
        assert_eq!(result, Some(hit("foo", 1)));
        assert_eq!(cursor.target(), Some("foo"));
        assert_eq!(cursor.count(), 1);
    }

    #[test]
    fn test_cursor_carry_forward() {
        let registry = registry(&["foo"]);
        let mut cursor = AttributionCursor::new();

        cursor.apply(AssertionLine::Assertion("foo"), &registry);
        let result = cursor.apply(AssertionLine::Assertion("wrapper_helper"), &registry);
        assert_eq!(result, Some(hit("foo", 1)));
        assert_eq!(cursor.target(), Some("foo"));
    }

    #[test]
    fn test_cursor_unattributed_without_target() {
        let registry = registry(&["foo"]);
        let mut cursor = AttributionCursor::new();

        assert_eq!(cursor.apply(AssertionLine::Assertion("result"), &registry), None);
        assert_eq!(cursor.target(), None);
    }

    #[test]
    fn test_cursor_count_applies_once() {
        let registry = registry(&["foo", "bar"]);
        let mut cursor = AttributionCursor::new();

        assert_eq!(cursor.apply(AssertionLine::SetCount(5), &registry), None);
        assert_eq!(
            cursor.apply(AssertionLine::Assertion("foo"), &registry),
            Some(hit("foo", 5))
        );
        assert_eq!(
            cursor.apply(AssertionLine::Assertion("bar"), &registry),
            Some(hit("bar", 1))
        );
    }

    #[test]
    fn test_cursor_count_survives_unattributed_assertion() {
        let registry = registry(&["foo"]);
        let mut cursor = AttributionCursor::new();

        cursor.apply(AssertionLine::SetCount(3), &registry);
        assert_eq!(cursor.apply(AssertionLine::Assertion("result"), &registry), None);
        assert_eq!(cursor.count(), 3);
        assert_eq!(
            cursor.apply(AssertionLine::Assertion("foo"), &registry),
            Some(hit("foo", 3))
        );
    }

    #[test]
    fn test_cursor_target_directive() {
        let registry = registry(&["foo", "mjb_case"]);
        let mut cursor = AttributionCursor::new();

        cursor.apply(AssertionLine::Assertion("foo"), &registry);
        assert_eq!(cursor.apply(AssertionLine::SetTarget("mjb_case"), &registry), None);
        assert_eq!(
            cursor.apply(AssertionLine::Assertion("result"), &registry),
            Some(hit("mjb_case", 1))
        );
    }

    #[test]
    fn test_cursor_unknown_target_directive_clears_target() {
        let registry = registry(&["foo"]);
        let mut cursor = AttributionCursor::new();

        cursor.apply(AssertionLine::Assertion("foo"), &registry);
        cursor.apply(AssertionLine::SetTarget("not_exported"), &registry);
        assert_eq!(cursor.target(), None);
        assert_eq!(cursor.apply(AssertionLine::Assertion("result"), &registry), None);
    }

    #[test]
    fn test_scan_text_chained_assertion() {
        let registry = registry(&["foo"]);
        let text = "
            ATT_ASSERT(foo(1,2));
            ATT_ASSERT(wrapper_helper(foo));
        ";

        let hits = attributor().scan_text(text, &registry);
        assert_eq!(hits, vec![hit("foo", 1), hit("foo", 1)]);
    }

    #[test]
    fn test_scan_text_directives() {
        let registry = registry(&["mjb_case", "mjb_other"]);
        let text = r#"
            // CURRENT_ASSERT mjb_case
            // CURRENT_COUNT 20
            char *result = mjb_case("hello", 5, MJB_CASE_UPPER, MJB_ENCODING_UTF_8);
            ATT_ASSERT(result, "HELLO", "UTF-8 uppercase: hello")
            ATT_ASSERT(result, "HELLO", "again")
            ATT_ASSERT(mjb_other(1), true, "other")
        "#;

        let hits = attributor().scan_text(text, &registry);
        assert_eq!(
            hits,
            vec![hit("mjb_case", 20), hit("mjb_case", 1), hit("mjb_other", 1)]
        );
    }

    #[test]
    fn test_attribute_resets_cursor_per_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.c"), "ATT_ASSERT(foo(1), 1, \"a\")\n").unwrap();
        fs::write(dir.path().join("b.c"), "ATT_ASSERT(result, 1, \"b\")\n").unwrap();
        fs::write(dir.path().join("c.h"), "ATT_ASSERT(foo(1), 1, \"c\")\n").unwrap();

        let mut registry = registry(&["foo"]);
        let outcome = attributor().attribute(dir.path(), &mut registry).unwrap();

        assert_eq!(registry.get("foo").unwrap().usage_count, 1);
        assert_eq!(outcome.files_scanned, 2);
        assert_eq!(outcome.matches, 1);
    }

    #[test]
    fn test_attribute_files_skips_unreadable_file() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.c");
        let c = dir.path().join("c.c");
        fs::write(&a, "ATT_ASSERT(foo(), 0, \"a\")\n").unwrap();
        fs::write(&c, "ATT_ASSERT(bar(), 0, \"c\")\nATT_ASSERT(result, 1, \"c\")\n").unwrap();
        let missing = dir.path().join("b.c");

        let mut registry = registry(&["foo", "bar", "baz"]);
        let outcome = attributor().attribute_files(&[a, missing.clone(), c], &mut registry);

        assert_eq!(registry.get("foo").unwrap().usage_count, 1);
        assert_eq!(registry.get("bar").unwrap().usage_count, 2);
        assert_eq!(registry.get("baz").unwrap().usage_count, 0);
        assert_eq!(outcome.files_scanned, 2);
        assert_eq!(outcome.files_failed(), 1);
        assert!(matches!(
            &outcome.failures[0],
            ScanError::Read { path, .. } if *path == missing
        ));
    }

    #[test]
    fn test_attribute_rejects_missing_root() {
        let dir = TempDir::new().unwrap();
        let mut registry = Registry::new();
        let result = attributor().attribute(&dir.path().join("nope"), &mut registry);
        assert!(matches!(result, Err(ScanError::InvalidDirectory(_))));
    }
}
