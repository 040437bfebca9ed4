//! End-to-end coverage analysis: export scan, then assertion attribution

use std::path::Path;

use tracing::info;

use crate::config::CompiledConfig;
use crate::files::{ScanError, ScanOutcome, ensure_directory};
use crate::registry::Registry;

/// Result of scanning a source tree and a test tree
#[derive(Debug)]
pub struct CoverageAnalysis {
    pub registry: Registry,
    /// Outcome of the export scan over the source tree
    pub exports: ScanOutcome,
    /// Outcome of the attribution scan over the test tree
    pub tests: ScanOutcome,
}

/// Build the registry from `source_dir`, then attribute assertions from `test_dir`
///
/// Both directories are validated before anything is scanned. The export scan
/// completes before attribution starts.
pub fn analyze_coverage(
    source_dir: &Path,
    test_dir: &Path,
    config: &CompiledConfig,
) -> Result<CoverageAnalysis, ScanError> {
    ensure_directory(source_dir)?;
    ensure_directory(test_dir)?;

    let (mut registry, exports) = config.export_scanner().build(source_dir)?;
    info!(
        "Found {} exported functions in {} files",
        registry.len(),
        exports.files_scanned
    );

    let tests = config.attributor().attribute(test_dir, &mut registry)?;
    info!(
        "Attributed {} assertions from {} test files",
        tests.matches, tests.files_scanned
    );

    Ok(CoverageAnalysis {
        registry,
        exports,
        tests,
    })
}
