//! # testcov - API Test Coverage for C Codebases
//!
//! Counts how often the test suite exercises each exported function of a C
//! library and renders the result as a ranked Markdown table.
//!
//! ## Overview
//!
//! The analysis runs in two passes over plain text, one line at a time:
//!
//! 1. **Export scan** - every `.c`/`.h` file in the source tree is searched
//!    for definitions opened by the export marker (`MJB_EXPORT int foo(void) {`).
//!    Each one becomes a registry entry with zero usage.
//! 2. **Attribution** - every `.c` file in the test tree is searched for
//!    assertions (`ATT_ASSERT(foo(1, 2), ...)`). The first identifier inside
//!    the assertion is credited if it is registered; otherwise the hit goes to
//!    the last function credited in the same file.
//!
//! Test files can steer attribution with comment directives:
//!
//! ```text
//! // CURRENT_ASSERT mjb_case     following unregistered assertions count for mjb_case
//! // CURRENT_COUNT 20            the next attributed assertion counts 20 times
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Scan ./src and ./tests
//! testcov
//!
//! # Explicit trees, total as the sum of all hits
//! testcov lib/src lib/tests --total usage
//! ```

pub mod analysis;
pub mod attribution;
pub mod config;
pub mod exports;
pub mod files;
pub mod matcher;
pub mod registry;
pub mod report;

pub use analysis::{CoverageAnalysis, analyze_coverage};
pub use attribution::{Attribution, AttributionCursor, Attributor};
pub use config::{
    CompiledConfig, ConfigError, FilesConfig, ReportConfig, TestcovConfig, load_compiled_config,
    load_config,
};
pub use exports::{Declaration, ExportScanner};
pub use files::{CandidateFiles, FileSelection, ScanError, ScanOutcome};
pub use matcher::{AssertionLine, AssertionMatcher, ExportMatch, ExportMatcher, Markers, count_params};
pub use registry::{Registry, UsageRecord};
pub use report::{ReportOptions, TotalPolicy, generate_report};
