//! Configuration file support for testcov
//!
//! This module handles parsing `.testcov.toml` configuration files that
//! customize the marker tokens, file selection and report layout.
//!
//! ## Configuration File Format
//!
//! ```toml
//! # .testcov.toml
//!
//! [markers]
//! # Token opening an exported function definition
//! export = "MJB_EXPORT"
//! # Assertion macro used by the test suite
//! assertion = "ATT_ASSERT"
//! # `// CURRENT_ASSERT name` names the function following assertions exercise
//! target_directive = "CURRENT_ASSERT"
//! # `// CURRENT_COUNT 20` weights the next attributed assertion
//! count_directive = "CURRENT_COUNT"
//!
//! [files]
//! # Scanned in both the source and the test tree
//! source_extensions = ["c"]
//! # Scanned in the source tree only
//! header_extensions = ["h"]
//! # Paths (relative to the scanned directory) to skip
//! exclude = ["**/old/*"]
//!
//! [report]
//! # "symbols" counts exported functions, "usage" sums all hits
//! total = "symbols"
//! code_names = false
//! show_params = false
//! ```

use glob::Pattern;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::attribution::Attributor;
use crate::exports::ExportScanner;
use crate::files::FileSelection;
use crate::matcher::{AssertionMatcher, ExportMatcher, Markers};
use crate::report::{ReportOptions, TotalPolicy};

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid glob pattern: {0}")]
    PatternError(String),

    #[error("Invalid marker: {0}")]
    MarkerError(String),
}

/// File selection section
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Extensions scanned in both trees
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,

    /// Extensions scanned in the source tree only
    #[serde(default = "default_header_extensions")]
    pub header_extensions: Vec<String>,

    /// Glob patterns of files to skip
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_source_extensions() -> Vec<String> {
    vec!["c".to_string()]
}

fn default_header_extensions() -> Vec<String> {
    vec!["h".to_string()]
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            source_extensions: default_source_extensions(),
            header_extensions: default_header_extensions(),
            exclude: Vec::new(),
        }
    }
}

/// Report section
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ReportConfig {
    #[serde(default)]
    pub total: TotalPolicy,

    #[serde(default)]
    pub code_names: bool,

    #[serde(default)]
    pub show_params: bool,
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TestcovConfig {
    #[serde(default)]
    pub markers: Markers,

    #[serde(default)]
    pub files: FilesConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

/// Configuration with matchers and patterns compiled
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    export_matcher: ExportMatcher,
    assertion_matcher: AssertionMatcher,
    source_selection: FileSelection,
    test_selection: FileSelection,
    /// Report options (CLI flags may override them)
    pub report: ReportOptions,
}

impl CompiledConfig {
    /// Create a compiled config from raw config
    pub fn from_config(config: TestcovConfig) -> Result<Self, ConfigError> {
        let markers = &config.markers;
        for (key, value) in [
            ("export", &markers.export),
            ("assertion", &markers.assertion),
            ("target_directive", &markers.target_directive),
            ("count_directive", &markers.count_directive),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MarkerError(format!("{} must not be empty", key)));
            }
        }

        let exclude = config
            .files
            .exclude
            .iter()
            .map(|p| Pattern::new(p).map_err(|e| ConfigError::PatternError(format!("{}: {}", p, e))))
            .collect::<Result<Vec<_>, _>>()?;

        let source_extensions: Vec<&String> = config
            .files
            .source_extensions
            .iter()
            .chain(&config.files.header_extensions)
            .collect();

        Ok(Self {
            export_matcher: ExportMatcher::new(&markers.export)
                .map_err(|e| ConfigError::MarkerError(e.to_string()))?,
            assertion_matcher: AssertionMatcher::new(markers)
                .map_err(|e| ConfigError::MarkerError(e.to_string()))?,
            source_selection: FileSelection::new(&source_extensions)
                .with_exclude(exclude.clone()),
            test_selection: FileSelection::new(&config.files.source_extensions)
                .with_exclude(exclude),
            report: ReportOptions {
                total: config.report.total,
                code_names: config.report.code_names,
                show_params: config.report.show_params,
            },
        })
    }

    /// Compiled default configuration
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::from_config(TestcovConfig::default())
    }

    /// Scanner for the source tree (sources and headers)
    pub fn export_scanner(&self) -> ExportScanner {
        ExportScanner::new(self.export_matcher.clone(), self.source_selection.clone())
    }

    /// Attributor for the test tree (sources only)
    pub fn attributor(&self) -> Attributor {
        Attributor::new(self.assertion_matcher.clone(), self.test_selection.clone())
    }
}

/// Load configuration
///
/// A directory is searched, together with its parents, for `.testcov.toml`
/// or `testcov.toml`; no file means defaults. Any other path is read as the
/// config file itself.
pub fn load_config(path: &Path) -> Result<TestcovConfig, ConfigError> {
    let config_path = if path.is_dir() {
        find_config_file(path)
    } else {
        Some(path.to_path_buf())
    };

    match config_path {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            let config: TestcovConfig = toml::from_str(&content)?;
            Ok(config)
        }
        None => Ok(TestcovConfig::default()),
    }
}

/// Find the config file by searching up the directory tree
fn find_config_file(start_path: &Path) -> Option<PathBuf> {
    let config_names = [".testcov.toml", "testcov.toml"];

    let mut current = Some(start_path);
    while let Some(dir) = current {
        for name in &config_names {
            let config_path = dir.join(name);
            if config_path.is_file() {
                return Some(config_path);
            }
        }
        current = dir.parent();
    }

    None
}

/// Load and compile configuration
pub fn load_compiled_config(path: &Path) -> Result<CompiledConfig, ConfigError> {
    let config = load_config(path)?;
    CompiledConfig::from_config(config)
}
