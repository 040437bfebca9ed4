//! Coverage report generation
//!
//! Renders the registry as a Markdown table, ranked by usage (descending)
//! with ties broken by name, followed by a bold total row.

use std::io::{self, Write};

use clap::ValueEnum;
use serde::Deserialize;

use crate::registry::Registry;

/// Width of the usage column
const COVERAGE_WIDTH: usize = 8;
/// Width of the optional parameter-count column
const PARAMS_WIDTH: usize = 6;

/// What the total row counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TotalPolicy {
    /// Number of exported functions in the registry
    #[default]
    Symbols,
    /// Sum of all usage counts
    Usage,
}

impl TotalPolicy {
    pub fn total(&self, registry: &Registry) -> u64 {
        match self {
            TotalPolicy::Symbols => registry.len() as u64,
            TotalPolicy::Usage => registry.total_usage(),
        }
    }
}

/// Report rendering options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    pub total: TotalPolicy,
    /// Render function names as inline code
    pub code_names: bool,
    /// Add a column with each function's parameter count
    pub show_params: bool,
}

/// Write the coverage table for `registry`
pub fn generate_report<W: Write>(
    registry: &Registry,
    options: &ReportOptions,
    writer: &mut W,
) -> io::Result<()> {
    let ranked = registry.ranked();
    let decoration = if options.code_names { 2 } else { 0 };
    let name_width = ranked
        .iter()
        .map(|r| r.name.len() + decoration)
        .max()
        .unwrap_or(0);

    writeln!(writer, "# Test coverage")?;
    writeln!(writer)?;

    write!(writer, "| {:<name_width$} | Coverage |", "Test ")?;
    if options.show_params {
        write!(writer, " Params |")?;
    }
    writeln!(writer)?;

    write!(writer, "| {} | {} |", "-".repeat(name_width), "-".repeat(COVERAGE_WIDTH))?;
    if options.show_params {
        write!(writer, " {} |", "-".repeat(PARAMS_WIDTH))?;
    }
    writeln!(writer)?;

    for record in ranked {
        let name = if options.code_names {
            format!("`{}`", record.name)
        } else {
            record.name.clone()
        };
        write!(
            writer,
            "| {:<name_width$} | {:<COVERAGE_WIDTH$} |",
            name, record.usage_count
        )?;
        if options.show_params {
            write!(writer, " {:<PARAMS_WIDTH$} |", record.param_count)?;
        }
        writeln!(writer)?;
    }

    let total = format!("**{}**", options.total.total(registry));
    write!(
        writer,
        "| {:<name_width$} | {:<COVERAGE_WIDTH$} |",
        "**Total** ", total
    )?;
    if options.show_params {
        write!(writer, " {:<PARAMS_WIDTH$} |", "")?;
    }
    writeln!(writer)?;

    Ok(())
}
