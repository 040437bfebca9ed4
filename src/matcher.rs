//! Line-level pattern matchers
//!
//! Recognition is line-oriented: each trimmed line is tested against a fixed
//! grammar with the marker tokens spliced in. Nothing here parses C.
//!
//! ```text
//! export:     <EXPORT> ... [ *]name(params) {
//! assertion:  <ASSERTION>(name( ...   or   <ASSERTION>(name, ...
//! directives: // <TARGET_DIRECTIVE> name
//!             // <COUNT_DIRECTIVE> 12
//! ```

use regex_lite::Regex;
use serde::Deserialize;

/// Marker tokens used to build the matching grammar
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Markers {
    /// Token that opens an exported function definition
    pub export: String,
    /// Assertion macro name used in test files
    pub assertion: String,
    /// Comment directive naming the function subsequent assertions exercise
    pub target_directive: String,
    /// Comment directive giving the weight of the next attributed assertion
    pub count_directive: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            export: "MJB_EXPORT".to_string(),
            assertion: "ATT_ASSERT".to_string(),
            target_directive: "CURRENT_ASSERT".to_string(),
            count_directive: "CURRENT_COUNT".to_string(),
        }
    }
}

/// A recognized exported function declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportMatch<'a> {
    pub name: &'a str,
    /// Raw parameter list text between the parentheses
    pub params: &'a str,
}

impl ExportMatch<'_> {
    pub fn param_count(&self) -> usize {
        count_params(self.params)
    }
}

/// Count formal parameters from the raw parameter list
///
/// `void` means no parameters; anything else is commas + 1. Commas inside
/// nested types (function pointers) are counted too, so such lists overcount.
pub fn count_params(params: &str) -> usize {
    if params.trim() == "void" {
        0
    } else {
        params.matches(',').count() + 1
    }
}

/// Matches the opening line of an exported function definition
#[derive(Debug, Clone)]
pub struct ExportMatcher {
    pattern: Regex,
}

impl ExportMatcher {
    pub fn new(marker: &str) -> Result<Self, regex_lite::Error> {
        let pattern = Regex::new(&format!(
            r"^{}.+[ *]([a-z_]+)\(([^)]*)\)\s*\{{$",
            regex_lite::escape(marker)
        ))?;
        Ok(Self { pattern })
    }

    /// Match a single (already trimmed) line
    pub fn match_line<'a>(&self, line: &'a str) -> Option<ExportMatch<'a>> {
        let caps = self.pattern.captures(line)?;
        Some(ExportMatch {
            name: caps.get(1)?.as_str(),
            params: caps.get(2)?.as_str(),
        })
    }
}

/// What a test-file line means for attribution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertionLine<'a> {
    /// Explicit attribution target for the following assertions
    SetTarget(&'a str),
    /// Weight applied to the next successful attribution
    SetCount(u64),
    /// Assertion whose first argument starts with this identifier
    Assertion(&'a str),
}

/// Matches directives and assertion invocations in test files
#[derive(Debug, Clone)]
pub struct AssertionMatcher {
    target_directive: Regex,
    count_directive: Regex,
    assertion: Regex,
}

impl AssertionMatcher {
    pub fn new(markers: &Markers) -> Result<Self, regex_lite::Error> {
        Ok(Self {
            target_directive: Regex::new(&format!(
                r"^// {} (.+)$",
                regex_lite::escape(&markers.target_directive)
            ))?,
            count_directive: Regex::new(&format!(
                r"^// {} (\d+)$",
                regex_lite::escape(&markers.count_directive)
            ))?,
            assertion: Regex::new(&format!(
                r"^{}\(([a-z_.]+)[(,].*$",
                regex_lite::escape(&markers.assertion)
            ))?,
        })
    }

    /// Classify a single (already trimmed) line
    ///
    /// Forms are checked in priority order: target directive, count
    /// directive, assertion. A count directive that is zero or out of range
    /// is not a directive.
    pub fn classify<'a>(&self, line: &'a str) -> Option<AssertionLine<'a>> {
        if let Some(caps) = self.target_directive.captures(line) {
            return Some(AssertionLine::SetTarget(caps.get(1)?.as_str().trim()));
        }

        if let Some(caps) = self.count_directive.captures(line) {
            return caps
                .get(1)?
                .as_str()
                .parse::<u64>()
                .ok()
                .filter(|count| *count > 0)
                .map(AssertionLine::SetCount);
        }

        let caps = self.assertion.captures(line)?;
        Some(AssertionLine::Assertion(caps.get(1)?.as_str()))
    }
}
