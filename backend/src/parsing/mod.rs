//! Parsers for light-curve text formats.
//!
//! # Parsers
//!
//! - [`ztf`]: output of the ZTF forced-photometry service
//! - [`tabular`]: four-column `jd filter flux flux_unc` tables used by
//!   multi-survey compilations
//!
//! Both produce [`Measurement`]s plus a [`ParseReport`] listing the rows that
//! were skipped. A row that cannot be read is never fatal on its own; only
//! input in which no row at all could be read is an error.
//!
//! # Example
//!
//! ```no_run
//! use lcstack::config::ParserConfig;
//! use lcstack::parsing::parse_file;
//!
//! let parsed = parse_file("forcedphotometry_req00012345_lc.txt", None, &ParserConfig::default())
//!     .expect("Failed to parse light curve");
//! println!("{} epochs", parsed.measurements.len());
//! ```

pub mod tabular;
pub mod ztf;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::ParserConfig;
use crate::error::{ErrorContext, StackError, StackResult};
use crate::models::Measurement;

/// Supported input layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Ztf,
    Tabular,
}

impl InputFormat {
    /// Guess the format of `content`.
    ///
    /// ZTF service output carries `#` comment lines and an `index,` header;
    /// anything else is treated as a plain table.
    pub fn detect(content: &str) -> Self {
        let looks_like_ztf = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .any(|line| line.starts_with('#') || ztf::is_header_line(line));

        if looks_like_ztf {
            InputFormat::Ztf
        } else {
            InputFormat::Tabular
        }
    }
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ztf" => Ok(InputFormat::Ztf),
            "tabular" | "table" => Ok(InputFormat::Tabular),
            _ => Err(format!("Unknown input format: {}", s)),
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Ztf => write!(f, "ztf"),
            InputFormat::Tabular => write!(f, "tabular"),
        }
    }
}

/// Inclusive range of source row indices to keep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRange {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl IndexRange {
    pub fn new(start: Option<usize>, end: Option<usize>) -> Self {
        Self { start, end }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start.map_or(true, |s| index >= s) && self.end.map_or(true, |e| index <= e)
    }

    /// Keep only the measurements whose row index falls in the range.
    pub fn apply(&self, measurements: Vec<Measurement>) -> StackResult<Vec<Measurement>> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(StackError::configuration(format!(
                    "Index range start {} is after end {}",
                    start, end
                )));
            }
        }
        if self.is_unbounded() {
            return Ok(measurements);
        }
        Ok(measurements
            .into_iter()
            .filter(|m| self.contains(m.index))
            .collect())
    }
}

/// A row that was left out while parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based line number in the input text
    pub line: usize,
    pub reason: String,
}

/// Summary of a parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseReport {
    /// Data lines seen (comments, blanks and headers excluded)
    pub data_lines: usize,
    pub parsed: usize,
    pub skipped: Vec<SkippedRow>,
}

impl ParseReport {
    pub(crate) fn skip(&mut self, line: usize, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("Skipping line {}: {}", line, reason);
        self.skipped.push(SkippedRow { line, reason });
    }

    /// Turn a parse that produced nothing from non-empty input into an error.
    pub(crate) fn ensure_any_parsed(&self, operation: &str) -> StackResult<()> {
        if self.data_lines > 0 && self.parsed == 0 {
            let details = self
                .skipped
                .first()
                .map(|s| format!("line {}: {}", s.line, s.reason))
                .unwrap_or_default();
            return Err(StackError::ParseError {
                message: format!("none of {} data lines could be parsed", self.data_lines),
                context: ErrorContext::new(operation).with_details(details),
            });
        }
        Ok(())
    }
}

/// Measurements read from one input.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInput {
    pub format: InputFormat,
    pub measurements: Vec<Measurement>,
    pub report: ParseReport,
}

/// Parse a numeric cell, mapping the missing-value sentinel to `None`.
pub(crate) fn parse_optional(token: &str, null_sentinel: &str) -> Result<Option<f64>, String> {
    if token.eq_ignore_ascii_case(null_sentinel) {
        return Ok(None);
    }
    token
        .parse::<f64>()
        .map(Some)
        .map_err(|_| format!("not a number: {:?}", token))
}

/// Strip the trailing comma some survey tables leave on every cell.
pub(crate) fn clean_token(token: &str) -> &str {
    token.trim().trim_end_matches(',')
}

/// Parse text in the given format, detecting it when `format` is `None`.
pub fn parse_str(
    content: &str,
    format: Option<InputFormat>,
    config: &ParserConfig,
) -> StackResult<ParsedInput> {
    let format = format.unwrap_or_else(|| InputFormat::detect(content));
    let (measurements, report) = match format {
        InputFormat::Ztf => ztf::parse(content, config)?,
        InputFormat::Tabular => tabular::parse(content, config)?,
    };

    log::info!(
        "Parsed {} {} measurements ({} rows skipped)",
        report.parsed,
        format,
        report.skipped.len()
    );

    Ok(ParsedInput {
        format,
        measurements,
        report,
    })
}

/// Read and parse a light-curve file.
pub fn parse_file<P: AsRef<Path>>(
    path: P,
    format: Option<InputFormat>,
    config: &ParserConfig,
) -> StackResult<ParsedInput> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| {
        StackError::IoError {
            message: format!("Failed to read input file: {}", e),
            context: ErrorContext::new("read_input").with_source(source.clone()),
        }
    })?;

    parse_str(&content, format, config).map_err(|e| e.with_source(source))
}
