use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::config::StackConfig;
use crate::error::StackResult;
use crate::models::CombinedPoint;
use crate::parsing::ParseReport;
use crate::stacking::{StackOutcome, StackStats};

/// One combined point flattened for tables and plotting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedRow {
    pub window_start: f64,
    pub window_end: f64,
    /// Plotting abscissa, `(window_start + window_end) / 2`
    pub window_mid: f64,
    /// `window_mid` as an RFC 3339 UTC timestamp
    pub window_mid_utc: String,
    pub band: String,
    pub label: String,
    pub color: String,
    pub flux: f64,
    pub flux_uncertainty: f64,
    pub zero_point: f64,
    pub n_measurements: usize,
    pub magnitude: Option<f64>,
    pub magnitude_uncertainty: Option<f64>,
    pub upper_limit: Option<f64>,
}

impl From<&CombinedPoint> for CombinedRow {
    fn from(point: &CombinedPoint) -> Self {
        let mid = point.window_mid();
        let info = point.band.info();
        Self {
            window_start: point.window_start.value(),
            window_end: point.window_end.value(),
            window_mid: mid.value(),
            window_mid_utc: mid.to_datetime().to_rfc3339(),
            band: info.name.to_string(),
            label: info.label.to_string(),
            color: info.color.to_string(),
            flux: point.flux,
            flux_uncertainty: point.flux_uncertainty,
            zero_point: point.zero_point,
            n_measurements: point.n_measurements,
            magnitude: point.photometry.magnitude(),
            magnitude_uncertainty: point.photometry.magnitude_uncertainty(),
            upper_limit: point.photometry.upper_limit(),
        }
    }
}

/// Flatten combined points into table rows.
pub fn to_rows(points: &[CombinedPoint]) -> Vec<CombinedRow> {
    points.iter().map(CombinedRow::from).collect()
}

/// Everything needed to reproduce and interpret a stacking run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackReport {
    /// Input file name or request label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// SHA-256 of the input text, when the input was text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    pub config: StackConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse: Option<ParseReport>,
    pub stats: StackStats,
    pub points: Vec<CombinedRow>,
}

impl StackReport {
    pub fn new(config: StackConfig, outcome: &StackOutcome) -> Self {
        Self {
            source: None,
            checksum: None,
            config,
            parse: None,
            stats: outcome.stats.clone(),
            points: to_rows(&outcome.points),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Fingerprint the raw input text.
    pub fn with_input_text(mut self, content: &str) -> Self {
        self.checksum = Some(super::checksum::calculate_checksum(content));
        self
    }

    pub fn with_parse_report(mut self, report: ParseReport) -> Self {
        self.parse = Some(report);
        self
    }
}

/// Write rows as CSV with a header line.
pub fn write_csv<W: Write>(rows: &[CombinedRow], writer: W) -> StackResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write a report as pretty-printed JSON.
pub fn write_json<W: Write>(report: &StackReport, mut writer: W) -> StackResult<()> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
