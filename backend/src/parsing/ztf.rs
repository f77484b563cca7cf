//! ZTF forced-photometry service output.
//!
//! The service writes a block of `#` comment lines, a header line starting
//! with `index,` and then one whitespace-separated row per epoch. Failed PSF
//! fits carry a `null` sentinel in the flux columns.

use crate::config::ParserConfig;
use crate::error::{StackError, StackResult};
use crate::models::{FilterBand, JulianDate, Measurement};

use super::{clean_token, parse_optional, ParseReport};

/// Candidate header names for each column
const INDEX_KEYS: &[&str] = &["index"];
const FILTER_KEYS: &[&str] = &["filter"];
const ZERO_POINT_KEYS: &[&str] = &["zpdiff"];
const JD_KEYS: &[&str] = &["jd"];
const FLUX_KEYS: &[&str] = &["forcediffimflux"];
const FLUX_UNC_KEYS: &[&str] = &["forcediffimfluxunc"];
const CHI_SQUARE_KEYS: &[&str] = &["forcediffimchisq", "forceddiffimchisq"];

/// Column positions of the fields the stacker needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZtfColumns {
    /// `None` numbers rows by their order in the file
    pub index: Option<usize>,
    pub filter: usize,
    pub zero_point: usize,
    pub jd: usize,
    pub flux: usize,
    pub flux_uncertainty: usize,
    pub chi_square: Option<usize>,
}

impl Default for ZtfColumns {
    /// Layout written by the service when no header is present.
    fn default() -> Self {
        Self {
            index: Some(0),
            filter: 4,
            zero_point: 20,
            jd: 22,
            flux: 24,
            flux_uncertainty: 25,
            chi_square: Some(27),
        }
    }
}

fn find_column(names: &[String], keys: &[&str]) -> Option<usize> {
    names
        .iter()
        .position(|name| keys.iter().any(|k| name.eq_ignore_ascii_case(k)))
}

impl ZtfColumns {
    /// Resolve column positions from a header line.
    pub fn from_header(line: &str) -> StackResult<Self> {
        let names: Vec<String> = line
            .split_whitespace()
            .map(clean_token)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        let required = |keys: &[&str]| {
            find_column(&names, keys).ok_or_else(|| {
                StackError::parse(format!("header has no '{}' column", keys[0]))
                    .with_operation("parse_ztf_header")
            })
        };

        Ok(Self {
            index: find_column(&names, INDEX_KEYS),
            filter: required(FILTER_KEYS)?,
            zero_point: required(ZERO_POINT_KEYS)?,
            jd: required(JD_KEYS)?,
            flux: required(FLUX_KEYS)?,
            flux_uncertainty: required(FLUX_UNC_KEYS)?,
            chi_square: find_column(&names, CHI_SQUARE_KEYS),
        })
    }

    /// Smallest row width that holds every required column.
    fn required_width(&self) -> usize {
        [
            self.filter,
            self.zero_point,
            self.jd,
            self.flux,
            self.flux_uncertainty,
        ]
        .into_iter()
        .chain(self.index)
        .max()
        .unwrap_or(0)
            + 1
    }
}

/// Whether `line` is the column header of a ZTF table.
pub fn is_header_line(line: &str) -> bool {
    line.split_whitespace()
        .next()
        .map(clean_token)
        .is_some_and(|first| first.eq_ignore_ascii_case("index"))
}

fn required_number(token: &str, name: &str, config: &ParserConfig) -> Result<f64, String> {
    match parse_optional(token, &config.null_sentinel) {
        Ok(Some(v)) if v.is_finite() => Ok(v),
        Ok(_) => Err(format!("missing {}", name)),
        Err(e) => Err(format!("{}: {}", name, e)),
    }
}

fn optional_number(token: &str, name: &str, line: usize, config: &ParserConfig) -> Option<f64> {
    match parse_optional(token, &config.null_sentinel) {
        Ok(v) => v,
        Err(e) => {
            log::debug!("Line {}: treating {} as missing ({})", line, name, e);
            None
        }
    }
}

fn parse_row(
    tokens: &[&str],
    columns: &ZtfColumns,
    ordinal: usize,
    line: usize,
    config: &ParserConfig,
) -> Result<Measurement, String> {
    let width = columns.required_width();
    if tokens.len() < width {
        return Err(format!(
            "expected at least {} columns, found {}",
            width,
            tokens.len()
        ));
    }

    let index = columns
        .index
        .and_then(|i| tokens[i].parse::<usize>().ok())
        .unwrap_or(ordinal);
    let band: FilterBand = tokens[columns.filter].parse()?;
    let jd = required_number(tokens[columns.jd], "jd", config)?;
    let zero_point = required_number(tokens[columns.zero_point], "zero point", config)?;
    let flux = optional_number(tokens[columns.flux], "flux", line, config);
    let flux_uncertainty =
        optional_number(tokens[columns.flux_uncertainty], "flux uncertainty", line, config);
    let chi_square = columns
        .chi_square
        .and_then(|i| tokens.get(i))
        .and_then(|t| optional_number(t, "chi-square", line, config));

    Ok(Measurement {
        index,
        time: JulianDate::new(jd),
        band,
        flux,
        flux_uncertainty,
        zero_point,
        chi_square,
    })
}

/// Parse ZTF forced-photometry text.
///
/// Without a header line the service's default column layout is assumed.
pub fn parse(content: &str, config: &ParserConfig) -> StackResult<(Vec<Measurement>, ParseReport)> {
    let mut columns = ZtfColumns::default();
    let mut report = ParseReport::default();
    let mut measurements = Vec::new();

    for (i, raw) in content.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if is_header_line(line) {
            columns = ZtfColumns::from_header(line).map_err(|e| match e {
                StackError::ParseError { message, context } => StackError::ParseError {
                    message,
                    context: context.with_row(line_no),
                },
                other => other,
            })?;
            log::debug!("Resolved ZTF columns from header: {:?}", columns);
            continue;
        }

        let ordinal = report.data_lines;
        report.data_lines += 1;

        let tokens: Vec<&str> = line
            .split_whitespace()
            .map(clean_token)
            .filter(|t| !t.is_empty())
            .collect();

        match parse_row(&tokens, &columns, ordinal, line_no, config) {
            Ok(m) => {
                measurements.push(m);
                report.parsed += 1;
            }
            Err(reason) => report.skip(line_no, reason),
        }
    }

    report.ensure_any_parsed("parse_ztf")?;
    Ok((measurements, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a 28-column row in the service's default layout.
    fn row(index: usize, band: &str, zp: &str, jd: &str, flux: &str, unc: &str, chi: &str) -> String {
        let mut cells: Vec<String> = (0..28).map(|_| "0".to_string()).collect();
        cells[0] = index.to_string();
        cells[4] = band.to_string();
        cells[20] = zp.to_string();
        cells[22] = jd.to_string();
        cells[24] = flux.to_string();
        cells[25] = unc.to_string();
        cells[27] = chi.to_string();
        cells.join(" ")
    }

    #[test]
    fn test_default_layout() {
        let content = format!(
            "# Requested input R.A. = 150.0 degrees\n# comment\n{}\n{}\n",
            row(0, "ZTF_g", "26.1", "2459000.5", "120.5", "10.2", "1.1"),
            row(1, "ZTF_r", "26.3", "2459000.6", "null", "null", "null"),
        );
        let (measurements, report) = parse(&content, &ParserConfig::default()).unwrap();
        assert_eq!(measurements.len(), 2);
        assert_eq!(report.parsed, 2);
        assert!(report.skipped.is_empty());

        let first = &measurements[0];
        assert_eq!(first.index, 0);
        assert_eq!(first.band, FilterBand::ZtfG);
        assert_eq!(first.zero_point, 26.1);
        assert_eq!(first.time.value(), 2459000.5);
        assert_eq!(first.flux, Some(120.5));
        assert_eq!(first.flux_uncertainty, Some(10.2));
        assert_eq!(first.chi_square, Some(1.1));

        let second = &measurements[1];
        assert_eq!(second.flux, None);
        assert_eq!(second.flux_uncertainty, None);
        assert_eq!(second.chi_square, None);
        assert!(!second.is_usable());
    }

    #[test]
    fn test_header_resolves_columns() {
        let content = "\
# ZTF forced photometry
 index, filter, jd, zpdiff, forcediffimflux, forcediffimfluxunc, forcediffimchisq,
 7, ZTF_i, 2459001.25, 25.9, -3.5, 4.0, 0.98,
";
        let (measurements, _) = parse(content, &ParserConfig::default()).unwrap();
        assert_eq!(measurements.len(), 1);
        let m = &measurements[0];
        assert_eq!(m.index, 7);
        assert_eq!(m.band, FilterBand::ZtfI);
        assert_eq!(m.time.value(), 2459001.25);
        assert_eq!(m.zero_point, 25.9);
        assert_eq!(m.flux, Some(-3.5));
        assert_eq!(m.chi_square, Some(0.98));
    }

    #[test]
    fn test_header_missing_required_column() {
        let content = "index, filter, jd, forcediffimflux, forcediffimfluxunc\n";
        let err = parse(content, &ParserConfig::default()).unwrap_err();
        assert!(matches!(err, StackError::ParseError { .. }));
        assert_eq!(err.context().row, Some(1));
        assert!(err.to_string().contains("zpdiff"));
    }

    #[test]
    fn test_bad_rows_skipped() {
        let content = format!(
            "{}\n{}\n{}\n1 2 3\n",
            row(0, "ZTF_g", "26.1", "2459000.5", "1.0", "1.0", "1.0"),
            row(1, "H.2mass", "26.1", "2459000.6", "1.0", "1.0", "1.0"),
            row(2, "ZTF_g", "26.1", "null", "1.0", "1.0", "1.0"),
        );
        let (measurements, report) = parse(&content, &ParserConfig::default()).unwrap();
        assert_eq!(measurements.len(), 1);
        assert_eq!(report.data_lines, 4);
        let lines: Vec<usize> = report.skipped.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![2, 3, 4]);
        assert!(report.skipped[2].reason.contains("columns"));
    }

    #[test]
    fn test_nothing_parsed_is_error() {
        let err = parse("garbage line\n", &ParserConfig::default()).unwrap_err();
        assert!(matches!(err, StackError::ParseError { .. }));
    }

    #[test]
    fn test_comments_only_is_empty() {
        let (measurements, report) = parse("# nothing here\n\n", &ParserConfig::default()).unwrap();
        assert!(measurements.is_empty());
        assert_eq!(report.data_lines, 0);
    }

    #[test]
    fn test_custom_sentinel() {
        let config = ParserConfig {
            null_sentinel: "NaN".to_string(),
            ..ParserConfig::default()
        };
        let content = row(0, "ZTF_g", "26.1", "2459000.5", "NaN", "1.0", "NaN");
        let (measurements, _) = parse(&content, &config).unwrap();
        assert_eq!(measurements[0].flux, None);
        assert_eq!(measurements[0].flux_uncertainty, Some(1.0));
    }

    #[test]
    fn test_is_header_line() {
        assert!(is_header_line(" index, field, ccdid"));
        assert!(is_header_line("INDEX filter jd"));
        assert!(!is_header_line("0 1739 15"));
        assert!(!is_header_line("jd filter flux"));
    }
}
