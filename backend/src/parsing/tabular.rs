//! Plain four-column light-curve tables.
//!
//! ```text
//! jd filter flux flux_unc
//! 2458849.71 ZTF_g 104.2 9.8
//! 2458850.02 UVW2.uvot 88.0 12.1
//! ```
//!
//! The first non-comment line is a header and is ignored. Tables carry no
//! per-epoch calibration, so every row gets the configured zero point.

use crate::config::ParserConfig;
use crate::error::StackResult;
use crate::models::{FilterBand, JulianDate, Measurement};

use super::{clean_token, parse_optional, ParseReport};

const COLUMNS: usize = 4;

fn parse_row(tokens: &[&str], ordinal: usize, config: &ParserConfig) -> Result<Measurement, String> {
    if tokens.len() < COLUMNS {
        return Err(format!(
            "expected {} columns (jd filter flux flux_unc), found {}",
            COLUMNS,
            tokens.len()
        ));
    }

    let jd = match parse_optional(tokens[0], &config.null_sentinel) {
        Ok(Some(jd)) if jd.is_finite() => jd,
        Ok(_) => return Err("missing jd".to_string()),
        Err(e) => return Err(format!("jd: {}", e)),
    };
    let band: FilterBand = tokens[1].parse()?;
    let flux = parse_optional(tokens[2], &config.null_sentinel).map_err(|e| format!("flux: {}", e))?;
    let flux_uncertainty = parse_optional(tokens[3], &config.null_sentinel)
        .map_err(|e| format!("flux uncertainty: {}", e))?;

    Ok(Measurement::new(
        ordinal,
        JulianDate::new(jd),
        band,
        flux,
        flux_uncertainty,
        config.tabular_zero_point,
    ))
}

/// Parse a `jd filter flux flux_unc` table.
///
/// Row indices number the data rows from zero, header excluded.
pub fn parse(content: &str, config: &ParserConfig) -> StackResult<(Vec<Measurement>, ParseReport)> {
    let mut report = ParseReport::default();
    let mut measurements = Vec::new();
    let mut header_seen = false;

    for (i, raw) in content.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if !header_seen {
            header_seen = true;
            continue;
        }

        let ordinal = report.data_lines;
        report.data_lines += 1;

        let tokens: Vec<&str> = line
            .split_whitespace()
            .map(clean_token)
            .filter(|t| !t.is_empty())
            .collect();

        match parse_row(&tokens, ordinal, config) {
            Ok(m) => {
                measurements.push(m);
                report.parsed += 1;
            }
            Err(reason) => report.skip(line_no, reason),
        }
    }

    report.ensure_any_parsed("parse_tabular")?;
    Ok((measurements, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StackError;

    const SAMPLE: &str = "\
jd filter flux flux_unc
2458849.71 ZTF_g 104.2 9.8
2458850.02 UVW2.uvot 88.0 12.1
2458851.50 o.atlas null 3.0
";

    #[test]
    fn test_parse_sample() {
        let (measurements, report) = parse(SAMPLE, &ParserConfig::default()).unwrap();
        assert_eq!(measurements.len(), 3);
        assert_eq!(report.data_lines, 3);

        assert_eq!(measurements[0].index, 0);
        assert_eq!(measurements[0].band, FilterBand::ZtfG);
        assert_eq!(measurements[0].zero_point, 25.0);
        assert_eq!(measurements[0].chi_square, None);
        assert_eq!(measurements[1].band, FilterBand::UvotUvw2);
        assert_eq!(measurements[1].flux_uncertainty, Some(12.1));
        assert_eq!(measurements[2].index, 2);
        assert_eq!(measurements[2].flux, None);
    }

    #[test]
    fn test_configured_zero_point() {
        let config = ParserConfig {
            tabular_zero_point: 23.9,
            ..ParserConfig::default()
        };
        let (measurements, _) = parse(SAMPLE, &config).unwrap();
        assert!(measurements.iter().all(|m| m.zero_point == 23.9));
    }

    #[test]
    fn test_bad_rows_skipped() {
        let content = "jd filter flux flux_unc\n2458849.71 ZTF_g 1.0 1.0\n2458850.0 K 1.0 1.0\nabc ZTF_r 1.0 1.0\n2458851.0 ZTF_r 1.0\n";
        let (measurements, report) = parse(content, &ParserConfig::default()).unwrap();
        assert_eq!(measurements.len(), 1);
        let lines: Vec<usize> = report.skipped.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![3, 4, 5]);
    }

    #[test]
    fn test_header_only() {
        let (measurements, report) = parse("jd filter flux flux_unc\n", &ParserConfig::default()).unwrap();
        assert!(measurements.is_empty());
        assert_eq!(report.data_lines, 0);
    }

    #[test]
    fn test_all_rows_bad_is_error() {
        let err = parse("jd filter flux flux_unc\nx y z w\n", &ParserConfig::default()).unwrap_err();
        assert!(matches!(err, StackError::ParseError { .. }));
    }
}
