mod support;

use std::fs;
use std::io::Write;

use tempfile::{tempdir, NamedTempFile};

use lcstack::config::{ParserConfig, StackConfig, WindowingPolicy};
use lcstack::models::FilterBand;
use lcstack::parsing::{parse_file, parse_str, InputFormat};
use lcstack::StackError;

use support::{with_current_dir, ztf_row, ztf_sample, ZTF_HEADER};

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_parse_ztf_file() {
    let file = write_temp(&ztf_sample());
    let parsed = parse_file(file.path(), None, &ParserConfig::default()).unwrap();

    assert_eq!(parsed.format, InputFormat::Ztf);
    assert_eq!(parsed.report.data_lines, 4);
    assert_eq!(parsed.report.parsed, 4);
    assert!(parsed.report.skipped.is_empty());

    let failed = &parsed.measurements[3];
    assert_eq!(failed.index, 3);
    assert_eq!(failed.band, FilterBand::ZtfR);
    assert_eq!(failed.flux, None);
    assert_eq!(failed.zero_point, 26.0);
    assert!(failed.exclusion().is_some());
}

#[test]
fn test_parse_tabular_file() {
    let content = "\
jd filter flux flux_unc
2458849.71 ZTF_g 104.2 9.8
2458850.02 UVW2.uvot 88.0 12.1
# calibration pending
2458851.00 o.atlas null null
";
    let file = write_temp(content);
    let config = ParserConfig {
        tabular_zero_point: 23.9,
        ..ParserConfig::default()
    };
    let parsed = parse_file(file.path(), None, &config).unwrap();

    assert_eq!(parsed.format, InputFormat::Tabular);
    assert_eq!(parsed.measurements.len(), 3);
    let bands: Vec<FilterBand> = parsed.measurements.iter().map(|m| m.band).collect();
    assert_eq!(
        bands,
        vec![FilterBand::ZtfG, FilterBand::UvotUvw2, FilterBand::AtlasO]
    );
    assert!(parsed.measurements.iter().all(|m| m.zero_point == 23.9));
    assert_eq!(parsed.measurements[2].index, 2);
}

#[test]
fn test_explicit_format_overrides_detection() {
    let content = "jd filter flux flux_unc\n2459000.5 ZTF_g 10.0 1.0\n";
    let err = parse_str(content, Some(InputFormat::Ztf), &ParserConfig::default()).unwrap_err();
    assert!(matches!(err, StackError::ParseError { .. }));
}

#[test]
fn test_bad_rows_are_reported_not_fatal() {
    let content = [
        ZTF_HEADER.to_string(),
        ztf_row(0, "ZTF_g", 25.0, 2459000.5, "10.0", "1.0", "1.0"),
        ztf_row(1, "ZTF_x", 25.0, 2459000.6, "10.0", "1.0", "1.0"),
        ztf_row(2, "ZTF_g", 25.0, 2459000.7, "12.0", "1.0", "1.0"),
    ]
    .join("\n");
    let parsed = parse_str(&content, None, &ParserConfig::default()).unwrap();

    assert_eq!(parsed.measurements.len(), 2);
    assert_eq!(parsed.report.skipped.len(), 1);
    assert_eq!(parsed.report.skipped[0].line, 3);
}

#[test]
fn test_custom_null_sentinel() {
    let content = [
        ZTF_HEADER.to_string(),
        ztf_row(0, "ZTF_g", 25.0, 2459000.5, "NaN", "NaN", "NaN"),
        ztf_row(1, "ZTF_g", 25.0, 2459000.6, "10.0", "1.0", "1.0"),
    ]
    .join("\n");
    let config = ParserConfig {
        null_sentinel: "NaN".to_string(),
        ..ParserConfig::default()
    };
    let parsed = parse_str(&content, None, &config).unwrap();
    assert_eq!(parsed.measurements[0].flux, None);
    assert_eq!(parsed.measurements[1].flux, Some(10.0));
}

#[test]
fn test_missing_input_file_is_io_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent_lc.txt");
    let err = parse_file(&path, None, &ParserConfig::default()).unwrap_err();

    assert!(matches!(err, StackError::IoError { .. }));
    assert!(!err.is_client_error());
    assert_eq!(
        err.context().source_name.as_deref(),
        Some(path.display().to_string().as_str())
    );
}

#[test]
fn test_unreadable_content_names_the_file() {
    let file = write_temp("jd filter flux flux_unc\nthis is not data\n");
    let err = parse_file(file.path(), None, &ParserConfig::default()).unwrap_err();
    assert!(matches!(err, StackError::ParseError { .. }));
    assert!(err.to_string().contains(&file.path().display().to_string()));
}

#[test]
fn test_config_from_default_location() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("lcstack.toml"),
        "window_width_days = 3.0\nwindowing_policy = \"fixed_grid\"\n\n[parser]\nnull_sentinel = \"NaN\"\n",
    )
    .unwrap();

    let config = with_current_dir(dir.path(), StackConfig::from_default_location).unwrap();
    assert_eq!(config.window_width_days.value(), 3.0);
    assert_eq!(config.windowing_policy, WindowingPolicy::FixedGrid);
    assert_eq!(config.parser.null_sentinel, "NaN");
    assert_eq!(config.detection_snr_threshold, 5.0);
}

#[test]
fn test_config_missing_from_default_location() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();

    let err = with_current_dir(&nested, StackConfig::from_default_location).unwrap_err();
    assert!(matches!(err, StackError::ConfigurationError { .. }));
}

#[test]
fn test_invalid_config_file_names_the_file() {
    let file = write_temp("window_width_days = -2.0\n");
    let err = StackConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, StackError::ConfigurationError { .. }));
    assert!(err.is_client_error());
    assert_eq!(
        err.context().source_name.as_deref(),
        Some(file.path().display().to_string().as_str())
    );
}
