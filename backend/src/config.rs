//! Stacking configuration file support.
//!
//! Configuration is read from TOML. Every field has a default, so an empty
//! file (or a partial JSON object sent to the HTTP surface) is a valid
//! configuration.
//!
//! ```toml
//! window_width_days = 3.0
//! windowing_policy = "run_based"
//! max_gap_days = 5.0
//! window_scope = "per_band"
//! reference_zero_point_policy = "min"
//! detection_snr_threshold = 5.0
//! upper_limit_snr_multiplier = 3.0
//! apply_uncertainty_validation = true
//! baseline = 0.0
//!
//! [parser]
//! null_sentinel = "null"
//! tabular_zero_point = 25.0
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ErrorContext, StackError, StackResult};

/// How measurements are grouped into windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowingPolicy {
    /// Windows open at the earliest unassigned epoch and absorb everything
    /// within the window width of it.
    #[default]
    #[serde(alias = "run")]
    RunBased,
    /// Windows are bins of a uniform grid anchored at the earliest epoch.
    #[serde(alias = "grid")]
    FixedGrid,
}

/// How the common zero point is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroPointPolicy {
    #[default]
    Min,
    Mean,
}

/// Whether windows are built per band or over all bands at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowScope {
    #[default]
    #[serde(alias = "band")]
    PerBand,
    Pooled,
}

impl FromStr for WindowingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "run_based" | "run" => Ok(WindowingPolicy::RunBased),
            "fixed_grid" | "grid" => Ok(WindowingPolicy::FixedGrid),
            _ => Err(format!("Unknown windowing policy: {}", s)),
        }
    }
}

impl FromStr for ZeroPointPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "min" => Ok(ZeroPointPolicy::Min),
            "mean" => Ok(ZeroPointPolicy::Mean),
            _ => Err(format!("Unknown zero point policy: {}", s)),
        }
    }
}

impl FromStr for WindowScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "per_band" | "band" => Ok(WindowScope::PerBand),
            "pooled" => Ok(WindowScope::Pooled),
            _ => Err(format!("Unknown window scope: {}", s)),
        }
    }
}

impl fmt::Display for WindowingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowingPolicy::RunBased => write!(f, "run_based"),
            WindowingPolicy::FixedGrid => write!(f, "fixed_grid"),
        }
    }
}

impl fmt::Display for ZeroPointPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZeroPointPolicy::Min => write!(f, "min"),
            ZeroPointPolicy::Mean => write!(f, "mean"),
        }
    }
}

impl fmt::Display for WindowScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowScope::PerBand => write!(f, "per_band"),
            WindowScope::Pooled => write!(f, "pooled"),
        }
    }
}

/// Settings for the text parsers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Token that marks a missing value in survey tables
    #[serde(default = "default_null_sentinel")]
    pub null_sentinel: String,
    /// Zero point assigned to every row of a tabular file
    #[serde(default = "default_tabular_zero_point")]
    pub tabular_zero_point: f64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            null_sentinel: default_null_sentinel(),
            tabular_zero_point: default_tabular_zero_point(),
        }
    }
}

/// Stacking configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackConfig {
    #[serde(default = "default_window_width")]
    pub window_width_days: qtty::Days,
    #[serde(default)]
    pub windowing_policy: WindowingPolicy,
    /// Largest allowed gap between consecutive epochs of a run-based window.
    /// `None` disables the test.
    #[serde(default)]
    pub max_gap_days: Option<qtty::Days>,
    #[serde(default)]
    pub window_scope: WindowScope,
    #[serde(default)]
    pub reference_zero_point_policy: ZeroPointPolicy,
    #[serde(default = "default_detection_snr_threshold")]
    pub detection_snr_threshold: f64,
    #[serde(default = "default_upper_limit_snr_multiplier")]
    pub upper_limit_snr_multiplier: f64,
    #[serde(default)]
    pub apply_uncertainty_validation: bool,
    /// Residual flux level subtracted from every raw flux before rescaling
    #[serde(default)]
    pub baseline: f64,
    #[serde(default)]
    pub parser: ParserConfig,
}

fn default_window_width() -> qtty::Days {
    qtty::Days::new(1.0)
}

fn default_detection_snr_threshold() -> f64 {
    5.0
}

fn default_upper_limit_snr_multiplier() -> f64 {
    3.0
}

fn default_null_sentinel() -> String {
    "null".to_string()
}

fn default_tabular_zero_point() -> f64 {
    25.0
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            window_width_days: default_window_width(),
            windowing_policy: WindowingPolicy::default(),
            max_gap_days: None,
            window_scope: WindowScope::default(),
            reference_zero_point_policy: ZeroPointPolicy::default(),
            detection_snr_threshold: default_detection_snr_threshold(),
            upper_limit_snr_multiplier: default_upper_limit_snr_multiplier(),
            apply_uncertainty_validation: false,
            baseline: 0.0,
            parser: ParserConfig::default(),
        }
    }
}

impl StackConfig {
    /// Default configuration with the given window width in days.
    pub fn with_width(days: f64) -> Self {
        Self {
            window_width_days: qtty::Days::new(days),
            ..Default::default()
        }
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> StackResult<Self> {
        let config: StackConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Returns
    /// * `Ok(StackConfig)` if the file was read, parsed and validated
    /// * `Err(StackError)` otherwise, with the path in the error context
    pub fn from_file<P: AsRef<Path>>(path: P) -> StackResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            StackError::configuration_with_context(
                format!("Failed to read config file: {}", e),
                ErrorContext::new("load_config").with_source(path.display().to_string()),
            )
        })?;

        Self::from_toml_str(&content).map_err(|e| e.with_source(path.display().to_string()))
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `lcstack.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> StackResult<Self> {
        let search_paths = [
            PathBuf::from("lcstack.toml"),
            PathBuf::from("backend/lcstack.toml"),
            PathBuf::from("../lcstack.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(StackError::configuration(
            "No lcstack.toml found in standard locations",
        ))
    }

    /// Check every numeric setting before any data is touched.
    pub fn validate(&self) -> StackResult<()> {
        let ctx = || ErrorContext::new("validate_config");

        let width = self.window_width_days.value();
        if !width.is_finite() || width <= 0.0 {
            return Err(StackError::configuration_with_context(
                format!("window_width_days must be positive, got {}", width),
                ctx(),
            ));
        }

        if let Some(gap) = self.max_gap_days {
            let gap = gap.value();
            if !gap.is_finite() || gap <= 0.0 {
                return Err(StackError::configuration_with_context(
                    format!("max_gap_days must be positive, got {}", gap),
                    ctx(),
                ));
            }
            if self.windowing_policy == WindowingPolicy::FixedGrid {
                log::warn!("max_gap_days is ignored by the fixed_grid windowing policy");
            }
        }

        if !self.detection_snr_threshold.is_finite() || self.detection_snr_threshold <= 0.0 {
            return Err(StackError::configuration_with_context(
                format!(
                    "detection_snr_threshold must be positive, got {}",
                    self.detection_snr_threshold
                ),
                ctx(),
            ));
        }

        if !self.upper_limit_snr_multiplier.is_finite() || self.upper_limit_snr_multiplier <= 0.0 {
            return Err(StackError::configuration_with_context(
                format!(
                    "upper_limit_snr_multiplier must be positive, got {}",
                    self.upper_limit_snr_multiplier
                ),
                ctx(),
            ));
        }

        if !self.baseline.is_finite() {
            return Err(StackError::configuration_with_context(
                "baseline must be a finite number",
                ctx(),
            ));
        }

        if !self.parser.tabular_zero_point.is_finite() {
            return Err(StackError::configuration_with_context(
                "parser.tabular_zero_point must be a finite number",
                ctx(),
            ));
        }

        Ok(())
    }
}

/// Parse a policy name, turning the parser's message into a configuration error.
pub fn parse_policy<T>(name: &str) -> StackResult<T>
where
    T: FromStr<Err = String>,
{
    name.parse::<T>().map_err(StackError::configuration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = StackConfig::from_toml_str("").unwrap();
        assert_eq!(config, StackConfig::default());
        assert_eq!(config.window_width_days.value(), 1.0);
        assert_eq!(config.detection_snr_threshold, 5.0);
        assert_eq!(config.upper_limit_snr_multiplier, 3.0);
        assert_eq!(config.parser.null_sentinel, "null");
        assert_eq!(config.parser.tabular_zero_point, 25.0);
        assert!(config.max_gap_days.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            window_width_days = 3.0
            windowing_policy = "fixed_grid"
            max_gap_days = 5.0
            window_scope = "pooled"
            reference_zero_point_policy = "mean"
            detection_snr_threshold = 3.0
            upper_limit_snr_multiplier = 5.0
            apply_uncertainty_validation = true
            baseline = 1.5

            [parser]
            null_sentinel = "NaN"
        "#;

        let config = StackConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.window_width_days.value(), 3.0);
        assert_eq!(config.windowing_policy, WindowingPolicy::FixedGrid);
        assert_eq!(config.max_gap_days.map(|d| d.value()), Some(5.0));
        assert_eq!(config.window_scope, WindowScope::Pooled);
        assert_eq!(config.reference_zero_point_policy, ZeroPointPolicy::Mean);
        assert!(config.apply_uncertainty_validation);
        assert_eq!(config.baseline, 1.5);
        assert_eq!(config.parser.null_sentinel, "NaN");
        assert_eq!(config.parser.tabular_zero_point, 25.0);
    }

    #[test]
    fn test_policy_aliases_in_toml() {
        let config = StackConfig::from_toml_str(
            "windowing_policy = \"grid\"\nwindow_scope = \"band\"",
        )
        .unwrap();
        assert_eq!(config.windowing_policy, WindowingPolicy::FixedGrid);
        assert_eq!(config.window_scope, WindowScope::PerBand);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let err = StackConfig::from_toml_str("windowing_policy = \"sliding\"").unwrap_err();
        assert!(matches!(err, StackError::ConfigurationError { .. }));
    }

    #[test]
    fn test_non_positive_width_rejected() {
        for width in ["0.0", "-1.0", "nan"] {
            let err = StackConfig::from_toml_str(&format!("window_width_days = {}", width))
                .unwrap_err();
            assert!(matches!(err, StackError::ConfigurationError { .. }));
        }
    }

    #[test]
    fn test_non_positive_gap_rejected() {
        let err = StackConfig::from_toml_str("max_gap_days = 0.0").unwrap_err();
        assert!(err.to_string().contains("max_gap_days"));
    }

    #[test]
    fn test_non_positive_snr_constants_rejected() {
        assert!(StackConfig::from_toml_str("detection_snr_threshold = 0.0").is_err());
        assert!(StackConfig::from_toml_str("upper_limit_snr_multiplier = -3.0").is_err());
    }

    #[test]
    fn test_from_str_policies() {
        assert_eq!("RUN".parse::<WindowingPolicy>().unwrap(), WindowingPolicy::RunBased);
        assert_eq!(
            "fixed-grid".parse::<WindowingPolicy>().unwrap(),
            WindowingPolicy::FixedGrid
        );
        assert_eq!("Mean".parse::<ZeroPointPolicy>().unwrap(), ZeroPointPolicy::Mean);
        assert_eq!("per_band".parse::<WindowScope>().unwrap(), WindowScope::PerBand);
        assert!("median".parse::<ZeroPointPolicy>().is_err());
    }

    #[test]
    fn test_parse_policy_maps_to_configuration_error() {
        let err = parse_policy::<WindowScope>("everything").unwrap_err();
        assert!(matches!(err, StackError::ConfigurationError { .. }));
        assert!(err.to_string().contains("everything"));
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for policy in [WindowingPolicy::RunBased, WindowingPolicy::FixedGrid] {
            assert_eq!(policy.to_string().parse::<WindowingPolicy>().unwrap(), policy);
        }
        for scope in [WindowScope::PerBand, WindowScope::Pooled] {
            assert_eq!(scope.to_string().parse::<WindowScope>().unwrap(), scope);
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "window_width_days = 2.5").unwrap();
        let config = StackConfig::from_file(file.path()).unwrap();
        assert_eq!(config.window_width_days.value(), 2.5);
    }

    #[test]
    fn test_from_missing_file() {
        let err = StackConfig::from_file("/nonexistent/lcstack.toml").unwrap_err();
        assert!(matches!(err, StackError::ConfigurationError { .. }));
        assert_eq!(
            err.context().source_name.as_deref(),
            Some("/nonexistent/lcstack.toml")
        );
    }

    #[test]
    fn test_partial_json_config() {
        let config: StackConfig =
            serde_json::from_str(r#"{"window_width_days": 4.0, "window_scope": "pooled"}"#)
                .unwrap();
        assert_eq!(config.window_width_days.value(), 4.0);
        assert_eq!(config.window_scope, WindowScope::Pooled);
        assert_eq!(config.detection_snr_threshold, 5.0);
    }
}
