use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::combine::{combine_group, Thresholds};
use super::rescale::{correct_baseline, reference_zero_point, rescale, validate_uncertainties};
use super::window::{build_windows, Window};
use super::StackStats;
use crate::config::{StackConfig, WindowScope};
use crate::error::StackResult;
use crate::models::{CombinedPoint, Exclusion, FilterBand, JulianDate, Measurement, RescaledMeasurement};

/// Result of one stacking run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackOutcome {
    /// Combined points ordered by window start, then band
    pub points: Vec<CombinedPoint>,
    pub stats: StackStats,
}

/// Rescale, window and combine a measurement table
#[derive(Debug, Clone)]
pub struct StackPipeline {
    config: StackConfig,
}

impl StackPipeline {
    /// Create a new pipeline with default configuration
    pub fn new() -> Self {
        Self {
            config: StackConfig::default(),
        }
    }

    /// Create a pipeline with custom configuration.
    ///
    /// The configuration is validated here so that a bad width or threshold
    /// is reported before any data is processed.
    pub fn with_config(config: StackConfig) -> StackResult<Self> {
        config
            .validate()
            .map_err(|e| e.with_operation("create_pipeline"))?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Stack a measurement table.
    ///
    /// The input is never modified. Unusable measurements are counted and
    /// dropped; they take no part in window boundaries.
    pub fn process(&self, measurements: &[Measurement]) -> StackResult<StackOutcome> {
        let config = &self.config;
        let mut stats = StackStats {
            total: measurements.len(),
            ..Default::default()
        };

        for m in measurements {
            match m.exclusion() {
                None => stats.usable += 1,
                Some(Exclusion::Missing) => {
                    stats.excluded_missing += 1;
                    log::debug!("Excluding row {}: missing flux or uncertainty", m.index);
                }
                Some(Exclusion::NonPositiveUncertainty) => {
                    stats.excluded_nonpositive_uncertainty += 1;
                    log::debug!("Excluding row {}: non-positive uncertainty", m.index);
                }
                Some(Exclusion::NonFinite) => {
                    stats.excluded_nonfinite += 1;
                    log::warn!("Excluding row {}: time or zero point is not finite", m.index);
                }
            }
        }

        // Step 1: Baseline correction happens in raw units, before rescaling
        let mut prepared = if config.baseline != 0.0 {
            correct_baseline(measurements, config.baseline)
        } else {
            measurements.to_vec()
        };

        // Step 2: Uncertainty validation (if requested)
        if config.apply_uncertainty_validation {
            prepared = validate_uncertainties(&prepared);
        }

        // Step 3: Common zero point
        let Some(zp_ref) = reference_zero_point(&prepared, config.reference_zero_point_policy)
        else {
            log::info!("No measurements to stack");
            return Ok(StackOutcome {
                points: Vec::new(),
                stats,
            });
        };
        stats.reference_zero_point = Some(zp_ref);

        let rescaled = rescale(&prepared, zp_ref);
        let thresholds = Thresholds::from(config);

        // Step 4: Windowing and combination
        let mut points = match config.window_scope {
            WindowScope::PerBand => self.stack_per_band(&rescaled, zp_ref, &thresholds, &mut stats)?,
            WindowScope::Pooled => self.stack_pooled(&rescaled, zp_ref, &thresholds, &mut stats)?,
        };

        points.sort_by(|a, b| {
            a.window_start
                .value()
                .total_cmp(&b.window_start.value())
                .then(a.band.cmp(&b.band))
        });

        // Step 5: Statistics
        stats.points = points.len();
        stats.detections = points.iter().filter(|p| p.photometry.is_detection()).count();
        stats.upper_limits = stats.points - stats.detections;

        log::info!(
            "Stacked {} of {} measurements into {} points over {} windows ({} detections, {} upper limits, zp_ref={:.3})",
            stats.usable,
            stats.total,
            stats.points,
            stats.windows,
            stats.detections,
            stats.upper_limits,
            zp_ref
        );

        Ok(StackOutcome { points, stats })
    }

    fn windows_for(&self, members: &[RescaledMeasurement]) -> StackResult<Vec<Window>> {
        let times: Vec<JulianDate> = members.iter().map(|m| m.time).collect();
        build_windows(
            &times,
            self.config.windowing_policy,
            self.config.window_width_days,
            self.config.max_gap_days,
        )
    }

    fn stack_per_band(
        &self,
        rescaled: &[RescaledMeasurement],
        zp_ref: f64,
        thresholds: &Thresholds,
        stats: &mut StackStats,
    ) -> StackResult<Vec<CombinedPoint>> {
        let mut by_band: BTreeMap<FilterBand, Vec<RescaledMeasurement>> = BTreeMap::new();
        for m in rescaled {
            by_band.entry(m.band).or_default().push(*m);
        }

        let mut points = Vec::new();
        for (band, members) in by_band {
            let windows = self.windows_for(&members)?;
            stats.windows += windows.len();

            for window in &windows {
                let group: Vec<RescaledMeasurement> =
                    window.members.iter().map(|&pos| members[pos]).collect();
                if let Some(point) = combine_group(band, &group, zp_ref, thresholds) {
                    points.push(point);
                }
            }
        }
        Ok(points)
    }

    fn stack_pooled(
        &self,
        rescaled: &[RescaledMeasurement],
        zp_ref: f64,
        thresholds: &Thresholds,
        stats: &mut StackStats,
    ) -> StackResult<Vec<CombinedPoint>> {
        let windows = self.windows_for(rescaled)?;
        stats.windows = windows.len();

        let mut points = Vec::new();
        for window in &windows {
            let mut by_band: BTreeMap<FilterBand, Vec<RescaledMeasurement>> = BTreeMap::new();
            for &pos in &window.members {
                by_band.entry(rescaled[pos].band).or_default().push(rescaled[pos]);
            }

            for (band, group) in by_band {
                if let Some(mut point) = combine_group(band, &group, zp_ref, thresholds) {
                    // pooled windows share their extent across bands
                    point.window_start = window.start;
                    point.window_end = window.end;
                    points.push(point);
                }
            }
        }
        Ok(points)
    }
}

impl Default for StackPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to stack with default settings and a given window width
pub fn stack_light_curve(measurements: &[Measurement], width_days: f64) -> StackResult<StackOutcome> {
    StackPipeline::with_config(StackConfig::with_width(width_days))?.process(measurements)
}
