//! Inverse-variance combination and detection classification.

use serde::{Deserialize, Serialize};

use crate::config::StackConfig;
use crate::models::{CombinedPoint, FilterBand, JulianDate, Photometry, RescaledMeasurement};

/// Converts a fractional flux error into a magnitude error (2.5 / ln 10).
pub const MAGNITUDE_ERROR_FACTOR: f64 = 1.0857;

/// Weighted mean of a group of fluxes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedFlux {
    pub flux: f64,
    pub flux_uncertainty: f64,
    /// Number of samples that contributed
    pub count: usize,
}

impl WeightedFlux {
    pub fn snr(&self) -> f64 {
        self.flux / self.flux_uncertainty
    }
}

/// Detection and upper-limit constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// A combined flux with SNR strictly above this is a detection
    pub detection_snr: f64,
    /// Upper limits are quoted at this multiple of the flux uncertainty
    pub upper_limit_multiplier: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            detection_snr: 5.0,
            upper_limit_multiplier: 3.0,
        }
    }
}

impl From<&StackConfig> for Thresholds {
    fn from(config: &StackConfig) -> Self {
        Self {
            detection_snr: config.detection_snr_threshold,
            upper_limit_multiplier: config.upper_limit_snr_multiplier,
        }
    }
}

/// Inverse-variance weighted mean of `(flux, uncertainty)` samples.
///
/// Weights are `1 / sigma^2`; the combined uncertainty is `(sum w)^-1/2`.
/// Returns `None` for an empty group or when the total weight is zero or
/// not finite.
pub fn weighted_mean<I>(samples: I) -> Option<WeightedFlux>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    let mut count = 0usize;

    for (flux, uncertainty) in samples {
        let w = 1.0 / (uncertainty * uncertainty);
        weighted_sum += w * flux;
        total_weight += w;
        count += 1;
    }

    if count == 0 || total_weight == 0.0 || !total_weight.is_finite() {
        return None;
    }

    Some(WeightedFlux {
        flux: weighted_sum / total_weight,
        flux_uncertainty: total_weight.powf(-0.5),
        count,
    })
}

/// Classify a combined flux as a detection or an upper limit.
pub fn classify(flux: f64, uncertainty: f64, zp_ref: f64, thresholds: &Thresholds) -> Photometry {
    let snr = flux / uncertainty;

    if snr > thresholds.detection_snr && flux != 0.0 {
        let magnitude = if flux > 0.0 {
            zp_ref - 2.5 * flux.log10()
        } else {
            // signed plotting convention for negative fluxes
            -(zp_ref - 2.5 * (-flux).log10())
        };
        Photometry::Detection {
            magnitude,
            magnitude_uncertainty: MAGNITUDE_ERROR_FACTOR * uncertainty / flux.abs(),
        }
    } else {
        Photometry::UpperLimit {
            limiting_magnitude: zp_ref
                - 2.5 * (thresholds.upper_limit_multiplier * uncertainty).log10(),
        }
    }
}

/// Collapse one (window, band) group into a combined point.
///
/// `window_start`/`window_end` are the times of the earliest and latest
/// members of the group. Returns `None` when the group carries no weight.
pub fn combine_group(
    band: FilterBand,
    members: &[RescaledMeasurement],
    zp_ref: f64,
    thresholds: &Thresholds,
) -> Option<CombinedPoint> {
    let combined = weighted_mean(members.iter().map(|m| (m.flux, m.flux_uncertainty)))?;

    let (window_start, window_end) = members.iter().fold(
        (JulianDate::new(f64::INFINITY), JulianDate::new(f64::NEG_INFINITY)),
        |(lo, hi), m| {
            (
                if m.time < lo { m.time } else { lo },
                if m.time > hi { m.time } else { hi },
            )
        },
    );

    Some(CombinedPoint {
        window_start,
        window_end,
        band,
        flux: combined.flux,
        flux_uncertainty: combined.flux_uncertainty,
        zero_point: zp_ref,
        n_measurements: combined.count,
        photometry: classify(combined.flux, combined.flux_uncertainty, zp_ref, thresholds),
    })
}
