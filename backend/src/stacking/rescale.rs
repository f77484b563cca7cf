//! Photometric calibration steps applied before windowing.
//!
//! Survey epochs are calibrated against different zero points; before fluxes
//! can be averaged they must be projected onto a single reference zero point.

use std::collections::BTreeMap;

use crate::config::ZeroPointPolicy;
use crate::models::{FilterBand, Measurement, RescaledMeasurement};

/// Factor that projects a flux measured at `zero_point` onto `zp_ref`.
#[inline]
pub fn zero_point_factor(zero_point: f64, zp_ref: f64) -> f64 {
    10f64.powf(0.4 * (zp_ref - zero_point))
}

/// Pick the common zero point for a run.
///
/// All ingested measurements take part, usable or not. Returns `None` when
/// there is no finite zero point to choose from.
pub fn reference_zero_point(measurements: &[Measurement], policy: ZeroPointPolicy) -> Option<f64> {
    let zps = measurements
        .iter()
        .map(|m| m.zero_point)
        .filter(|zp| zp.is_finite());

    match policy {
        ZeroPointPolicy::Min => zps.reduce(f64::min),
        ZeroPointPolicy::Mean => {
            let (sum, count) = zps.fold((0.0, 0usize), |(s, n), zp| (s + zp, n + 1));
            if count == 0 {
                None
            } else {
                Some(sum / count as f64)
            }
        }
    }
}

/// Project every usable measurement onto `zp_ref`.
///
/// Unusable measurements are dropped, not reported; the caller counts them
/// beforehand if it needs to.
pub fn rescale(measurements: &[Measurement], zp_ref: f64) -> Vec<RescaledMeasurement> {
    measurements
        .iter()
        .filter_map(|m| match (m.flux, m.flux_uncertainty) {
            (Some(flux), Some(unc)) if m.is_usable() => {
                let factor = zero_point_factor(m.zero_point, zp_ref);
                Some(RescaledMeasurement {
                    index: m.index,
                    time: m.time,
                    band: m.band,
                    flux: flux * factor,
                    flux_uncertainty: unc * factor,
                })
            }
            _ => None,
        })
        .collect()
}

/// Subtract a residual baseline from every present raw flux.
pub fn correct_baseline(measurements: &[Measurement], baseline: f64) -> Vec<Measurement> {
    measurements
        .iter()
        .map(|m| Measurement {
            flux: m.flux.map(|f| f - baseline),
            ..m.clone()
        })
        .collect()
}

/// Chi-square usable for inflation; zero would erase the uncertainty.
fn fit_chi_square(m: &Measurement) -> Option<f64> {
    m.chi_square.filter(|c| c.is_finite() && *c > 0.0)
}

/// Inflate uncertainties of bands whose PSF fits are poorly scaled.
///
/// For each band the mean chi-square of usable measurements is computed; when
/// it does not round to 1, each measurement's uncertainty in that band is
/// multiplied by the square root of its own chi-square. Measurements without
/// a positive chi-square are left alone and do not enter the band mean.
pub fn validate_uncertainties(measurements: &[Measurement]) -> Vec<Measurement> {
    let mut chi_by_band: BTreeMap<FilterBand, Vec<f64>> = BTreeMap::new();
    for m in measurements.iter().filter(|m| m.is_usable()) {
        if let Some(chi) = fit_chi_square(m) {
            chi_by_band.entry(m.band).or_default().push(chi);
        }
    }

    let inflated: BTreeMap<FilterBand, f64> = chi_by_band
        .into_iter()
        .map(|(band, chis)| (band, chis.iter().sum::<f64>() / chis.len() as f64))
        .filter(|(_, mean)| mean.round() != 1.0)
        .collect();

    for (band, mean) in &inflated {
        log::debug!(
            "Mean chi-square {:.3} for {}; inflating uncertainties",
            mean,
            band
        );
    }

    measurements
        .iter()
        .map(|m| {
            match (inflated.contains_key(&m.band), fit_chi_square(m)) {
                (true, Some(chi)) => Measurement {
                    flux_uncertainty: m.flux_uncertainty.map(|u| u * chi.sqrt()),
                    ..m.clone()
                },
                _ => m.clone(),
            }
        })
        .collect()
}
