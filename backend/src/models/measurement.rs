use serde::{Deserialize, Serialize};

use super::band::FilterBand;
use super::time::JulianDate;

/// One forced-photometry epoch as read from the source table.
///
/// `flux` and `flux_uncertainty` are optional because survey tables mark
/// failed PSF fits with a sentinel; such epochs are kept so that row indices
/// stay aligned with the source, but they never reach the stacker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Row index in the source table
    #[serde(default)]
    pub index: usize,
    pub time: JulianDate,
    pub band: FilterBand,
    pub flux: Option<f64>,
    pub flux_uncertainty: Option<f64>,
    pub zero_point: f64,
    #[serde(default)]
    pub chi_square: Option<f64>,
}

/// Why a measurement was left out of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// Flux or uncertainty missing (or not a finite number)
    Missing,
    /// Uncertainty present but zero or negative
    NonPositiveUncertainty,
    /// Time or zero point is NaN or infinite
    NonFinite,
}

impl Measurement {
    pub fn new(
        index: usize,
        time: impl Into<JulianDate>,
        band: FilterBand,
        flux: Option<f64>,
        flux_uncertainty: Option<f64>,
        zero_point: f64,
    ) -> Self {
        Self {
            index,
            time: time.into(),
            band,
            flux,
            flux_uncertainty,
            zero_point,
            chi_square: None,
        }
    }

    /// Attach a PSF-fit reduced chi-square.
    pub fn with_chi_square(mut self, chi_square: f64) -> Self {
        self.chi_square = Some(chi_square);
        self
    }

    /// Reason this measurement cannot be stacked, or `None` if it is usable.
    pub fn exclusion(&self) -> Option<Exclusion> {
        if !self.time.value().is_finite() || !self.zero_point.is_finite() {
            return Some(Exclusion::NonFinite);
        }
        match (self.flux, self.flux_uncertainty) {
            (Some(f), Some(u)) if f.is_finite() && u.is_finite() => {
                if u > 0.0 {
                    None
                } else {
                    Some(Exclusion::NonPositiveUncertainty)
                }
            }
            _ => Some(Exclusion::Missing),
        }
    }

    /// A measurement is usable when its time and zero point are finite and
    /// it has a finite flux with a finite, strictly positive uncertainty.
    pub fn is_usable(&self) -> bool {
        self.exclusion().is_none()
    }
}

/// A usable measurement projected onto the reference zero point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RescaledMeasurement {
    /// Row index of the source measurement
    pub index: usize,
    pub time: JulianDate,
    pub band: FilterBand,
    pub flux: f64,
    pub flux_uncertainty: f64,
}
