use serde::{Deserialize, Serialize};

use super::band::FilterBand;
use super::time::JulianDate;

/// Classification of a combined flux.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Photometry {
    /// Significant detection. For negative fluxes the magnitude carries a
    /// sign flip so that plotted points keep a monotonic ordering.
    Detection {
        magnitude: f64,
        magnitude_uncertainty: f64,
    },
    /// No significant detection; the source is fainter than this magnitude.
    UpperLimit { limiting_magnitude: f64 },
}

impl Photometry {
    pub fn is_detection(&self) -> bool {
        matches!(self, Photometry::Detection { .. })
    }

    pub fn magnitude(&self) -> Option<f64> {
        match self {
            Photometry::Detection { magnitude, .. } => Some(*magnitude),
            Photometry::UpperLimit { .. } => None,
        }
    }

    pub fn magnitude_uncertainty(&self) -> Option<f64> {
        match self {
            Photometry::Detection {
                magnitude_uncertainty,
                ..
            } => Some(*magnitude_uncertainty),
            Photometry::UpperLimit { .. } => None,
        }
    }

    pub fn upper_limit(&self) -> Option<f64> {
        match self {
            Photometry::Detection { .. } => None,
            Photometry::UpperLimit { limiting_magnitude } => Some(*limiting_magnitude),
        }
    }
}

/// Stacked flux for one (window, band) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedPoint {
    /// Time of the earliest measurement in the window
    pub window_start: JulianDate,
    /// Time of the latest measurement in the window
    pub window_end: JulianDate,
    pub band: FilterBand,
    pub flux: f64,
    pub flux_uncertainty: f64,
    /// Reference zero point the flux is expressed on
    pub zero_point: f64,
    /// Number of measurements that went into the stack
    pub n_measurements: usize,
    pub photometry: Photometry,
}

impl CombinedPoint {
    /// Plotting abscissa: the midpoint of the window.
    pub fn window_mid(&self) -> JulianDate {
        self.window_start.midpoint(&self.window_end)
    }

    pub fn snr(&self) -> f64 {
        self.flux / self.flux_uncertainty
    }
}
