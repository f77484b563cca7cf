//! Windowed inverse-variance stacking.
//!
//! The stacker runs three steps over a fully materialized measurement table:
//! [`rescale`] projects every usable epoch onto a common zero point,
//! [`window`] partitions epochs into day-windows, and [`combine`] collapses
//! each (window, band) group into one flux and classifies it. [`pipeline`]
//! wires the three together.

pub mod combine;
pub mod pipeline;
pub mod rescale;
pub mod window;

pub use combine::{classify, combine_group, weighted_mean, Thresholds, WeightedFlux};
pub use pipeline::{stack_light_curve, StackOutcome, StackPipeline};
pub use rescale::{correct_baseline, reference_zero_point, rescale, validate_uncertainties};
pub use window::{build_windows, fixed_grid, run_based, Window, WindowBounds};

use serde::{Deserialize, Serialize};

/// Counters collected during one stacking run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackStats {
    pub total: usize,
    pub usable: usize,
    pub excluded_missing: usize,
    pub excluded_nonpositive_uncertainty: usize,
    /// Time or zero point not a finite number
    pub excluded_nonfinite: usize,
    pub windows: usize,
    pub points: usize,
    pub detections: usize,
    pub upper_limits: usize,
    /// `None` when the input was empty
    pub reference_zero_point: Option<f64>,
}

impl StackStats {
    pub fn excluded(&self) -> usize {
        self.excluded_missing + self.excluded_nonpositive_uncertainty + self.excluded_nonfinite
    }
}
