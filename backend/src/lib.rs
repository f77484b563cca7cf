//! # lcstack
//!
//! Windowed inverse-variance stacking of forced-photometry light curves.
//!
//! Difference-imaging surveys such as ZTF report one flux per epoch, each
//! calibrated against its own zero point and often too faint to be detected
//! on its own. This crate projects those fluxes onto a common zero point,
//! groups them into day-windows, combines each (window, band) group with
//! inverse-variance weights and classifies the result as a detection with a
//! magnitude or as an upper limit.
//!
//! ## Features
//!
//! - **Parsing**: ZTF forced-photometry service output and plain
//!   `jd filter flux flux_unc` tables
//! - **Calibration**: zero-point rescaling, baseline correction, chi-square
//!   based uncertainty validation
//! - **Windowing**: run-based or fixed-grid windows, per band or pooled
//! - **Combination**: inverse-variance weighted means and SNR classification
//! - **Output**: CSV tables and JSON reports
//! - **HTTP API**: REST endpoints behind the `http-server` feature
//!
//! ## Architecture
//!
//! - [`models`]: measurements, filter bands, Julian dates, combined points
//! - [`config`]: TOML-backed stacking configuration
//! - [`parsing`]: text input formats
//! - [`stacking`]: the rescale → window → combine pipeline
//! - [`output`]: flat rows, reports and writers
//! - [`http`]: axum server and request handlers
//!
//! ## Example
//!
//! ```
//! use lcstack::models::{FilterBand, Measurement};
//! use lcstack::stacking::stack_light_curve;
//!
//! let measurements = vec![
//!     Measurement::new(0, 2459000.1, FilterBand::ZtfG, Some(100.0), Some(10.0), 25.0),
//!     Measurement::new(1, 2459000.6, FilterBand::ZtfG, Some(120.0), Some(12.0), 25.0),
//! ];
//! let outcome = stack_light_curve(&measurements, 1.0).unwrap();
//! assert_eq!(outcome.points.len(), 1);
//! assert!(outcome.points[0].photometry.is_detection());
//! ```

// StackError carries structured context for diagnostics
#![allow(clippy::result_large_err)]

pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod parsing;
pub mod stacking;

#[cfg(feature = "http-server")]
pub mod http;

pub use config::StackConfig;
pub use error::{StackError, StackResult};
pub use stacking::{StackOutcome, StackPipeline};
