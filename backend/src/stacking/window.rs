//! Partitioning of epochs into contiguous day-windows.
//!
//! Both policies work on positions into the caller's slice of times, so the
//! caller can map windows back onto whatever records the times came from.
//! Input order does not matter; times are sorted (stably) first.

use serde::Serialize;

use crate::config::WindowingPolicy;
use crate::error::{ErrorContext, StackError, StackResult};
use crate::models::JulianDate;

/// The nominal interval that decided membership of a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowBounds {
    pub lower: JulianDate,
    pub upper: JulianDate,
    /// Run-based windows and the first grid bin include their lower edge
    pub lower_inclusive: bool,
}

impl WindowBounds {
    pub fn contains(&self, t: JulianDate) -> bool {
        let above = if self.lower_inclusive {
            t >= self.lower
        } else {
            t > self.lower
        };
        above && t <= self.upper
    }
}

/// A contiguous group of epochs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Window {
    /// Time of the earliest member
    pub start: JulianDate,
    /// Time of the latest member
    pub end: JulianDate,
    pub bounds: WindowBounds,
    /// Positions into the input slice, in time order
    pub members: Vec<usize>,
}

impl Window {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn span(&self) -> qtty::Days {
        self.end.days_since(&self.start)
    }
}

/// Sort positions by time, keeping the input order for equal times.
///
/// Rejects NaN and infinite times.
fn sorted_positions(times: &[JulianDate]) -> StackResult<Vec<(usize, f64)>> {
    if let Some(pos) = times.iter().position(|t| !t.value().is_finite()) {
        return Err(StackError::validation(format!(
            "time at position {} is not finite: {}",
            pos,
            times[pos].value()
        ))
        .with_operation("build_windows"));
    }
    let mut sorted: Vec<(usize, f64)> = times.iter().map(|t| t.value()).enumerate().collect();
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1));
    Ok(sorted)
}

fn check_width(width: qtty::Days, max_gap: Option<qtty::Days>) -> StackResult<(f64, Option<f64>)> {
    let w = width.value();
    if !w.is_finite() || w <= 0.0 {
        return Err(StackError::configuration_with_context(
            format!("window width must be positive, got {}", w),
            ErrorContext::new("build_windows"),
        ));
    }
    let gap = match max_gap.map(|g| g.value()) {
        Some(g) if !g.is_finite() || g <= 0.0 => {
            return Err(StackError::configuration_with_context(
                format!("max gap must be positive, got {}", g),
                ErrorContext::new("build_windows"),
            ))
        }
        other => other,
    };
    Ok((w, gap))
}

/// Run-based windows.
///
/// Starting from the earliest unassigned epoch `t0`, a window absorbs each
/// following epoch `t` while `t <= t0 + width` and, when `max_gap` is set,
/// while the step from the previously absorbed epoch is strictly below it.
pub fn run_based(
    times: &[JulianDate],
    width: qtty::Days,
    max_gap: Option<qtty::Days>,
) -> StackResult<Vec<Window>> {
    let (width, max_gap) = check_width(width, max_gap)?;
    let sorted = sorted_positions(times)?;
    let mut windows = Vec::new();

    let mut i = 0;
    while i < sorted.len() {
        let t0 = sorted[i].1;
        let upper = t0 + width;

        let mut j = i + 1;
        while j < sorted.len() {
            let t = sorted[j].1;
            if t > upper {
                break;
            }
            if let Some(gap) = max_gap {
                if t - sorted[j - 1].1 >= gap {
                    break;
                }
            }
            j += 1;
        }

        windows.push(Window {
            start: JulianDate::new(t0),
            end: JulianDate::new(sorted[j - 1].1),
            bounds: WindowBounds {
                lower: JulianDate::new(t0),
                upper: JulianDate::new(upper),
                lower_inclusive: true,
            },
            members: sorted[i..j].iter().map(|(pos, _)| *pos).collect(),
        });
        i = j;
    }

    Ok(windows)
}

/// Fixed-grid windows.
///
/// Edges run `first, first + width, ...` up to the first edge at or past the
/// latest epoch. Bin `k` (1-based) covers `(first + (k-1)*width, first + k*width]`;
/// the first bin also covers `first` itself. Empty bins produce no window.
pub fn fixed_grid(times: &[JulianDate], width: qtty::Days) -> StackResult<Vec<Window>> {
    let (width, _) = check_width(width, None)?;
    let sorted = sorted_positions(times)?;
    let Some(&(_, first)) = sorted.first() else {
        return Ok(Vec::new());
    };

    let edge = |k: u64| first + k as f64 * width;
    // the quotient can land one bin off near an edge; settle against the edges
    let bin_of = |t: f64| -> u64 {
        let mut k = (((t - first) / width).ceil() as u64).max(1);
        while k > 1 && t <= edge(k - 1) {
            k -= 1;
        }
        while t > edge(k) {
            k += 1;
        }
        k
    };

    let mut windows: Vec<Window> = Vec::new();
    let mut current_bin = 0u64;
    for &(pos, t) in &sorted {
        let bin = bin_of(t);
        match windows.last_mut() {
            Some(window) if bin == current_bin => {
                window.end = JulianDate::new(t);
                window.members.push(pos);
            }
            _ => {
                current_bin = bin;
                windows.push(Window {
                    start: JulianDate::new(t),
                    end: JulianDate::new(t),
                    bounds: WindowBounds {
                        lower: JulianDate::new(edge(bin - 1)),
                        upper: JulianDate::new(edge(bin)),
                        lower_inclusive: bin == 1,
                    },
                    members: vec![pos],
                });
            }
        }
    }

    Ok(windows)
}

/// Build windows with the given policy.
pub fn build_windows(
    times: &[JulianDate],
    policy: WindowingPolicy,
    width: qtty::Days,
    max_gap: Option<qtty::Days>,
) -> StackResult<Vec<Window>> {
    let windows = match policy {
        WindowingPolicy::RunBased => run_based(times, width, max_gap)?,
        WindowingPolicy::FixedGrid => fixed_grid(times, width)?,
    };
    log::debug!(
        "Built {} {} windows over {} epochs",
        windows.len(),
        policy,
        times.len()
    );
    Ok(windows)
}
