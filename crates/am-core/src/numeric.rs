use crate::{CoreError, CoreResult};

/// Floating point type used throughout the client
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> CoreResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Check that `value` is a number inside `[min, max]`.
///
/// Error messages are the ones surfaced to users of the client, e.g.
/// `laser_power must be between 50 and 700.`
pub fn validate_range(value: Real, min: Real, max: Real, name: &str) -> CoreResult<Real> {
    if value.is_nan() {
        return Err(CoreError::validation(format!("{name} must be a number.")));
    }
    if value < min || value > max {
        return Err(CoreError::validation(format!(
            "{name} must be between {min} and {max}."
        )));
    }
    Ok(value)
}

/// Round to `decimals` places after the point.
pub fn round_to(value: Real, decimals: i32) -> Real {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    if scaled.is_finite() {
        scaled.round() / factor
    } else {
        value
    }
}

/// Median of the finite values; NaN when there are none.
pub fn median(values: &[Real]) -> Real {
    let mut sorted: Vec<Real> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return Real::NAN;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
