//! Process window metrics.

use am_core::round_to;

/// Approximate volumetric build rate: scan speed * layer thickness * hatch
/// spacing. Single bead runs pass `None` for the hatch spacing.
///
/// Useful for comparing parameter sets, not for predicting build time.
pub fn build_rate(scan_speed: f64, layer_thickness: f64, hatch_spacing: Option<f64>) -> f64 {
    round_to(scan_speed * layer_thickness * hatch_spacing.unwrap_or(1.0), 16)
}

/// Laser power over build rate, NaN when the build rate is zero.
pub fn energy_density(
    laser_power: f64,
    scan_speed: f64,
    layer_thickness: f64,
    hatch_spacing: Option<f64>,
) -> f64 {
    let br = build_rate(scan_speed, layer_thickness, hatch_spacing);
    if br != 0.0 { laser_power / br } else { f64::NAN }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_rate_is_rounded() {
        assert_eq!(build_rate(1.0, 5e-5, Some(1e-4)), 5e-9);
        assert_eq!(build_rate(2.0, 3e-5, None), 6e-5);
    }

    #[test]
    fn energy_density_values() {
        let ed = energy_density(200.0, 1.0, 5e-5, Some(1e-4));
        assert!((ed - 4e10).abs() / 4e10 < 1e-12);
        assert!((energy_density(200.0, 2.0, 5e-5, None) - 2e6).abs() < 1e-6);
        assert!(energy_density(200.0, 0.0, 5e-5, None).is_nan());
    }
}
