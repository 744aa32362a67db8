//! Scoring Primitives
//!
//! The two pure functions every suitability score is built from: a
//! piecewise-linear range scorer for continuous factors (temperature,
//! rainfall, pH, organic carbon) and a set-membership scorer for soil
//! texture. Both are deterministic and side-effect free.

/// Score a continuous value against an ideal range inside hard bounds.
///
/// Returns `ceiling` on the plateau `[ideal_low, ideal_high]`, 0 at or
/// beyond `[min, max]`, and interpolates linearly on the two shoulders,
/// so the curve is continuous at all four knots:
///
/// ```text
/// ceiling ┤      ________
///         │     /        \
///       0 ┤ ___/          \___
///         └──min──ideal──────max──>
/// ```
///
/// The result is clamped to `[0, ceiling]`, which also absorbs malformed
/// inputs (e.g. `min > ideal_low`) instead of returning nonsense.
pub fn score_linear(
    value: f64,
    ideal_low: f64,
    ideal_high: f64,
    min: f64,
    max: f64,
    ceiling: f64,
) -> f64 {
    let raw = if value >= ideal_low && value <= ideal_high {
        ceiling
    } else if value < ideal_low {
        if value <= min {
            0.0
        } else {
            (value - min) / (ideal_low - min) * ceiling
        }
    } else if value >= max {
        0.0
    } else {
        (max - value) / (max - ideal_high) * ceiling
    };

    raw.clamp(0.0, ceiling.max(0.0))
}

/// Score a categorical value by set membership, case-insensitively.
///
/// Returns `ceiling` iff `value` matches one of `ideal` (ASCII
/// case-folded, surrounding whitespace ignored), else 0.
pub fn score_texture(value: &str, ideal: &[String], ceiling: f64) -> f64 {
    let value = value.trim();
    if ideal.iter().any(|t| t.trim().eq_ignore_ascii_case(value)) {
        ceiling
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_plateau_returns_ceiling() {
        assert_eq!(score_linear(25.0, 20.0, 30.0, 10.0, 40.0, 100.0), 100.0);
        assert_eq!(score_linear(20.0, 20.0, 30.0, 10.0, 40.0, 100.0), 100.0);
        assert_eq!(score_linear(30.0, 20.0, 30.0, 10.0, 40.0, 100.0), 100.0);
    }

    #[test]
    fn test_shoulder_interpolation() {
        // Halfway up the lower shoulder
        assert_relative_eq!(score_linear(15.0, 20.0, 30.0, 10.0, 40.0, 100.0), 50.0);
        // Halfway down the upper shoulder
        assert_relative_eq!(score_linear(35.0, 20.0, 30.0, 10.0, 40.0, 100.0), 50.0);
    }

    #[test]
    fn test_outside_bounds_is_zero() {
        assert_eq!(score_linear(5.0, 20.0, 30.0, 10.0, 40.0, 100.0), 0.0);
        assert_eq!(score_linear(10.0, 20.0, 30.0, 10.0, 40.0, 100.0), 0.0);
        assert_eq!(score_linear(40.0, 20.0, 30.0, 10.0, 40.0, 100.0), 0.0);
        assert_eq!(score_linear(45.0, 20.0, 30.0, 10.0, 40.0, 100.0), 0.0);
    }

    #[test]
    fn test_monotonic_on_shoulders() {
        let mut prev = 0.0;
        for i in 0..=100 {
            let v = 10.0 + (i as f64) * 0.1; // 10 -> 20, rising shoulder
            let s = score_linear(v, 20.0, 30.0, 10.0, 40.0, 100.0);
            assert!(s >= prev, "not non-decreasing at {}", v);
            prev = s;
        }
        let mut prev = 100.0;
        for i in 0..=100 {
            let v = 30.0 + (i as f64) * 0.1; // 30 -> 40, falling shoulder
            let s = score_linear(v, 20.0, 30.0, 10.0, 40.0, 100.0);
            assert!(s <= prev, "not non-increasing at {}", v);
            prev = s;
        }
    }

    #[test]
    fn test_continuity_at_knots() {
        let eps = 1e-6;
        let near = |v| score_linear(v, 20.0, 30.0, 10.0, 40.0, 100.0);
        assert!((near(20.0 - eps) - near(20.0)).abs() < 1e-3);
        assert!((near(30.0 + eps) - near(30.0)).abs() < 1e-3);
        assert!((near(10.0 + eps) - near(10.0)).abs() < 1e-3);
        assert!((near(40.0 - eps) - near(40.0)).abs() < 1e-3);
    }

    #[test]
    fn test_malformed_bounds_stay_in_range() {
        // Inverted bounds (min > ideal_low, max < ideal_high) must never
        // escape [0, ceiling]
        for i in 0..=60 {
            let v = (i as f64) - 10.0; // sweep -10..50
            let s = score_linear(v, 20.0, 30.0, 25.0, 28.0, 100.0);
            assert!((0.0..=100.0).contains(&s), "escaped range at {}: {}", v, s);
        }
        // Degenerate plateau equal to bounds still stays in range
        let s = score_linear(20.0, 20.0, 20.0, 20.0, 20.0, 100.0);
        assert!((0.0..=100.0).contains(&s));
    }

    #[test]
    fn test_texture_membership() {
        let ideal = vec!["loam".to_string(), "clay loam".to_string()];
        assert_eq!(score_texture("loam", &ideal, 10.0), 10.0);
        assert_eq!(score_texture("Clay Loam", &ideal, 10.0), 10.0);
        assert_eq!(score_texture(" loam ", &ideal, 10.0), 10.0);
        assert_eq!(score_texture("sand", &ideal, 10.0), 0.0);
        assert_eq!(score_texture("loam", &[], 10.0), 0.0);
    }
}
