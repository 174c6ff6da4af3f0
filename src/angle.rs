//! Angle utilities shared by route geometry, matching and evaluation.
//!
//! Headings are plain `f64` degrees. The canonical range is (-180, 180],
//! which is also what `atan2` produces for segment headings.

/// Signed minimal rotation from `y` to `x` in degrees, in (-180, 180].
///
/// Inputs may lie outside [0, 360); the result is continuous across the
/// ±180° boundary.
#[inline]
pub fn shortest_angle_between(x_deg: f64, y_deg: f64) -> f64 {
    let diff = (x_deg - y_deg).to_radians();
    let wrapped = diff.sin().atan2(diff.cos()).to_degrees();
    // atan2 returns -180 for an exact half turn; keep the upper bound inclusive
    if wrapped <= -180.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Wraps a heading into (-180, 180].
#[inline]
pub fn wrap_deg(angle_deg: f64) -> f64 {
    shortest_angle_between(angle_deg, 0.0)
}

/// Signed pixel rotation represented by a RIDF column.
///
/// Columns past the image centre represent negative rotations.
#[inline]
pub fn column_to_pixel_rotation(column: usize, width: usize) -> i64 {
    let c = column as i64;
    if c > (width / 2) as i64 {
        c - width as i64
    } else {
        c
    }
}

/// Rotation in degrees represented by a RIDF column.
#[inline]
pub fn column_to_angle_deg(column: usize, width: usize) -> f64 {
    360.0 * column_to_pixel_rotation(column, width) as f64 / width as f64
}

/// Nearest RIDF column for a rotation in degrees (inverse of
/// [`column_to_angle_deg`] modulo the image width).
#[inline]
pub fn angle_to_column(angle_deg: f64, width: usize) -> usize {
    let pixels = (angle_deg / 360.0 * width as f64).round() as i64;
    pixels.rem_euclid(width as i64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn shortest_angle_basic() {
        assert_abs_diff_eq!(shortest_angle_between(10.0, 350.0), 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(shortest_angle_between(350.0, 10.0), -20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(shortest_angle_between(90.0, 0.0), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn shortest_angle_half_turn_is_positive() {
        assert_abs_diff_eq!(shortest_angle_between(180.0, 0.0), 180.0, epsilon = 1e-9);
        assert_abs_diff_eq!(shortest_angle_between(0.0, 180.0), 180.0, epsilon = 1e-9);
    }

    #[test]
    fn shortest_angle_handles_out_of_range_inputs() {
        assert_abs_diff_eq!(shortest_angle_between(725.0, -5.0), 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(shortest_angle_between(-540.0, 0.0), 180.0, epsilon = 1e-9);
    }

    #[test]
    fn wrap_keeps_canonical_range() {
        assert_abs_diff_eq!(wrap_deg(270.0), -90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(wrap_deg(-90.0), -90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(wrap_deg(360.0), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn column_wrap_convention() {
        // width 8: columns 0..=4 are non-negative, 5..=7 wrap to negative
        assert_eq!(column_to_pixel_rotation(4, 8), 4);
        assert_eq!(column_to_pixel_rotation(5, 8), -3);
        assert_abs_diff_eq!(column_to_angle_deg(2, 8), 90.0);
        assert_abs_diff_eq!(column_to_angle_deg(4, 8), 180.0);
        assert_abs_diff_eq!(column_to_angle_deg(6, 8), -90.0);
        assert_abs_diff_eq!(column_to_angle_deg(0, 120), 0.0);
        assert_abs_diff_eq!(column_to_angle_deg(119, 120), -3.0);
    }

    proptest! {
        #[test]
        fn shortest_angle_is_antisymmetric(x in -1000.0f64..1000.0, y in -1000.0f64..1000.0) {
            let a = shortest_angle_between(x, y);
            let b = shortest_angle_between(y, x);
            prop_assert!(a > -180.0 && a <= 180.0);
            // the half-turn case maps to +180 in both directions
            if (a.abs() - 180.0).abs() > 1e-6 {
                prop_assert!((a + b).abs() < 1e-6);
            }
        }

        #[test]
        fn column_round_trip(width in 2usize..400, seed in 0usize..10_000) {
            let column = seed % width;
            let angle = column_to_angle_deg(column, width);
            prop_assert_eq!(angle_to_column(angle, width), column);
        }
    }
}
