use crate::angle::{column_to_angle_deg, shortest_angle_between};
use crate::backend::Differences;
use serde::{Deserialize, Serialize};

/// How a heading is selected from a difference table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum SelectionPolicy {
    /// Global minimum over every snapshot and rotation.
    Unconstrained,
    /// Minimum over candidates whose heading lies strictly within
    /// `half_angle_deg` of the reference heading.
    FovConstrained { half_angle_deg: f64 },
}

/// Winning cell of a difference table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub row: usize,
    pub column: usize,
    pub heading_deg: f64,
    pub difference: f32,
}

impl SelectionPolicy {
    /// Scans `differences` and returns the selected cell, or `None` when the
    /// FOV window admits no candidate. Ties go to the first cell in
    /// row-major order.
    pub fn select(
        &self,
        differences: &Differences,
        query_heading_deg: f64,
        reference_heading_deg: f64,
    ) -> Option<Candidate> {
        let width = differences.columns();
        let mut best: Option<Candidate> = None;

        // The admissible columns are not contiguous once the window crosses
        // the ±width/2 discontinuity, so every cell is tested.
        for row in 0..differences.rows() {
            for column in 0..width {
                let difference = differences.get(row, column);
                // NaN cells cannot be ranked
                if difference.is_nan() || best.is_some_and(|b| difference >= b.difference) {
                    continue;
                }
                let heading_deg = query_heading_deg + column_to_angle_deg(column, width);
                if let SelectionPolicy::FovConstrained { half_angle_deg } = *self {
                    let offset = shortest_angle_between(heading_deg, reference_heading_deg);
                    if offset.abs() >= half_angle_deg {
                        continue;
                    }
                }
                best = Some(Candidate {
                    row,
                    column,
                    heading_deg,
                    difference,
                });
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::DMatrix;

    /// Row of 8 with its global minimum at column 6 (-90°).
    fn row_min_at_6() -> Differences {
        Differences::Row(vec![5.0, 6.0, 7.0, 8.0, 9.0, 4.0, 1.0, 3.0])
    }

    #[test]
    fn unconstrained_picks_global_minimum() {
        let best = SelectionPolicy::Unconstrained
            .select(&row_min_at_6(), 30.0, 0.0)
            .unwrap();
        assert_eq!(best.column, 6);
        assert_abs_diff_eq!(best.heading_deg, -60.0);
        assert_eq!(best.difference, 1.0);
    }

    #[test]
    fn fov_does_not_fall_back_to_global_optimum() {
        let policy = SelectionPolicy::FovConstrained {
            half_angle_deg: 10.0,
        };
        // column 4 sits exactly 10° away and is excluded by the strict bound
        assert!(policy.select(&row_min_at_6(), 0.0, 170.0).is_none());
    }

    #[test]
    fn fov_picks_best_inside_window() {
        let policy = SelectionPolicy::FovConstrained {
            half_angle_deg: 60.0,
        };
        // window around 170° admits columns 3 (135°), 4 (180°) and 5 (-135°)
        let best = policy.select(&row_min_at_6(), 0.0, 170.0).unwrap();
        assert_eq!(best.column, 5);
        assert_eq!(best.difference, 4.0);
        assert_abs_diff_eq!(best.heading_deg, -135.0);
    }

    #[test]
    fn fov_window_across_wrap_point() {
        // width 8, reference 0°: admissible columns 7, 0, 1 straddle the wrap
        let d = Differences::Row(vec![6.0, 5.0, 0.5, 0.5, 0.5, 0.5, 0.5, 2.0]);
        let policy = SelectionPolicy::FovConstrained {
            half_angle_deg: 60.0,
        };
        let best = policy.select(&d, 0.0, 0.0).unwrap();
        assert_eq!(best.column, 7);
        assert_abs_diff_eq!(best.heading_deg, -45.0);
    }

    #[test]
    fn matrix_scan_reports_row_and_first_tie() {
        let d = Differences::Matrix(DMatrix::from_row_slice(
            2,
            4,
            &[3.0, 2.0, 9.0, 9.0, 9.0, 1.0, 1.0, 9.0],
        ));
        let best = SelectionPolicy::Unconstrained.select(&d, 0.0, 0.0).unwrap();
        assert_eq!((best.row, best.column), (1, 1));

        let fov = SelectionPolicy::FovConstrained {
            half_angle_deg: 45.0,
        };
        // only column 0 (0°) survives a ±45° window when width is 4
        let best = fov.select(&d, 0.0, 0.0).unwrap();
        assert_eq!((best.row, best.column), (0, 0));
        assert_eq!(best.difference, 3.0);
    }

    #[test]
    fn nan_cells_are_never_selected() {
        let d = Differences::Row(vec![f32::NAN, 3.0, f32::NAN, 2.0]);
        let best = SelectionPolicy::Unconstrained.select(&d, 0.0, 0.0).unwrap();
        assert_eq!(best.column, 3);
        assert_eq!(best.difference, 2.0);

        let all_nan = Differences::Row(vec![f32::NAN; 4]);
        assert!(SelectionPolicy::Unconstrained
            .select(&all_nan, 0.0, 0.0)
            .is_none());
    }
}
