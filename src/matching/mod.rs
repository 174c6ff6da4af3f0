//! Heading estimation on top of a difference backend.
//!
//! A [`Matcher`] composes two independent choices made at construction:
//! the backend producing per-rotation differences (stored snapshots or a
//! learned model) and the [`SelectionPolicy`] picking a cell from them.
//! The four [`MatcherVariant`]s are the combinations of the two.

mod policy;
pub mod ridf;

pub use policy::{Candidate, SelectionPolicy};
pub use ridf::ridf;

use crate::angle::wrap_deg;
use crate::backend::{DifferenceBackend, InfoMax, InfoMaxParams, PerfectMemory};
use crate::database::ImageDatabase;
use crate::error::{Error, Result};
use crate::image::ImageU8;
use log::info;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Outcome of one [`Matcher::test`] call.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MatchResult {
    /// Estimated heading in degrees, wrapped to (-180, 180].
    pub best_heading_deg: f64,
    /// `1 - lowest_difference`, clamped to [0, 1].
    pub confidence: f32,
    /// Lowest difference after the backend's normalization.
    pub lowest_difference: f32,
    /// Lowest difference on the backend's raw scale.
    pub raw_lowest_difference: f32,
    /// Matched route snapshot, for backends that store snapshots.
    pub snapshot_index: Option<usize>,
}

/// The four supported backend × policy combinations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum MatcherVariant {
    PerfectMemory,
    PerfectMemoryConstrained,
    InfoMax,
    InfoMaxConstrained,
}

impl MatcherVariant {
    pub const ALL: [MatcherVariant; 4] = [
        MatcherVariant::PerfectMemory,
        MatcherVariant::PerfectMemoryConstrained,
        MatcherVariant::InfoMax,
        MatcherVariant::InfoMaxConstrained,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MatcherVariant::PerfectMemory => "PerfectMemory",
            MatcherVariant::PerfectMemoryConstrained => "PerfectMemoryConstrained",
            MatcherVariant::InfoMax => "InfoMax",
            MatcherVariant::InfoMaxConstrained => "InfoMaxConstrained",
        }
    }

    pub fn uses_perfect_memory(&self) -> bool {
        matches!(
            self,
            MatcherVariant::PerfectMemory | MatcherVariant::PerfectMemoryConstrained
        )
    }

    pub fn is_constrained(&self) -> bool {
        matches!(
            self,
            MatcherVariant::PerfectMemoryConstrained | MatcherVariant::InfoMaxConstrained
        )
    }

    /// Selection policy of this variant; `fov_deg` only applies to the
    /// constrained ones.
    pub fn policy(&self, fov_deg: f64) -> SelectionPolicy {
        if self.is_constrained() {
            SelectionPolicy::FovConstrained {
                half_angle_deg: fov_deg,
            }
        } else {
            SelectionPolicy::Unconstrained
        }
    }
}

impl fmt::Display for MatcherVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MatcherVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MatcherVariant::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| Error::UnknownVariant(s.to_string()))
    }
}

/// Backend plus selection policy. Holds no per-query state, so one matcher
/// can serve many grid points concurrently.
pub struct Matcher {
    backend: Box<dyn DifferenceBackend>,
    policy: SelectionPolicy,
}

impl Matcher {
    pub fn new(backend: Box<dyn DifferenceBackend>, policy: SelectionPolicy) -> Self {
        Self { backend, policy }
    }

    /// Builds `variant` trained on the snapshots of `route`, resized to
    /// `width × height`. InfoMax weights are cached next to the route.
    pub fn for_route(
        variant: MatcherVariant,
        route: &ImageDatabase,
        width: usize,
        height: usize,
        fov_deg: f64,
        infomax: &InfoMaxParams,
    ) -> Result<Self> {
        if route.is_empty() {
            return Err(Error::InvalidInput(format!(
                "route database {} has no entries",
                route.path().display()
            )));
        }
        let backend: Box<dyn DifferenceBackend> = if variant.uses_perfect_memory() {
            let mut pm = PerfectMemory::new(width, height);
            for snapshot in route.snapshots(width, height) {
                pm.train(&snapshot?.as_view())?;
            }
            Box::new(pm)
        } else {
            Box::new(InfoMax::load_or_train(
                route.path(),
                width,
                height,
                infomax,
                route.snapshots(width, height),
            )?)
        };
        info!(
            "{variant} matcher ready ({} route snapshots, {width}x{height})",
            route.len()
        );
        Ok(Self::new(backend, variant.policy(fov_deg)))
    }

    pub fn backend(&self) -> &dyn DifferenceBackend {
        self.backend.as_ref()
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Backend name with a `Constrained` suffix under the FOV policy, i.e.
    /// the [`MatcherVariant`] name for the built-in backends.
    pub fn name(&self) -> String {
        match self.policy {
            SelectionPolicy::Unconstrained => self.backend.name().to_string(),
            SelectionPolicy::FovConstrained { .. } => format!("{}Constrained", self.backend.name()),
        }
    }

    /// Whether [`MatchResult::snapshot_index`] is populated.
    pub fn reports_snapshot_index(&self) -> bool {
        self.backend.stores_snapshots()
    }

    /// Estimates the heading of `image`, captured facing `query_heading_deg`.
    ///
    /// `reference_heading_deg` is only consulted by the FOV-constrained
    /// policy; when its window admits nothing the call fails with
    /// [`Error::NoMatchInFov`].
    pub fn test(
        &self,
        image: &ImageU8<'_>,
        query_heading_deg: f64,
        reference_heading_deg: f64,
    ) -> Result<MatchResult> {
        let differences = self.backend.differences(image)?;
        let best = self
            .policy
            .select(&differences, query_heading_deg, reference_heading_deg)
            .ok_or(match self.policy {
                SelectionPolicy::FovConstrained { half_angle_deg } => Error::NoMatchInFov {
                    fov_deg: half_angle_deg,
                    reference_heading_deg,
                },
                SelectionPolicy::Unconstrained => {
                    Error::InvalidInput("backend returned an empty difference table".to_string())
                }
            })?;

        let lowest_difference = self.backend.scale().normalize(best.difference, &differences);
        Ok(MatchResult {
            best_heading_deg: wrap_deg(best.heading_deg),
            confidence: (1.0 - lowest_difference).clamp(0.0, 1.0),
            lowest_difference,
            raw_lowest_difference: best.difference,
            snapshot_index: differences.has_snapshots().then_some(best.row),
        })
    }

    /// RIDF of `image`, one value per column.
    pub fn ridf(&self, image: &ImageU8<'_>) -> Result<Vec<f32>> {
        let differences = self.backend.differences(image)?;
        Ok(ridf(&differences))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DifferenceScale, Differences};
    use approx::assert_abs_diff_eq;
    use nalgebra::DMatrix;

    /// Backend returning a fixed table regardless of the query.
    struct FixedBackend {
        differences: Differences,
        scale: DifferenceScale,
    }

    impl DifferenceBackend for FixedBackend {
        fn name(&self) -> &'static str {
            "Fixed"
        }
        fn image_size(&self) -> (usize, usize) {
            (self.differences.columns(), 1)
        }
        fn differences(&self, _image: &ImageU8<'_>) -> Result<Differences> {
            Ok(self.differences.clone())
        }
        fn scale(&self) -> DifferenceScale {
            self.scale
        }
        fn stores_snapshots(&self) -> bool {
            self.differences.has_snapshots()
        }
    }

    fn dummy_image(data: &[u8]) -> ImageU8<'_> {
        ImageU8 {
            w: data.len(),
            h: 1,
            stride: data.len(),
            data,
        }
    }

    fn snapshot_matcher(policy: SelectionPolicy) -> Matcher {
        let m = DMatrix::from_row_slice(
            2,
            4,
            &[200.0, 150.0, 250.0, 240.0, 100.0, 51.0, 90.0, 250.0],
        );
        Matcher::new(
            Box::new(FixedBackend {
                differences: Differences::Matrix(m),
                scale: DifferenceScale::Fixed(255.0),
            }),
            policy,
        )
    }

    #[test]
    fn unconstrained_snapshot_match_normalizes_by_255() {
        let data = [0u8; 4];
        let matcher = snapshot_matcher(SelectionPolicy::Unconstrained);
        let result = matcher.test(&dummy_image(&data), 100.0, 0.0).unwrap();
        assert_eq!(result.snapshot_index, Some(1));
        assert_abs_diff_eq!(result.best_heading_deg, -170.0);
        assert_abs_diff_eq!(result.lowest_difference, 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(result.confidence, 0.8, epsilon = 1e-6);
        assert_eq!(result.raw_lowest_difference, 51.0);
        assert!(matcher.reports_snapshot_index());
        assert_eq!(matcher.name(), "Fixed");
    }

    #[test]
    fn constrained_snapshot_match_respects_window() {
        let data = [0u8; 4];
        let matcher = snapshot_matcher(SelectionPolicy::FovConstrained {
            half_angle_deg: 30.0,
        });
        let result = matcher.test(&dummy_image(&data), 0.0, 10.0).unwrap();
        assert_eq!(result.snapshot_index, Some(1));
        assert_abs_diff_eq!(result.best_heading_deg, 0.0);
        assert_abs_diff_eq!(result.raw_lowest_difference, 100.0);
    }

    #[test]
    fn constrained_match_without_candidates_is_an_error() {
        let data = [0u8; 8];
        let matcher = Matcher::new(
            Box::new(FixedBackend {
                differences: Differences::Row(vec![5.0, 6.0, 7.0, 8.0, 9.0, 4.0, 1.0, 3.0]),
                scale: DifferenceScale::RowMaximum,
            }),
            SelectionPolicy::FovConstrained {
                half_angle_deg: 10.0,
            },
        );
        let err = matcher.test(&dummy_image(&data), 0.0, 170.0).unwrap_err();
        assert!(matches!(err, Error::NoMatchInFov { .. }));
        assert_eq!(matcher.name(), "FixedConstrained");
    }

    #[test]
    fn row_backend_has_no_snapshot_index() {
        let data = [0u8; 4];
        let matcher = Matcher::new(
            Box::new(FixedBackend {
                differences: Differences::Row(vec![4.0, 2.0, 8.0, 6.0]),
                scale: DifferenceScale::RowMaximum,
            }),
            SelectionPolicy::Unconstrained,
        );
        let result = matcher.test(&dummy_image(&data), 0.0, 0.0).unwrap();
        assert_eq!(result.snapshot_index, None);
        assert_abs_diff_eq!(result.best_heading_deg, 90.0);
        assert_abs_diff_eq!(result.confidence, 0.75);
        assert_eq!(matcher.ridf(&dummy_image(&data)).unwrap(), vec![4.0, 2.0, 8.0, 6.0]);
        assert!(!matcher.reports_snapshot_index());
    }

    #[test]
    fn variant_names_round_trip_and_reject_unknown() {
        for v in MatcherVariant::ALL {
            assert_eq!(v.name().parse::<MatcherVariant>().unwrap(), v);
        }
        let err = "BestGuess".parse::<MatcherVariant>().unwrap_err();
        assert!(matches!(err, Error::UnknownVariant(ref s) if s == "BestGuess"));
        assert_eq!(
            MatcherVariant::InfoMaxConstrained.policy(45.0),
            SelectionPolicy::FovConstrained {
                half_angle_deg: 45.0
            }
        );
        assert_eq!(
            MatcherVariant::PerfectMemory.policy(45.0),
            SelectionPolicy::Unconstrained
        );
    }
}
