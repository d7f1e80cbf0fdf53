use crate::core::models::pairs::PairList;
use crate::core::models::reference::ConfigurationError;
use crate::engine::error::{EngineError, NumericalError};
use nalgebra::{Point3, Vector3};

const VALUE_FLOOR: f64 = 1e-12;
/// Below this separation the pair's unit displacement vector is undefined.
const COINCIDENCE_FLOOR: f64 = 1e-10;

/// Distance-matrix RMSD engine.
///
/// Compares instantaneous pairwise interatomic distances against the reference
/// distances precomputed in a [`PairList`], needing no rotational alignment.
/// The value is the mean (or root-mean) square deviation over the pairs and the
/// gradient flows through each pair's unit displacement vector.
#[derive(Debug, Clone)]
pub struct DistanceMetric {
    pairs: PairList,
}

impl DistanceMetric {
    pub fn new(pairs: PairList) -> Result<Self, ConfigurationError> {
        if pairs.is_empty() {
            return Err(ConfigurationError::EmptyPairList);
        }
        Ok(Self { pairs })
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    pub fn pairs(&self) -> &PairList {
        &self.pairs
    }

    /// Measures the pairwise-distance deviation of the instantaneous frame.
    ///
    /// `positions` must contain every atom referenced by the pair list;
    /// `derivatives` is cleared and refilled with one gradient vector per
    /// instantaneous atom.
    ///
    /// # Errors
    ///
    /// Fails when the frame is shorter than the pair list requires, or when two
    /// paired atoms are coincident and the pair direction is undefined.
    pub fn measure_into(
        &self,
        positions: &[Point3<f64>],
        squared: bool,
        derivatives: &mut Vec<Vector3<f64>>,
    ) -> Result<f64, EngineError> {
        if positions.len() < self.pairs.atom_count() {
            return Err(ConfigurationError::AtomCountMismatch {
                expected: self.pairs.atom_count(),
                actual: positions.len(),
            }
            .into());
        }

        derivatives.clear();
        derivatives.resize(positions.len(), Vector3::zeros());

        let normalization = 1.0 / self.pairs.len() as f64;
        let mut mean_square = 0.0;

        for pair in self.pairs.pairs() {
            let separation = positions[pair.i] - positions[pair.j];
            let distance = separation.norm();
            if distance < COINCIDENCE_FLOOR {
                return Err(NumericalError::CoincidentAtoms {
                    i: pair.i,
                    j: pair.j,
                    distance,
                }
                .into());
            }
            let delta = distance - pair.reference_distance;
            mean_square += normalization * delta * delta;

            let gradient = (2.0 * normalization * delta / distance) * separation;
            derivatives[pair.i] += gradient;
            derivatives[pair.j] -= gradient;
        }

        if squared {
            Ok(mean_square)
        } else {
            let root = mean_square.sqrt();
            if root > VALUE_FLOOR {
                let scale = 1.0 / (2.0 * root);
                for g in derivatives.iter_mut() {
                    *g *= scale;
                }
            }
            Ok(root)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::pairs::{DistanceWindow, PairMode, build_pairs};
    use crate::core::models::reference::ReferenceFrame;
    use nalgebra::Rotation3;
    use nalgebra::Unit;

    const TOLERANCE: f64 = 1e-9;

    fn reference_positions() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.2, 0.0, 0.0),
            Point3::new(0.4, 1.1, 0.0),
            Point3::new(0.2, 0.3, 1.3),
        ]
    }

    fn displaced_positions() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.1, -0.1, 0.2),
            Point3::new(1.4, 0.2, -0.1),
            Point3::new(0.3, 1.3, 0.1),
            Point3::new(0.0, 0.2, 1.1),
        ]
    }

    fn metric() -> DistanceMetric {
        let frame = ReferenceFrame::with_uniform_weights(reference_positions()).unwrap();
        let pairs = build_pairs(&frame, PairMode::All, DistanceWindow::default()).unwrap();
        DistanceMetric::new(pairs).unwrap()
    }

    #[test]
    fn identical_frame_gives_zero() {
        let metric = metric();
        let mut derivatives = Vec::new();
        let value = metric
            .measure_into(&reference_positions(), true, &mut derivatives)
            .unwrap();
        assert!(value.abs() < TOLERANCE);
        for g in &derivatives {
            assert!(g.norm() < 1e-7);
        }
    }

    #[test]
    fn value_is_invariant_under_rigid_motion() {
        let metric = metric();
        let mut derivatives = Vec::new();
        let base = metric
            .measure_into(&displaced_positions(), false, &mut derivatives)
            .unwrap();

        let rotation = Rotation3::from_axis_angle(
            &Unit::new_normalize(Vector3::new(0.2, 1.0, -0.6)),
            1.9,
        );
        let moved: Vec<_> = displaced_positions()
            .iter()
            .map(|p| rotation * p + Vector3::new(4.0, -2.0, 6.0))
            .collect();
        let transformed = metric.measure_into(&moved, false, &mut derivatives).unwrap();
        assert!((base - transformed).abs() < TOLERANCE);
    }

    #[test]
    fn squared_and_unsquared_values_are_consistent() {
        let metric = metric();
        let mut derivatives = Vec::new();
        let squared = metric
            .measure_into(&displaced_positions(), true, &mut derivatives)
            .unwrap();
        let root = metric
            .measure_into(&displaced_positions(), false, &mut derivatives)
            .unwrap();
        assert!((root * root - squared).abs() < TOLERANCE);
    }

    #[test]
    fn gradient_sums_to_zero() {
        let metric = metric();
        let mut derivatives = Vec::new();
        metric
            .measure_into(&displaced_positions(), false, &mut derivatives)
            .unwrap();
        let total: Vector3<f64> = derivatives.iter().sum();
        assert!(total.norm() < 1e-10);
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let metric = metric();
        let positions = displaced_positions();
        let mut derivatives = Vec::new();
        metric
            .measure_into(&positions, false, &mut derivatives)
            .unwrap();

        let step = 1e-6;
        let mut scratch = Vec::new();
        for k in 0..positions.len() {
            for axis in 0..3 {
                let mut forward = positions.clone();
                forward[k][axis] += step;
                let plus = metric.measure_into(&forward, false, &mut scratch).unwrap();
                let mut backward = positions.clone();
                backward[k][axis] -= step;
                let minus = metric.measure_into(&backward, false, &mut scratch).unwrap();
                let numeric = (plus - minus) / (2.0 * step);
                assert!((derivatives[k][axis] - numeric).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn two_pair_value_is_the_mean_square_deviation() {
        let frame = ReferenceFrame::with_uniform_weights(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ])
        .unwrap();
        // Keep only the two short reference pairs (1.0 and 2.0).
        let window = DistanceWindow::new(0.0, 2.0).unwrap();
        let pairs = build_pairs(&frame, PairMode::All, window).unwrap();
        assert_eq!(pairs.len(), 2);
        let metric = DistanceMetric::new(pairs).unwrap();

        // Stretch each kept pair by 0.5 and 1.0 respectively.
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.5, 0.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
        ];
        let mut derivatives = Vec::new();
        let value = metric.measure_into(&positions, true, &mut derivatives).unwrap();
        assert!((value - (0.25 + 1.0) / 2.0).abs() < TOLERANCE);
    }

    #[test]
    fn coincident_atoms_are_a_numerical_error() {
        let metric = metric();
        let mut positions = reference_positions();
        positions[1] = positions[0];
        let mut derivatives = Vec::new();
        let err = metric
            .measure_into(&positions, true, &mut derivatives)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Numerical(NumericalError::CoincidentAtoms { i: 0, j: 1, .. })
        ));
    }

    #[test]
    fn short_instantaneous_frame_is_rejected() {
        let metric = metric();
        let mut derivatives = Vec::new();
        let err = metric
            .measure_into(&reference_positions()[..2], true, &mut derivatives)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Configuration(ConfigurationError::AtomCountMismatch { .. })
        ));
    }
}
