use nalgebra::{Matrix3, Point3, Vector3};

/// Accumulates the virial tensor `-Σᵢ posᵢ ⊗ gradᵢ` from the current positions
/// and the per-atom derivative buffer.
///
/// Always recomputed in full: incremental maintenance invites stale-state bugs
/// when the active atom set changes between calls.
pub fn accumulate(positions: &[Point3<f64>], derivatives: &[Vector3<f64>]) -> Matrix3<f64> {
    let mut virial = Matrix3::zeros();
    for (position, derivative) in positions.iter().zip(derivatives) {
        virial -= position.coords * derivative.transpose();
    }
    virial
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virial_is_negated_sum_of_outer_products() {
        let positions = vec![Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 2.0, 0.0)];
        let derivatives = vec![Vector3::new(0.0, 3.0, 0.0), Vector3::new(1.0, 0.0, 0.0)];
        let virial = accumulate(&positions, &derivatives);
        assert_eq!(virial[(0, 1)], -3.0);
        assert_eq!(virial[(1, 0)], -2.0);
        assert_eq!(virial[(0, 0)], 0.0);
    }

    #[test]
    fn zero_derivatives_give_zero_virial() {
        let positions = vec![Point3::new(5.0, -3.0, 2.0)];
        let derivatives = vec![Vector3::zeros()];
        assert_eq!(accumulate(&positions, &derivatives), Matrix3::zeros());
    }
}
