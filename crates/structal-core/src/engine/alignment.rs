use crate::core::models::reference::{ConfigurationError, ReferenceFrame};
use crate::core::utils::geometry;
use crate::engine::error::{EngineError, NumericalError};
use nalgebra::{
    Matrix3, Matrix4, Point3, Quaternion, Rotation3, SymmetricEigen, UnitQuaternion, Vector3,
    Vector4,
};

/// Below this value the √ chain rule is skipped; the MSD gradient is already
/// zero to the same order.
const VALUE_FLOOR: f64 = 1e-12;
/// Relative threshold on covariance eigenvalues when checking reference rank.
const RANK_TOLERANCE: f64 = 1e-9;
/// Relative threshold on the Kearsley eigenvalue gap below which the
/// eigenvector perturbation is ill-conditioned.
const GAP_TOLERANCE: f64 = 1e-10;

/// Result of one optimal-superposition measurement.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// The (possibly squared) displacement-weighted deviation.
    pub value: f64,
    /// Rotation carrying the centered reference onto the centered instantaneous
    /// frame.
    pub rotation: Rotation3<f64>,
    /// Alignment-weighted centroid of the instantaneous positions.
    pub centroid: Point3<f64>,
}

/// Optimal-superposition RMSD engine (Kearsley quaternion alignment).
///
/// Construction precomputes everything derivable from the immutable reference:
/// the centered reference coordinates and both normalized weight sets. Each
/// [`measure_into`](Self::measure_into) call is then a pure function of the
/// instantaneous coordinates.
///
/// The 4x4 Kearsley matrix is built from per-atom difference and sum vectors of
/// the centered frames; its smallest eigenvalue is the minimal alignment-weighted
/// squared deviation and the matching eigenvector is the optimal rotation
/// quaternion. The quaternion sign is fixed (scalar component non-negative) so
/// derivative signs are reproducible across runs.
#[derive(Debug, Clone)]
pub struct OptimalAligner {
    reference_centered: Vec<Vector3<f64>>,
    align_weights: Vec<f64>,
    displace_weights: Vec<f64>,
    matching_weights: bool,
}

impl OptimalAligner {
    /// Prepares the aligner from a validated reference frame.
    ///
    /// # Errors
    ///
    /// Fails when the reference has fewer than two atoms (rotation
    /// indeterminate) or when the weighted reference covariance is
    /// rank-deficient (coincident or collinear reference points).
    pub fn new(frame: &ReferenceFrame) -> Result<Self, ConfigurationError> {
        let n = frame.len();
        if n < 2 {
            return Err(ConfigurationError::TooFewAtoms {
                required: 2,
                actual: n,
            });
        }

        let align_weights = frame.align_weights().to_vec();
        let centroid = geometry::weighted_centroid(frame.positions(), &align_weights);
        let reference_centered = geometry::centered_coords(frame.positions(), &centroid);

        let mut covariance = Matrix3::zeros();
        for (r, &w) in reference_centered.iter().zip(&align_weights) {
            covariance += w * r * r.transpose();
        }
        let eigenvalues = SymmetricEigen::new(covariance).eigenvalues;
        let largest = eigenvalues.iter().cloned().fold(f64::MIN, f64::max);
        if largest <= 0.0 {
            return Err(ConfigurationError::DegenerateReference);
        }
        let rank = eigenvalues
            .iter()
            .filter(|&&ev| ev > largest * RANK_TOLERANCE)
            .count();
        if rank < 2 {
            return Err(ConfigurationError::DegenerateReference);
        }

        Ok(Self {
            reference_centered,
            align_weights,
            displace_weights: frame.displace_weights().to_vec(),
            matching_weights: frame.has_matching_weights(),
        })
    }

    pub fn atom_count(&self) -> usize {
        self.reference_centered.len()
    }

    /// Measures the instantaneous frame against the reference.
    ///
    /// `derivatives` is cleared and refilled with the gradient of the returned
    /// value with respect to each instantaneous atom position; reusing one
    /// buffer across calls avoids hot-path allocation.
    ///
    /// The gradient carries the direct deviation term, the implicit dependence
    /// of the optimal rotation on the positions (computed only when alignment
    /// and displacement weights differ; at matching weights the rotation is
    /// stationary for the scored quantity and the term vanishes), and the
    /// centroid-projection chain rule.
    pub fn measure_into(
        &self,
        positions: &[Point3<f64>],
        squared: bool,
        derivatives: &mut Vec<Vector3<f64>>,
    ) -> Result<Alignment, EngineError> {
        let n = self.atom_count();
        if positions.len() != n {
            return Err(ConfigurationError::AtomCountMismatch {
                expected: n,
                actual: positions.len(),
            }
            .into());
        }

        let centroid = geometry::weighted_centroid(positions, &self.align_weights);

        // Kearsley quadratic form over difference/sum vectors of the centered
        // frames.
        let mut kearsley = Matrix4::zeros();
        for (k, position) in positions.iter().enumerate() {
            let p = position - centroid;
            let d = self.reference_centered[k] - p;
            let s = self.reference_centered[k] + p;
            kearsley += self.align_weights[k] * kearsley_contribution(&d, &s);
        }

        let eigen = SymmetricEigen::new(kearsley);
        let order = ascending_order(&eigen.eigenvalues);
        let ground = order[0];

        let mut quaternion: Vector4<f64> = eigen.eigenvectors.column(ground).into_owned();
        if quaternion[0] < 0.0 {
            quaternion = -quaternion;
        }
        let rotation = UnitQuaternion::from_quaternion(Quaternion::new(
            quaternion[0],
            quaternion[1],
            quaternion[2],
            quaternion[3],
        ))
        .to_rotation_matrix();

        derivatives.clear();
        derivatives.resize(n, Vector3::zeros());

        // Direct deviation term, and the residual-outer-product matrix feeding
        // the rotation-derivative correction.
        let mut mean_square = 0.0;
        let mut residual_outer = Matrix3::zeros();
        for (k, position) in positions.iter().enumerate() {
            let p = position - centroid;
            let residual = p - rotation * self.reference_centered[k];
            let wd = self.displace_weights[k];
            mean_square += wd * residual.norm_squared();
            derivatives[k] = 2.0 * wd * residual;
            if !self.matching_weights {
                residual_outer += 2.0 * wd * residual * self.reference_centered[k].transpose();
            }
        }

        if !self.matching_weights {
            self.add_rotation_correction(
                positions,
                &centroid,
                &eigen,
                &order,
                &quaternion,
                &residual_outer,
                derivatives,
            )?;
        }

        // Chain rule through the alignment-weighted centroid removal.
        let total: Vector3<f64> = derivatives.iter().sum();
        for (g, &wa) in derivatives.iter_mut().zip(&self.align_weights) {
            *g -= wa * total;
        }

        let value = if squared {
            mean_square
        } else {
            let root = mean_square.sqrt();
            if root > VALUE_FLOOR {
                let scale = 1.0 / (2.0 * root);
                for g in derivatives.iter_mut() {
                    *g *= scale;
                }
            }
            root
        };

        Ok(Alignment {
            value,
            rotation,
            centroid,
        })
    }

    /// Reference coordinates rotated and shifted into the instantaneous frame
    /// of a previous [`measure_into`](Self::measure_into) call.
    pub fn superposed_reference(&self, alignment: &Alignment) -> Vec<Point3<f64>> {
        self.reference_centered
            .iter()
            .map(|r| alignment.centroid + alignment.rotation * r)
            .collect()
    }

    /// Adds the eigenvector-perturbation term accounting for the optimal
    /// rotation's dependence on the instantaneous positions.
    #[allow(clippy::too_many_arguments)]
    fn add_rotation_correction(
        &self,
        positions: &[Point3<f64>],
        centroid: &Point3<f64>,
        eigen: &SymmetricEigen<f64, nalgebra::Const<4>>,
        order: &[usize; 4],
        quaternion: &Vector4<f64>,
        residual_outer: &Matrix3<f64>,
        derivatives: &mut [Vector3<f64>],
    ) -> Result<(), EngineError> {
        let ground_value = eigen.eigenvalues[order[0]];
        let scale = 1.0 + eigen.eigenvalues[order[3]].abs();

        // Sensitivity of the scored deviation to each quaternion component.
        let mut value_by_quaternion = Vector4::zeros();
        for a in 0..4 {
            value_by_quaternion[a] =
                rotation_derivative(quaternion, a).dot(residual_outer);
        }

        // Fold the first-order eigenvector perturbation over the excited
        // eigenvectors into a single effective quaternion.
        let mut effective = Vector4::zeros();
        for &m in &order[1..] {
            let gap = eigen.eigenvalues[m] - ground_value;
            if gap < GAP_TOLERANCE * scale {
                return Err(NumericalError::DegenerateAlignment { gap }.into());
            }
            let excited: Vector4<f64> = eigen.eigenvectors.column(m).into_owned();
            effective += (value_by_quaternion.dot(&excited) / -gap) * excited;
        }

        for (k, position) in positions.iter().enumerate() {
            let p = position - centroid;
            let d = self.reference_centered[k] - p;
            let s = self.reference_centered[k] + p;
            let wa = self.align_weights[k];
            for axis in 0..3 {
                let matrix_derivative = kearsley_position_derivative(&d, &s, axis);
                derivatives[k][axis] -= wa * effective.dot(&(matrix_derivative * quaternion));
            }
        }

        Ok(())
    }
}

/// Indices of the eigenvalues sorted ascending; nalgebra's symmetric solver
/// does not guarantee an order, and downstream derivative signs depend on a
/// deterministic one.
fn ascending_order(eigenvalues: &Vector4<f64>) -> [usize; 4] {
    let mut order = [0usize, 1, 2, 3];
    order.sort_by(|&a, &b| {
        eigenvalues[a]
            .partial_cmp(&eigenvalues[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}

/// Per-atom contribution to the Kearsley matrix, built from the difference
/// vector `d = r - p` and sum vector `s = r + p` of the centered coordinates.
fn kearsley_contribution(d: &Vector3<f64>, s: &Vector3<f64>) -> Matrix4<f64> {
    let f00 = d.norm_squared();
    let f11 = d.x * d.x + s.y * s.y + s.z * s.z;
    let f22 = s.x * s.x + d.y * d.y + s.z * s.z;
    let f33 = s.x * s.x + s.y * s.y + d.z * d.z;
    let f01 = s.y * d.z - s.z * d.y;
    let f02 = s.z * d.x - s.x * d.z;
    let f03 = s.x * d.y - s.y * d.x;
    let f12 = d.x * d.y - s.x * s.y;
    let f13 = d.x * d.z - s.x * s.z;
    let f23 = d.y * d.z - s.y * s.z;
    Matrix4::new(
        f00, f01, f02, f03, //
        f01, f11, f12, f13, //
        f02, f12, f22, f23, //
        f03, f13, f23, f33,
    )
}

/// Derivative of [`kearsley_contribution`] with respect to the instantaneous
/// position along `axis`, using `dd/dp = -1` and `ds/dp = +1` on that axis.
fn kearsley_position_derivative(d: &Vector3<f64>, s: &Vector3<f64>, axis: usize) -> Matrix4<f64> {
    match axis {
        0 => {
            let g02 = -(s.z + d.z);
            let g03 = d.y + s.y;
            let g12 = -(d.y + s.y);
            let g13 = -(d.z + s.z);
            Matrix4::new(
                -2.0 * d.x, 0.0, g02, g03, //
                0.0, -2.0 * d.x, g12, g13, //
                g02, g12, 2.0 * s.x, 0.0, //
                g03, g13, 0.0, 2.0 * s.x,
            )
        }
        1 => {
            let g01 = d.z + s.z;
            let g03 = -(s.x + d.x);
            let g12 = -(d.x + s.x);
            let g23 = -(d.z + s.z);
            Matrix4::new(
                -2.0 * d.y, g01, 0.0, g03, //
                g01, 2.0 * s.y, g12, 0.0, //
                0.0, g12, -2.0 * d.y, g23, //
                g03, 0.0, g23, 2.0 * s.y,
            )
        }
        _ => {
            let g01 = -(s.y + d.y);
            let g02 = d.x + s.x;
            let g13 = -(d.x + s.x);
            let g23 = -(d.y + s.y);
            Matrix4::new(
                -2.0 * d.z, g01, g02, 0.0, //
                g01, 2.0 * s.z, 0.0, g13, //
                g02, 0.0, 2.0 * s.z, g23, //
                0.0, g13, g23, -2.0 * d.z,
            )
        }
    }
}

/// Derivative of the quaternion rotation matrix with respect to one quaternion
/// component, valid along tangent perturbations of a unit quaternion.
fn rotation_derivative(q: &Vector4<f64>, component: usize) -> Matrix3<f64> {
    let (q0, q1, q2, q3) = (q[0], q[1], q[2], q[3]);
    2.0 * match component {
        0 => Matrix3::new(
            q0, -q3, q2, //
            q3, q0, -q1, //
            -q2, q1, q0,
        ),
        1 => Matrix3::new(
            q1, q2, q3, //
            q2, -q1, -q0, //
            q3, q0, -q1,
        ),
        2 => Matrix3::new(
            -q2, q1, q0, //
            q1, q2, q3, //
            -q0, q3, -q2,
        ),
        _ => Matrix3::new(
            -q3, -q0, q1, //
            q0, -q3, q2, //
            q1, q2, q3,
        ),
    }
}
