use crate::core::models::reference::{ConfigurationError, ReferenceFrame};
use crate::core::utils::geometry;
use crate::engine::alignment::Alignment;
use crate::engine::error::EngineError;
use nalgebra::{Point3, Rotation3, Vector3};

const VALUE_FLOOR: f64 = 1e-12;

/// Translation-only RMSD engine.
///
/// Removes the alignment-weighted centroid from both frames and compares
/// coordinates directly, with no rotation step. This is the cheap fallback and
/// the reference against which the optimal aligner's gradient is validated: at
/// zero rotation the two must agree.
#[derive(Debug, Clone)]
pub struct SimpleAligner {
    reference_centered: Vec<Vector3<f64>>,
    align_weights: Vec<f64>,
    displace_weights: Vec<f64>,
}

impl SimpleAligner {
    pub fn new(frame: &ReferenceFrame) -> Result<Self, ConfigurationError> {
        if frame.is_empty() {
            return Err(ConfigurationError::TooFewAtoms {
                required: 1,
                actual: 0,
            });
        }
        let align_weights = frame.align_weights().to_vec();
        let centroid = geometry::weighted_centroid(frame.positions(), &align_weights);
        Ok(Self {
            reference_centered: geometry::centered_coords(frame.positions(), &centroid),
            align_weights,
            displace_weights: frame.displace_weights().to_vec(),
        })
    }

    pub fn atom_count(&self) -> usize {
        self.reference_centered.len()
    }

    /// Measures the instantaneous frame against the reference.
    ///
    /// The returned rotation is always the identity; it is carried so the
    /// simple and optimal engines share one result type.
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

        derivatives.clear();
        derivatives.resize(n, Vector3::zeros());

        let mut mean_square = 0.0;
        for (k, position) in positions.iter().enumerate() {
            let residual = (position - centroid) - self.reference_centered[k];
            let wd = self.displace_weights[k];
            mean_square += wd * residual.norm_squared();
            derivatives[k] = 2.0 * wd * residual;
        }

        // Chain rule through the alignment-weighted centroid removal; only a
        // no-op when the two weight sets coincide.
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
            rotation: Rotation3::identity(),
            centroid,
        })
    }
}
