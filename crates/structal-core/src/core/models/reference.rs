use nalgebra::Point3;
use thiserror::Error;

/// Setup-time validation failures.
///
/// Every variant is fatal and reproducible: a configuration that fails once will
/// fail identically on retry, so callers should surface the error and stop.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Expected {expected} atoms but received {actual}")]
    AtomCountMismatch { expected: usize, actual: usize },

    #[error("Expected one {role} weight per atom ({atoms}), got {weights}")]
    WeightCountMismatch {
        role: &'static str,
        atoms: usize,
        weights: usize,
    },

    #[error("Negative {role} weight {value} for atom {index}")]
    NegativeWeight {
        role: &'static str,
        index: usize,
        value: f64,
    },

    #[error("Sum of {role} weights must be positive")]
    DegenerateWeights { role: &'static str },

    #[error("Alignment requires at least {required} atoms, reference has {actual}")]
    TooFewAtoms { required: usize, actual: usize },

    #[error("Reference positions are degenerate (collinear or coincident); the optimal rotation is undetermined")]
    DegenerateReference,

    #[error("Block boundaries must start at 0, end at the atom count, and be strictly increasing")]
    InvalidBlockPartition,

    #[error("Pair mode '{0}' requires a block partition but the reference defines none")]
    MissingBlockPartition(&'static str),

    #[error("Lower cutoff {lower} must be strictly below upper cutoff {upper}")]
    InvalidCutoffWindow { lower: f64, upper: f64 },

    #[error("Distance window excludes every atom pair of the reference")]
    EmptyPairList,

    #[error("Unknown metric type '{0}'")]
    UnknownMetricType(String),
}

/// Contiguous, non-overlapping grouping of the atom sequence into molecules.
///
/// Boundaries are stored fence-post style: block `b` spans atom indices
/// `boundaries[b]..boundaries[b + 1]`. Used only by the DRMSD pair filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPartition {
    boundaries: Vec<usize>,
}

impl BlockPartition {
    /// Validates and builds a partition of `atom_count` atoms.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidBlockPartition`] unless the
    /// boundaries start at 0, end at `atom_count`, and increase strictly.
    pub fn new(boundaries: Vec<usize>, atom_count: usize) -> Result<Self, ConfigurationError> {
        let valid = boundaries.len() >= 2
            && boundaries.first() == Some(&0)
            && boundaries.last() == Some(&atom_count)
            && boundaries.windows(2).all(|w| w[0] < w[1]);
        if !valid {
            return Err(ConfigurationError::InvalidBlockPartition);
        }
        Ok(Self { boundaries })
    }

    pub fn n_blocks(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Half-open atom-index range of block `block`.
    pub fn block_range(&self, block: usize) -> std::ops::Range<usize> {
        self.boundaries[block]..self.boundaries[block + 1]
    }

    /// Index of the block containing atom `atom`.
    ///
    /// `atom` must be below the atom count the partition was built for.
    pub fn block_of(&self, atom: usize) -> usize {
        debug_assert!(
            atom < self.boundaries[self.boundaries.len() - 1],
            "atom index {atom} is outside the partition"
        );
        match self.boundaries.binary_search(&atom) {
            Ok(b) => b,
            Err(b) => b - 1,
        }
    }

    pub fn same_block(&self, i: usize, j: usize) -> bool {
        self.block_of(i) == self.block_of(j)
    }
}

/// Immutable reference configuration against which instantaneous frames are scored.
///
/// Holds the reference positions and two independent per-atom weight sets: the
/// alignment weights determine the optimal rotation and the removed centroid,
/// while the displacement weights determine each atom's contribution to the
/// scored deviation. Both sets are normalized to sum to one at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceFrame {
    positions: Vec<Point3<f64>>,
    align_weights: Vec<f64>,
    displace_weights: Vec<f64>,
    blocks: Option<BlockPartition>,
}

fn normalized(
    role: &'static str,
    atoms: usize,
    weights: Vec<f64>,
) -> Result<Vec<f64>, ConfigurationError> {
    if weights.len() != atoms {
        return Err(ConfigurationError::WeightCountMismatch {
            role,
            atoms,
            weights: weights.len(),
        });
    }
    if let Some((index, &value)) = weights.iter().enumerate().find(|&(_, &w)| w < 0.0) {
        return Err(ConfigurationError::NegativeWeight { role, index, value });
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(ConfigurationError::DegenerateWeights { role });
    }
    Ok(weights.into_iter().map(|w| w / total).collect())
}

impl ReferenceFrame {
    /// Builds a reference frame from raw positions and weights.
    ///
    /// # Errors
    ///
    /// Fails if either weight vector does not match the atom count, contains a
    /// negative entry, or sums to zero, or if the frame is empty.
    pub fn new(
        positions: Vec<Point3<f64>>,
        align_weights: Vec<f64>,
        displace_weights: Vec<f64>,
    ) -> Result<Self, ConfigurationError> {
        let atoms = positions.len();
        if atoms == 0 {
            return Err(ConfigurationError::TooFewAtoms {
                required: 1,
                actual: 0,
            });
        }
        let align_weights = normalized("alignment", atoms, align_weights)?;
        let displace_weights = normalized("displacement", atoms, displace_weights)?;
        Ok(Self {
            positions,
            align_weights,
            displace_weights,
            blocks: None,
        })
    }

    /// Convenience constructor giving every atom equal alignment and
    /// displacement weight.
    pub fn with_uniform_weights(positions: Vec<Point3<f64>>) -> Result<Self, ConfigurationError> {
        let n = positions.len();
        Self::new(positions, vec![1.0; n], vec![1.0; n])
    }

    /// Attaches a molecule partition (consumed by DRMSD pair filtering).
    pub fn with_blocks(mut self, blocks: BlockPartition) -> Result<Self, ConfigurationError> {
        if blocks.boundaries.last() != Some(&self.len()) {
            return Err(ConfigurationError::InvalidBlockPartition);
        }
        self.blocks = Some(blocks);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Alignment weights, normalized to sum to one.
    pub fn align_weights(&self) -> &[f64] {
        &self.align_weights
    }

    /// Displacement weights, normalized to sum to one.
    pub fn displace_weights(&self) -> &[f64] {
        &self.displace_weights
    }

    pub fn blocks(&self) -> Option<&BlockPartition> {
        self.blocks.as_ref()
    }

    /// Whether the normalized alignment and displacement weight vectors coincide.
    ///
    /// When they do, the optimal rotation minimizes exactly the quantity being
    /// scored and the rotation-derivative correction term vanishes.
    pub fn has_matching_weights(&self) -> bool {
        self.align_weights
            .iter()
            .zip(&self.displace_weights)
            .all(|(a, d)| (a - d).abs() < 1e-12)
    }
}
