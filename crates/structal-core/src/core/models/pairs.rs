use super::reference::{ConfigurationError, ReferenceFrame};
use crate::core::utils::geometry;
use serde::{Deserialize, Serialize};

/// Topology filter applied while enumerating reference atom pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PairMode {
    /// Every unordered pair (i, j) with i < j.
    All,
    /// Only pairs whose atoms fall within the same block.
    Intra,
    /// Only pairs whose atoms fall in different blocks.
    Inter,
}

/// Reference-distance filter for pair enumeration.
///
/// The window is open at the lower bound and closed at the upper bound: a pair
/// is kept when `lower < d <= upper`. A pair exactly at the lower cutoff is
/// excluded; one exactly at the upper cutoff is included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceWindow {
    pub lower: f64,
    pub upper: f64,
}

impl Default for DistanceWindow {
    fn default() -> Self {
        Self {
            lower: 0.0,
            upper: f64::INFINITY,
        }
    }
}

impl DistanceWindow {
    pub fn new(lower: f64, upper: f64) -> Result<Self, ConfigurationError> {
        if lower >= upper {
            return Err(ConfigurationError::InvalidCutoffWindow { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    #[inline]
    pub fn contains(&self, distance: f64) -> bool {
        distance > self.lower && distance <= self.upper
    }
}

/// One scored atom pair with its precomputed reference distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistancePair {
    pub i: usize,
    pub j: usize,
    pub reference_distance: f64,
}

/// Stable-ordered list of atom pairs built once from the reference configuration.
///
/// Ordering is ascending in `i`, then ascending in `j` within each `i`, and is
/// identical across calls: downstream consumers correlate pair-list position
/// with composed quantities, not (i, j) identity.
#[derive(Debug, Clone, PartialEq)]
pub struct PairList {
    pairs: Vec<DistancePair>,
    atom_count: usize,
}

impl PairList {
    pub fn pairs(&self) -> &[DistancePair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of atoms of the reference the list was built from. Every pair
    /// index is below this bound.
    pub fn atom_count(&self) -> usize {
        self.atom_count
    }
}

/// Enumerates the atom pairs of `frame` subject to `mode` and `window`.
///
/// # Errors
///
/// Fails when `mode` is [`PairMode::Intra`] or [`PairMode::Inter`] but the
/// frame carries no block partition, or when the window filters out every
/// pair.
pub fn build_pairs(
    frame: &ReferenceFrame,
    mode: PairMode,
    window: DistanceWindow,
) -> Result<PairList, ConfigurationError> {
    let positions = frame.positions();
    let mut pairs = Vec::new();

    let mut push_if_in_window = |i: usize, j: usize| {
        let reference_distance = geometry::distance(&positions[i], &positions[j]);
        if window.contains(reference_distance) {
            pairs.push(DistancePair {
                i,
                j,
                reference_distance,
            });
        }
    };

    match mode {
        PairMode::All => {
            for i in 0..positions.len() {
                for j in (i + 1)..positions.len() {
                    push_if_in_window(i, j);
                }
            }
        }
        PairMode::Intra => {
            let blocks = frame
                .blocks()
                .ok_or(ConfigurationError::MissingBlockPartition("intra"))?;
            for block in 0..blocks.n_blocks() {
                let range = blocks.block_range(block);
                for i in range.clone() {
                    for j in (i + 1)..range.end {
                        push_if_in_window(i, j);
                    }
                }
            }
        }
        PairMode::Inter => {
            let blocks = frame
                .blocks()
                .ok_or(ConfigurationError::MissingBlockPartition("inter"))?;
            for block_i in 0..blocks.n_blocks() {
                for block_j in (block_i + 1)..blocks.n_blocks() {
                    for i in blocks.block_range(block_i) {
                        for j in blocks.block_range(block_j) {
                            push_if_in_window(i, j);
                        }
                    }
                }
            }
        }
    }

    if pairs.is_empty() {
        return Err(ConfigurationError::EmptyPairList);
    }

    Ok(PairList {
        pairs,
        atom_count: frame.len(),
    })
}
