use crate::core::models::reference::{BlockPartition, ConfigurationError, ReferenceFrame};
use nalgebra::Point3;

/// Raw reference-structure data as read from a file, in the file's length unit.
///
/// The occupancy column is reused as the alignment weight and the
/// beta/temperature-factor column as the displacement weight; `TER` records
/// become block boundaries for DRMSD pair filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawReference {
    pub serials: Vec<usize>,
    pub names: Vec<String>,
    pub positions: Vec<Point3<f64>>,
    pub align_weights: Vec<f64>,
    pub displace_weights: Vec<f64>,
    /// Fence-post boundaries; always starts at 0 and ends at the atom count.
    pub block_boundaries: Vec<usize>,
}

impl RawReference {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Builds a validated [`ReferenceFrame`], rescaling every position by
    /// `length_scale` into the engine's internal unit.
    pub fn into_frame(self, length_scale: f64) -> Result<ReferenceFrame, ConfigurationError> {
        let atom_count = self.positions.len();
        let positions = self
            .positions
            .into_iter()
            .map(|p| Point3::from(p.coords * length_scale))
            .collect();
        let partition = BlockPartition::new(self.block_boundaries, atom_count)?;
        ReferenceFrame::new(positions, self.align_weights, self.displace_weights)?
            .with_blocks(partition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_frame_applies_the_length_scale() {
        let raw = RawReference {
            serials: vec![1, 2],
            names: vec!["CA".into(), "CB".into()],
            positions: vec![Point3::new(10.0, 0.0, 0.0), Point3::new(0.0, 20.0, 0.0)],
            align_weights: vec![1.0, 1.0],
            displace_weights: vec![1.0, 1.0],
            block_boundaries: vec![0, 2],
        };
        let frame = raw.into_frame(0.1).unwrap();
        assert!((frame.positions()[0].x - 1.0).abs() < 1e-12);
        assert!((frame.positions()[1].y - 2.0).abs() < 1e-12);
        assert_eq!(frame.blocks().unwrap().n_blocks(), 1);
    }

    #[test]
    fn into_frame_rejects_degenerate_weights() {
        let raw = RawReference {
            serials: vec![1, 2],
            names: vec!["CA".into(), "CB".into()],
            positions: vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)],
            align_weights: vec![0.0, 0.0],
            displace_weights: vec![1.0, 1.0],
            block_boundaries: vec![0, 2],
        };
        assert!(matches!(
            raw.into_frame(1.0),
            Err(ConfigurationError::DegenerateWeights { role: "alignment" })
        ));
    }
}
