use crate::core::models::pairs::{DistanceWindow, PairMode, build_pairs};
use crate::core::models::reference::{ConfigurationError, ReferenceFrame};
use crate::engine::alignment::OptimalAligner;
use crate::engine::drmsd::DistanceMetric;
use crate::engine::error::EngineError;
use crate::engine::simple::SimpleAligner;
use crate::engine::virial;
use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of supported metrics, resolved to a concrete strategy once at
/// setup so no string dispatch survives into the hot evaluation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricKind {
    /// Translation-only RMSD.
    Simple,
    /// Optimal-superposition RMSD (Kearsley alignment).
    Optimal,
    /// DRMSD over every atom pair.
    Drmsd,
    /// DRMSD over same-block pairs only.
    IntraDrmsd,
    /// DRMSD over cross-block pairs only.
    InterDrmsd,
}

impl MetricKind {
    /// Pair-filter mode for the DRMSD variants, `None` for coordinate metrics.
    pub fn pair_mode(&self) -> Option<PairMode> {
        match self {
            MetricKind::Simple | MetricKind::Optimal => None,
            MetricKind::Drmsd => Some(PairMode::All),
            MetricKind::IntraDrmsd => Some(PairMode::Intra),
            MetricKind::InterDrmsd => Some(PairMode::Inter),
        }
    }
}

impl FromStr for MetricKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SIMPLE" => Ok(MetricKind::Simple),
            "OPTIMAL" => Ok(MetricKind::Optimal),
            "DRMSD" => Ok(MetricKind::Drmsd),
            "INTRA-DRMSD" => Ok(MetricKind::IntraDrmsd),
            "INTER-DRMSD" => Ok(MetricKind::InterDrmsd),
            _ => Err(ConfigurationError::UnknownMetricType(s.to_string())),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::Simple => "SIMPLE",
            MetricKind::Optimal => "OPTIMAL",
            MetricKind::Drmsd => "DRMSD",
            MetricKind::IntraDrmsd => "INTRA-DRMSD",
            MetricKind::InterDrmsd => "INTER-DRMSD",
        };
        f.write_str(name)
    }
}

/// Everything one evaluation call produces.
///
/// Owned buffers, overwritten on every call: keep one instance alive across a
/// trajectory and pass it to [`StructuralMetric::evaluate_into`] to avoid
/// per-step allocation.
#[derive(Debug, Clone, Default)]
pub struct MetricOutput {
    /// Scalar dissimilarity (squared or root form, per the evaluation flag).
    pub value: f64,
    /// Gradient of the value with respect to each instantaneous atom position.
    pub derivatives: Vec<Vector3<f64>>,
    /// Virial tensor `-Σᵢ posᵢ ⊗ gradᵢ`.
    pub virial: Matrix3<f64>,
}

impl MetricOutput {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone)]
enum Strategy {
    Simple(SimpleAligner),
    Optimal(OptimalAligner),
    Distance(DistanceMetric),
}

/// A fully resolved metric: immutable reference data plus a concrete strategy.
///
/// Holds no mutable state; each evaluation is a pure function of the
/// instantaneous coordinates, so independent instances may run on different
/// threads and one instance may be shared read-only.
#[derive(Debug, Clone)]
pub struct StructuralMetric {
    kind: MetricKind,
    strategy: Strategy,
}

impl StructuralMetric {
    /// Resolves `kind` against the reference frame.
    ///
    /// `window` applies only to the DRMSD variants and is ignored by the
    /// coordinate metrics.
    pub fn from_reference(
        frame: &ReferenceFrame,
        kind: MetricKind,
        window: DistanceWindow,
    ) -> Result<Self, EngineError> {
        let strategy = match kind.pair_mode() {
            None => match kind {
                MetricKind::Simple => Strategy::Simple(SimpleAligner::new(frame)?),
                _ => Strategy::Optimal(OptimalAligner::new(frame)?),
            },
            Some(mode) => {
                let pairs = build_pairs(frame, mode, window)?;
                Strategy::Distance(DistanceMetric::new(pairs)?)
            }
        };
        Ok(Self { kind, strategy })
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Evaluates the metric, reusing the buffers of `out`.
    pub fn evaluate_into(
        &self,
        positions: &[Point3<f64>],
        squared: bool,
        out: &mut MetricOutput,
    ) -> Result<(), EngineError> {
        out.value = match &self.strategy {
            Strategy::Simple(aligner) => {
                aligner
                    .measure_into(positions, squared, &mut out.derivatives)?
                    .value
            }
            Strategy::Optimal(aligner) => {
                aligner
                    .measure_into(positions, squared, &mut out.derivatives)?
                    .value
            }
            Strategy::Distance(metric) => {
                metric.measure_into(positions, squared, &mut out.derivatives)?
            }
        };
        out.virial = virial::accumulate(positions, &out.derivatives);
        Ok(())
    }

    /// Allocating convenience wrapper around
    /// [`evaluate_into`](Self::evaluate_into).
    pub fn evaluate(
        &self,
        positions: &[Point3<f64>],
        squared: bool,
    ) -> Result<MetricOutput, EngineError> {
        let mut out = MetricOutput::new();
        self.evaluate_into(positions, squared, &mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::reference::BlockPartition;

    fn frame() -> ReferenceFrame {
        ReferenceFrame::with_uniform_weights(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.1, 0.2, 0.0),
            Point3::new(0.3, 1.2, 0.2),
            Point3::new(-0.2, 0.4, 1.0),
        ])
        .expect("valid frame")
    }

    fn positions() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.2, 0.1, -0.1),
            Point3::new(1.3, 0.1, 0.2),
            Point3::new(0.2, 1.4, 0.1),
            Point3::new(-0.4, 0.3, 1.2),
        ]
    }

    #[test]
    fn legacy_type_strings_resolve_to_the_closed_variant() {
        assert_eq!("SIMPLE".parse::<MetricKind>().unwrap(), MetricKind::Simple);
        assert_eq!("OPTIMAL".parse::<MetricKind>().unwrap(), MetricKind::Optimal);
        assert_eq!("DRMSD".parse::<MetricKind>().unwrap(), MetricKind::Drmsd);
        assert_eq!(
            "INTRA-DRMSD".parse::<MetricKind>().unwrap(),
            MetricKind::IntraDrmsd
        );
        assert_eq!(
            "inter-drmsd".parse::<MetricKind>().unwrap(),
            MetricKind::InterDrmsd
        );
    }

    #[test]
    fn unknown_type_string_is_a_configuration_error() {
        let err = "KABSCH".parse::<MetricKind>().unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownMetricType("KABSCH".into()));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for kind in [
            MetricKind::Simple,
            MetricKind::Optimal,
            MetricKind::Drmsd,
            MetricKind::IntraDrmsd,
            MetricKind::InterDrmsd,
        ] {
            assert_eq!(kind.to_string().parse::<MetricKind>().unwrap(), kind);
        }
    }

    #[test]
    fn every_kind_evaluates_against_the_reference() {
        let base = frame();
        let partition = BlockPartition::new(vec![0, 2, 4], 4).unwrap();
        let blocked = base.clone().with_blocks(partition).unwrap();

        for kind in [
            MetricKind::Simple,
            MetricKind::Optimal,
            MetricKind::Drmsd,
            MetricKind::IntraDrmsd,
            MetricKind::InterDrmsd,
        ] {
            let metric =
                StructuralMetric::from_reference(&blocked, kind, DistanceWindow::default())
                    .unwrap_or_else(|e| panic!("setup failed for {kind}: {e}"));
            let out = metric.evaluate(&positions(), false).unwrap();
            assert!(out.value > 0.0, "{kind} should see a nonzero deviation");
            assert_eq!(out.derivatives.len(), 4);
        }
    }

    #[test]
    fn drmsd_block_modes_require_a_partition() {
        let err = StructuralMetric::from_reference(
            &frame(),
            MetricKind::IntraDrmsd,
            DistanceWindow::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Configuration(ConfigurationError::MissingBlockPartition(_))
        ));
    }

    #[test]
    fn virial_is_populated_from_the_derivative_buffer() {
        let metric =
            StructuralMetric::from_reference(&frame(), MetricKind::Optimal, DistanceWindow::default())
                .unwrap();
        let out = metric.evaluate(&positions(), true).unwrap();
        let expected = virial::accumulate(&positions(), &out.derivatives);
        assert_eq!(out.virial, expected);
    }

    #[test]
    fn output_buffers_are_reused_across_calls() {
        let metric =
            StructuralMetric::from_reference(&frame(), MetricKind::Simple, DistanceWindow::default())
                .unwrap();
        let mut out = MetricOutput::new();
        metric.evaluate_into(&positions(), true, &mut out).unwrap();
        let first = out.value;
        metric
            .evaluate_into(&frame().positions().to_vec(), true, &mut out)
            .unwrap();
        assert!(out.value < first);
        assert_eq!(out.derivatives.len(), 4);
    }
}
