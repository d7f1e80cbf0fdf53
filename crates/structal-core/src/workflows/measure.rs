use crate::core::io::pdb::{PdbError, PdbFile};
use crate::core::io::traits::ReferenceFile;
use crate::core::models::reference::{ConfigurationError, ReferenceFrame};
use crate::engine::config::MetricConfig;
use crate::engine::error::EngineError;
use crate::engine::metric::{MetricOutput, StructuralMetric};
use crate::engine::progress::{Progress, ProgressReporter};
use nalgebra::Point3;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Failed to read '{path}': {source}", path = path.display())]
    File {
        path: PathBuf,
        #[source]
        source: PdbError,
    },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// One measured trajectory frame.
#[derive(Debug, Clone)]
pub struct FrameMeasurement {
    pub path: PathBuf,
    pub output: MetricOutput,
}

fn read_raw(path: &Path) -> Result<crate::core::io::containers::RawReference, WorkflowError> {
    PdbFile::read_from_path(path).map_err(|source| WorkflowError::File {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads and validates a reference configuration, rescaling positions by
/// `length_scale` into the engine's internal unit.
pub fn load_reference<P: AsRef<Path>>(
    path: P,
    length_scale: f64,
) -> Result<ReferenceFrame, WorkflowError> {
    let raw = read_raw(path.as_ref())?;
    Ok(raw.into_frame(length_scale)?)
}

/// Reads the instantaneous positions of one frame file, in engine units.
pub fn load_frame_positions<P: AsRef<Path>>(
    path: P,
    length_scale: f64,
) -> Result<Vec<Point3<f64>>, WorkflowError> {
    let raw = read_raw(path.as_ref())?;
    Ok(raw
        .positions
        .into_iter()
        .map(|p| Point3::from(p.coords * length_scale))
        .collect())
}

/// Resolves the configured metric against an already-loaded reference.
pub fn build_metric(
    config: &MetricConfig,
    frame: &ReferenceFrame,
) -> Result<StructuralMetric, WorkflowError> {
    let window = config.window()?;
    Ok(StructuralMetric::from_reference(frame, config.metric, window)?)
}

/// Measures every frame file against the reference structure.
///
/// The metric is resolved once; each frame is then a pure evaluation reusing
/// one output buffer. Progress is reported per frame through `reporter`.
pub fn run(
    config: &MetricConfig,
    reference_path: &Path,
    frame_paths: &[PathBuf],
    reporter: &ProgressReporter,
) -> Result<Vec<FrameMeasurement>, WorkflowError> {
    let reference = load_reference(reference_path, config.length_scale)?;
    let metric = build_metric(config, &reference)?;

    reporter.report(Progress::RunStart {
        total_frames: frame_paths.len() as u64,
    });
    reporter.report(Progress::Message(format!(
        "{} metric resolved against {} reference atoms",
        metric.kind(),
        reference.len()
    )));

    let mut results = Vec::with_capacity(frame_paths.len());
    let mut output = MetricOutput::new();
    for path in frame_paths {
        let positions = load_frame_positions(path, config.length_scale)?;
        metric.evaluate_into(&positions, config.squared, &mut output)?;
        results.push(FrameMeasurement {
            path: path.clone(),
            output: output.clone(),
        });
        reporter.report(Progress::FrameMeasured);
    }

    reporter.report(Progress::RunFinish);
    Ok(results)
}
