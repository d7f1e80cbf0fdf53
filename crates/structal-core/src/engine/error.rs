use crate::core::models::reference::ConfigurationError;
use thiserror::Error;

/// Evaluation-time numerical failures.
///
/// These are fatal: the engine never approximates its way past a degenerate
/// gradient, since a silently corrupted derivative would poison any downstream
/// integration. Every call is deterministic, so a failure is reproducible and
/// must be surfaced rather than retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NumericalError {
    #[error(
        "Alignment eigenproblem is degenerate (eigenvalue gap {gap:.3e}); the optimal rotation derivative is undetermined"
    )]
    DegenerateAlignment { gap: f64 },

    #[error("Atoms {i} and {j} are coincident (distance {distance:.3e}); the pair direction is undefined")]
    CoincidentAtoms { i: usize, j: usize, distance: f64 },
}

/// Top-level error type of the metric engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Numerical error: {0}")]
    Numerical(#[from] NumericalError),
}
