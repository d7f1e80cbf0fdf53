//! # Structal Core Library
//!
//! A differentiable structural-similarity metric engine for molecular simulation
//! analysis. Given a fixed reference configuration and an instantaneous set of
//! atomic coordinates, it produces a scalar dissimilarity value together with its
//! analytic derivative with respect to every atom position and a virial tensor.
//!
//! Three metric families are provided: translation-only RMSD, optimal-superposition
//! RMSD (Kearsley quaternion alignment), and distance-matrix RMSD (DRMSD) over a
//! filtered pair list.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a clear
//! separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains immutable data models
//!   (`ReferenceFrame`, `PairList`), pure geometry helpers, and reference-structure
//!   I/O.
//!
//! - **[`engine`]: The Logic Core.** Implements the metric strategies and their
//!   gradients, the closed [`engine::metric::MetricKind`] dispatch resolved once at
//!   setup, error taxonomy, and progress reporting.
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer. It
//!   ties `engine` and `core` together to measure whole trajectories against a
//!   reference structure.

pub mod core;
pub mod engine;
pub mod workflows;
