use crate::core::models::pairs::DistanceWindow;
use crate::core::models::reference::ConfigurationError;
use crate::engine::metric::MetricKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Invalid(#[from] ConfigurationError),
}

/// Declarative description of one metric, typically read from a TOML file.
///
/// ```toml
/// metric = "optimal"
/// squared = false
/// length-scale = 0.1
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct MetricConfig {
    /// Which metric to resolve; defaults to the translation-only RMSD, matching
    /// the historical TYPE=SIMPLE default.
    pub metric: MetricKind,
    /// Report the mean-square value instead of its root.
    pub squared: bool,
    /// Lower reference-distance cutoff for DRMSD pair filtering (exclusive).
    pub lower_cutoff: f64,
    /// Upper reference-distance cutoff for DRMSD pair filtering (inclusive).
    pub upper_cutoff: f64,
    /// Factor applied to reference-file positions to reach the engine's
    /// internal length unit (e.g. 0.1 for an Angstrom file and a nanometer
    /// engine).
    pub length_scale: f64,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            metric: MetricKind::Simple,
            squared: false,
            lower_cutoff: 0.0,
            upper_cutoff: f64::INFINITY,
            length_scale: 1.0,
        }
    }
}

impl MetricConfig {
    /// Validated cutoff window for the DRMSD variants.
    pub fn window(&self) -> Result<DistanceWindow, ConfigurationError> {
        DistanceWindow::new(self.lower_cutoff, self.upper_cutoff)
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.window()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

#[derive(Default)]
pub struct MetricConfigBuilder {
    metric: Option<MetricKind>,
    squared: Option<bool>,
    lower_cutoff: Option<f64>,
    upper_cutoff: Option<f64>,
    length_scale: Option<f64>,
}

impl MetricConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds every field from an existing configuration, so callers can layer
    /// selective overrides on top of a loaded file.
    pub fn from_config(config: MetricConfig) -> Self {
        Self {
            metric: Some(config.metric),
            squared: Some(config.squared),
            lower_cutoff: Some(config.lower_cutoff),
            upper_cutoff: Some(config.upper_cutoff),
            length_scale: Some(config.length_scale),
        }
    }

    pub fn metric(mut self, kind: MetricKind) -> Self {
        self.metric = Some(kind);
        self
    }

    pub fn squared(mut self, squared: bool) -> Self {
        self.squared = Some(squared);
        self
    }

    pub fn lower_cutoff(mut self, cutoff: f64) -> Self {
        self.lower_cutoff = Some(cutoff);
        self
    }

    pub fn upper_cutoff(mut self, cutoff: f64) -> Self {
        self.upper_cutoff = Some(cutoff);
        self
    }

    pub fn length_scale(mut self, scale: f64) -> Self {
        self.length_scale = Some(scale);
        self
    }

    pub fn build(self) -> Result<MetricConfig, ConfigError> {
        let defaults = MetricConfig::default();
        let config = MetricConfig {
            metric: self.metric.unwrap_or(defaults.metric),
            squared: self.squared.unwrap_or(defaults.squared),
            lower_cutoff: self.lower_cutoff.unwrap_or(defaults.lower_cutoff),
            upper_cutoff: self.upper_cutoff.unwrap_or(defaults.upper_cutoff),
            length_scale: self.length_scale.unwrap_or(defaults.length_scale),
        };
        config.window()?;
        Ok(config)
    }
}
