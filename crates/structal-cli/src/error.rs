use structal::core::models::reference::ConfigurationError;
use structal::engine::config::ConfigError;
use structal::engine::error::EngineError;
use structal::workflows::measure::WorkflowError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Invalid(#[from] ConfigurationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),
}
