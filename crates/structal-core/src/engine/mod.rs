pub mod alignment;
pub mod config;
pub mod drmsd;
pub mod error;
pub mod metric;
pub mod progress;
pub mod simple;
pub mod virial;
