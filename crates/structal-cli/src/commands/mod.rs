pub mod measure;
pub mod pairs;
