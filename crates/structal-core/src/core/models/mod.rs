pub mod pairs;
pub mod reference;
