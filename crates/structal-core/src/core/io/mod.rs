pub mod containers;
pub mod pdb;
pub mod traits;
