pub mod advertisement;

pub use advertisement::*;
