pub mod feature;
pub mod geometry;

pub use feature::*;
pub use geometry::*;
