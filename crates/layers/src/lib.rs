pub mod highlight;
pub mod layer;
pub mod raster;
pub mod style;
pub mod symbology;
pub mod vector;

pub use layer::*;
