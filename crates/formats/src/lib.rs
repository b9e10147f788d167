pub mod geojson;
pub mod wkt;

pub use geojson::*;
pub use wkt::*;
