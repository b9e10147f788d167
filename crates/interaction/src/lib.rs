pub mod drawing;
pub mod surface;

pub use drawing::*;
pub use surface::*;
