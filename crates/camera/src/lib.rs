pub mod fit;
pub mod host;

pub use fit::*;
pub use host::*;
