pub mod bounds;
pub mod color;
pub mod error;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use color::*;
pub use error::*;
