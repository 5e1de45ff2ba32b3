pub mod aligned;
pub mod geometry;

pub use aligned::*;
pub use geometry::*;

// Re-exports.
pub use approx;
pub use bytemuck;
pub use glam;
pub use static_assertions;
