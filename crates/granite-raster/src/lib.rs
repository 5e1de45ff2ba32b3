//! A coverage-only CPU rasterizer for occlusion culling.
//!
//! Objects are described by axis-aligned boxes compressed to eight `i16`s each (see [`compress_min_max_box`]). A batch
//! query projects up to 64 boxes with the frame's matrices and reports, as a bit mask, which of them cover enough pixels to
//! be worth drawing.

mod config;
mod rasterizer;
pub mod simd;

pub use config::*;
pub use rasterizer::*;
pub use simd::{VisibilityMask, MAX_BATCH_SIZE};

