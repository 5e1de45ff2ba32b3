//! Continuous distance-dependent LOD terrain and coverage-based occlusion culling.
//!
//! The heavy lifting lives in the member crates: [`granite_terrain`] selects terrain patches every frame, and [`granite_raster`] decides
//! which objects are big enough on screen to draw. This crate ties them to a loadable [`Config`] and wraps the quadtree
//! in [`CdLodTerrain`], which manages its own instance buffer.

mod cdlod_terrain;
mod config;

pub use cdlod_terrain::CdLodTerrain;
pub use config::{Config, ConfigError};

pub use granite_core;
pub use granite_raster;
pub use granite_terrain;
