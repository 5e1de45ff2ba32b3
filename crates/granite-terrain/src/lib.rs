//! CDLOD terrain: a quadtree over a displacement-mapped height field that decides, every frame, which patches to draw and at
//! which level of detail.
//!
//! # Levels of Detail
//!
//! Level 0 patches cover [`TILE_SIZE`] height field texels per edge. Every coarser level doubles the edge length. Each level
//! keeps a grid of min/max displacement bounds, one cell per patch at that level, so a node's bounding box can be built
//! without touching the height field again.
//!
//! ## Morphing
//!
//! A patch switches to the next finer level once the camera enters the level's range sphere. Near the far end of each range,
//! vertices are blended toward the coarser level (see [`LodDescription::morph_params`]) so the switch never pops.
//!
//! # Selection
//!
//! [`CdLodQuadTree::select_quads_for_drawing`] walks the tree from the coarsest level and writes one [`TerrainInstance`] per
//! selected patch into a caller-owned buffer.

mod config;
mod displacement;
mod grid;
mod instance;
mod lod;
mod quad_order;
mod quadtree;
mod sampling;
mod units;

pub use config::*;
pub use displacement::*;
pub use grid::*;
pub use instance::*;
pub use lod::*;
pub use quad_order::*;
pub use quadtree::*;
pub use sampling::*;
pub use units::*;

/// Height field texels per edge of a level 0 patch.
pub const TILE_SIZE: u32 = 32;

/// World units per height field texel.
pub const PATCH_WORLD_SCALE: f32 = 0.25;

pub const MAX_LOD_COUNT: usize = 8;

/// Fraction at the end of each LOD range over which vertices morph toward the next level.
pub const MORPH_ZONE_RATIO: f32 = 0.3;
