mod selection;

pub use selection::*;

use granite_core::glam::{UVec2, Vec3};
use granite_core::BoundingBox;
use crate::{
    calculate_lod_params, downsample_min_max, fill_level_zero, lod_count_for_grid, texel_to_world, DisplacementMap,
    LodDescription, TexelUnits, WorldUnits, MAX_LOD_COUNT,
};

/// Padding added around every node's displacement bounds, in world units.
const NODE_SLACK: f32 = 0.5;
/// Node boxes are grown about their center so morphing vertices never leave them.
const NODE_INFLATION: f32 = 1.05;

/// A continuous distance-dependent LOD quadtree over a displacement-mapped height field.
///
/// Nodes are never allocated. A node is addressed by its level and the texel position of its lower corner, and everything
/// else about it is looked up in the per-level [`LodDescription`]s.
#[derive(Clone, Debug)]
pub struct CdLodQuadTree {
    lods: [LodDescription; MAX_LOD_COUNT],
    min: Vec3,
    max: Vec3,
    grid_size: UVec2,
    patch_world_scale: f32,
    lod_count: u32,
    low_quality: bool,
}

impl Default for CdLodQuadTree {
    fn default() -> Self {
        Self::new(false)
    }
}

impl CdLodQuadTree {
    /// An empty tree. Selection on it yields nothing until [`Self::init`] is called.
    pub fn new(low_quality: bool) -> Self {
        Self {
            lods: Default::default(),
            min: Vec3::ZERO,
            max: Vec3::ZERO,
            grid_size: UVec2::ZERO,
            patch_world_scale: 0.0,
            lod_count: 0,
            low_quality,
        }
    }

    /// Rebuilds every level from `map`. Sampled offsets are moved by `translation`, and each texel spans
    /// `patch_world_scale` world units.
    pub fn init(&mut self, map: &impl DisplacementMap, translation: Vec3, patch_world_scale: f32) {
        self.clear();

        self.patch_world_scale = patch_world_scale;
        self.grid_size = map.size();
        self.lod_count = lod_count_for_grid(self.grid_size);

        calculate_lod_params(
            &mut self.lods,
            self.lod_count,
            self.grid_size,
            patch_world_scale,
            self.low_quality,
        );

        if self.lod_count == 0 {
            log::debug!("Empty displacement map {:?}; no LODs built", self.grid_size);
            return;
        }

        fill_level_zero(&mut self.lods[0].min_max, map, translation);

        for level in 1..self.lod_count as usize {
            let (finer, coarser) = self.lods.split_at_mut(level);
            downsample_min_max(&finer[level - 1].min_max, &mut coarser[0].min_max);
        }

        let (min, max) = self.lods[self.lod_count as usize - 1].min_max.union();
        self.min = min;
        self.max = max;

        log::debug!(
            "Built terrain quadtree for {:?} grid: {} LODs, bounds {:?}..{:?}",
            self.grid_size,
            self.lod_count,
            self.min,
            self.max
        );
    }

    /// Drops all LODs. The tree selects nothing until it is initialized again.
    pub fn clear(&mut self) {
        for lod in self.lods.iter_mut() {
            *lod = LodDescription::default();
        }
        self.min = Vec3::ZERO;
        self.max = Vec3::ZERO;
        self.grid_size = UVec2::ZERO;
        self.patch_world_scale = 0.0;
        self.lod_count = 0;
    }

    #[inline]
    pub fn max_lod_count(&self) -> u32 {
        MAX_LOD_COUNT as u32
    }

    #[inline]
    pub fn lod_count(&self) -> u32 {
        self.lod_count
    }

    #[inline]
    pub fn low_quality(&self) -> bool {
        self.low_quality
    }

    /// Takes effect on the next [`Self::init`].
    pub fn set_low_quality(&mut self, low_quality: bool) {
        self.low_quality = low_quality;
    }

    /// Highest point of the terrain.
    #[inline]
    pub fn max_z(&self) -> f32 {
        self.max.z
    }

    /// Lower corner of the displacement bounds over the whole terrain.
    #[inline]
    pub fn min(&self) -> Vec3 {
        self.min
    }

    /// Upper corner of the displacement bounds over the whole terrain.
    #[inline]
    pub fn max(&self) -> Vec3 {
        self.max
    }

    #[inline]
    pub fn grid_size(&self) -> UVec2 {
        self.grid_size
    }

    /// World units per height field texel.
    #[inline]
    pub fn patch_world_scale(&self) -> f32 {
        self.patch_world_scale
    }

    pub fn lod(&self, level: u32) -> &LodDescription {
        debug_assert!(level < self.lod_count);
        &self.lods[level as usize]
    }

    pub fn lods(&self) -> &[LodDescription] {
        &self.lods[..self.lod_count as usize]
    }

    /// World space bounds of the node at `position` (in texels) on `level`, padded and inflated for culling.
    ///
    /// Nodes on the far edge of the grid are clipped to it laterally.
    pub fn node_bounding_box(&self, position: UVec2, level: u32) -> BoundingBox {
        let lod = self.lod(level);
        let patch_size = lod.patch_size();

        let remaining = UVec2::new(
            self.grid_size.x.saturating_sub(position.x),
            self.grid_size.y.saturating_sub(position.y),
        );
        let extent = UVec2::splat(patch_size).min(remaining);
        let WorldUnits(lateral_min) = texel_to_world(TexelUnits(position), self.patch_world_scale);
        let WorldUnits(lateral_max) = texel_to_world(TexelUnits(position + extent), self.patch_world_scale);

        let (offset_min, offset_max) = lod.min_max.get(position / patch_size);

        let min = lateral_min.extend(0.0) + offset_min - Vec3::splat(NODE_SLACK);
        let max = lateral_max.extend(0.0) + offset_max + Vec3::splat(NODE_SLACK);

        let mut bounding_box = BoundingBox::from_min_max(min.into(), max.into());
        bounding_box.scale(NODE_INFLATION);
        bounding_box
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
