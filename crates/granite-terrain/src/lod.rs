use granite_core::glam::{UVec2, Vec2};
use crate::{MinMaxGrid, MAX_LOD_COUNT, MORPH_ZONE_RATIO, TILE_SIZE};

/// Everything the selection needs to know about one level of detail. Level 0 is the finest.
#[derive(Clone, Debug, Default)]
pub struct LodDescription {
    /// Bounds of the displacement inside each patch of this level, one cell per patch.
    pub min_max: MinMaxGrid,
    /// `(a, b)` such that the vertex morph factor is `clamp(a * distance + b, 0, 1)`.
    pub morph_params: Vec2,
    /// Distance from the camera at which this level takes over from the next finer one.
    pub range_start: f32,
    /// Edge length of this level's patches in units of level 0 patches.
    pub patch_scale: u32,
}

impl LodDescription {
    /// Edge length of this level's patches in height field texels.
    #[inline]
    pub fn patch_size(&self) -> u32 {
        self.patch_scale * TILE_SIZE
    }
}

/// Number of levels needed for the coarsest patch to cover a grid of `grid_size` vertices.
pub fn lod_count_for_grid(grid_size: UVec2) -> u32 {
    if grid_size.cmpeq(UVec2::ZERO).any() {
        return 0;
    }

    let max_grid_size = grid_size.max_element() - 1;
    let mut lod_count = 1;
    while (lod_count as usize) < MAX_LOD_COUNT && max_grid_size >= (TILE_SIZE << lod_count) {
        lod_count += 1;
    }
    lod_count
}

/// Distance at which level 1 takes over from level 0.
pub fn first_range(low_quality: bool) -> f32 {
    if low_quality {
        5.0
    } else {
        25.0
    }
}

/// Fills in ranges, morph parameters and patch scales for the first `lod_count` levels, and allocates each level's min/max
/// grid for a height field of `grid_size` vertices.
///
/// Every level's range is the diagonal of its patch, so the LOD sphere always contains a whole patch at the switch distance.
pub fn calculate_lod_params(
    lods: &mut [LodDescription],
    lod_count: u32,
    grid_size: UVec2,
    patch_world_scale: f32,
    low_quality: bool,
) {
    let lod_count = lod_count as usize;
    assert!(lod_count <= lods.len());
    if lod_count == 0 {
        return;
    }

    let mut patch_scale = 1;
    let mut range = 2.0 * 2.0f32.sqrt() * patch_world_scale * TILE_SIZE as f32;
    let mut cur_range = first_range(low_quality);

    for lod in lods.iter_mut().take(lod_count) {
        lod.range_start = cur_range;
        cur_range += range;

        let range_end = cur_range;
        let morph_range = range * MORPH_ZONE_RATIO;
        let morph_start = range_end - morph_range;
        lod.morph_params = Vec2::new(1.0 / morph_range, -morph_start / morph_range);

        lod.patch_scale = patch_scale;

        let patch_size = patch_scale * TILE_SIZE;
        let size = (grid_size + patch_size - 2) / patch_size;
        lod.min_max = MinMaxGrid::new(size);

        range *= 2.0;
        patch_scale *= 2;
    }

    lods[0].range_start = 0.0;
    lods[lod_count - 1].morph_params = Vec2::ZERO;
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
