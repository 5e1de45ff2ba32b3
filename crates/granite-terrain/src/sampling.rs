use granite_core::glam::{UVec2, Vec3};
use crate::grid::{set_row_cell, MinMaxGrid};
use crate::{DisplacementMap, TILE_SIZE};

use rayon::prelude::*;

/// Min/max of the decoded offsets in the `size × size` texel block starting at `offset`.
///
/// The block is clipped to the map, so patches on the far edge only see the texels that exist. A block that lies entirely
/// outside of the map yields the empty bounds `(+MAX, -MAX)`.
pub fn block_min_max(map: &impl DisplacementMap, offset: UVec2, size: u32) -> (Vec3, Vec3) {
    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(-f32::MAX);

    let end = (offset + UVec2::splat(size)).min(map.size());

    for y in offset.y..end.y {
        for x in offset.x..end.x {
            let value = map.offset(x, y);
            min = min.min(value);
            max = max.max(value);
        }
    }

    (min, max)
}

/// Fills every level 0 cell from its texel block, including the one texel skirt shared with the next patch, then moves the
/// bounds by `translation`.
///
/// Rows are independent, so they are sampled in parallel.
pub fn fill_level_zero(grid: &mut MinMaxGrid, map: &impl DisplacementMap, translation: Vec3) {
    let width = grid.size().x as usize;
    let (row_len, values) = grid.rows_mut();
    if row_len == 0 {
        return;
    }

    values
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                let offset = UVec2::new(x as u32, y as u32) * TILE_SIZE;
                let (min, max) = block_min_max(map, offset, TILE_SIZE + 1);
                set_row_cell(row, x, min + translation, max + translation);
            }
        });
}

/// Takes the componentwise **union** of each 2×2 neighborhood in `src` to build the next coarser level in `dst`.
///
/// Children past the edge of `src` are skipped, so edge cells only aggregate the children that exist.
pub fn downsample_min_max(src: &MinMaxGrid, dst: &mut MinMaxGrid) {
    let dst_size = dst.size();
    for y in 0..dst_size.y {
        for x in 0..dst_size.x {
            let parent = UVec2::new(x, y);
            let mut min = Vec3::splat(f32::MAX);
            let mut max = Vec3::splat(-f32::MAX);

            for offset in CHILD_OFFSETS {
                let child = parent * 2 + offset;
                if !src.contains(child) {
                    continue;
                }
                let (child_min, child_max) = src.get(child);
                min = min.min(child_min);
                max = max.max(child_max);
            }

            dst.set(parent, min, max);
        }
    }
}

const CHILD_OFFSETS: [UVec2; 4] = [
    UVec2::new(0, 0),
    UVec2::new(0, 1),
    UVec2::new(1, 0),
    UVec2::new(1, 1),
];

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
