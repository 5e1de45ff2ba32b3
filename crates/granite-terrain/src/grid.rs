use granite_core::glam::{UVec2, Vec3, Vec4};
use granite_core::{AlignedVec4Array, Float4};

use ndshape::{RuntimeShape, Shape};
use std::fmt;

/// A 2D grid of `(min, max)` bounds, stored row-major as two aligned float4 records per cell.
#[derive(Clone)]
pub struct MinMaxGrid {
    size: UVec2,
    shape: RuntimeShape<u32, 2>,
    values: AlignedVec4Array,
}

impl fmt::Debug for MinMaxGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinMaxGrid")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl Default for MinMaxGrid {
    fn default() -> Self {
        Self::new(UVec2::ZERO)
    }
}

impl MinMaxGrid {
    /// All cells start out empty: `min = +MAX`, `max = -MAX`.
    pub fn new(size: UVec2) -> Self {
        let shape = RuntimeShape::<u32, 2>::new(size.to_array());
        let cells = shape.size() as usize;
        let mut values = AlignedVec4Array::with_capacity(2 * cells);
        for _ in 0..cells {
            values.push(Vec4::splat(f32::MAX));
            values.push(Vec4::splat(-f32::MAX));
        }
        Self {
            size,
            shape,
            values,
        }
    }

    #[inline]
    pub fn size(&self) -> UVec2 {
        self.size
    }

    #[inline]
    pub fn contains(&self, p: UVec2) -> bool {
        p.cmplt(self.size()).all()
    }

    #[inline]
    pub fn get(&self, p: UVec2) -> (Vec3, Vec3) {
        debug_assert!(self.contains(p));

        let i = self.linearize(p);
        (
            self.values.get(i).truncate(),
            self.values.get(i + 1).truncate(),
        )
    }

    #[inline]
    pub fn set(&mut self, p: UVec2, min: Vec3, max: Vec3) {
        debug_assert!(self.contains(p));

        let i = self.linearize(p);
        self.values.set(i, min.extend(0.0));
        self.values.set(i + 1, max.extend(0.0));
    }

    /// Rows of raw records, `2 * width` per row, for filling rows independently.
    pub fn rows_mut(&mut self) -> (usize, &mut [Float4]) {
        let row_len = 2 * self.size().x as usize;
        (row_len, self.values.as_mut_slice())
    }

    /// Union of every cell's bounds.
    pub fn union(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(-f32::MAX);
        for pair in self.values.as_slice().chunks_exact(2) {
            min = min.min(Vec4::from(pair[0]).truncate());
            max = max.max(Vec4::from(pair[1]).truncate());
        }
        (min, max)
    }

    #[inline]
    fn linearize(&self, p: UVec2) -> usize {
        2 * self.shape.linearize(p.to_array()) as usize
    }
}

/// Writes one cell's bounds into a row slice handed out by [`MinMaxGrid::rows_mut`].
#[inline]
pub fn set_row_cell(row: &mut [Float4], x: usize, min: Vec3, max: Vec3) {
    row[2 * x] = min.extend(0.0).into();
    row[2 * x + 1] = max.extend(0.0).into();
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
