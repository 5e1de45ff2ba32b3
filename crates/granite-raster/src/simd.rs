//! Coverage kernels for compressed min/max boxes.
//!
//! Each box is projected corner by corner, its clip space footprint is clipped to the view and the resulting area is
//! compared with a pixel threshold. [`check_visibility`] is the scalar reference; [`check_coverage_simple`] and
//! [`check_coverage`] transform all four clip space components of a corner at once.

use granite_core::glam::{IVec4, Mat4, Vec2, Vec4};
use granite_core::Short8;

use wide::f32x4;

/// One bit per box or sub-mesh, lowest bit first.
pub type VisibilityMask = u64;

/// Most boxes a single batch query can report on.
pub const MAX_BATCH_SIZE: usize = VisibilityMask::BITS as usize;

/// Visibility of one box whose corners are `min.xyz` and `max.xyz`, in the units `matrix` expects.
///
/// The clip space footprint is clipped to `[-1, 1]` and scaled by `view` (viewport size in pixels). Since clip space is two
/// units wide, the pixel area comes out four times too big, which is why it is compared against `4 * threshold`.
pub fn check_visibility(matrix: &Mat4, min: IVec4, max: IVec4, view: Vec2, threshold: f32) -> bool {
    let min = min.truncate().as_vec3();
    let max = max.truncate().as_vec3();

    let mut vmin = Vec2::splat(f32::MAX);
    let mut vmax = Vec2::splat(-f32::MAX);

    for corner in 0..8 {
        let x = if corner & 1 == 0 { min.x } else { max.x };
        let y = if corner & 2 == 0 { min.y } else { max.y };
        let z = if corner & 4 == 0 { min.z } else { max.z };

        let value = *matrix * Vec4::new(x, y, z, 1.0);
        let projected = Vec2::new(value.x, value.y) / value.w;

        vmin = vmin.min(projected);
        vmax = vmax.max(projected);
    }

    vmin = vmin.min(Vec2::ONE).max(Vec2::NEG_ONE);
    vmax = vmax.min(Vec2::ONE).max(Vec2::NEG_ONE);

    let size = (vmax - vmin) * view;
    size.x * size.y > threshold * 4.0
}

/// Visibility of each of the first [`MAX_BATCH_SIZE`] boxes, as a bit mask.
pub fn check_coverage_simple(matrix: &Mat4, boxes: &[Short8], view: Vec2, threshold: f32) -> VisibilityMask {
    let kernel = CoverageKernel::new(matrix, view, threshold);

    let mut result = 0;
    for (i, min_max) in boxes.iter().take(MAX_BATCH_SIZE).enumerate() {
        if kernel.is_visible(min_max) {
            result |= 1 << i;
        }
    }
    result
}

/// True as soon as any box is visible.
pub fn check_coverage(matrix: &Mat4, boxes: &[Short8], view: Vec2, threshold: f32) -> bool {
    let kernel = CoverageKernel::new(matrix, view, threshold);

    boxes.iter().any(|min_max| kernel.is_visible(min_max))
}

struct CoverageKernel {
    columns: [f32x4; 4],
    view: f32x4,
    threshold: f32,
}

impl CoverageKernel {
    fn new(matrix: &Mat4, view: Vec2, threshold: f32) -> Self {
        Self {
            columns: matrix.to_cols_array_2d().map(f32x4::from),
            view: f32x4::from([view.x, view.y, 1.0, 1.0]),
            threshold: threshold * 4.0,
        }
    }

    /// Clip space position of `(x, y, z, 1)` after the perspective divide.
    #[inline]
    fn project(&self, x: f32, y: f32, z: f32) -> f32x4 {
        let [m0, m1, m2, m3] = self.columns;
        let value = f32x4::splat(x) * m0 + f32x4::splat(y) * m1 + f32x4::splat(z) * m2 + m3;
        let w = value.to_array()[3];
        value / f32x4::splat(w)
    }

    #[inline]
    fn is_visible(&self, min_max: &Short8) -> bool {
        let v = min_max.0;
        let low = [f32::from(v[0]), f32::from(v[1]), f32::from(v[2])];
        let high = [f32::from(v[4]), f32::from(v[5]), f32::from(v[6])];

        let mut min = self.project(low[0], low[1], low[2]);
        let mut max = min;

        for corner in 1..8 {
            let x = if corner & 1 == 0 { low[0] } else { high[0] };
            let y = if corner & 2 == 0 { low[1] } else { high[1] };
            let z = if corner & 4 == 0 { low[2] } else { high[2] };

            let projected = self.project(x, y, z);
            min = min.min(projected);
            max = max.max(projected);
        }

        let one = f32x4::ONE;
        let neg_one = f32x4::splat(-1.0);
        min = min.min(one).max(neg_one);
        max = max.min(one).max(neg_one);

        let size = ((max - min) * self.view).to_array();
        size[0] * size[1] > self.threshold
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
