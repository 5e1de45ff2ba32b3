use granite_core::glam::{Affine3A, IVec3, IVec4, Mat4, Vec2, Vec3, Vec3A};
use granite_core::{AlignedShort8Array, AlignedVec4Array, BoundingBox, Short8};
use crate::simd::{check_coverage, check_coverage_simple, check_visibility, VisibilityMask, MAX_BATCH_SIZE};

/// Compressed box coordinates are stored in sixteenths of a world unit.
pub const MIN_MAX_BOX_INVERSE_SCALE: f32 = 16.0;
pub const MIN_MAX_BOX_SCALE: f32 = 1.0 / MIN_MAX_BOX_INVERSE_SCALE;

/// Returned for an empty batch, so nothing is culled by accident.
pub const ALL_VISIBLE: VisibilityMask = 0xFFFF_FFFF;

/// A part of a mesh that owns a contiguous run of compressed boxes in a shared [`AlignedShort8Array`].
pub trait SubMesh {
    fn bounding_box(&self) -> BoundingBox;

    fn min_max_boxes_index(&self) -> usize;

    /// A sub-mesh with no boxes is always considered visible.
    fn min_max_boxes_count(&self) -> usize;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubMeshBoxes {
    pub bounding_box: BoundingBox,
    pub min_max_boxes_index: usize,
    pub min_max_boxes_count: usize,
}

impl SubMesh for SubMeshBoxes {
    fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    fn min_max_boxes_index(&self) -> usize {
        self.min_max_boxes_index
    }

    fn min_max_boxes_count(&self) -> usize {
        self.min_max_boxes_count
    }
}

/// Estimates how much of the screen an object's boxes would cover and culls the ones that fall under a pixel threshold.
pub struct CpuRasterizer {
    /// Owned for a depth tested rasterizer; coverage queries leave it empty.
    depth_buffer: AlignedVec4Array,
    width: u32,
    height: u32,
    threshold: f32,
    use_simd: bool,
}

impl CpuRasterizer {
    /// `threshold` is the smallest area, in pixels, an object has to cover to stay visible.
    pub fn new(width: u32, height: u32, threshold: f32, use_simd: bool) -> Self {
        Self {
            depth_buffer: AlignedVec4Array::new(),
            width,
            height,
            threshold,
            use_simd,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    #[inline]
    pub fn use_simd(&self) -> bool {
        self.use_simd
    }

    pub fn depth_buffer(&self) -> &AlignedVec4Array {
        &self.depth_buffer
    }

    #[inline]
    fn view(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Visibility of a single box, with `min` and `max` already in the space `matrix` transforms from.
    pub fn check_box_visibility(&self, matrix: &Mat4, min: IVec4, max: IVec4) -> bool {
        check_visibility(matrix, min, max, self.view(), self.threshold)
    }

    /// One bit per box for up to the first 64 boxes. An empty array yields [`ALL_VISIBLE`].
    pub fn check_visibility(
        &self,
        projection_view: &Mat4,
        world: &Affine3A,
        min_max_boxes: &AlignedShort8Array,
    ) -> VisibilityMask {
        let count = min_max_boxes.len().min(MAX_BATCH_SIZE);
        if count == 0 {
            return ALL_VISIBLE;
        }

        let matrix = min_max_box_matrix(projection_view, world);

        if self.use_simd {
            return check_coverage_simple(
                &matrix,
                &min_max_boxes.as_slice()[..count],
                self.view(),
                self.threshold,
            );
        }

        let mut result = 0;
        for i in 0..count {
            if self.check_box_visibility(&matrix, min_max_boxes.value_low(i), min_max_boxes.value_high(i)) {
                result |= 1 << i;
            }
        }
        result
    }

    /// One bit per sub-mesh for up to the first 64 sub-meshes. A sub-mesh is visible when any of its boxes is, or when it
    /// has no boxes at all.
    pub fn check_sub_mesh_visibility(
        &self,
        projection_view: &Mat4,
        world: &Affine3A,
        min_max_boxes: &AlignedShort8Array,
        sub_meshes: &[impl SubMesh],
    ) -> VisibilityMask {
        let matrix = min_max_box_matrix(projection_view, world);
        let boxes = min_max_boxes.as_slice();

        let mut result = 0;
        for (i, sub_mesh) in sub_meshes.iter().take(MAX_BATCH_SIZE).enumerate() {
            let index = sub_mesh.min_max_boxes_index();
            let count = sub_mesh.min_max_boxes_count();
            debug_assert!(index + count <= boxes.len());

            if count == 0 || self.any_box_visible(&matrix, &boxes[index..index + count]) {
                result |= 1 << i;
            }
        }
        result
    }

    fn any_box_visible(&self, matrix: &Mat4, boxes: &[Short8]) -> bool {
        if self.use_simd {
            check_coverage(matrix, boxes, self.view(), self.threshold)
        } else {
            boxes
                .iter()
                .any(|b| self.check_box_visibility(matrix, b.low(), b.high()))
        }
    }

    /// Replaces the contents of `min_max_boxes` with one compressed box per sub-mesh, in order.
    pub fn build_min_max_boxes(sub_meshes: &[impl SubMesh], min_max_boxes: &mut AlignedShort8Array) {
        min_max_boxes.resize(sub_meshes.len());

        for (i, sub_mesh) in sub_meshes.iter().enumerate() {
            let (min, max) = compress_min_max_box(&sub_mesh.bounding_box());
            min_max_boxes.set_value_low(min, i);
            min_max_boxes.set_value_high(max, i);
        }
    }

    pub fn append_min_max_box(bounding_box: &BoundingBox, min_max_boxes: &mut AlignedShort8Array) {
        let (min, max) = compress_min_max_box(bounding_box);
        min_max_boxes.push(min, max);
    }
}

/// Combines the frame's projection·view with an object's world transform, undoing the box compression in the same step.
pub fn min_max_box_matrix(projection_view: &Mat4, world: &Affine3A) -> Mat4 {
    let descaled = Affine3A {
        matrix3: world.matrix3 * MIN_MAX_BOX_SCALE,
        translation: world.translation,
    };
    *projection_view * Mat4::from(descaled)
}

/// `[min.xyz, 1]` and `[max.xyz, 1]` in sixteenths of a world unit, rounded to the nearest step.
pub fn compress_min_max_box(bounding_box: &BoundingBox) -> (IVec4, IVec4) {
    let min = quantize(bounding_box.min());
    let max = quantize(bounding_box.max());

    debug_assert!(min.cmple(max).all());

    (min.extend(1), max.extend(1))
}

/// World space bounds of a compressed box.
pub fn decompress_min_max_box(min_max: &Short8) -> BoundingBox {
    BoundingBox::from_min_max(
        Vec3A::from(min_max.low().truncate().as_vec3() * MIN_MAX_BOX_SCALE),
        Vec3A::from(min_max.high().truncate().as_vec3() * MIN_MAX_BOX_SCALE),
    )
}

#[inline]
fn quantize(v: Vec3A) -> IVec3 {
    (Vec3::from(v) * MIN_MAX_BOX_INVERSE_SCALE).round().as_ivec3()
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    use granite_core::approx::assert_relative_eq;

    fn cube(center: Vec3A, half_size: f32) -> BoundingBox {
        BoundingBox::from_center_half_size(center, Vec3A::splat(half_size))
    }

    fn sub_mesh(index: usize, count: usize) -> SubMeshBoxes {
        SubMeshBoxes {
            bounding_box: cube(Vec3A::ZERO, 0.5),
            min_max_boxes_index: index,
            min_max_boxes_count: count,
        }
    }

    fn rasterizers() -> [CpuRasterizer; 2] {
        [
            CpuRasterizer::new(100, 100, 10.0, false),
            CpuRasterizer::new(100, 100, 10.0, true),
        ]
    }

    #[test]
    fn compression_rounds_to_sixteenths() {
        let mut boxes = AlignedShort8Array::new();
        let bounding_box = BoundingBox::from_min_max(Vec3A::new(-1.0, 0.03, 2.0), Vec3A::new(0.5, 0.1, 2.02));
        CpuRasterizer::append_min_max_box(&bounding_box, &mut boxes);

        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes.value_low(0), IVec4::new(-16, 0, 32, 1));
        assert_eq!(boxes.value_high(0), IVec4::new(8, 2, 32, 1));

        let restored = decompress_min_max_box(&boxes.as_slice()[0]);
        assert_relative_eq!(restored.min().x, -1.0);
        assert_relative_eq!(restored.max().y, 0.125);
    }

    #[test]
    fn build_replaces_existing_boxes() {
        let mut boxes = AlignedShort8Array::new();
        CpuRasterizer::append_min_max_box(&cube(Vec3A::splat(5.0), 1.0), &mut boxes);
        CpuRasterizer::append_min_max_box(&cube(Vec3A::splat(5.0), 1.0), &mut boxes);
        CpuRasterizer::append_min_max_box(&cube(Vec3A::splat(5.0), 1.0), &mut boxes);

        let sub_meshes = [sub_mesh(0, 1), sub_mesh(1, 1)];
        CpuRasterizer::build_min_max_boxes(&sub_meshes, &mut boxes);
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes.value_low(1), IVec4::new(-8, -8, -8, 1));
        assert_eq!(boxes.value_high(1), IVec4::new(8, 8, 8, 1));
    }

    #[test]
    fn unit_cube_covers_the_view() {
        let mut boxes = AlignedShort8Array::new();
        CpuRasterizer::append_min_max_box(&cube(Vec3A::ZERO, 0.5), &mut boxes);

        for rasterizer in rasterizers() {
            let mask = rasterizer.check_visibility(&Mat4::IDENTITY, &Affine3A::IDENTITY, &boxes);
            assert_eq!(mask, 1);

            let shrunk = Affine3A::from_scale(Vec3::splat(0.01));
            assert_eq!(rasterizer.check_visibility(&Mat4::IDENTITY, &shrunk, &boxes), 0);
        }
    }

    #[test]
    fn empty_batch_is_all_visible() {
        let boxes = AlignedShort8Array::new();
        for rasterizer in rasterizers() {
            let mask = rasterizer.check_visibility(&Mat4::IDENTITY, &Affine3A::IDENTITY, &boxes);
            assert_eq!(mask, ALL_VISIBLE);
        }
    }

    #[test]
    fn world_translation_moves_boxes_off_screen() {
        let mut boxes = AlignedShort8Array::new();
        CpuRasterizer::append_min_max_box(&cube(Vec3A::ZERO, 0.5), &mut boxes);
        CpuRasterizer::append_min_max_box(&cube(Vec3A::new(0.2, 0.0, 0.0), 0.1), &mut boxes);

        let moved = Affine3A::from_translation(Vec3::new(3.0, 0.0, 0.0));
        for rasterizer in rasterizers() {
            assert_eq!(rasterizer.check_visibility(&Mat4::IDENTITY, &Affine3A::IDENTITY, &boxes), 0b11);
            assert_eq!(rasterizer.check_visibility(&Mat4::IDENTITY, &moved, &boxes), 0);
        }
    }

    #[test]
    fn sub_mesh_is_visible_if_any_box_is() {
        let mut boxes = AlignedShort8Array::new();
        // Too small to see.
        CpuRasterizer::append_min_max_box(&cube(Vec3A::ZERO, 0.01), &mut boxes);
        CpuRasterizer::append_min_max_box(&cube(Vec3A::ZERO, 0.01), &mut boxes);
        // Plenty big.
        CpuRasterizer::append_min_max_box(&cube(Vec3A::ZERO, 0.5), &mut boxes);

        let sub_meshes = [sub_mesh(0, 2), sub_mesh(1, 2), sub_mesh(3, 0), sub_mesh(0, 1)];
        for rasterizer in rasterizers() {
            let mask =
                rasterizer.check_sub_mesh_visibility(&Mat4::IDENTITY, &Affine3A::IDENTITY, &boxes, &sub_meshes);
            assert_eq!(mask, 0b0110);
        }
    }

    #[test]
    fn depth_buffer_starts_unallocated() {
        let rasterizer = CpuRasterizer::new(1920, 1080, 1.0, true);
        assert!(rasterizer.depth_buffer().is_empty());
        assert_eq!(rasterizer.depth_buffer().capacity(), 0);

        let mut boxes = AlignedShort8Array::new();
        CpuRasterizer::append_min_max_box(&cube(Vec3A::ZERO, 0.5), &mut boxes);
        rasterizer.check_visibility(&Mat4::IDENTITY, &Affine3A::IDENTITY, &boxes);
        assert_eq!(rasterizer.depth_buffer().capacity(), 0);

        let rasterizer = CpuRasterizer::new(64, 32, 1.0, true);
        assert_eq!((rasterizer.width(), rasterizer.height()), (64, 32));
        assert!(rasterizer.use_simd());
        assert_eq!(rasterizer.threshold(), 1.0);
    }
}
