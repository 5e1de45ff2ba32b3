use super::CdLodQuadTree;
use granite_core::glam::{UVec2, Vec2, Vec3, Vec4};
use granite_core::{BoundingBox, Frustum, Intersection, PlanesMask};
use crate::{
    quad_order, texel_to_world, ByteInstanceWriter, InstanceSink, SliceInstanceWriter, TerrainInstance, TexelUnits,
    WorldUnits,
};

/// The outcome of one frame's terrain selection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Selection {
    /// Union of the bounding boxes of every selected patch.
    pub bounding_box: BoundingBox,
    /// `(-camera.x, -camera.y, height above or below the terrain slab, patch world scale)`, for the vertex shader.
    pub lod_offset: Vec4,
    /// Number of instances written, never more than the buffer could hold.
    pub instance_count: usize,
    /// Number of patches selected, including any that did not fit.
    pub requested_instances: usize,
}

impl Selection {
    pub fn empty(lod_offset: Vec4) -> Self {
        Self {
            bounding_box: BoundingBox::empty(),
            lod_offset,
            instance_count: 0,
            requested_instances: 0,
        }
    }

    /// True if some selected patches were dropped because the buffer was full.
    #[inline]
    pub fn overflowed(&self) -> bool {
        self.requested_instances > self.instance_count
    }
}

/// A node that survived frustum culling.
struct VisibleNode {
    bounding_box: BoundingBox,
    intersection: Intersection,
    out_mask: PlanesMask,
}

impl CdLodQuadTree {
    /// Selects the patches to draw this frame and writes one [`TerrainInstance`] per patch into `buffer`, starting at byte
    /// `offset`.
    ///
    /// At most `max_instances` are written, and never past the end of `buffer`. Patches that do not fit are counted in
    /// [`Selection::requested_instances`] so the caller can grow the buffer for the next frame.
    pub fn select_quads_for_drawing(
        &self,
        frustum: &Frustum,
        camera: Vec3,
        buffer: &mut [u8],
        offset: usize,
        max_instances: usize,
    ) -> Selection {
        let mut writer = ByteInstanceWriter::new(buffer, offset, max_instances);
        self.select_into(frustum, camera, &mut writer)
    }

    /// Like [`Self::select_quads_for_drawing`], but writes into a typed slice.
    pub fn select_instances(
        &self,
        frustum: &Frustum,
        camera: Vec3,
        instances: &mut [TerrainInstance],
    ) -> Selection {
        let mut writer = SliceInstanceWriter::new(instances);
        self.select_into(frustum, camera, &mut writer)
    }

    pub fn select_into(&self, frustum: &Frustum, camera: Vec3, sink: &mut impl InstanceSink) -> Selection {
        let lod_offset = self.lod_offset(camera);
        if self.lod_count == 0 {
            return Selection::empty(lod_offset);
        }

        let mut bounding_box = BoundingBox::empty();
        let top = self.lod_count - 1;
        for root in self.roots() {
            self.select_node(
                frustum,
                camera,
                root,
                frustum.planes_mask(),
                top,
                &mut bounding_box,
                &mut *sink,
            );
        }

        Selection {
            bounding_box,
            lod_offset,
            instance_count: sink.written(),
            requested_instances: sink.requested(),
        }
    }

    /// Bounds of everything [`Self::select_quads_for_drawing`] would select, without producing instances.
    ///
    /// Subtrees that are entirely inside the frustum stop at their root, so the result may be looser than the draw
    /// selection's box, but always contains it.
    pub fn select_bounding_box(&self, frustum: &Frustum, camera: Vec3) -> BoundingBox {
        let mut bounding_box = BoundingBox::empty();
        if self.lod_count == 0 {
            return bounding_box;
        }

        let top = self.lod_count - 1;
        for root in self.roots() {
            self.select_node_bounds(
                frustum,
                camera,
                root,
                frustum.planes_mask(),
                top,
                &mut bounding_box,
            );
        }
        bounding_box
    }

    /// Camera relative offset applied to terrain vertices, keeping their coordinates small near the camera.
    ///
    /// `z` is how far the camera is above or below the slab `[0, max_z]`, or 0 inside of it.
    pub fn lod_offset(&self, camera: Vec3) -> Vec4 {
        let half_max_z = self.max_z() * 0.5;
        let dist = (camera.z - half_max_z).abs();
        Vec4::new(
            -camera.x,
            -camera.y,
            (dist - half_max_z).max(0.0),
            self.patch_world_scale,
        )
    }

    /// Texel positions of the coarsest level's nodes.
    fn roots(&self) -> impl Iterator<Item = UVec2> {
        let step = self.lods[self.lod_count as usize - 1].patch_size() as usize;
        let end = self.grid_size.saturating_sub_one();
        (0..end.y)
            .step_by(step)
            .flat_map(move |y| (0..end.x).step_by(step).map(move |x| UVec2::new(x, y)))
    }

    fn select_node(
        &self,
        frustum: &Frustum,
        camera: Vec3,
        position: UVec2,
        mask: PlanesMask,
        level: u32,
        bounding_box: &mut BoundingBox,
        sink: &mut impl InstanceSink,
    ) {
        let node = match self.cull_node(frustum, position, mask, level) {
            Some(node) => node,
            None => return,
        };

        if self.is_final(&node.bounding_box, camera, level) {
            bounding_box.merge(&node.bounding_box);
            sink.push(self.instance(position, level));
            return;
        }

        for child in self.children(position, level, camera) {
            self.select_node(
                frustum,
                camera,
                child,
                node.out_mask,
                level - 1,
                bounding_box,
                &mut *sink,
            );
        }
    }

    fn select_node_bounds(
        &self,
        frustum: &Frustum,
        camera: Vec3,
        position: UVec2,
        mask: PlanesMask,
        level: u32,
        bounding_box: &mut BoundingBox,
    ) {
        let node = match self.cull_node(frustum, position, mask, level) {
            Some(node) => node,
            None => return,
        };

        if node.intersection == Intersection::Inside || self.is_final(&node.bounding_box, camera, level) {
            bounding_box.merge(&node.bounding_box);
            return;
        }

        for child in self.children(position, level, camera) {
            self.select_node_bounds(frustum, camera, child, node.out_mask, level - 1, bounding_box);
        }
    }

    /// Builds the node's bounds and tests them against the frustum planes left in `mask`. Returns `None` for nodes past the
    /// edge of the grid or outside of the frustum.
    fn cull_node(&self, frustum: &Frustum, position: UVec2, mask: PlanesMask, level: u32) -> Option<VisibleNode> {
        if position.cmpge(self.grid_size.saturating_sub_one()).any() {
            return None;
        }

        let bounding_box = self.node_bounding_box(position, level);
        if bounding_box.is_empty() {
            return None;
        }

        let (intersection, out_mask) = frustum.intersect_masked(&bounding_box, mask);
        if intersection == Intersection::Outside {
            return None;
        }

        Some(VisibleNode {
            bounding_box,
            intersection,
            out_mask,
        })
    }

    /// A node is drawn as is when it is on the finest level, or when the camera is outside of its LOD range.
    fn is_final(&self, node_box: &BoundingBox, camera: Vec3, level: u32) -> bool {
        if level == 0 {
            return true;
        }

        let range_start = self.lods[level as usize].range_start;

        // Even the highest point of the terrain is out of range.
        if range_start + self.max_z() < camera.z {
            return true;
        }

        let center = Vec3::from(node_box.center()).truncate();
        let half_size = Vec3::from(node_box.half_size()).truncate();
        let distance = ((center - camera.truncate()).abs() - half_size).max(Vec2::ZERO);

        distance.length_squared() >= range_start * range_start
    }

    /// The four children of a node, nearest to the camera first.
    fn children(&self, position: UVec2, level: u32, camera: Vec3) -> impl Iterator<Item = UVec2> {
        let half = self.lods[level as usize].patch_size() / 2;
        let WorldUnits(center) = texel_to_world(TexelUnits(position + half), self.patch_world_scale);
        quad_order(center - camera.truncate())
            .iter()
            .map(move |quadrant| position + *quadrant * half)
    }

    fn instance(&self, position: UVec2, level: u32) -> TerrainInstance {
        let lod = &self.lods[level as usize];
        TerrainInstance::new(position, lod.patch_scale, lod.morph_params, level, lod.patch_size())
    }
}

trait SaturatingSubOne {
    fn saturating_sub_one(self) -> Self;
}

impl SaturatingSubOne for UVec2 {
    #[inline]
    fn saturating_sub_one(self) -> Self {
        UVec2::new(self.x.saturating_sub(1), self.y.saturating_sub(1))
    }
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
    use crate::{DisplacementImage, INSTANCE_STRIDE, PATCH_WORLD_SCALE, TILE_SIZE};

    use granite_core::approx::assert_relative_eq;
    use granite_core::glam::Mat4;

    fn flat_tree(size: u32) -> CdLodQuadTree {
        let mut tree = CdLodQuadTree::new(false);
        tree.init(
            &DisplacementImage::flat(UVec2::splat(size)),
            Vec3::ZERO,
            PATCH_WORLD_SCALE,
        );
        tree
    }

    fn everything() -> Frustum {
        Frustum::from_matrix(&Mat4::orthographic_rh(-1e4, 1e4, -1e4, 1e4, -1e4, 1e4))
    }

    fn patch_area(instance: &TerrainInstance) -> u32 {
        let edge = instance.patch_scale as u32 * TILE_SIZE;
        edge * edge
    }

    #[test]
    fn empty_tree_selects_nothing() {
        let tree = CdLodQuadTree::default();
        let mut buffer = vec![0u8; 4 * INSTANCE_STRIDE];

        let selection = tree.select_quads_for_drawing(&everything(), Vec3::ZERO, &mut buffer, 0, 4);
        assert_eq!(selection.instance_count, 0);
        assert_eq!(selection.requested_instances, 0);
        assert!(selection.bounding_box.is_empty());
        assert!(tree.select_bounding_box(&everything(), Vec3::ZERO).is_empty());
    }

    #[test]
    fn distant_camera_selects_one_root_patch() {
        let tree = flat_tree(65);
        let mut instances = [TerrainInstance::default(); 8];

        let selection = tree.select_instances(&everything(), Vec3::new(8.0, 8.0, 1000.0), &mut instances);
        assert_eq!(selection.instance_count, 1);
        assert!(!selection.overflowed());

        let root = instances[0];
        assert_eq!(root.position(), UVec2::ZERO);
        assert_eq!(root.level(), 1);
        assert_eq!(root.patch_size, 64.0);
        assert_eq!(root.morph_params, [0.0, 0.0]);
    }

    #[test]
    fn selected_patches_tile_the_grid() {
        let tree = flat_tree(513);
        assert_eq!(tree.lod_count(), 5);

        let mut instances = vec![TerrainInstance::default(); 1024];
        let selection = tree.select_instances(&everything(), Vec3::new(1.0, 1.0, 2.0), &mut instances);
        assert!(!selection.overflowed());

        let selected = &instances[..selection.instance_count];
        let area: u32 = selected.iter().map(patch_area).sum();
        assert_eq!(area, 512 * 512);

        // Nearest first.
        assert_eq!(selected[0].position(), UVec2::ZERO);
        assert_eq!(selected[0].level(), 0);

        // Detail falls off with distance.
        assert!(selected.iter().any(|i| i.level() >= 2));
        let far = selected
            .iter()
            .find(|i| i.position() == UVec2::new(384, 384))
            .expect("far corner patch");
        assert!(far.level() >= 2);

        let max_leaves = (512 / TILE_SIZE) * (512 / TILE_SIZE);
        assert!(selection.requested_instances <= max_leaves as usize);
    }

    #[test]
    fn overflow_is_counted_but_not_written() {
        let tree = flat_tree(129);

        let mut buffer = vec![0u8; 3 * INSTANCE_STRIDE];
        let selection = tree.select_quads_for_drawing(&everything(), Vec3::new(1.0, 1.0, 2.0), &mut buffer, 0, 2);
        assert_eq!(selection.instance_count, 2);
        assert_eq!(selection.requested_instances, 16);
        assert!(selection.overflowed());

        // The slot past the cap is untouched.
        assert!(buffer[2 * INSTANCE_STRIDE..].iter().all(|b| *b == 0));
        assert_eq!(TerrainInstance::read(&buffer, 0, 0).position(), UVec2::ZERO);
    }

    #[test]
    fn culled_patches_are_skipped() {
        let tree = flat_tree(129);
        let camera = Vec3::new(1.0, 1.0, 2.0);

        let mut all = vec![TerrainInstance::default(); 64];
        let full = tree.select_instances(&everything(), camera, &mut all);

        // Only world x < 10 is visible.
        let left = Frustum::from_matrix(&Mat4::orthographic_rh(-1e4, 10.0, -1e4, 1e4, -1e4, 1e4));
        let mut culled = vec![TerrainInstance::default(); 64];
        let selection = tree.select_instances(&left, camera, &mut culled);

        assert!(selection.instance_count > 0);
        assert!(selection.instance_count < full.instance_count);
        for instance in &culled[..selection.instance_count] {
            assert!(instance.position[0] * PATCH_WORLD_SCALE < 10.0);
        }
        assert!(selection.bounding_box.min().x < 10.0);
        assert!(full.bounding_box.contains(&selection.bounding_box));
    }

    #[test]
    fn bounding_box_query_contains_draw_bounds() {
        let mut tree = CdLodQuadTree::new(false);
        tree.init(
            &DisplacementImage::from_offsets(UVec2::splat(257), |x, y| {
                Vec3::new(0.0, 0.0, ((x * 3 + y * 5) % 17) as f32)
            }),
            Vec3::ZERO,
            PATCH_WORLD_SCALE,
        );

        let frustum = Frustum::from_matrix(&Mat4::orthographic_rh(-1e4, 20.0, -1e4, 1e4, -1e4, 1e4));
        for camera in [
            Vec3::new(1.0, 1.0, 2.0),
            Vec3::new(40.0, 60.0, 10.0),
            Vec3::new(30.0, 30.0, 500.0),
        ] {
            let mut instances = vec![TerrainInstance::default(); 256];
            let selection = tree.select_instances(&frustum, camera, &mut instances);
            let bounds = tree.select_bounding_box(&frustum, camera);

            assert!(!selection.bounding_box.is_empty());
            assert!(bounds.contains(&selection.bounding_box), "{:?}", camera);
        }
    }

    #[test]
    fn lod_offset_measures_distance_to_slab() {
        let mut tree = CdLodQuadTree::new(false);
        tree.init(
            &DisplacementImage::from_offsets(UVec2::splat(65), |_, _| Vec3::new(0.0, 0.0, 20.0)),
            Vec3::ZERO,
            PATCH_WORLD_SCALE,
        );
        assert_relative_eq!(tree.max_z(), 20.0, epsilon = 1e-3);

        let above = tree.lod_offset(Vec3::new(1.0, 2.0, 50.0));
        assert_eq!(above.x, -1.0);
        assert_eq!(above.y, -2.0);
        assert_relative_eq!(above.z, 30.0, epsilon = 1e-3);
        assert_eq!(above.w, PATCH_WORLD_SCALE);

        assert_eq!(tree.lod_offset(Vec3::new(0.0, 0.0, 15.0)).z, 0.0);
        assert_relative_eq!(tree.lod_offset(Vec3::new(0.0, 0.0, -5.0)).z, 5.0, epsilon = 1e-3);
    }
}
