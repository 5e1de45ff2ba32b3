use granite_core::glam::{UVec2, Vec2, Vec3, Vec3A};
use granite_core::{BoundingBox, Frustum};
use granite_terrain::{
    CdLodQuadTree, DisplacementMap, Selection, TerrainConfig, TerrainInstance, PATCH_WORLD_SCALE,
};

/// A CDLOD terrain that owns its quadtree and an instance buffer for the selection.
///
/// The buffer starts at the configured capacity and grows whenever a selection does not fit, so at most one frame is
/// missing patches.
pub struct CdLodTerrain {
    quadtree: CdLodQuadTree,
    instances: Vec<TerrainInstance>,
    bounding_box: BoundingBox,
    terrain_size: Vec2,
}

impl CdLodTerrain {
    pub fn new(config: &TerrainConfig) -> Self {
        Self {
            quadtree: CdLodQuadTree::new(config.low_quality),
            instances: vec![TerrainInstance::default(); config.initial_instance_capacity],
            bounding_box: BoundingBox::empty(),
            terrain_size: Vec2::ZERO,
        }
    }

    /// Rebuilds the quadtree from a new displacement map.
    pub fn set_geometry_maps(&mut self, map: &impl DisplacementMap) {
        self.quadtree.init(map, Vec3::ZERO, PATCH_WORLD_SCALE);

        if self.quadtree.lod_count() == 0 {
            self.bounding_box = BoundingBox::empty();
            self.terrain_size = Vec2::ZERO;
            return;
        }

        let grid_size = self.quadtree.grid_size();
        let extent = (grid_size.as_vec2() * PATCH_WORLD_SCALE).extend(0.0);
        self.bounding_box = BoundingBox::from_min_max(
            Vec3A::from(self.quadtree.min()),
            Vec3A::from(self.quadtree.max() + extent),
        );
        self.terrain_size = (grid_size - UVec2::ONE).as_vec2() * PATCH_WORLD_SCALE;

        log::debug!(
            "Terrain geometry set: {:?} texels, {} LODs, size {}",
            grid_size,
            self.quadtree.lod_count(),
            self.terrain_size
        );
    }

    pub fn clear(&mut self) {
        self.quadtree.clear();
        self.bounding_box = BoundingBox::empty();
        self.terrain_size = Vec2::ZERO;
    }

    /// Selects this frame's patches into the owned instance buffer. See [`Self::instances`] for the result.
    pub fn intersect(&mut self, frustum: &Frustum, camera: Vec3) -> Selection {
        let selection = self
            .quadtree
            .select_instances(frustum, camera, &mut self.instances);

        if selection.overflowed() {
            let capacity = selection.requested_instances.next_power_of_two();
            log::warn!(
                "Terrain selection needed {} instances but only {} fit; growing buffer to {}",
                selection.requested_instances,
                self.instances.len(),
                capacity
            );
            self.instances.resize(capacity, TerrainInstance::default());
        }

        selection
    }

    /// Bounds of the terrain that would be selected for `camera`, without writing instances.
    pub fn intersect_bounding_box(&self, frustum: &Frustum, camera: Vec3) -> BoundingBox {
        self.quadtree.select_bounding_box(frustum, camera)
    }

    /// The first `selection.instance_count` instances of the most recent [`Self::intersect`].
    pub fn instances(&self, selection: &Selection) -> &[TerrainInstance] {
        &self.instances[..selection.instance_count.min(self.instances.len())]
    }

    pub fn instance_capacity(&self) -> usize {
        self.instances.len()
    }

    pub fn quadtree(&self) -> &CdLodQuadTree {
        &self.quadtree
    }

    /// World space bounds of the whole terrain.
    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    /// Extent of the terrain along x and y, in world units.
    pub fn terrain_size(&self) -> Vec2 {
        self.terrain_size
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
    use granite_core::glam::Mat4;
    use granite_terrain::DisplacementImage;

    use approx::assert_relative_eq;

    fn everything() -> Frustum {
        Frustum::from_matrix(&Mat4::orthographic_rh(-1e4, 1e4, -1e4, 1e4, -1e4, 1e4))
    }

    #[test]
    fn buffer_grows_after_overflow() {
        let config = TerrainConfig {
            low_quality: false,
            initial_instance_capacity: 4,
        };
        let mut terrain = CdLodTerrain::new(&config);
        terrain.set_geometry_maps(&DisplacementImage::flat(UVec2::splat(129)));

        let camera = Vec3::new(1.0, 1.0, 2.0);
        let first = terrain.intersect(&everything(), camera);
        assert!(first.overflowed());
        assert_eq!(first.instance_count, 4);
        assert_eq!(terrain.instances(&first).len(), 4);
        assert_eq!(terrain.instance_capacity(), first.requested_instances.next_power_of_two());

        let second = terrain.intersect(&everything(), camera);
        assert!(!second.overflowed());
        assert_eq!(second.instance_count, first.requested_instances);
    }

    #[test]
    fn geometry_sets_bounds_and_size() {
        let mut terrain = CdLodTerrain::new(&TerrainConfig::default());
        terrain.set_geometry_maps(&DisplacementImage::from_offsets(UVec2::splat(65), |_, _| {
            Vec3::new(0.0, 0.0, 4.0)
        }));

        assert_eq!(terrain.terrain_size(), Vec2::splat(16.0));
        let bounds = terrain.bounding_box();
        assert_relative_eq!(bounds.max().x, 65.0 * 0.25, epsilon = 1e-4);
        assert_relative_eq!(bounds.max().z, 4.0, epsilon = 1e-4);
        assert_relative_eq!(bounds.min().z, 4.0, epsilon = 1e-4);

        let camera = Vec3::new(8.0, 8.0, 1000.0);
        assert!(!terrain.intersect_bounding_box(&everything(), camera).is_empty());

        terrain.clear();
        assert!(terrain.bounding_box().is_empty());
        assert_eq!(terrain.terrain_size(), Vec2::ZERO);
        let selection = terrain.intersect(&everything(), camera);
        assert_eq!(selection.requested_instances, 0);
        assert!(terrain.intersect_bounding_box(&everything(), camera).is_empty());
    }

    #[test]
    fn size_is_kept_per_axis() {
        let mut terrain = CdLodTerrain::new(&TerrainConfig::default());
        terrain.set_geometry_maps(&DisplacementImage::flat(UVec2::new(129, 65)));

        assert_eq!(terrain.terrain_size(), Vec2::new(32.0, 16.0));
        let bounds = terrain.bounding_box();
        assert_relative_eq!(bounds.max().x, 129.0 * 0.25, epsilon = 1e-4);
        assert_relative_eq!(bounds.max().y, 65.0 * 0.25, epsilon = 1e-4);
    }
}
