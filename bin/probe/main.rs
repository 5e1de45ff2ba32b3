//! Runs terrain selection and coverage culling over a procedural height field and logs what happened.
//!
//! Usage: `probe [config.ron]`. Set `RUST_LOG=debug` for the details.

use granite::granite_core::glam::{Affine3A, Mat4, UVec2, Vec3};
use granite::granite_core::{AlignedShort8Array, Frustum};
use granite::granite_raster::{CpuRasterizer, MAX_BATCH_SIZE};
use granite::granite_terrain::DisplacementImage;
use granite::{CdLodTerrain, Config, ConfigError};

const GRID_SIZE: u32 = 513;

fn main() -> Result<(), ConfigError> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::read_file(path)?,
        None => Config::default(),
    };
    log::info!("{:?}", config);

    let map = DisplacementImage::from_offsets(UVec2::splat(GRID_SIZE), |x, y| {
        let (fx, fy) = (x as f32 * 0.02, y as f32 * 0.03);
        Vec3::new(
            (fy * 3.0).sin() * 0.5,
            (fx * 3.0).cos() * 0.5,
            12.0 + 8.0 * fx.sin() * fy.cos() + 3.0 * (fx * 4.0 + fy).sin(),
        )
    });

    let mut terrain = CdLodTerrain::new(&config.terrain);
    terrain.set_geometry_maps(&map);

    let rasterizer = config.rasterizer.build();
    let aspect = rasterizer.width() as f32 / rasterizer.height().max(1) as f32;
    let projection = Mat4::perspective_rh(1.0, aspect, 0.5, 1000.0);

    let center = terrain.terrain_size() * 0.5;
    let cameras = [
        (Vec3::new(2.0, 2.0, 20.0), center.extend(10.0)),
        (Vec3::new(center.x, -30.0, 60.0), center.extend(0.0)),
        (center.extend(400.0), Vec3::new(center.x, center.y + 1.0, 0.0)),
    ];

    for (eye, target) in cameras {
        let projection_view = projection * Mat4::look_at_rh(eye, target, Vec3::Z);
        let frustum = Frustum::from_matrix(&projection_view);

        // The first pass may grow the instance buffer.
        let mut selection = terrain.intersect(&frustum, eye);
        if selection.overflowed() {
            selection = terrain.intersect(&frustum, eye);
        }

        let bounds = terrain.intersect_bounding_box(&frustum, eye);
        log::info!(
            "camera {:?}: {} patches, bounds {:?}..{:?}, selection box {:?}..{:?}",
            eye,
            selection.instance_count,
            selection.bounding_box.min(),
            selection.bounding_box.max(),
            bounds.min(),
            bounds.max()
        );

        let visible = count_visible_patches(&terrain, &rasterizer, &projection_view, &selection);
        log::info!(
            "camera {:?}: {} of {} patches cover enough pixels",
            eye,
            visible,
            selection.instance_count
        );
    }

    Ok(())
}

fn count_visible_patches(
    terrain: &CdLodTerrain,
    rasterizer: &CpuRasterizer,
    projection_view: &Mat4,
    selection: &granite::granite_terrain::Selection,
) -> u32 {
    let quadtree = terrain.quadtree();
    let instances = terrain.instances(selection);

    let mut visible = 0;
    for batch in instances.chunks(MAX_BATCH_SIZE) {
        let mut boxes = AlignedShort8Array::with_capacity(batch.len());
        for instance in batch {
            let bounding_box = quadtree.node_bounding_box(instance.position(), instance.level());
            CpuRasterizer::append_min_max_box(&bounding_box, &mut boxes);
        }
        let mask = rasterizer.check_visibility(projection_view, &Affine3A::IDENTITY, &boxes);
        visible += mask.count_ones();
    }
    visible
}
