use granite_core::glam::{UVec2, Vec2};

/// A position on the height field grid, in texels.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TexelUnits<T>(pub T);

/// A lateral position in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorldUnits<T>(pub T);

/// World space position of the texel at `p`, ignoring displacement.
#[inline]
pub fn texel_to_world(p: TexelUnits<UVec2>, patch_world_scale: f32) -> WorldUnits<Vec2> {
    WorldUnits(p.0.as_vec2() * patch_world_scale)
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
