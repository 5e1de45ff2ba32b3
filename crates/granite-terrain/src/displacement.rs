use granite_core::glam::{UVec2, Vec3, Vec4};

/// Largest displacement magnitude a terrain texel can encode, per axis.
pub const VECTOR_SCALE: Vec3 = Vec3::new(8.0, 8.0, 32.0);
pub const VECTOR_MIN: Vec3 = Vec3::new(-8.0, -8.0, 0.0);
pub const VECTOR_MAX: Vec3 = VECTOR_SCALE;

const RGB10_MASK: u32 = 0x3FF;
const RGB10_MAX: f32 = 1023.0;

/// One texel of a displacement map, as stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DisplacementTexel {
    /// Normalized `[0, 1]` channels; xy are biased around 0.5.
    Vector(Vec4),
    /// Three unsigned 10-bit fields from the top down: red in bits 22..32, green in 12..22, blue in 2..12. The low two
    /// (alpha) bits are ignored.
    Rgb10A2(u32),
}

impl DisplacementTexel {
    #[inline]
    pub fn decode(self, scale: Vec3) -> Vec3 {
        match self {
            Self::Vector(pixel) => offset_scaled_0_1(pixel.truncate(), scale),
            Self::Rgb10A2(packed) => offset_scaled_rgb10_a2(packed, scale),
        }
    }
}

/// `xy` are remapped from `[0, 1]` to `[-1, 1]`, then everything is multiplied by `scale`.
#[inline]
pub fn offset_scaled_0_1(pixel: Vec3, scale: Vec3) -> Vec3 {
    let mut result = pixel;
    result.x = result.x * 2.0 - 1.0;
    result.y = result.y * 2.0 - 1.0;
    result * scale
}

#[inline]
pub fn offset_scaled_rgb10_a2(packed: u32, scale: Vec3) -> Vec3 {
    let unpacked = Vec3::new(
        ((packed >> 22) & RGB10_MASK) as f32,
        ((packed >> 12) & RGB10_MASK) as f32,
        ((packed >> 2) & RGB10_MASK) as f32,
    ) / RGB10_MAX;

    offset_scaled_0_1(unpacked, scale)
}

/// Inverse of [`offset_scaled_0_1`], clamped to the encodable range.
pub fn encode_offset_0_1(offset: Vec3, scale: Vec3) -> Vec4 {
    let mut pixel = offset / scale;
    pixel.x = (pixel.x + 1.0) * 0.5;
    pixel.y = (pixel.y + 1.0) * 0.5;
    pixel.clamp(Vec3::ZERO, Vec3::ONE).extend(1.0)
}

/// Inverse of [`offset_scaled_rgb10_a2`], rounded to the nearest code and clamped to the encodable range.
pub fn encode_offset_rgb10_a2(offset: Vec3, scale: Vec3) -> u32 {
    let pixel = encode_offset_0_1(offset, scale).truncate();
    let codes = (pixel * RGB10_MAX).round().as_uvec3();

    ((codes.x & RGB10_MASK) << 22) | ((codes.y & RGB10_MASK) << 12) | ((codes.z & RGB10_MASK) << 2) | 3
}

/// A height field that stores a 3D offset per texel.
///
/// Texture loading lives elsewhere; anything that can report its size and fetch texels can drive a
/// [`CdLodQuadTree`](crate::CdLodQuadTree).
pub trait DisplacementMap: Sync {
    fn size(&self) -> UVec2;

    fn texel(&self, x: u32, y: u32) -> DisplacementTexel;

    #[inline]
    fn offset(&self, x: u32, y: u32) -> Vec3 {
        self.texel(x, y).decode(VECTOR_SCALE)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DisplacementTexels {
    Vector(Vec<Vec4>),
    Rgb10A2(Vec<u32>),
}

impl DisplacementTexels {
    fn len(&self) -> usize {
        match self {
            Self::Vector(t) => t.len(),
            Self::Rgb10A2(t) => t.len(),
        }
    }
}

#[inline]
fn texel_count(size: UVec2) -> usize {
    size.x as usize * size.y as usize
}

/// A row-major, in-memory [`DisplacementMap`].
#[derive(Clone, Debug, PartialEq)]
pub struct DisplacementImage {
    size: UVec2,
    texels: DisplacementTexels,
}

impl DisplacementImage {
    pub fn new(size: UVec2, texels: DisplacementTexels) -> Self {
        assert_eq!(texels.len(), texel_count(size));

        Self { size, texels }
    }

    /// Every texel decodes to a zero offset.
    pub fn flat(size: UVec2) -> Self {
        let texel = encode_offset_0_1(Vec3::ZERO, VECTOR_SCALE);
        Self::new(
            size,
            DisplacementTexels::Vector(vec![texel; texel_count(size)]),
        )
    }

    /// Encodes `f(x, y)` as float vector texels.
    pub fn from_offsets(size: UVec2, mut f: impl FnMut(u32, u32) -> Vec3) -> Self {
        let mut texels = Vec::with_capacity(texel_count(size));
        for y in 0..size.y {
            for x in 0..size.x {
                texels.push(encode_offset_0_1(f(x, y), VECTOR_SCALE));
            }
        }
        Self::new(size, DisplacementTexels::Vector(texels))
    }

    /// Encodes `f(x, y)` as packed RGB10A2 texels.
    pub fn from_offsets_rgb10_a2(size: UVec2, mut f: impl FnMut(u32, u32) -> Vec3) -> Self {
        let mut texels = Vec::with_capacity(texel_count(size));
        for y in 0..size.y {
            for x in 0..size.x {
                texels.push(encode_offset_rgb10_a2(f(x, y), VECTOR_SCALE));
            }
        }
        Self::new(size, DisplacementTexels::Rgb10A2(texels))
    }

    pub fn texels(&self) -> &DisplacementTexels {
        &self.texels
    }
}

impl DisplacementMap for DisplacementImage {
    #[inline]
    fn size(&self) -> UVec2 {
        self.size
    }

    #[inline]
    fn texel(&self, x: u32, y: u32) -> DisplacementTexel {
        debug_assert!(x < self.size.x && y < self.size.y);

        let index = x as usize + y as usize * self.size.x as usize;
        match &self.texels {
            DisplacementTexels::Vector(t) => DisplacementTexel::Vector(t[index]),
            DisplacementTexels::Rgb10A2(t) => DisplacementTexel::Rgb10A2(t[index]),
        }
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
