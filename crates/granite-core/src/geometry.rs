use glam::{Mat4, Vec3A, Vec4};

/// Axis-aligned bounding box. The default box is empty and merging anything into it yields that thing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    min: Vec3A,
    max: Vec3A,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    pub fn empty() -> Self {
        Self {
            min: Vec3A::splat(f32::MAX),
            max: Vec3A::splat(-f32::MAX),
        }
    }

    pub fn from_min_max(min: Vec3A, max: Vec3A) -> Self {
        Self { min, max }
    }

    pub fn from_center_half_size(center: Vec3A, half_size: Vec3A) -> Self {
        Self {
            min: center - half_size,
            max: center + half_size,
        }
    }

    #[inline]
    pub fn min(&self) -> Vec3A {
        self.min
    }

    #[inline]
    pub fn max(&self) -> Vec3A {
        self.max
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    #[inline]
    pub fn center(&self) -> Vec3A {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_size(&self) -> Vec3A {
        (self.max - self.min) * 0.5
    }

    pub fn merge(&mut self, other: &Self) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn merged(mut self, other: &Self) -> Self {
        self.merge(other);
        self
    }

    /// Scales the box about its center.
    pub fn scale(&mut self, factor: f32) {
        if self.is_empty() {
            return;
        }
        *self = Self::from_center_half_size(self.center(), self.half_size() * factor);
    }

    pub fn contains(&self, other: &Self) -> bool {
        self.min.cmple(other.min).all() && self.max.cmpge(other.max).all()
    }

    pub fn contains_point(&self, p: Vec3A) -> bool {
        self.min.cmple(p).all() && self.max.cmpge(p).all()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Intersection {
    Outside,
    Intersect,
    Inside,
}

/// `normal · p + distance >= 0` is the inside half space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vec3A,
    pub distance: f32,
}

impl Plane {
    pub fn new(normal: Vec3A, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Builds a plane from `(a, b, c, d)` coefficients and normalizes it.
    pub fn from_coefficients(v: Vec4) -> Self {
        let normal = Vec3A::from(v.truncate());
        let length = normal.length();
        if length > 0.0 {
            Self::new(normal / length, v.w / length)
        } else {
            Self::new(normal, v.w)
        }
    }

    #[inline]
    pub fn signed_distance(&self, p: Vec3A) -> f32 {
        self.normal.dot(p) + self.distance
    }

    pub fn intersect(&self, bounding_box: &BoundingBox) -> Intersection {
        let center = bounding_box.center();
        let half_size = bounding_box.half_size();

        let radius = self.normal.abs().dot(half_size);
        let distance = self.signed_distance(center);

        if distance < -radius {
            Intersection::Outside
        } else if distance > radius {
            Intersection::Inside
        } else {
            Intersection::Intersect
        }
    }
}

/// One bit per frustum plane. A set bit means the plane still has to be tested.
pub type PlanesMask = u8;

pub const FRUSTUM_PLANE_COUNT: usize = 6;
pub const ALL_PLANES_MASK: PlanesMask = (1 << FRUSTUM_PLANE_COUNT) - 1;

/// A view frustum bounded by six planes: left, right, bottom, top, near, far.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
    planes: [Plane; FRUSTUM_PLANE_COUNT],
}

impl Frustum {
    pub fn new(planes: [Plane; FRUSTUM_PLANE_COUNT]) -> Self {
        Self { planes }
    }

    /// Extracts the planes of a projection·view matrix whose clip space depth range is `[0, 1]`.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let r0 = matrix.row(0);
        let r1 = matrix.row(1);
        let r2 = matrix.row(2);
        let r3 = matrix.row(3);

        Self::new([
            Plane::from_coefficients(r3 + r0),
            Plane::from_coefficients(r3 - r0),
            Plane::from_coefficients(r3 + r1),
            Plane::from_coefficients(r3 - r1),
            Plane::from_coefficients(r2),
            Plane::from_coefficients(r3 - r2),
        ])
    }

    #[inline]
    pub fn planes(&self) -> &[Plane; FRUSTUM_PLANE_COUNT] {
        &self.planes
    }

    #[inline]
    pub fn planes_mask(&self) -> PlanesMask {
        ALL_PLANES_MASK
    }

    /// Tests `bounding_box` against the planes selected by `in_mask`.
    ///
    /// Returns the result and the mask of planes the box straddles. Children of a box can be tested with that mask, since a
    /// plane the parent is fully inside of can never cut a child.
    pub fn intersect_masked(
        &self,
        bounding_box: &BoundingBox,
        in_mask: PlanesMask,
    ) -> (Intersection, PlanesMask) {
        let mut out_mask = 0;

        for (i, plane) in self.planes.iter().enumerate() {
            let bit = 1 << i;
            if in_mask & bit == 0 {
                continue;
            }
            match plane.intersect(bounding_box) {
                Intersection::Outside => return (Intersection::Outside, 0),
                Intersection::Intersect => out_mask |= bit,
                Intersection::Inside => {}
            }
        }

        if out_mask == 0 {
            (Intersection::Inside, 0)
        } else {
            (Intersection::Intersect, out_mask)
        }
    }

    pub fn intersect(&self, bounding_box: &BoundingBox) -> Intersection {
        self.intersect_masked(bounding_box, self.planes_mask()).0
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

    use approx::assert_relative_eq;

    fn unit_ortho_frustum() -> Frustum {
        Frustum::from_matrix(&Mat4::orthographic_rh(-1.0, 1.0, -1.0, 1.0, -1.0, 1.0))
    }

    #[test]
    fn empty_box_merge() {
        let mut bounding_box = BoundingBox::default();
        assert!(bounding_box.is_empty());

        let other = BoundingBox::from_min_max(Vec3A::ZERO, Vec3A::ONE);
        bounding_box.merge(&other);
        assert_eq!(bounding_box, other);

        bounding_box.merge(&BoundingBox::from_min_max(Vec3A::splat(-1.0), Vec3A::ZERO));
        assert_eq!(bounding_box.min(), Vec3A::splat(-1.0));
        assert_eq!(bounding_box.max(), Vec3A::ONE);
    }

    #[test]
    fn scale_about_center() {
        let mut bounding_box = BoundingBox::from_min_max(Vec3A::ZERO, Vec3A::splat(2.0));
        bounding_box.scale(1.5);
        assert_relative_eq!(bounding_box.min().x, -0.5);
        assert_relative_eq!(bounding_box.max().z, 2.5);

        let mut empty = BoundingBox::empty();
        empty.scale(2.0);
        assert!(empty.is_empty());
    }

    #[test]
    fn plane_classification() {
        let plane = Plane::new(Vec3A::Z, 0.0);
        let above = BoundingBox::from_min_max(Vec3A::new(0.0, 0.0, 1.0), Vec3A::splat(2.0));
        let below = BoundingBox::from_min_max(Vec3A::splat(-2.0), Vec3A::splat(-1.0));
        let across = BoundingBox::from_min_max(Vec3A::splat(-1.0), Vec3A::ONE);

        assert_eq!(plane.intersect(&above), Intersection::Inside);
        assert_eq!(plane.intersect(&below), Intersection::Outside);
        assert_eq!(plane.intersect(&across), Intersection::Intersect);
    }

    #[test]
    fn frustum_masks_narrow() {
        let frustum = unit_ortho_frustum();

        let inside = BoundingBox::from_min_max(Vec3A::splat(-0.25), Vec3A::splat(0.25));
        assert_eq!(
            frustum.intersect_masked(&inside, ALL_PLANES_MASK),
            (Intersection::Inside, 0)
        );

        let outside = BoundingBox::from_min_max(Vec3A::new(2.0, 0.0, 0.0), Vec3A::new(3.0, 0.5, 0.5));
        assert_eq!(frustum.intersect(&outside), Intersection::Outside);

        // Only straddles the right plane.
        let right = BoundingBox::from_min_max(Vec3A::new(0.5, -0.5, -0.5), Vec3A::new(1.5, 0.5, 0.5));
        let (result, mask) = frustum.intersect_masked(&right, ALL_PLANES_MASK);
        assert_eq!(result, Intersection::Intersect);
        assert_eq!(mask, 0b10);

        // With no planes left to test, everything is inside.
        assert_eq!(
            frustum.intersect_masked(&outside, 0),
            (Intersection::Inside, 0)
        );
    }
}
