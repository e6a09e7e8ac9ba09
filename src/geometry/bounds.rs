use crate::{Float, Point3f, Vec3f, Ray};
use crate::err_float::gamma;
use bytemuck::{Pod, Zeroable};

/// Axis-aligned bounding box
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(C)]
pub struct Bounds3f {
    pub min: Point3f,
    pub max: Point3f,
}

// SAFETY: cgmath points are #[repr(C)] structs of three f32s, so two of them have no padding
// and every bit pattern is valid.
unsafe impl Zeroable for Bounds3f {}
unsafe impl Pod for Bounds3f {}

impl Bounds3f {
    pub fn empty() -> Self {
        Self {
            min: Point3f::new(Float::INFINITY, Float::INFINITY, Float::INFINITY),
            max: Point3f::new(Float::NEG_INFINITY, Float::NEG_INFINITY, Float::NEG_INFINITY),
        }
    }

    pub fn with_bounds(p1: Point3f, p2: Point3f) -> Self {
        Self {
            min: Point3f::new(p1.x.min(p2.x), p1.y.min(p2.y), p1.z.min(p2.z)),
            max: Point3f::new(p1.x.max(p2.x), p1.y.max(p2.y), p1.z.max(p2.z)),
        }
    }

    /// True when the box contains no points, including the inverted box from `empty()`.
    pub fn is_empty(&self) -> bool {
        !(self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z)
    }

    pub fn join(&self, other: &Bounds3f) -> Self {
        Self {
            min: Point3f::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3f::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    pub fn join_point(&self, p: Point3f) -> Self {
        self.join(&Self { min: p, max: p })
    }

    pub fn diagonal(&self) -> Vec3f {
        self.max - self.min
    }

    pub fn centroid(&self) -> Point3f {
        self.min + (self.diagonal() / 2.0)
    }

    pub fn surface_area(&self) -> Float {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.diagonal();
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    pub fn corner(&self, i: usize) -> Point3f {
        Point3f::new(
            if i & 1 == 0 { self.min.x } else { self.max.x },
            if i & 2 == 0 { self.min.y } else { self.max.y },
            if i & 4 == 0 { self.min.z } else { self.max.z },
        )
    }

    pub fn iter_corners(&self) -> impl Iterator<Item = Point3f> + '_ {
        (0..8).map(move |i| self.corner(i))
    }

    /// Slab test against the ray's parametric range `[0, t_max]`, returning the entry and exit
    /// distances if the ray overlaps the box.
    pub fn intersect_p(&self, ray: &Ray) -> Option<(Float, Float)> {
        if self.is_empty() {
            return None;
        }
        let mut t0 = 0.0;
        let mut t1 = ray.t_max;
        for i in 0..3 {
            let inv_dir = 1.0 / ray.dir[i];
            let mut t_near = (self.min[i] - ray.origin[i]) * inv_dir;
            let mut t_far = (self.max[i] - ray.origin[i]) * inv_dir;
            if t_near > t_far {
                std::mem::swap(&mut t_near, &mut t_far);
            }
            t_far *= 1.0 + 2.0 * gamma(3);

            // NaN slab distances (origin on a slab plane with a zero direction component)
            // leave the interval unchanged
            t0 = if t_near > t0 { t_near } else { t0 };
            t1 = if t_far < t1 { t_far } else { t1 };
            if t0 > t1 {
                return None;
            }
        }
        Some((t0, t1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slab_hit_and_miss() {
        let b = bounds3f!((-1, -1, -1), (1, 1, 1));
        let ray = Ray::new(point3f!(0, 0, 5), vec3f!(0, 0, -1));
        let (t0, t1) = b.intersect_p(&ray).unwrap();
        assert!((t0 - 4.0).abs() < 1.0e-5);
        assert!(t1 >= 6.0);

        let miss = Ray::new(point3f!(3, 0, 5), vec3f!(0, 0, -1));
        assert!(b.intersect_p(&miss).is_none());

        let short = Ray::with_t_max(point3f!(0, 0, 5), vec3f!(0, 0, -1), 3.0);
        assert!(b.intersect_p(&short).is_none());
    }

    #[test]
    fn degenerate_boxes() {
        let ray = Ray::new(point3f!(0, 0, 5), vec3f!(0, 0, -1));
        assert!(Bounds3f::empty().intersect_p(&ray).is_none());

        let flat = bounds3f!((-1, -1, 0), (1, 1, 0));
        assert!(flat.intersect_p(&ray).is_some());

        // origin lies exactly on a slab plane while the direction is parallel to it
        let grazing = Ray::new(point3f!(1, 0, 5), vec3f!(0, 0, -1));
        assert!(bounds3f!((-1, -1, -1), (1, 1, 1)).intersect_p(&grazing).is_some());
    }

    #[test]
    fn join_and_corners() {
        let b = Bounds3f::empty()
            .join_point(point3f!(1, 2, 3))
            .join(&bounds3f!((-1, 0, 0), (0, 0, 0)));
        assert_eq!(b, bounds3f!((-1, 0, 0), (1, 2, 3)));
        assert_eq!(b.iter_corners().count(), 8);
        assert_eq!(b.centroid(), point3f!(0, 1, 1.5));
        assert!(Bounds3f::empty().is_empty());
        assert!(!b.is_empty());
    }
}
