use crate::{Vec3f, Point3f, ComponentWiseExt};
use cgmath::prelude::*;
use std::ops::{Deref, Neg};
use crate::Float;

pub mod bounds;
pub mod transform;

pub use bounds::*;
pub use transform::*;
pub use transform::Transform;
use crate::err_float::{next_float_up, next_float_down};

pub fn distance(p1: Point3f, p2: Point3f) -> Float {
    (p1 - p2).magnitude()
}

/// Push a point computed with absolute error `p_err` far enough along the normal that a ray
/// leaving it in direction `dir` can't re-intersect the surface it came from.
pub fn offset_ray_origin(p: Point3f, p_err: Vec3f, n: Normal3, dir: Vec3f) -> Point3f {
    let d = n.0.abs().dot(p_err);
    let offset = if dir.dot(n.0) < 0.0 { -d * n.0 } else { d * n.0 };

    // round away from p so the offset survives the addition
    let mut po = p + offset;
    for axis in 0..3 {
        po[axis] = match offset[axis] {
            o if o > 0.0 => next_float_up(po[axis]),
            o if o < 0.0 => next_float_down(po[axis]),
            _ => po[axis],
        };
    }
    po
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3f,
    pub dir: Vec3f,
    pub t_max: Float,
    pub time: Float,
}

impl Ray {
    pub fn new(origin: Point3f, dir: Vec3f) -> Self {
        Self { origin, dir, t_max: Float::INFINITY, time: 0.0 }
    }

    pub fn with_t_max(origin: Point3f, dir: Vec3f, t_max: Float) -> Self {
        Self { t_max, ..Self::new(origin, dir) }
    }

    pub fn at(&self, t: Float) -> Point3f {
        self.origin + (self.dir * t)
    }
}

/// Offset rays one pixel over in x and y, used to estimate the footprint of a camera ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Differential {
    pub rx_origin: Point3f,
    pub ry_origin: Point3f,
    pub rx_dir: Vec3f,
    pub ry_dir: Vec3f,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayDifferential {
    pub ray: Ray,
    pub diff: Option<Differential>,
}

impl RayDifferential {
    pub fn new(ray: Ray, diff: Differential) -> Self {
        Self { ray, diff: Some(diff) }
    }

    pub fn scale_differentials(&mut self, s: Float) {
        let ray = self.ray;
        if let Some(diff) = &mut self.diff {
            diff.rx_origin = ray.origin + (diff.rx_origin - ray.origin) * s;
            diff.ry_origin = ray.origin + (diff.ry_origin - ray.origin) * s;
            diff.rx_dir = ray.dir + (diff.rx_dir - ray.dir) * s;
            diff.ry_dir = ray.dir + (diff.ry_dir - ray.dir) * s;
        }
    }
}

impl From<Ray> for RayDifferential {
    fn from(ray: Ray) -> Self {
        Self { ray, diff: None }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Normal3(pub Vec3f);

impl Normal3 {
    pub fn new(x: Float, y: Float, z: Float) -> Self {
        Self(Vec3f::new(x, y, z))
    }

    pub fn faceforward(self, v: Vec3f) -> Self {
        if self.dot(v) < 0.0 {
            Self(-self.0)
        } else {
            self
        }
    }

    pub fn normalize(self) -> Self {
        Self(self.0.normalize())
    }
}

impl Deref for Normal3 {
    type Target = Vec3f;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Neg for Normal3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl From<Vec3f> for Normal3 {
    fn from(v: Vec3f) -> Self {
        Self(v)
    }
}

impl From<Normal3> for Vec3f {
    fn from(n: Normal3) -> Self {
        n.0
    }
}
