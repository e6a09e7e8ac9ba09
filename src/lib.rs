#[macro_use] pub mod macros; // must stay at the top
pub mod error;
pub mod err_float;
pub mod math;
pub mod sampling;
pub mod geometry;
pub mod mem;
pub mod interaction;
pub mod shapes;
pub mod primitive;
pub mod aggregate;
pub mod spectrum;
pub mod fresnel;
pub mod reflection;
pub mod material;
pub mod light;
pub mod scene;

pub use geometry::*;
pub use err_float::EFloat;
pub use error::{Error, Result, ResultCode};
pub use interaction::{SurfaceHit, SurfaceInteraction};
pub use math::solve_linear_system_2x2;

use cgmath::{Point2, Point3, Vector2, Vector3, InnerSpace};

pub type Float = f32;

pub type Point2f = Point2<Float>;
pub type Point3f = Point3<Float>;
pub type Vec2f = Vector2<Float>;
pub type Vec3f = Vector3<Float>;

pub mod consts {
    pub use std::f32::consts::*;

    pub const INV_PI: crate::Float = FRAC_1_PI;
    pub const INV_2PI: crate::Float = FRAC_1_PI * 0.5;
    pub const INV_4PI: crate::Float = FRAC_1_PI * 0.25;
    pub const TWO_PI: crate::Float = PI * 2.0;

    /// Fraction of the segment length left unspanned when testing visibility between two points.
    pub const SHADOW_EPSILON: crate::Float = 0.0001;
}

pub trait ComponentWiseExt {
    fn abs(self) -> Self;
    fn min_component(self) -> Float;
    fn max_component(self) -> Float;
    fn max_dimension(self) -> usize;
}

impl ComponentWiseExt for Vec3f {
    fn abs(self) -> Self {
        Vec3f::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    fn min_component(self) -> Float {
        self.x.min(self.y.min(self.z))
    }

    fn max_component(self) -> Float {
        self.x.max(self.y.max(self.z))
    }

    fn max_dimension(self) -> usize {
        if self.x > self.y {
            if self.x > self.z { 0 } else { 2 }
        } else if self.y > self.z { 1 } else { 2 }
    }
}

/// Flip `v` so that it lies in the same hemisphere as `reference`.
pub fn faceforward(v: Vec3f, reference: Vec3f) -> Vec3f {
    if v.dot(reference) < 0.0 { -v } else { v }
}

pub fn abs_dot(v1: Vec3f, v2: Vec3f) -> Float {
    v1.dot(v2).abs()
}

pub fn spherical_direction(sin_theta: Float, cos_theta: Float, phi: Float) -> Vec3f {
    Vec3f::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faceforward() {
        let v = vec3f!(0, 0, -1);
        assert_eq!(faceforward(v, vec3f!(0, 0, 1)), vec3f!(0, 0, 1));
        assert_eq!(faceforward(v, vec3f!(0, 0, -1)), v);
    }

    #[test]
    fn test_max_dimension() {
        assert_eq!(vec3f!(1, 5, 2).max_dimension(), 1);
        assert_eq!(vec3f!(-1, -5, 2).abs().max_dimension(), 1);
        assert_eq!(vec3f!(0, 0, 3).max_dimension(), 2);
    }
}
