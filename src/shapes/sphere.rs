use crate::{Float, distance, Normal3, Point3f, Vec3f, Point2f, Bounds3f, Ray, ComponentWiseExt};
use crate::EFloat;
use crate::consts::TWO_PI;
use crate::err_float::gamma;
use crate::error::{Error, Result};
use crate::interaction::{DiffGeom, SurfaceInteraction};
use crate::math::{quadratic, safe_acos, safe_sqrt};
use crate::mem::MemoryManager;
use crate::geometry::{Transform, Transformable};
use crate::shapes::{QuadricIntersection, Shape, ShapeFlags, ShapeIntersection, ShapeType};
use bytemuck::{Pod, Zeroable};
use cgmath::{EuclideanSpace, InnerSpace};

/// Construction parameters for a (possibly partial) sphere centred on the object-space origin.
/// `phi_max` is in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereParams {
    pub radius: Float,
    pub z_min: Float,
    pub z_max: Float,
    pub phi_max: Float,
}

impl Default for SphereParams {
    fn default() -> Self {
        Self { radius: 1.0, z_min: -1.0, z_max: 1.0, phi_max: TWO_PI }
    }
}

/// x = r sin(theta) cos(phi), y = r sin(theta) sin(phi), z = r cos(theta), optionally cut
/// off below `z_min`, above `z_max` and past `phi_max`.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Sphere {
    radius: Float,
    z_min: Float,
    z_max: Float,
    theta_z_min: Float,
    theta_z_max: Float,
    phi_max: Float,
}

impl_relocate!(Sphere {} plain { radius, z_min, z_max, theta_z_min, theta_z_max, phi_max });

impl Sphere {
    pub fn new(radius: Float, z_min: Float, z_max: Float, phi_max: Float) -> Self {
        Self {
            radius,
            z_min: Float::min(z_min, z_max).clamp(-radius, radius),
            z_max: Float::max(z_min, z_max).clamp(-radius, radius),
            theta_z_min: safe_acos(Float::min(z_min, z_max) / radius),
            theta_z_max: safe_acos(Float::max(z_min, z_max) / radius),
            phi_max: phi_max.clamp(0.0, TWO_PI),
        }
    }

    pub fn unit_sphere() -> Self {
        Self::new(1.0, -1.0, 1.0, TWO_PI)
    }

    /// Place a sphere in the arena and wrap it in a shape handle.
    pub fn create_shape(mem: &mut MemoryManager, o2w: Transform, flags: ShapeFlags, params: SphereParams) -> Result<Shape> {
        if !(params.radius > 0.0 && params.radius.is_finite()) {
            return Err(Error::InvalidInput(format!("sphere radius {} must be positive", params.radius)));
        }
        let sphere = Sphere::new(params.radius, params.z_min, params.z_max, params.phi_max);
        let ptr = mem.allocate(sphere)?;
        Ok(Shape::new(o2w, ShapeType::Sphere, ptr, sphere.object_bound(), flags))
    }

    pub fn radius(&self) -> Float {
        self.radius
    }

    pub fn object_bound(&self) -> Bounds3f {
        Bounds3f::with_bounds(
            Point3f::new(-self.radius, -self.radius, self.z_min),
            Point3f::new(self.radius, self.radius, self.z_max),
        )
    }

    pub fn surface_area(&self) -> Float {
        self.phi_max * self.radius * (self.z_max - self.z_min)
    }

    /// Hit point on the surface for parameter `t`, reprojected onto the sphere, and its phi.
    fn hit_point(&self, ray: &Ray, t: Float) -> (Point3f, Float) {
        let mut p_hit = ray.at(t);

        // refine the hit point, the ray equation accumulates more error than this does
        p_hit *= self.radius / distance(p_hit, Point3f::origin());
        if p_hit.x == 0.0 && p_hit.y == 0.0 { p_hit.x = 1.0e-5 * self.radius }
        let mut phi = Float::atan2(p_hit.y, p_hit.x);
        if phi < 0.0 { phi += TWO_PI }

        (p_hit, phi)
    }

    fn is_clipped(&self, p_hit: Point3f, phi: Float) -> bool {
        (self.z_min > -self.radius && p_hit.z < self.z_min)
            || (self.z_max < self.radius && p_hit.z > self.z_max)
            || phi > self.phi_max
    }

    pub fn intersect_quadric(&self, ray: &Ray, t_max: Float, w2o: &Transform) -> Option<QuadricIntersection> {
        let (ray, (origin_err, dir_err)) = w2o.tf_exact_to_err(*ray);
        if ray.dir.magnitude2() == 0.0 {
            return None;
        }

        let ox = EFloat::with_err(ray.origin.x, origin_err.x);
        let oy = EFloat::with_err(ray.origin.y, origin_err.y);
        let oz = EFloat::with_err(ray.origin.z, origin_err.z);
        let dirx = EFloat::with_err(ray.dir.x, dir_err.x);
        let diry = EFloat::with_err(ray.dir.y, dir_err.y);
        let dirz = EFloat::with_err(ray.dir.z, dir_err.z);

        let a = dirx * dirx + diry * diry + dirz * dirz;
        let b = 2.0 * (dirx * ox + diry * oy + dirz * oz);
        let c = ox * ox + oy * oy + oz * oz - EFloat::new(self.radius) * EFloat::new(self.radius);

        let (t0, t1) = quadratic(a, b, c)?;

        // t_max is inclusive, the root's central value decides
        if t0.v > t_max || t1.lower_bound() <= 0.0 {
            return None;
        }

        // find the closest valid intersection t value
        let mut t_shape_hit = t0;
        if t_shape_hit.lower_bound() <= 0.0 {
            t_shape_hit = t1;
            if t_shape_hit.v > t_max {
                return None
            }
        }

        let (mut p_hit, mut phi) = self.hit_point(&ray, t_shape_hit.into());

        if self.is_clipped(p_hit, phi) {
            if t_shape_hit == t1 { return None; }
            if t1.v > t_max { return None; }

            t_shape_hit = t1;
            let (p, ph) = self.hit_point(&ray, t_shape_hit.into());
            p_hit = p;
            phi = ph;

            // If we still miss due to clipping
            if self.is_clipped(p_hit, phi) {
                return None;
            }
        }

        Some(QuadricIntersection { t_hit: t_shape_hit.into(), p_obj: p_hit, phi })
    }

    /// Build the world-space differential geometry for a hit found by `intersect_quadric`.
    #[allow(non_snake_case)]
    pub fn interaction_from_intersection(
        &self,
        isect: &QuadricIntersection,
        wo: Vec3f,
        time: Float,
        shape: &Shape,
    ) -> SurfaceInteraction {
        let p_hit = isect.p_obj;
        let phi = isect.phi;

        let u = phi / self.phi_max;
        let cos_theta = p_hit.z / self.radius;
        let theta = safe_acos(cos_theta);
        let v = (theta - self.theta_z_min) / (self.theta_z_max - self.theta_z_min);

        let z_radius = (p_hit.x * p_hit.x + p_hit.y * p_hit.y).sqrt();
        let cos_phi = p_hit.x / z_radius;
        let sin_phi = p_hit.y / z_radius;
        let sin_theta = safe_sqrt(1.0 - cos_theta * cos_theta);
        let theta_range = self.theta_z_max - self.theta_z_min;

        let dpdu = vec3f!(-self.phi_max * p_hit.y, self.phi_max * p_hit.x, 0.0);
        let dpdv = theta_range * vec3f!(p_hit.z * cos_phi, p_hit.z * sin_phi, -self.radius * sin_theta);

        let d2pduu = (-self.phi_max * self.phi_max) * vec3f!(p_hit.x, p_hit.y, 0.0);
        let d2pduv = theta_range * p_hit.z * self.phi_max * vec3f!(-sin_phi, cos_phi, 0.0);
        let d2pdvv = -theta_range * theta_range * p_hit.to_vec();

        // Weingarten equations
        let E = dpdu.dot(dpdu);
        let F = dpdu.dot(dpdv);
        let G = dpdv.dot(dpdv);

        let N = dpdu.cross(dpdv).normalize();

        let e = N.dot(d2pduu);
        let f = N.dot(d2pduv);
        let g = N.dot(d2pdvv);

        let EGF2 = E * G - F * F;
        let invEGF2 = if EGF2 == 0.0 { 0.0 } else { 1.0 / EGF2 };

        let dndu = Normal3((f * F - e * G) * invEGF2 * dpdu + (e * F - f * E) * invEGF2 * dpdv);
        let dndv = Normal3((g * F - f * G) * invEGF2 * dpdu + (f * F - g * E) * invEGF2 * dpdv);

        let p_err: Vec3f = gamma(5) * p_hit.to_vec().abs();

        let interact = SurfaceInteraction::new(
            p_hit,
            p_err,
            time,
            Point2f::new(u, v),
            shape.w2o.transform(wo),
            DiffGeom { dpdu, dpdv, dndu, dndv },
            shape.flips_normal(),
        );

        interact.transform(shape.o2w).with_shape(*shape)
    }

    pub fn intersect(&self, shape: &Shape, ray: &Ray, t_max: Float) -> Option<ShapeIntersection> {
        let isect = self.intersect_quadric(ray, t_max, &shape.w2o)?;
        let interaction = self.interaction_from_intersection(&isect, -ray.dir, ray.time, shape);
        Some(ShapeIntersection { interaction, t_hit: isect.t_hit })
    }

    pub fn intersect_p(&self, shape: &Shape, ray: &Ray, t_max: Float) -> bool {
        self.intersect_quadric(ray, t_max, &shape.w2o).is_some()
    }
}
