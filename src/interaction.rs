use crate::{Point2f, Vec3f, Point3f, Float, Ray, RayDifferential, offset_ray_origin};
use crate::consts::SHADOW_EPSILON;
use crate::geometry::{Normal3, Transform, Transformable};
use crate::material::Material;
use crate::math::solve_linear_system_2x2;
use crate::mem::MemoryView;
use crate::reflection::bsdf::Bsdf;
use crate::shapes::Shape;
use crate::spectrum::SampledWavelengths;
use bumpalo::Bump;
use cgmath::{InnerSpace, Matrix2, Vector2};

/// A point on a surface together with the error bound it was computed with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceHit {
    pub p: Point3f,
    pub p_err: Vec3f,
    pub time: Float,
    pub n: Normal3,
}

impl SurfaceHit {
    pub fn new(p: Point3f, p_err: Vec3f, time: Float, n: Normal3) -> Self {
        Self { p, p_err, time, n }
    }

    /// An exact point with no surface, e.g. the position of a point light.
    pub fn from_point(p: Point3f, time: Float) -> Self {
        Self { p, p_err: vec3f!(0, 0, 0), time, n: Normal3::new(0.0, 0.0, 0.0) }
    }

    pub fn spawn_ray(&self, dir: Vec3f) -> Ray {
        let o = offset_ray_origin(self.p, self.p_err, self.n, dir);
        Ray { origin: o, dir, t_max: std::f32::INFINITY, time: self.time }
    }

    /// Segment towards `p`. The direction is left unnormalized so that `t_max` just short of 1
    /// stops before the target.
    pub fn spawn_ray_to_point(&self, p: Point3f) -> Ray {
        let origin = offset_ray_origin(self.p, self.p_err, self.n, p - self.p);
        let dir = p - origin;
        Ray { origin, dir, t_max: 1.0 - SHADOW_EPSILON, time: self.time }
    }

    pub fn spawn_ray_to_hit(&self, other: &SurfaceHit) -> Ray {
        let origin = offset_ray_origin(self.p, self.p_err, self.n, other.p - self.p);
        let target = offset_ray_origin(other.p, other.p_err, other.n, origin - other.p);
        let dir = target - origin;
        Ray { origin, dir, t_max: 1.0 - SHADOW_EPSILON, time: self.time }
    }
}

/// Partial derivatives of the surface with respect to its (u, v) parametrization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiffGeom {
    pub dpdu: Vec3f,
    pub dpdv: Vec3f,
    pub dndu: Normal3,
    pub dndv: Normal3
}

/// Possibly perturbed (bump or normal mapped) frame used for shading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadingGeom {
    pub n: Normal3,
    pub dpdu: Vec3f,
    pub dpdv: Vec3f,
    pub dndu: Normal3,
    pub dndv: Normal3
}

/// Screen-space footprint of the hit, used to filter texture lookups.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureDifferentials {
    pub dpdx: Vec3f,
    pub dpdy: Vec3f,
    pub dudx: Float,
    pub dvdx: Float,
    pub dudy: Float,
    pub dvdy: Float,
}

impl Default for TextureDifferentials {
    fn default() -> Self {
        Self {
            dpdx: vec3f!(0, 0, 0),
            dpdy: vec3f!(0, 0, 0),
            dudx: 0.0,
            dvdx: 0.0,
            dudy: 0.0,
            dvdy: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SurfaceInteraction {
    pub hit: SurfaceHit,

    /// (u, v) coordinates from the parametrization of the surface
    pub uv: Point2f,

    pub wo: Vec3f,

    pub geom: DiffGeom,

    pub shading: ShadingGeom,

    pub tex_diffs: TextureDifferentials,

    /// Null unless the hit came through a primitive with a material
    pub material: Material,

    pub face_index: i32,

    pub shape: Option<Shape>,
}

impl SurfaceInteraction {
    pub fn new(
        p: Point3f,
        p_err: Vec3f,
        time: Float,
        uv: Point2f,
        wo: Vec3f,
        geom: DiffGeom,
        flip_normal: bool,
    ) -> Self {
        let mut n = Normal3(geom.dpdu.cross(geom.dpdv).normalize());
        if flip_normal {
            n = -n;
        }

        Self {
            hit: SurfaceHit { p, p_err, time, n },
            uv,
            wo,
            geom,
            shading: ShadingGeom { n, dpdu: geom.dpdu, dpdv: geom.dpdv, dndu: geom.dndu, dndv: geom.dndv },
            tex_diffs: TextureDifferentials::default(),
            material: Material::NULL,
            face_index: 0,
            shape: None,
        }
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn n(&self) -> Normal3 {
        self.hit.n
    }

    /// Replace the shading frame. Whichever of the two normals is not authoritative is flipped
    /// into the other's hemisphere.
    pub fn set_shading_geometry(
        &mut self,
        dpdus: Vec3f,
        dpdvs: Vec3f,
        dndus: Normal3,
        dndvs: Normal3,
        orientation_is_authoritative: bool,
    ) {
        let mut ns = Normal3(dpdus.cross(dpdvs).normalize());
        if self.shape.map_or(false, |s| s.flips_normal()) {
            ns = -ns;
        }
        if orientation_is_authoritative {
            self.hit.n = self.hit.n.faceforward(ns.0);
        } else {
            ns = ns.faceforward(self.hit.n.0);
        }
        self.shading = ShadingGeom { n: ns, dpdu: dpdus, dpdv: dpdvs, dndu: dndus, dndv: dndvs };
    }

    /// Estimate how (p, u, v) change from one pixel to the next by intersecting the offset rays
    /// with the tangent plane. Anything degenerate leaves the differentials at zero.
    pub fn compute_differentials(&mut self, ray: &RayDifferential) {
        self.tex_diffs = self.try_differentials(ray).unwrap_or_default();
    }

    fn try_differentials(&self, ray: &RayDifferential) -> Option<TextureDifferentials> {
        let diff = ray.diff?;
        let n = self.hit.n.0;
        let p = self.hit.p;

        // plane through p: n . x = d
        let d = n.dot(vec3f!(p.x, p.y, p.z));
        let plane_t = |o: Point3f, dir: Vec3f| {
            let t = -(n.dot(vec3f!(o.x, o.y, o.z)) - d) / n.dot(dir);
            if t.is_finite() { Some(t) } else { None }
        };
        let tx = plane_t(diff.rx_origin, diff.rx_dir)?;
        let ty = plane_t(diff.ry_origin, diff.ry_dir)?;
        let px = diff.rx_origin + tx * diff.rx_dir;
        let py = diff.ry_origin + ty * diff.ry_dir;

        let mut tex = TextureDifferentials { dpdx: px - p, dpdy: py - p, ..TextureDifferentials::default() };

        // project onto the two axes where the normal is smallest
        let dim = if n.x.abs() > n.y.abs() && n.x.abs() > n.z.abs() {
            [1, 2]
        } else if n.y.abs() > n.z.abs() {
            [0, 2]
        } else {
            [0, 1]
        };

        let dpdu = self.geom.dpdu;
        let dpdv = self.geom.dpdv;
        let a = Matrix2::new(dpdu[dim[0]], dpdu[dim[1]], dpdv[dim[0]], dpdv[dim[1]]);
        let bx = Vector2::new(px[dim[0]] - p[dim[0]], px[dim[1]] - p[dim[1]]);
        let by = Vector2::new(py[dim[0]] - p[dim[0]], py[dim[1]] - p[dim[1]]);

        if let Some(x) = solve_linear_system_2x2(a, bx) {
            tex.dudx = x.x;
            tex.dvdx = x.y;
        }
        if let Some(y) = solve_linear_system_2x2(a, by) {
            tex.dudy = y.x;
            tex.dvdy = y.y;
        }
        Some(tex)
    }

    pub fn spawn_ray(&self, dir: Vec3f) -> Ray {
        self.hit.spawn_ray(dir)
    }

    /// Compute the differentials for `ray` and ask the material for its scattering function.
    /// Hits without a material (or whose material can't be resolved) have no BSDF.
    pub fn bsdf<'a>(
        &mut self,
        ray: &RayDifferential,
        lambda: &mut SampledWavelengths,
        mem: MemoryView,
        arena: &'a Bump,
    ) -> Option<Bsdf<'a>> {
        self.compute_differentials(ray);
        if self.material.is_null() {
            return None;
        }
        match self.material.get_bsdf(self, lambda, mem, arena) {
            Ok(bsdf) => Some(bsdf),
            Err(e) => {
                tracing::error!(error = %e, "could not evaluate material");
                None
            }
        }
    }
}

impl Transformable for SurfaceHit {
    fn transform(&self, t: Transform) -> Self {
        let (p, p_err) = t.tf_err_to_err(self.p, self.p_err);
        let n = t.transform_normal(&self.n);
        let n = if n.magnitude2() > 0.0 { n.normalize() } else { n };
        Self { p, p_err, time: self.time, n }
    }
}

impl Transformable for SurfaceInteraction {
    fn transform(&self, t: Transform) -> Self {
        let hit = self.hit.transform(t);
        let wo = t.transform(self.wo);
        let wo = if wo.magnitude2() > 0.0 { wo.normalize() } else { wo };

        let geom = DiffGeom {
            dpdu: t.transform(self.geom.dpdu),
            dpdv: t.transform(self.geom.dpdv),
            dndu: t.transform_normal(&self.geom.dndu),
            dndv: t.transform_normal(&self.geom.dndv),
        };
        let shading = ShadingGeom {
            n: t.transform_normal(&self.shading.n).normalize().faceforward(hit.n.0),
            dpdu: t.transform(self.shading.dpdu),
            dpdv: t.transform(self.shading.dpdv),
            dndu: t.transform_normal(&self.shading.dndu),
            dndv: t.transform_normal(&self.shading.dndv),
        };
        let tex_diffs = TextureDifferentials {
            dpdx: t.transform(self.tex_diffs.dpdx),
            dpdy: t.transform(self.tex_diffs.dpdy),
            ..self.tex_diffs
        };

        Self { hit, uv: self.uv, wo, geom, shading, tex_diffs, ..*self }
    }
}
