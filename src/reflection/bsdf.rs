use crate::{Float, Normal3, Vec3f, Point2f};
use crate::reflection::{BSDFSample, BxDF, BxDFFlags, BxDFReflTransFlags, TransportMode};
use crate::interaction::SurfaceInteraction;
use crate::spectrum::SampledSpectrum;
use cgmath::InnerSpace;

/// A [`BxDF`] placed in the shading frame of a hit.
#[derive(Clone, Copy, Debug)]
pub struct Bsdf<'a> {
    /// Shading normal
    ns: Normal3,

    /// Geometry normal
    ng: Normal3,

    /// s orthonormal basis vector with the shading normal
    ss: Vec3f,

    /// t orthonormal basis vector with the shading normal
    ts: Vec3f,

    bxdf: BxDF<'a>,
}

/// Any two vectors completing `v` to an orthonormal basis.
fn coordinate_system(v: Vec3f) -> (Vec3f, Vec3f) {
    let sign = Float::copysign(1.0, v.z);
    let a = -1.0 / (sign + v.z);
    let b = v.x * v.y * a;
    (
        Vec3f::new(1.0 + sign * v.x * v.x * a, sign * b, -sign * v.x),
        Vec3f::new(b, sign + v.y * v.y * a, -v.y),
    )
}

impl<'a> Bsdf<'a> {
    pub fn new(si: &SurfaceInteraction, bxdf: BxDF<'a>) -> Self {
        Self::from_frame(si.shading.n, si.hit.n, si.shading.dpdu, bxdf)
    }

    pub fn from_frame(ns: Normal3, ng: Normal3, dpdus: Vec3f, bxdf: BxDF<'a>) -> Self {
        // Gram-Schmidt dpdu against the shading normal, which it need not be perpendicular to
        let s = dpdus - ns.0 * ns.dot(dpdus);
        let (ss, ts) = if s.magnitude2() > 0.0 {
            let ss = s.normalize();
            (ss, ns.cross(ss))
        } else {
            coordinate_system(ns.0)
        };

        Self { ns, ng, ss, ts, bxdf }
    }

    pub fn flags(&self) -> BxDFFlags {
        self.bxdf.flags()
    }

    pub fn bxdf(&self) -> BxDF<'a> {
        self.bxdf
    }

    pub fn geometric_normal(&self) -> Normal3 {
        self.ng
    }

    pub fn world_to_local(&self, v: Vec3f) -> Vec3f {
        Vec3f::new(v.dot(self.ss), v.dot(self.ts), v.dot(self.ns.0))
    }

    pub fn local_to_world(&self, v: Vec3f) -> Vec3f {
        let x = self.ss.x * v.x + self.ts.x * v.y + self.ns.x * v.z;
        let y = self.ss.y * v.x + self.ts.y * v.y + self.ns.y * v.z;
        let z = self.ss.z * v.x + self.ts.z * v.y + self.ns.z * v.z;
        Vec3f::new(x, y, z)
    }

    pub fn f(&self, wo_world: Vec3f, wi_world: Vec3f, mode: TransportMode) -> SampledSpectrum {
        let wi = self.world_to_local(wi_world);
        let wo = self.world_to_local(wo_world);
        if wo.z == 0.0 { return SampledSpectrum::uniform(0.0) }
        self.bxdf.f(wo, wi, mode)
    }

    pub fn sample_f(
        &self,
        wo_world: Vec3f,
        uc: Float,
        u: Point2f,
        mode: TransportMode,
        sample_flags: BxDFReflTransFlags,
    ) -> Option<BSDFSample> {
        let wo = self.world_to_local(wo_world);
        if wo.z == 0.0 || !self.allows(sample_flags) {
            return None;
        }

        let mut bs = self.bxdf.sample_f(wo, uc, u, mode, sample_flags)?;
        if bs.f.is_black() || bs.pdf == 0.0 || bs.wi.z == 0.0 {
            return None;
        }
        bs.wi = self.local_to_world(bs.wi);
        Some(bs)
    }

    pub fn pdf(&self, wo_world: Vec3f, wi_world: Vec3f, mode: TransportMode, sample_flags: BxDFReflTransFlags) -> Float {
        let wo = self.world_to_local(wo_world);
        let wi = self.world_to_local(wi_world);
        if wo.z == 0.0 { return 0.0 }
        self.bxdf.pdf(wo, wi, mode, sample_flags)
    }

    fn allows(&self, sample_flags: BxDFReflTransFlags) -> bool {
        let flags = self.flags();
        (sample_flags.contains(BxDFReflTransFlags::REFLECTION) && flags.is_reflective())
            || (sample_flags.contains(BxDFReflTransFlags::TRANSMISSION) && flags.is_transmissive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::{DielectricBxDF, TrowbridgeReitzDistribution};
    use approx::assert_abs_diff_eq;

    #[test]
    fn frame_round_trip() {
        let bxdf = DielectricBxDF::new(1.5, TrowbridgeReitzDistribution::new(0.2, 0.2));
        let n = Normal3(vec3f!(1, 1, 0).normalize());
        let bsdf = Bsdf::from_frame(n, n, vec3f!(0, 0, 2), BxDF::Dielectric(&bxdf));

        assert_abs_diff_eq!(bsdf.world_to_local(n.0), vec3f!(0, 0, 1), epsilon = 1.0e-6);
        let v = vec3f!(0.3, -0.2, 0.9);
        assert_abs_diff_eq!(bsdf.local_to_world(bsdf.world_to_local(v)), v, epsilon = 1.0e-6);

        // degenerate tangent falls back to an arbitrary frame
        let bsdf = Bsdf::from_frame(n, n, vec3f!(0, 0, 0), BxDF::Dielectric(&bxdf));
        assert_abs_diff_eq!(bsdf.world_to_local(n.0), vec3f!(0, 0, 1), epsilon = 1.0e-6);
    }

    #[test]
    fn rejects_tangent_wo_and_disallowed_lobes() {
        let glass = DielectricBxDF::new(1.0, TrowbridgeReitzDistribution::new(0.0, 0.0));
        let n = Normal3::new(0.0, 0.0, 1.0);
        let bsdf = Bsdf::from_frame(n, n, vec3f!(1, 0, 0), BxDF::Dielectric(&glass));
        let u = Point2f::new(0.5, 0.5);

        assert!(bsdf.sample_f(vec3f!(1, 0, 0), 0.5, u, TransportMode::Radiance, BxDFReflTransFlags::ALL).is_none());
        // index-matched glass only transmits
        assert!(bsdf.sample_f(vec3f!(0, 0, 1), 0.5, u, TransportMode::Radiance, BxDFReflTransFlags::REFLECTION).is_none());
        let s = bsdf.sample_f(vec3f!(0, 0, 1), 0.5, u, TransportMode::Radiance, BxDFReflTransFlags::ALL).unwrap();
        assert_abs_diff_eq!(s.wi, vec3f!(0, 0, -1), epsilon = 1.0e-6);
        assert!(bsdf.f(vec3f!(1, 0, 0), vec3f!(0, 0, 1), TransportMode::Radiance).is_black());
    }
}
