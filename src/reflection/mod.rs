use bitflags::bitflags;
use crate::{Vec3f, Point2f, Float, Normal3};
use crate::spectrum::SampledSpectrum;
use cgmath::InnerSpace;
use std::ops::Not;

pub mod bsdf;
pub mod dielectric;
pub mod microfacet;

pub use bsdf::Bsdf;
pub use dielectric::DielectricBxDF;
pub use microfacet::{MicrofacetDistribution, TrowbridgeReitzDistribution};

bitflags! {
    pub struct BxDFFlags: u8 {
        const REFLECTION = 1;
        const TRANSMISSION = 1 << 1;
        const DIFFUSE = 1 << 2;
        const GLOSSY = 1 << 3;
        const SPECULAR = 1 << 4;

        const DIFFUSE_REFLECTION = Self::DIFFUSE.bits | Self::REFLECTION.bits;
        const DIFFUSE_TRANSMISSION = Self::DIFFUSE.bits | Self::TRANSMISSION.bits;
        const GLOSSY_REFLECTION = Self::GLOSSY.bits | Self::REFLECTION.bits;
        const GLOSSY_TRANSMISSION = Self::GLOSSY.bits | Self::TRANSMISSION.bits;
        const SPECULAR_REFLECTION = Self::SPECULAR.bits | Self::REFLECTION.bits;
        const SPECULAR_TRANSMISSION = Self::SPECULAR.bits | Self::TRANSMISSION.bits;
        const ALL = Self::DIFFUSE.bits | Self::GLOSSY.bits | Self::SPECULAR.bits
            | Self::REFLECTION.bits | Self::TRANSMISSION.bits;
    }
}

impl BxDFFlags {
    pub fn is_reflective(self) -> bool { self.contains(BxDFFlags::REFLECTION) }
    pub fn is_transmissive(self) -> bool { self.contains(BxDFFlags::TRANSMISSION) }
    pub fn is_diffuse(self) -> bool { self.contains(BxDFFlags::DIFFUSE) }
    pub fn is_glossy(self) -> bool { self.contains(BxDFFlags::GLOSSY) }
    pub fn is_specular(self) -> bool { self.contains(BxDFFlags::SPECULAR) }
    pub fn is_non_specular(self) -> bool { self.intersects(BxDFFlags::DIFFUSE | BxDFFlags::GLOSSY) }
}

bitflags! {
    /// Which lobes a caller allows `sample_f` to pick from.
    pub struct BxDFReflTransFlags: u8 {
        const REFLECTION = 1;
        const TRANSMISSION = 1 << 1;
        const ALL = Self::REFLECTION.bits | Self::TRANSMISSION.bits;
    }
}

/// Direction in which light is being traced. Refraction scales radiance but not importance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportMode {
    Radiance,
    Importance,
}

impl Not for TransportMode {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            TransportMode::Radiance => TransportMode::Importance,
            TransportMode::Importance => TransportMode::Radiance,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BSDFSample {
    pub f: SampledSpectrum,
    pub wi: Vec3f,
    pub pdf: Float,
    pub flags: BxDFFlags,
    /// Relative index of refraction crossed by a transmitted sample, 1 otherwise.
    pub eta: Float,
    pub pdf_is_proportional: bool,
}

impl BSDFSample {
    pub fn new(f: SampledSpectrum, wi: Vec3f, pdf: Float, flags: BxDFFlags) -> Self {
        Self { f, wi, pdf, flags, eta: 1.0, pdf_is_proportional: false }
    }

    pub fn with_eta(self, eta: Float) -> Self {
        Self { eta, ..self }
    }

    pub fn is_reflection(&self) -> bool { self.flags.is_reflective() }
    pub fn is_transmission(&self) -> bool { self.flags.is_transmissive() }
    pub fn is_specular(&self) -> bool { self.flags.is_specular() }
}

// Trig in the local shading frame, where the normal is +z.

pub fn cos_theta(w: Vec3f) -> Float { w.z }
pub fn cos2_theta(w: Vec3f) -> Float { w.z * w.z }
pub fn abs_cos_theta(w: Vec3f) -> Float { w.z.abs() }

pub fn sin2_theta(w: Vec3f) -> Float {
    Float::max(0.0, 1.0 - cos2_theta(w))
}

pub fn sin_theta(w: Vec3f) -> Float {
    sin2_theta(w).sqrt()
}

pub fn tan_theta(w: Vec3f) -> Float {
    sin_theta(w) / cos_theta(w)
}

pub fn tan2_theta(w: Vec3f) -> Float {
    sin2_theta(w) / cos2_theta(w)
}

pub fn cos_phi(w: Vec3f) -> Float {
    let sin_theta = sin_theta(w);
    if sin_theta == 0.0 {
        1.0
    } else {
        (w.x / sin_theta).clamp(-1.0, 1.0)
    }
}

pub fn sin_phi(w: Vec3f) -> Float {
    let sin_theta = sin_theta(w);
    if sin_theta == 0.0 {
        0.0
    } else {
        (w.y / sin_theta).clamp(-1.0, 1.0)
    }
}

pub fn cos2_phi(w: Vec3f) -> Float {
    cos_phi(w) * cos_phi(w)
}

pub fn sin2_phi(w: Vec3f) -> Float {
    sin_phi(w) * sin_phi(w)
}

/// Refract `wi` through the interface with normal `n` and relative index `eta`. Returns the
/// transmitted direction and the relative index actually crossed, which is inverted when `wi`
/// arrives from below `n`. `None` on total internal reflection.
pub fn refract(wi: Vec3f, n: Normal3, eta: Float) -> Option<(Vec3f, Float)> {
    let mut n = n.0;
    let mut eta = eta;
    let mut cos_theta_i = n.dot(wi);
    if cos_theta_i < 0.0 {
        eta = 1.0 / eta;
        cos_theta_i = -cos_theta_i;
        n = -n;
    }

    let sin2_theta_i = Float::max(0.0, 1.0 - cos_theta_i * cos_theta_i);
    let sin2_theta_t = sin2_theta_i / (eta * eta);
    if sin2_theta_t >= 1.0 { return None }
    let cos_theta_t = Float::sqrt(1.0 - sin2_theta_t);

    let wt = -wi / eta + (cos_theta_i / eta - cos_theta_t) * n;
    Some((wt, eta))
}

pub fn reflect(wo: Vec3f, n: Vec3f) -> Vec3f {
    -wo + 2.0 * wo.dot(n) * n
}

pub fn same_hemisphere(v1: Vec3f, v2: Vec3f) -> bool {
    v1.z * v2.z > 0.0
}

/// Scattering function at a single hit, living in a per-worker scratch arena.
#[derive(Clone, Copy, Debug)]
pub enum BxDF<'a> {
    Dielectric(&'a DielectricBxDF),
}

impl<'a> BxDF<'a> {
    pub fn flags(&self) -> BxDFFlags {
        match self {
            BxDF::Dielectric(bxdf) => bxdf.flags(),
        }
    }

    pub fn f(&self, wo: Vec3f, wi: Vec3f, mode: TransportMode) -> SampledSpectrum {
        match self {
            BxDF::Dielectric(bxdf) => bxdf.f(wo, wi, mode),
        }
    }

    pub fn sample_f(
        &self,
        wo: Vec3f,
        uc: Float,
        u: Point2f,
        mode: TransportMode,
        sample_flags: BxDFReflTransFlags,
    ) -> Option<BSDFSample> {
        match self {
            BxDF::Dielectric(bxdf) => bxdf.sample_f(wo, uc, u, mode, sample_flags),
        }
    }

    pub fn pdf(&self, wo: Vec3f, wi: Vec3f, mode: TransportMode, sample_flags: BxDFReflTransFlags) -> Float {
        match self {
            BxDF::Dielectric(bxdf) => bxdf.pdf(wo, wi, mode, sample_flags),
        }
    }
}
