use crate::{Vec3f, Float, Point2f, Normal3, abs_dot, faceforward};
use crate::fresnel::fr_dielectric;
use crate::reflection::{
    BSDFSample, BxDFFlags, BxDFReflTransFlags, TransportMode, MicrofacetDistribution,
    TrowbridgeReitzDistribution, abs_cos_theta, cos_theta, reflect, refract, same_hemisphere,
};
use crate::spectrum::SampledSpectrum;
use cgmath::InnerSpace;

/// Interface between two dielectrics, e.g. air and glass. Smooth interfaces scatter into a
/// single mirror or refracted direction; rough ones go through the microfacet model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DielectricBxDF {
    eta: Float,
    mf_distrib: TrowbridgeReitzDistribution,
}

/// Generalized half vector for the pair, with the relative index it was built with. `None` when
/// the configuration is degenerate or the microfacet faces away from either direction.
fn half_vector(wo: Vec3f, wi: Vec3f, eta: Float) -> Option<(Vec3f, Float, bool)> {
    let cos_theta_o = cos_theta(wo);
    let cos_theta_i = cos_theta(wi);
    let reflect = cos_theta_i * cos_theta_o > 0.0;
    let etap = if reflect {
        1.0
    } else if cos_theta_o > 0.0 {
        eta
    } else {
        1.0 / eta
    };

    let wm = wi * etap + wo;
    if cos_theta_i == 0.0 || cos_theta_o == 0.0 || wm.magnitude2() == 0.0 {
        return None;
    }
    let wm = faceforward(wm.normalize(), Vec3f::unit_z());

    // discard backfacing microfacets
    if wm.dot(wi) * cos_theta_i < 0.0 || wm.dot(wo) * cos_theta_o < 0.0 {
        return None;
    }
    Some((wm, etap, reflect))
}

/// Reflection and transmission probabilities restricted to the lobes the caller allows.
fn lobe_probabilities(r: Float, sample_flags: BxDFReflTransFlags) -> Option<(Float, Float)> {
    let pr = if sample_flags.contains(BxDFReflTransFlags::REFLECTION) { r } else { 0.0 };
    let pt = if sample_flags.contains(BxDFReflTransFlags::TRANSMISSION) { 1.0 - r } else { 0.0 };
    if pr == 0.0 && pt == 0.0 {
        None
    } else {
        Some((pr, pt))
    }
}

impl DielectricBxDF {
    pub fn new(eta: Float, mf_distrib: TrowbridgeReitzDistribution) -> Self {
        Self { eta, mf_distrib }
    }

    pub fn eta(&self) -> Float {
        self.eta
    }

    pub fn distribution(&self) -> &TrowbridgeReitzDistribution {
        &self.mf_distrib
    }

    /// No index contrast or no roughness: the interface scatters into discrete directions only.
    fn is_specular(&self) -> bool {
        self.eta == 1.0 || self.mf_distrib.effectively_smooth()
    }

    pub fn flags(&self) -> BxDFFlags {
        let flags = if self.eta == 1.0 {
            BxDFFlags::TRANSMISSION
        } else {
            BxDFFlags::REFLECTION | BxDFFlags::TRANSMISSION
        };
        flags | if self.mf_distrib.effectively_smooth() { BxDFFlags::SPECULAR } else { BxDFFlags::GLOSSY }
    }

    pub fn regularize(&mut self) {
        self.mf_distrib.regularize();
    }

    pub fn f(&self, wo: Vec3f, wi: Vec3f, mode: TransportMode) -> SampledSpectrum {
        if self.is_specular() {
            return SampledSpectrum::uniform(0.0);
        }
        let (wm, etap, reflect) = match half_vector(wo, wi, self.eta) {
            Some(h) => h,
            None => return SampledSpectrum::uniform(0.0),
        };

        let cos_theta_o = cos_theta(wo);
        let cos_theta_i = cos_theta(wi);
        let fr = fr_dielectric(wo.dot(wm), self.eta);
        let d = self.mf_distrib.d(wm);
        let g = self.mf_distrib.g(wo, wi);
        if reflect {
            SampledSpectrum::uniform(d * g * fr / Float::abs(4.0 * cos_theta_i * cos_theta_o))
        } else {
            let denom = sq!(wi.dot(wm) + wo.dot(wm) / etap) * cos_theta_i * cos_theta_o;
            let mut ft = d * (1.0 - fr) * g * Float::abs(wi.dot(wm) * wo.dot(wm) / denom);
            if mode == TransportMode::Radiance {
                ft /= sq!(etap);
            }
            SampledSpectrum::uniform(ft)
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
        if self.is_specular() {
            self.sample_specular(wo, uc, mode, sample_flags)
        } else {
            self.sample_rough(wo, uc, u, mode, sample_flags)
        }
    }

    fn sample_specular(
        &self,
        wo: Vec3f,
        uc: Float,
        mode: TransportMode,
        sample_flags: BxDFReflTransFlags,
    ) -> Option<BSDFSample> {
        let r = fr_dielectric(cos_theta(wo), self.eta);
        let (pr, pt) = lobe_probabilities(r, sample_flags)?;

        if uc < pr / (pr + pt) {
            let wi = Vec3f::new(-wo.x, -wo.y, wo.z);
            let fr = SampledSpectrum::uniform(r / abs_cos_theta(wi));
            Some(BSDFSample::new(fr, wi, pr / (pr + pt), BxDFFlags::SPECULAR_REFLECTION))
        } else {
            let (wi, etap) = refract(wo, Normal3::new(0.0, 0.0, 1.0), self.eta)?;
            let mut ft = (1.0 - r) / abs_cos_theta(wi);
            if mode == TransportMode::Radiance {
                ft /= sq!(etap);
            }
            Some(BSDFSample::new(SampledSpectrum::uniform(ft), wi, pt / (pr + pt), BxDFFlags::SPECULAR_TRANSMISSION)
                .with_eta(etap))
        }
    }

    fn sample_rough(
        &self,
        wo: Vec3f,
        uc: Float,
        u: Point2f,
        mode: TransportMode,
        sample_flags: BxDFReflTransFlags,
    ) -> Option<BSDFSample> {
        let wm = self.mf_distrib.sample_wm(wo, u);
        let r = fr_dielectric(wo.dot(wm), self.eta);
        let (pr, pt) = lobe_probabilities(r, sample_flags)?;

        if uc < pr / (pr + pt) {
            let wi = reflect(wo, wm);
            if !same_hemisphere(wo, wi) {
                return None;
            }
            let pdf = self.mf_distrib.pdf(wo, wm) / (4.0 * abs_dot(wo, wm)) * pr / (pr + pt);
            let f = self.mf_distrib.d(wm) * self.mf_distrib.g(wo, wi) * r
                / (4.0 * cos_theta(wi) * cos_theta(wo));
            Some(BSDFSample::new(SampledSpectrum::uniform(f), wi, pdf, BxDFFlags::GLOSSY_REFLECTION))
        } else {
            let (wi, etap) = refract(wo, Normal3(wm), self.eta)?;
            if same_hemisphere(wo, wi) || wi.z == 0.0 {
                return None;
            }
            let denom = sq!(wi.dot(wm) + wo.dot(wm) / etap);
            let dwm_dwi = abs_dot(wi, wm) / denom;
            let pdf = self.mf_distrib.pdf(wo, wm) * dwm_dwi * pt / (pr + pt);

            let mut ft = (1.0 - r) * self.mf_distrib.d(wm) * self.mf_distrib.g(wo, wi)
                * Float::abs(wi.dot(wm) * wo.dot(wm) / (cos_theta(wi) * cos_theta(wo) * denom));
            if mode == TransportMode::Radiance {
                ft /= sq!(etap);
            }
            Some(BSDFSample::new(SampledSpectrum::uniform(ft), wi, pdf, BxDFFlags::GLOSSY_TRANSMISSION)
                .with_eta(etap))
        }
    }

    pub fn pdf(&self, wo: Vec3f, wi: Vec3f, _mode: TransportMode, sample_flags: BxDFReflTransFlags) -> Float {
        if self.is_specular() {
            return 0.0;
        }
        let (wm, etap, reflect) = match half_vector(wo, wi, self.eta) {
            Some(h) => h,
            None => return 0.0,
        };

        let r = fr_dielectric(wo.dot(wm), self.eta);
        let (pr, pt) = match lobe_probabilities(r, sample_flags) {
            Some(p) => p,
            None => return 0.0,
        };

        if reflect {
            self.mf_distrib.pdf(wo, wm) / (4.0 * abs_dot(wo, wm)) * pr / (pr + pt)
        } else {
            let denom = sq!(wi.dot(wm) + wo.dot(wm) / etap);
            let dwm_dwi = abs_dot(wi, wm) / denom;
            self.mf_distrib.pdf(wo, wm) * dwm_dwi * pt / (pr + pt)
        }
    }
}
