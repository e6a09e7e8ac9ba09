use crate::Float;
use crate::error::{Error, Result};
use crate::material::{Material, MaterialType};
use crate::mem::{MemoryManager, MemoryView};
use crate::reflection::{DielectricBxDF, MicrofacetDistribution, TrowbridgeReitzDistribution};
use crate::spectrum::{SampledWavelengths, Spectrum};
use bytemuck::{Pod, Zeroable};

/// Glass-like interface. A spectrally varying `eta` disperses light, so only the first sampled
/// wavelength survives scattering off it.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct DielectricMaterial {
    pub eta: Spectrum,
    pub u_roughness: Float,
    pub v_roughness: Float,
    remap_roughness: u32,
    _pad: u32,
}

impl_relocate!(DielectricMaterial { eta } plain { u_roughness, v_roughness, remap_roughness, _pad });

impl DielectricMaterial {
    pub fn new(eta: Spectrum, u_roughness: Float, v_roughness: Float, remap_roughness: bool) -> Self {
        Self { eta, u_roughness, v_roughness, remap_roughness: remap_roughness as u32, _pad: 0 }
    }

    pub fn remap_roughness(&self) -> bool {
        self.remap_roughness != 0
    }

    pub fn create_material(mem: &mut MemoryManager, material: DielectricMaterial) -> Result<Material> {
        for r in [material.u_roughness, material.v_roughness] {
            if !(r >= 0.0 && r.is_finite()) {
                return Err(Error::InvalidInput(format!("dielectric roughness {} must be non-negative", r)));
            }
        }
        material.validate(mem.host_view())?;

        let distrib = material.distribution();
        if material.eta.is_constant() && distrib.effectively_smooth()
            && material.eta.max_value(mem.host_view())? == 1.0 {
            tracing::warn!("smooth dielectric with eta = 1 does not scatter, light passes straight through");
        }

        let ptr = mem.allocate(material)?;
        Ok(Material::new(ptr, MaterialType::Dielectric))
    }

    fn distribution(&self) -> TrowbridgeReitzDistribution {
        let (u, v) = if self.remap_roughness() {
            (
                TrowbridgeReitzDistribution::roughness_to_alpha(self.u_roughness),
                TrowbridgeReitzDistribution::roughness_to_alpha(self.v_roughness),
            )
        } else {
            (self.u_roughness, self.v_roughness)
        };
        TrowbridgeReitzDistribution::new(u, v)
    }

    pub fn validate(&self, mem: MemoryView) -> Result<()> {
        if self.eta.is_null() {
            return Err(Error::InvalidInput("dielectric material without eta".to_string()));
        }
        self.eta.max_value(mem).map(|_| ())
    }

    pub fn bxdf(&self, lambda: &mut SampledWavelengths, mem: MemoryView) -> Result<DielectricBxDF> {
        let mut eta = self.eta.eval(lambda[0], mem)?;
        if !self.eta.is_constant() {
            lambda.terminate_secondary();
        }
        // a zero index would otherwise divide by zero in the Fresnel terms
        if eta == 0.0 {
            eta = 1.0;
        }
        Ok(DielectricBxDF::new(eta, self.distribution()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResultCode;
    use crate::spectrum::{BlackbodySpectrum, ConstantSpectrum};
    use approx::assert_relative_eq;

    #[test]
    fn dispersive_eta_terminates_secondary_wavelengths() {
        let mut mem = MemoryManager::new(1024).unwrap();
        let eta = BlackbodySpectrum::create_spectrum(&mut mem, 5000.0).unwrap();
        let material = DielectricMaterial::new(eta, 0.1, 0.1, false);
        let mut lambda = SampledWavelengths::sample_uniform(0.5);
        let bxdf = material.bxdf(&mut lambda, mem.host_view()).unwrap();

        assert!(lambda.secondary_terminated());
        assert!(bxdf.eta() > 0.0 && bxdf.eta() <= 1.0);
    }

    #[test]
    fn roughness_remapping_and_zero_eta() {
        let mut mem = MemoryManager::new(1024).unwrap();
        let zero = ConstantSpectrum::create_spectrum(&mut mem, 0.0).unwrap();
        let mut lambda = SampledWavelengths::sample_uniform(0.5);

        let remapped = DielectricMaterial::new(zero, 0.25, 0.04, true).bxdf(&mut lambda, mem.host_view()).unwrap();
        assert_eq!(remapped.eta(), 1.0);
        assert_relative_eq!(remapped.distribution().alpha_x(), 0.5);
        assert_relative_eq!(remapped.distribution().alpha_y(), 0.2);
        assert!(!lambda.secondary_terminated());

        let raw = DielectricMaterial::new(zero, 0.25, 0.04, false).bxdf(&mut lambda, mem.host_view()).unwrap();
        assert_eq!(raw.distribution().alpha_x(), 0.25);
    }

    #[test]
    fn one_smooth_axis_gives_finite_scattering() {
        use crate::reflection::{BxDFReflTransFlags, TransportMode};

        let mut mem = MemoryManager::new(1024).unwrap();
        let eta = ConstantSpectrum::create_spectrum(&mut mem, 1.5).unwrap();
        let mut lambda = SampledWavelengths::sample_uniform(0.5);
        let bxdf = DielectricMaterial::new(eta, 0.0, 0.5, false).bxdf(&mut lambda, mem.host_view()).unwrap();

        let wo = vec3f!(0.3, 0.2, 0.9327379);
        let wi = vec3f!(-0.2, -0.3, 0.9327379);
        assert!(!bxdf.f(wo, wi, TransportMode::Radiance).has_nans());
        assert!(bxdf.pdf(wo, wi, TransportMode::Radiance, BxDFReflTransFlags::ALL).is_finite());
        let bs = bxdf.sample_f(wo, 0.3, crate::Point2f::new(0.4, 0.6), TransportMode::Radiance, BxDFReflTransFlags::ALL);
        assert!(bs.map_or(true, |bs| !bs.f.has_nans() && bs.pdf.is_finite()));
    }

    #[test]
    fn rejects_bad_parameters() {
        let mut mem = MemoryManager::new(1024).unwrap();
        let eta = ConstantSpectrum::create_spectrum(&mut mem, 1.5).unwrap();

        let res = DielectricMaterial::create_material(&mut mem, DielectricMaterial::new(eta, -0.1, 0.0, false));
        assert_eq!(ResultCode::of(&res), ResultCode::InvalidInput);

        let null_eta = DielectricMaterial::new(Spectrum::zeroed(), 0.0, 0.0, false);
        let res = DielectricMaterial::create_material(&mut mem, null_eta);
        assert_eq!(ResultCode::of(&res), ResultCode::InvalidInput);
    }
}
