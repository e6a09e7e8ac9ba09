use crate::{Transform, Point3f, Float};
use crate::error::{Error, Result};
use crate::interaction::SurfaceHit;
use crate::light::{Light, LightFlags, LightLiSample, LightType, VisibilityTester};
use crate::mem::{MemoryManager, MemoryView};
use crate::spectrum::{SampledWavelengths, Spectrum};
use bytemuck::{Pod, Zeroable};
use cgmath::InnerSpace;

/// Isotropic emitter at the origin of its own coordinate system.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub struct PointLight {
    pub light_to_world: Transform,
    pub world_to_light: Transform,
    pub i: Spectrum,
    pub scale: Float,
    _pad: u32,
}

impl_relocate!(PointLight { i } plain { light_to_world, world_to_light, scale, _pad });

impl PointLight {
    pub fn new(light_to_world: Transform, i: Spectrum, scale: Float) -> Self {
        Self {
            light_to_world,
            world_to_light: light_to_world.inverse(),
            i,
            scale,
            _pad: 0,
        }
    }

    pub fn create_light(mem: &mut MemoryManager, light: PointLight) -> Result<Light> {
        if !light.scale.is_finite() {
            return Err(Error::InvalidInput(format!("point light scale {} is not finite", light.scale)));
        }
        light.validate(mem.host_view())?;
        let ptr = mem.allocate(light)?;
        Ok(Light::new(ptr, LightType::Point, LightFlags::DELTA_POSITION))
    }

    pub fn position(&self) -> Point3f {
        self.light_to_world.transform(Point3f::new(0.0, 0.0, 0.0))
    }

    pub fn validate(&self, mem: MemoryView) -> Result<()> {
        if self.i.is_null() {
            return Err(Error::InvalidInput("point light without intensity".to_string()));
        }
        self.i.max_value(mem).map(|_| ())
    }

    pub fn sample_li(&self, ctx: &SurfaceHit, lambda: &SampledWavelengths, mem: MemoryView) -> Result<Option<LightLiSample>> {
        let p = self.position();
        let dist2 = (p - ctx.p).magnitude2();
        if dist2 == 0.0 {
            return Ok(None);
        }
        let wi = (p - ctx.p).normalize();
        let radiance = self.i.sample(lambda, mem)? * (self.scale / dist2);

        Ok(Some(LightLiSample {
            radiance,
            wi,
            pdf: 1.0,
            vis: VisibilityTester { p0: *ctx, p1: SurfaceHit::from_point(p, ctx.time) },
        }))
    }
}
