use crate::Vec3f;
use crate::Float;
use crate::error::{Error, Result};
use crate::interaction::SurfaceHit;
use crate::mem::{relocate_child, MemPtr, MemoryView, Relocate, StackAllocator};
use crate::scene::SceneView;
use crate::spectrum::{SampledSpectrum, SampledWavelengths};
use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use std::convert::TryFrom;

pub mod point;

pub use point::PointLight;

tagged_kind! {
    pub enum LightType {
        Point = 0,
        Custom = 1,
    }
}

bitflags! {
    pub struct LightFlags: u32 {
        const DELTA_POSITION = 1;
        const DELTA_DIRECTION = 1 << 1;
        const AREA = 1 << 2;
        const INFINITE = 1 << 3;
    }
}

impl LightFlags {
    pub fn is_delta_light(self) -> bool {
        self.intersects(LightFlags::DELTA_POSITION | LightFlags::DELTA_DIRECTION)
    }
}

pub struct LightLiSample {
    pub radiance: SampledSpectrum,

    /// The direction *towards* the illumination
    pub wi: Vec3f,

    pub pdf: Float,

    pub vis: VisibilityTester,
}

/// Two points whose mutual visibility decides whether a light sample contributes.
#[derive(Clone, Copy, Debug)]
pub struct VisibilityTester {
    pub p0: SurfaceHit,
    pub p1: SurfaceHit,
}

impl VisibilityTester {
    pub fn unoccluded(&self, scene: SceneView) -> bool {
        !scene.intersect_p(&self.p0.spawn_ray_to_hit(&self.p1))
    }
}

/// Arena handle to a light source.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Light {
    data_ptr: MemPtr,
    kind: u32,
    flags: u32,
}

impl Light {
    fn new(data_ptr: MemPtr, kind: LightType, flags: LightFlags) -> Self {
        Self { data_ptr, kind: kind.tag(), flags: flags.bits() }
    }

    pub fn kind(&self) -> Result<LightType> {
        LightType::try_from(self.kind)
    }

    pub fn flags(&self) -> LightFlags {
        LightFlags::from_bits_truncate(self.flags)
    }

    /// Sample the light's contribution at `ctx`. `None` when it can't reach it at all.
    pub fn sample_li(
        &self,
        ctx: &SurfaceHit,
        lambda: &SampledWavelengths,
        mem: MemoryView,
    ) -> Result<Option<LightLiSample>> {
        match self.kind()? {
            LightType::Point => self.data_ptr.get::<PointLight>(mem)?.sample_li(ctx, lambda, mem),
            kind @ LightType::Custom => Err(Error::unsupported(kind)),
        }
    }

    pub fn validate(&self, mem: MemoryView) -> Result<()> {
        match self.kind()? {
            LightType::Point => self.data_ptr.get::<PointLight>(mem)?.validate(mem),
            kind @ LightType::Custom => Err(Error::unsupported(kind)),
        }
    }
}

impl Relocate for Light {
    fn relocate(&mut self, region: &mut StackAllocator) -> Result<()> {
        match self.kind()? {
            LightType::Point => relocate_child::<PointLight>(&mut self.data_ptr, region),
            kind @ LightType::Custom => Err(Error::unsupported(kind)),
        }
    }
}
