use crate::error::{Error, Result};
use crate::interaction::SurfaceInteraction;
use crate::mem::{relocate_child, MemPtr, MemoryView, Relocate, StackAllocator};
use crate::reflection::{Bsdf, BxDF};
use crate::spectrum::SampledWavelengths;
use bumpalo::Bump;
use bytemuck::{Pod, Zeroable};
use std::convert::TryFrom;

pub mod dielectric;

pub use dielectric::DielectricMaterial;

tagged_kind! {
    pub enum MaterialType {
        Dielectric = 0,
        Custom = 1,
    }
}

/// Arena handle to a material. Surfaces without one are simply not shaded.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Material {
    data_ptr: MemPtr,
    kind: u32,
    _pad: u32,
}

impl Material {
    pub const NULL: Material = Material { data_ptr: MemPtr::NULL, kind: 0, _pad: 0 };

    fn new(data_ptr: MemPtr, kind: MaterialType) -> Self {
        Self { data_ptr, kind: kind.tag(), _pad: 0 }
    }

    pub fn is_null(&self) -> bool {
        self.data_ptr.is_null()
    }

    pub fn kind(&self) -> Result<MaterialType> {
        MaterialType::try_from(self.kind)
    }

    /// Build the scattering function at `si`, placing it in `arena`.
    pub fn get_bsdf<'a>(
        &self,
        si: &SurfaceInteraction,
        lambda: &mut SampledWavelengths,
        mem: MemoryView,
        arena: &'a Bump,
    ) -> Result<Bsdf<'a>> {
        match self.kind()? {
            MaterialType::Dielectric => {
                let material = self.data_ptr.get::<DielectricMaterial>(mem)?;
                let bxdf = arena.alloc(material.bxdf(lambda, mem)?);
                Ok(Bsdf::new(si, BxDF::Dielectric(bxdf)))
            }
            kind @ MaterialType::Custom => Err(Error::unsupported(kind)),
        }
    }

    /// Resolve the material and everything it refers to against `mem`. Null is valid.
    pub fn validate(&self, mem: MemoryView) -> Result<()> {
        if self.is_null() {
            return Ok(());
        }
        match self.kind()? {
            MaterialType::Dielectric => self.data_ptr.get::<DielectricMaterial>(mem)?.validate(mem),
            kind @ MaterialType::Custom => Err(Error::unsupported(kind)),
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::NULL
    }
}

impl Relocate for Material {
    fn relocate(&mut self, region: &mut StackAllocator) -> Result<()> {
        if self.is_null() {
            return Ok(());
        }
        match self.kind()? {
            MaterialType::Dielectric => relocate_child::<DielectricMaterial>(&mut self.data_ptr, region),
            kind @ MaterialType::Custom => Err(Error::unsupported(kind)),
        }
    }
}
