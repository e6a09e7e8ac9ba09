use crate::{Bounds3f, Float, Ray};
use crate::error::{Error, Result};
use crate::material::Material;
use crate::mem::{relocate_child, MemPtr, MemoryManager, MemoryView, Relocate, StackAllocator};
use crate::shapes::{Shape, ShapeIntersection};
use bytemuck::{Pod, Zeroable};
use std::convert::TryFrom;

tagged_kind! {
    pub enum PrimitiveType {
        Geometric = 0,
        Custom = 1,
    }
}

/// Arena handle to something that can be hit and shaded.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Primitive {
    data_ptr: MemPtr,
    kind: u32,
    _pad: u32,
}

/// A shape paired with the material it is shaded with.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub struct GeometricPrimitive {
    pub shape: Shape,
    pub material: Material,
}

impl_relocate!(GeometricPrimitive { shape, material } plain {});

impl GeometricPrimitive {
    pub fn create_primitive(mem: &mut MemoryManager, shape: Shape, material: Material) -> Result<Primitive> {
        let prim = GeometricPrimitive { shape, material };
        prim.validate(mem.host_view())?;
        let ptr = mem.allocate(prim)?;
        Ok(Primitive::new(ptr, PrimitiveType::Geometric))
    }

    pub fn world_bound(&self) -> Bounds3f {
        self.shape.world_bound()
    }

    pub fn intersect(&self, ray: &Ray, t_max: Float, mem: MemoryView) -> Result<Option<ShapeIntersection>> {
        let mut isect = self.shape.intersect(ray, t_max, mem)?;
        if let Some(isect) = isect.as_mut() {
            isect.interaction.material = self.material;
        }
        Ok(isect)
    }

    pub fn intersect_p(&self, ray: &Ray, t_max: Float, mem: MemoryView) -> Result<bool> {
        self.shape.intersect_p(ray, t_max, mem)
    }

    pub fn validate(&self, mem: MemoryView) -> Result<()> {
        self.shape.validate(mem)?;
        self.material.validate(mem)
    }
}

impl Primitive {
    fn new(data_ptr: MemPtr, kind: PrimitiveType) -> Self {
        Self { data_ptr, kind: kind.tag(), _pad: 0 }
    }

    pub fn kind(&self) -> Result<PrimitiveType> {
        PrimitiveType::try_from(self.kind)
    }

    pub fn data_ptr(&self) -> MemPtr {
        self.data_ptr
    }

    pub fn world_bound(&self, mem: MemoryView) -> Result<Bounds3f> {
        match self.kind()? {
            PrimitiveType::Geometric => Ok(self.data_ptr.get::<GeometricPrimitive>(mem)?.world_bound()),
            kind @ PrimitiveType::Custom => Err(Error::unsupported(kind)),
        }
    }

    pub fn intersect(&self, ray: &Ray, t_max: Float, mem: MemoryView) -> Result<Option<ShapeIntersection>> {
        match self.kind()? {
            PrimitiveType::Geometric => self.data_ptr.get::<GeometricPrimitive>(mem)?.intersect(ray, t_max, mem),
            kind @ PrimitiveType::Custom => Err(Error::unsupported(kind)),
        }
    }

    pub fn intersect_p(&self, ray: &Ray, t_max: Float, mem: MemoryView) -> Result<bool> {
        match self.kind()? {
            PrimitiveType::Geometric => self.data_ptr.get::<GeometricPrimitive>(mem)?.intersect_p(ray, t_max, mem),
            kind @ PrimitiveType::Custom => Err(Error::unsupported(kind)),
        }
    }

    pub fn validate(&self, mem: MemoryView) -> Result<()> {
        match self.kind()? {
            PrimitiveType::Geometric => self.data_ptr.get::<GeometricPrimitive>(mem)?.validate(mem),
            kind @ PrimitiveType::Custom => Err(Error::unsupported(kind)),
        }
    }
}

impl Relocate for Primitive {
    fn relocate(&mut self, region: &mut StackAllocator) -> Result<()> {
        match self.kind()? {
            PrimitiveType::Geometric => relocate_child::<GeometricPrimitive>(&mut self.data_ptr, region),
            kind @ PrimitiveType::Custom => Err(Error::unsupported(kind)),
        }
    }
}
