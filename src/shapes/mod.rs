use crate::{Bounds3f, Float, Point3f, Ray, Transform, Transformable};
use crate::error::{Error, Result};
use crate::interaction::SurfaceInteraction;
use crate::mem::{relocate_child, MemPtr, MemoryView, Relocate, StackAllocator};
use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use std::convert::TryFrom;

pub mod sphere;

pub use sphere::{Sphere, SphereParams};

tagged_kind! {
    pub enum ShapeType {
        Sphere = 0,
        Mesh = 1,
        Custom = 2,
    }
}

bitflags! {
    pub struct ShapeFlags: u32 {
        /// Surface normals point inward.
        const REVERSE_ORIENTATION = 0b01;
        /// Set from the object-to-world transform when it is built.
        const TRANSFORM_SWAP_HANDEDNESS = 0b10;
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ShapeIntersection {
    pub interaction: SurfaceInteraction,
    pub t_hit: Float,
}

/// Object-space result of a quadric root search, before any differential geometry is built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadricIntersection {
    pub t_hit: Float,
    pub p_obj: Point3f,
    pub phi: Float,
}

/// Arena handle to a concrete shape, with its placement in the world.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub struct Shape {
    pub o2w: Transform,
    pub w2o: Transform,
    bounds: Bounds3f,
    data_ptr: MemPtr,
    kind: u32,
    flags: u32,
}

impl Shape {
    pub fn new(o2w: Transform, kind: ShapeType, data_ptr: MemPtr, object_bound: Bounds3f, mut flags: ShapeFlags) -> Self {
        flags.set(ShapeFlags::TRANSFORM_SWAP_HANDEDNESS, o2w.swaps_handedness());
        Self {
            o2w,
            w2o: o2w.inverse(),
            bounds: object_bound.transform(o2w),
            data_ptr,
            kind: kind.tag(),
            flags: flags.bits(),
        }
    }

    /// Move the shape, keeping its object-space extent.
    pub fn with_transform(self, o2w: Transform) -> Self {
        let object_bound = self.bounds.transform(self.w2o);
        let mut flags = self.flags();
        flags.set(ShapeFlags::TRANSFORM_SWAP_HANDEDNESS, o2w.swaps_handedness());
        Self {
            o2w,
            w2o: o2w.inverse(),
            bounds: object_bound.transform(o2w),
            flags: flags.bits(),
            ..self
        }
    }

    pub fn kind(&self) -> Result<ShapeType> {
        ShapeType::try_from(self.kind)
    }

    pub fn flags(&self) -> ShapeFlags {
        ShapeFlags::from_bits_truncate(self.flags)
    }

    pub fn data_ptr(&self) -> MemPtr {
        self.data_ptr
    }

    pub fn reverse_orientation(&self) -> bool {
        self.flags().contains(ShapeFlags::REVERSE_ORIENTATION)
    }

    pub fn transform_swaps_handedness(&self) -> bool {
        self.flags().contains(ShapeFlags::TRANSFORM_SWAP_HANDEDNESS)
    }

    /// Whether normals computed from the parametrization must be flipped. Each of the two
    /// conditions reverses orientation on its own, so both together cancel out.
    pub fn flips_normal(&self) -> bool {
        self.reverse_orientation() ^ self.transform_swaps_handedness()
    }

    pub fn world_bound(&self) -> Bounds3f {
        self.bounds
    }

    pub fn intersect(&self, ray: &Ray, t_max: Float, mem: MemoryView) -> Result<Option<ShapeIntersection>> {
        match self.kind()? {
            ShapeType::Sphere => Ok(self.data_ptr.get::<Sphere>(mem)?.intersect(self, ray, t_max)),
            kind @ (ShapeType::Mesh | ShapeType::Custom) => Err(Error::unsupported(kind)),
        }
    }

    pub fn intersect_p(&self, ray: &Ray, t_max: Float, mem: MemoryView) -> Result<bool> {
        match self.kind()? {
            ShapeType::Sphere => Ok(self.data_ptr.get::<Sphere>(mem)?.intersect_p(self, ray, t_max)),
            kind @ (ShapeType::Mesh | ShapeType::Custom) => Err(Error::unsupported(kind)),
        }
    }

    pub fn surface_area(&self, mem: MemoryView) -> Result<Float> {
        match self.kind()? {
            ShapeType::Sphere => Ok(self.data_ptr.get::<Sphere>(mem)?.surface_area()),
            kind @ (ShapeType::Mesh | ShapeType::Custom) => Err(Error::unsupported(kind)),
        }
    }

    /// Resolve the geometry behind the handle, failing if it can't be read from `mem`.
    pub fn validate(&self, mem: MemoryView) -> Result<()> {
        self.surface_area(mem).map(|_| ())
    }
}

impl Relocate for Shape {
    fn relocate(&mut self, region: &mut StackAllocator) -> Result<()> {
        match self.kind()? {
            ShapeType::Sphere => relocate_child::<Sphere>(&mut self.data_ptr, region),
            kind @ (ShapeType::Mesh | ShapeType::Custom) => Err(Error::unsupported(kind)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResultCode;
    use crate::mem::MemoryManager;
    use pretty_assertions::assert_eq;

    #[test]
    fn flags_follow_the_transform() {
        let mut mem = MemoryManager::new(1024).unwrap();
        let mirror = Transform::scale(-1.0, 1.0, 1.0);

        let plain = Sphere::create_shape(&mut mem, Transform::IDENTITY, ShapeFlags::empty(), SphereParams::default()).unwrap();
        let mirrored = Sphere::create_shape(&mut mem, mirror, ShapeFlags::empty(), SphereParams::default()).unwrap();
        let both = Sphere::create_shape(&mut mem, mirror, ShapeFlags::REVERSE_ORIENTATION, SphereParams::default()).unwrap();

        assert_eq!(plain.flags(), ShapeFlags::empty());
        assert_eq!(mirrored.flags(), ShapeFlags::TRANSFORM_SWAP_HANDEDNESS);
        assert!(!plain.flips_normal());
        assert!(mirrored.flips_normal());
        assert!(!both.flips_normal());
    }

    #[test]
    fn world_bound_is_transformed() {
        let mut mem = MemoryManager::new(1024).unwrap();
        let shape = Sphere::create_shape(
            &mut mem, Transform::translate(vec3f!(0, 0, 5)), ShapeFlags::empty(), SphereParams::default()
        ).unwrap();
        assert_eq!(shape.world_bound(), bounds3f!((-1, -1, 4), (1, 1, 6)));

        let moved = shape.with_transform(Transform::IDENTITY);
        assert_eq!(moved.world_bound(), bounds3f!((-1, -1, -1), (1, 1, 1)));
    }

    #[test]
    fn unsupported_kinds_are_reported() {
        let mut mem = MemoryManager::new(1024).unwrap();
        let ptr = mem.allocate(Sphere::unit_sphere()).unwrap();
        let mut region = StackAllocator::new(0, crate::mem::MemoryKind::Device).unwrap();
        let ray = Ray::new(point3f!(0, 0, 5), vec3f!(0, 0, -1));

        let mut mesh = Shape::new(Transform::IDENTITY, ShapeType::Mesh, ptr, Bounds3f::empty(), ShapeFlags::empty());
        assert_eq!(mesh.intersect(&ray, ray.t_max, mem.host_view()).unwrap_err().code(), ResultCode::BadOperation);
        assert_eq!(mesh.relocate(&mut region).unwrap_err().code(), ResultCode::BadOperation);

        mesh.kind = 17;
        assert_eq!(mesh.validate(mem.host_view()).unwrap_err().code(), ResultCode::InvalidInput);
    }
}
