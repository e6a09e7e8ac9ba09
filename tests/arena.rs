use photon::{ResultCode, Transform};
use photon::mem::{MemoryKind, MemoryManager, Relocate, StackAllocator};
use photon::material::{DielectricMaterial, Material};
use photon::primitive::{GeometricPrimitive, Primitive};
use photon::shapes::{Sphere, ShapeFlags, SphereParams};
use photon::spectrum::ConstantSpectrum;
use photon::consts::TWO_PI;

#[test]
fn allocate_until_exhausted() -> anyhow::Result<()> {
    let mut mem = MemoryManager::default();
    mem.init(1024)?;

    let ptr = mem.allocate(Sphere::new(1.0, -1.0, 1.0, TWO_PI))?;
    assert_eq!(mem.get::<Sphere>(ptr)?.radius(), 1.0);
    assert_eq!(mem.available_size(), 1024 - std::mem::size_of::<Sphere>());

    let too_big = mem.allocate([0u64; 128]);
    assert_eq!(ResultCode::of(&too_big), ResultCode::BadAllocation);
    // a failed allocation leaves the arena untouched
    assert_eq!(mem.get::<Sphere>(ptr)?.radius(), 1.0);
    Ok(())
}

#[test]
fn handles_do_not_outlive_their_region() -> anyhow::Result<()> {
    let mut region = StackAllocator::new(256, MemoryKind::Host)?;
    let marker = region.marker();
    let ptr = region.allocate(Sphere::unit_sphere())?;
    region.release_to(marker)?;
    assert_eq!(region.get::<Sphere>(ptr).unwrap_err().code(), ResultCode::OutOfBounds);

    let other = StackAllocator::new(256, MemoryKind::Host)?;
    assert_eq!(other.get::<Sphere>(ptr).unwrap_err().code(), ResultCode::BadOperation);

    let mut mem = MemoryManager::new(256)?;
    let ptr = mem.allocate(7u32)?;
    mem.init(256)?;
    assert!(mem.get::<u32>(ptr).is_err());
    Ok(())
}

#[test]
fn nested_handles_are_repatched_on_the_device() -> anyhow::Result<()> {
    let mut mem = MemoryManager::new(4096)?;
    let shape = Sphere::create_shape(&mut mem, Transform::IDENTITY, ShapeFlags::empty(), SphereParams { radius: 2.0, ..SphereParams::default() })?;
    let eta = ConstantSpectrum::create_spectrum(&mut mem, 1.33)?;
    let material = DielectricMaterial::create_material(&mut mem, DielectricMaterial::new(eta, 0.1, 0.1, false))?;
    let prim = GeometricPrimitive::create_primitive(&mut mem, shape, material)?;
    mem.send_to_gpu()?;

    // before relocation the copy still names host memory
    let device_view = mem.device_view()?;
    assert_eq!(prim.validate(device_view).unwrap_err().code(), ResultCode::BadOperation);

    let mut moved: Primitive = prim;
    moved.relocate(mem.device_mut()?)?;
    let device_view = mem.device_view()?;
    moved.validate(device_view)?;

    let record = moved.data_ptr().get::<GeometricPrimitive>(device_view)?;
    assert_eq!(record.shape.data_ptr().get::<Sphere>(device_view)?.radius(), 2.0);
    assert_ne!(record.material, Material::NULL);
    assert_eq!(record.shape.data_ptr().region(), device_view.region());

    // the host side is untouched
    prim.validate(mem.host_view())?;
    Ok(())
}
