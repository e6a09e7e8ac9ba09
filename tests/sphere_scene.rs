use approx::assert_abs_diff_eq;
use bumpalo::Bump;
use photon::{Point2f, Ray, RayDifferential, Transform};
use photon::material::DielectricMaterial;
use photon::mem::MemoryManager;
use photon::primitive::GeometricPrimitive;
use photon::reflection::{BxDFFlags, BxDFReflTransFlags, TransportMode};
use photon::scene::Scene;
use photon::shapes::{ShapeFlags, Sphere, SphereParams};
use photon::spectrum::{ConstantSpectrum, SampledWavelengths};
use pretty_assertions::assert_eq;

fn glass_sphere(flags: ShapeFlags) -> anyhow::Result<(MemoryManager, Scene)> {
    let mut mem = MemoryManager::new(4096)?;
    let shape = Sphere::create_shape(&mut mem, Transform::IDENTITY, flags, SphereParams::default())?;
    let eta = ConstantSpectrum::create_spectrum(&mut mem, 1.5)?;
    let material = DielectricMaterial::create_material(&mut mem, DielectricMaterial::new(eta, 0.0, 0.0, false))?;
    let mut scene = Scene::new();
    scene.add_primitive(GeometricPrimitive::create_primitive(&mut mem, shape, material)?);
    scene.prepare(&mut mem)?;
    Ok((mem, scene))
}

#[test]
fn ray_through_two_known_points() -> anyhow::Result<()> {
    let (mem, scene) = glass_sphere(ShapeFlags::empty())?;
    let view = scene.view(&mem)?;

    // enters at (0, 0.6, 0.8) and leaves at (0, 0.6, -0.8)
    let ray = Ray::new(photon::point3f!(0, 0.6, 5), photon::vec3f!(0, 0, -1));
    let first = view.intersect(&ray).expect("front hit");
    assert_abs_diff_eq!(first.t_hit, 4.2, epsilon = 1.0e-4);
    assert_abs_diff_eq!(first.interaction.hit.p, photon::point3f!(0, 0.6, 0.8), epsilon = 1.0e-4);

    let inside = Ray::new(photon::point3f!(0, 0.6, 0), photon::vec3f!(0, 0, -1));
    let second = view.intersect(&inside).expect("back hit");
    assert_abs_diff_eq!(second.t_hit, 0.8, epsilon = 1.0e-4);

    // nothing hidden between calls
    let again = view.intersect(&ray).expect("front hit");
    assert_eq!(first.t_hit, again.t_hit);
    assert_eq!(first.interaction.hit, again.interaction.hit);
    Ok(())
}

#[test]
fn hit_exactly_at_t_max_counts() -> anyhow::Result<()> {
    let (mem, scene) = glass_sphere(ShapeFlags::empty())?;
    let view = scene.view(&mem)?;

    let to_surface = Ray::with_t_max(photon::point3f!(0, 0, 5), photon::vec3f!(0, 0, -1), 4.0);
    assert!(view.intersect_p(&to_surface));
    let hit = view.intersect(&to_surface).expect("hit at t_max");
    assert_abs_diff_eq!(hit.t_hit, 4.0, epsilon = 1.0e-4);

    let short = Ray::with_t_max(photon::point3f!(0, 0, 5), photon::vec3f!(0, 0, -1), 3.99);
    assert!(!view.intersect_p(&short));
    assert!(view.intersect(&short).is_none());
    Ok(())
}

#[test]
fn reverse_orientation_points_normals_inward() -> anyhow::Result<()> {
    let ray = Ray::new(photon::point3f!(0, 0, 5), photon::vec3f!(0, 0, -1));

    let (mem, scene) = glass_sphere(ShapeFlags::empty())?;
    let n = scene.view(&mem)?.intersect(&ray).expect("hit").interaction.n();
    assert_abs_diff_eq!(n.0, photon::vec3f!(0, 0, 1), epsilon = 1.0e-5);

    let (mem, scene) = glass_sphere(ShapeFlags::REVERSE_ORIENTATION)?;
    let n = scene.view(&mem)?.intersect(&ray).expect("hit").interaction.n();
    assert_abs_diff_eq!(n.0, photon::vec3f!(0, 0, -1), epsilon = 1.0e-5);
    Ok(())
}

#[test]
fn smooth_glass_mirror_sample_at_normal_incidence() -> anyhow::Result<()> {
    let (mem, scene) = glass_sphere(ShapeFlags::empty())?;
    let view = scene.view(&mem)?;
    let ray = RayDifferential::from(Ray::new(photon::point3f!(0, 0, 5), photon::vec3f!(0, 0, -1)));

    let mut si = view.intersect(&ray.ray).expect("hit").interaction;
    let mut lambda = SampledWavelengths::sample_uniform(0.5);
    let arena = Bump::new();
    let bsdf = si.bsdf(&ray, &mut lambda, view.memory(), &arena).expect("glass has a bsdf");
    let u = Point2f::new(0.5, 0.5);

    let bs = bsdf.sample_f(si.wo, 0.5, u, TransportMode::Radiance, BxDFReflTransFlags::REFLECTION).expect("reflection");
    assert_abs_diff_eq!(bs.wi, photon::vec3f!(0, 0, 1), epsilon = 1.0e-5);
    assert_eq!(bs.flags, BxDFFlags::SPECULAR_REFLECTION);
    assert_abs_diff_eq!(bs.pdf, 1.0, epsilon = 1.0e-6);
    assert_abs_diff_eq!(bs.f[0] * bs.wi.z.abs(), 0.04, epsilon = 1.0e-4);

    let bs = bsdf.sample_f(si.wo, 0.01, u, TransportMode::Radiance, BxDFReflTransFlags::ALL).expect("reflection");
    assert!(bs.is_reflection());
    assert_abs_diff_eq!(bs.pdf, 0.04, epsilon = 1.0e-4);

    let bs = bsdf.sample_f(si.wo, 0.5, u, TransportMode::Radiance, BxDFReflTransFlags::ALL).expect("transmission");
    assert!(bs.is_transmission());
    assert_abs_diff_eq!(bs.wi, photon::vec3f!(0, 0, -1), epsilon = 1.0e-5);
    assert_eq!(bs.eta, 1.5);
    Ok(())
}
