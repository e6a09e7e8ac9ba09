//! Builds a row of glass spheres lit by a point light, prepares it and shoots one ray per pixel
//! through the device view, shading each hit with a single BSDF and light sample.

use bumpalo::Bump;
use clap::Parser;
use photon::{Float, Point2f, Ray, RayDifferential, Transform, Vec3f};
use photon::light::PointLight;
use photon::material::DielectricMaterial;
use photon::mem::{MemoryManager, DEFAULT_ARENA_SIZE};
use photon::primitive::GeometricPrimitive;
use photon::reflection::{BxDFReflTransFlags, TransportMode};
use photon::scene::{Scene, SceneView};
use photon::shapes::{ShapeFlags, Sphere, SphereParams};
use photon::spectrum::{ConstantSpectrum, SampledWavelengths};
use cgmath::InnerSpace;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "probe")]
#[command(about = "Intersect and shade a procedural sphere scene", long_about = None)]
struct Args {
    /// Size of the host arena in bytes
    #[arg(long, default_value_t = DEFAULT_ARENA_SIZE)]
    arena_size: usize,

    #[arg(long, default_value_t = 8)]
    spheres: usize,

    #[arg(long, default_value_t = 64)]
    width: usize,

    #[arg(long, default_value_t = 48)]
    height: usize,

    #[arg(long, default_value_t = 0.0)]
    roughness: Float,

    #[arg(long, default_value_t = 1.5)]
    eta: Float,

    #[arg(long, default_value_t = 1)]
    seed: u64,
}

fn build_scene(args: &Args, mem: &mut MemoryManager) -> anyhow::Result<Scene> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(args.seed);
    let mut scene = Scene::new();

    let eta = ConstantSpectrum::create_spectrum(mem, args.eta)?;
    let material = DielectricMaterial::create_material(
        mem, DielectricMaterial::new(eta, args.roughness, args.roughness, true)
    )?;

    let n = args.spheres.max(1);
    for i in 0..n {
        let x = -5.0 + 10.0 * (i as Float + 0.5) / n as Float;
        let radius = rng.gen_range(0.3..0.8);
        let o2w = Transform::translate(Vec3f::new(x, 0.0, rng.gen_range(-1.0..1.0)));
        let shape = Sphere::create_shape(mem, o2w, ShapeFlags::empty(), SphereParams { radius, ..SphereParams::default() })?;
        scene.add_primitive(GeometricPrimitive::create_primitive(mem, shape, material)?);
    }

    let intensity = ConstantSpectrum::create_spectrum(mem, 50.0)?;
    let light = PointLight::new(Transform::translate(Vec3f::new(0.0, 5.0, 5.0)), intensity, 1.0);
    scene.add_light(PointLight::create_light(mem, light)?);

    Ok(scene)
}

/// Single-sample estimate of the light reflected back along the camera ray at pixel `idx`.
fn shade(scene: SceneView, args: &Args, idx: usize, arena: &Bump) -> Option<Float> {
    let (px, py) = ((idx % args.width) as Float, (idx / args.width) as Float);
    let aspect = args.width as Float / args.height as Float;
    let sx = ((px + 0.5) / args.width as Float * 2.0 - 1.0) * aspect;
    let sy = 1.0 - (py + 0.5) / args.height as Float * 2.0;
    let origin = photon::Point3f::new(0.0, 0.0, 10.0);
    let ray = RayDifferential::from(Ray::new(origin, Vec3f::new(sx * 0.5, sy * 0.5, -1.0).normalize()));

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(args.seed ^ (idx as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15));
    let mut lambda = SampledWavelengths::sample_uniform(rng.gen());

    let isect = scene.intersect(&ray.ray)?;
    let mut si = isect.interaction;
    let bsdf = si.bsdf(&ray, &mut lambda, scene.memory(), arena)?;

    let mut l = 0.0;
    for light in scene.lights() {
        let ls = match light.sample_li(&si.hit, &lambda, scene.memory()) {
            Ok(Some(ls)) => ls,
            Ok(None) => continue,
            Err(e) => {
                tracing::error!(error = %e, "light sample failed");
                continue;
            }
        };
        let f = bsdf.f(si.wo, ls.wi, TransportMode::Radiance);
        if !f.is_black() && ls.vis.unoccluded(scene) {
            l += (f * ls.radiance).average() * ls.wi.dot(si.shading.n.0).abs() / ls.pdf;
        }
    }

    // one bounce worth of the specular lobes
    let u = Point2f::new(rng.gen(), rng.gen());
    if let Some(bs) = bsdf.sample_f(si.wo, rng.gen(), u, TransportMode::Radiance, BxDFReflTransFlags::ALL) {
        tracing::trace!(pixel = idx, wi = ?bs.wi, pdf = bs.pdf, flags = ?bs.flags, "scattered");
        l += bs.f.average() * bs.wi.dot(si.shading.n.0).abs() / bs.pdf * 0.1;
    }
    Some(l)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut mem = MemoryManager::new(args.arena_size)?;
    let mut scene = build_scene(&args, &mut mem)?;
    scene.prepare(&mut mem)?;
    mem.dump_memory();

    let view = scene.view(&mem)?;
    tracing::info!(bounds = ?view.world_bound(), "scene ready");

    let n_pixels = args.width * args.height;
    let samples: Vec<Option<Float>> = (0..n_pixels)
        .into_par_iter()
        .map_init(Bump::new, |arena, idx| {
            let l = shade(view, &args, idx, arena);
            arena.reset();
            l
        })
        .collect();

    let hits = samples.iter().filter(|s| s.is_some()).count();
    let total: Float = samples.iter().flatten().sum();
    let mean = if hits > 0 { total / hits as Float } else { 0.0 };
    tracing::info!(pixels = n_pixels, hits, mean_radiance = mean, "probe finished");
    println!("{} / {} pixels hit, mean radiance {:.5}", hits, n_pixels, mean);

    Ok(())
}
