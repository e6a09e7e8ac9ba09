use criterion::{Criterion, criterion_main, criterion_group, Throughput, BenchmarkId};
use photon::{Float, Ray, Transform, Vec3f, Point3f};
use photon::material::Material;
use photon::mem::MemoryManager;
use photon::primitive::GeometricPrimitive;
use photon::scene::Scene;
use photon::shapes::{ShapeFlags, Sphere, SphereParams};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

fn random_spheres(n: usize, mem: &mut MemoryManager) -> Scene {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(n as u64);
    let mut scene = Scene::new();
    for _ in 0..n {
        let center = Vec3f::new(rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0));
        let params = SphereParams { radius: rng.gen_range(0.1..1.0), ..SphereParams::default() };
        let shape = Sphere::create_shape(mem, Transform::translate(center), ShapeFlags::empty(), params).unwrap();
        scene.add_primitive(GeometricPrimitive::create_primitive(mem, shape, Material::NULL).unwrap());
    }
    scene
}

fn bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("ListAggregate");
    group.throughput(Throughput::Elements(1));

    for n in [16usize, 128, 1024] {
        let mut mem = MemoryManager::new(n * 512).unwrap();
        let mut scene = random_spheres(n, &mut mem);
        scene.prepare(&mut mem).unwrap();
        let view = scene.view(&mem).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);

        group.bench_with_input(BenchmarkId::new("intersect", n), &n, |b, _| {
            b.iter(|| {
                let target = Point3f::new(rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0), 0.0);
                let origin = Point3f::new(0.0, 0.0, 30.0);
                view.intersect(&Ray::new(origin, target - origin))
            })
        });

        group.bench_with_input(BenchmarkId::new("intersect_p", n), &n, |b, _| {
            b.iter(|| {
                let dir = Vec3f::new(rng.gen::<Float>() - 0.5, rng.gen::<Float>() - 0.5, -1.0);
                view.intersect_p(&Ray::new(Point3f::new(0.0, 0.0, 30.0), dir))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench);
criterion_main!(benches);
