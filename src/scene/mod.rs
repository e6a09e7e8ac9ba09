//! Scene assembly. Objects are created in the host arena and registered here; [`Scene::prepare`]
//! then freezes everything, mirrors the arena into the device region and re-points a copy of
//! every handle at the mirror. After that, views are read-only and can be shared across threads.

use crate::{Bounds3f, Ray};
use crate::aggregate::{ListAggregate, ListAggregateView};
use crate::error::{Error, Result};
use crate::light::Light;
use crate::mem::{MemoryManager, MemoryView, RegionId, Relocate};
use crate::primitive::Primitive;
use crate::shapes::{Shape, ShapeIntersection};

/// Handles resolved against the device mirror.
struct DeviceScene {
    region: RegionId,
    shapes: Vec<Shape>,
    primitives: Vec<Primitive>,
    lights: Vec<Light>,
    aggregate: ListAggregate<Primitive>,
    shape_aggregate: ListAggregate<Shape>,
}

#[derive(Default)]
pub struct Scene {
    shapes: Vec<Shape>,
    primitives: Vec<Primitive>,
    lights: Vec<Light>,
    aggregate: Option<ListAggregate<Primitive>>,
    shape_aggregate: Option<ListAggregate<Shape>>,
    device: Option<DeviceScene>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shape without a material. Bare shapes are hit and occlude like primitives but
    /// lose ties to them.
    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn add_primitive(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Use `aggregate` to hold the primitives. A list is used when none is set.
    pub fn set_aggregate(&mut self, aggregate: ListAggregate<Primitive>) {
        self.aggregate = Some(aggregate);
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn is_prepared(&self) -> bool {
        self.device.is_some()
    }

    /// Check that every registered handle resolves in the host arena.
    pub fn validate(&self, mem: &MemoryManager) -> Result<()> {
        let view = mem.host_view();
        for shape in &self.shapes {
            shape.validate(view)?;
        }
        for prim in &self.primitives {
            prim.validate(view)?;
        }
        for light in &self.lights {
            light.validate(view)?;
        }
        Ok(())
    }

    /// Build the aggregates and transfer the scene to the device region. Nothing may be
    /// allocated in `mem` afterwards without preparing again.
    pub fn prepare(&mut self, mem: &mut MemoryManager) -> Result<()> {
        let span = tracing::debug_span!(
            "prepare",
            shapes = self.shapes.len(),
            primitives = self.primitives.len(),
            lights = self.lights.len()
        );
        let _enter = span.enter();

        self.device = None;
        self.validate(mem)?;

        let mut aggregate = self.aggregate.take().unwrap_or_default();
        aggregate.init(self.primitives.clone(), mem.host_view())?;
        self.aggregate = Some(aggregate);
        let mut shape_aggregate = ListAggregate::new();
        shape_aggregate.init(self.shapes.clone(), mem.host_view())?;
        self.shape_aggregate = Some(shape_aggregate);

        mem.send_to_gpu()?;

        let mut shapes = self.shapes.clone();
        let mut primitives = self.primitives.clone();
        let mut lights = self.lights.clone();
        {
            let _relocate = tracing::debug_span!("relocate").entered();
            let device = mem.device_mut()?;
            for shape in &mut shapes {
                shape.relocate(device)?;
            }
            for prim in &mut primitives {
                prim.relocate(device)?;
            }
            for light in &mut lights {
                light.relocate(device)?;
            }
            tracing::debug!(region = ?device.region(), "relocated scene handles");
        }

        let device_view = mem.device_view()?;
        let mut device_aggregate = ListAggregate::new();
        device_aggregate.init(primitives.clone(), device_view)?;
        let mut device_shape_aggregate = ListAggregate::new();
        device_shape_aggregate.init(shapes.clone(), device_view)?;

        self.device = Some(DeviceScene {
            region: device_view.region(),
            shapes,
            primitives,
            lights,
            aggregate: device_aggregate,
            shape_aggregate: device_shape_aggregate,
        });
        Ok(())
    }

    /// Query the scene in the host arena, as built so far.
    pub fn host_view<'a>(&'a self, mem: &'a MemoryManager) -> SceneView<'a> {
        let view = mem.host_view();
        SceneView {
            aggregate: self.aggregate.as_ref().map(|agg| agg.view(view)),
            shape_aggregate: self.shape_aggregate.as_ref().map(|agg| agg.view(view)),
            shapes: &self.shapes,
            primitives: &self.primitives,
            lights: &self.lights,
            mem: view,
        }
    }

    /// Query the prepared scene in the device region.
    pub fn view<'a>(&'a self, mem: &'a MemoryManager) -> Result<SceneView<'a>> {
        let device = self.device.as_ref()
            .ok_or_else(|| Error::BadOperation("scene has not been prepared".to_string()))?;
        let view = mem.device_view()?;
        if view.region() != device.region {
            return Err(Error::BadOperation("device memory was replaced after the scene was prepared".to_string()));
        }
        Ok(SceneView {
            aggregate: Some(device.aggregate.view(view)),
            shape_aggregate: Some(device.shape_aggregate.view(view)),
            shapes: &device.shapes,
            primitives: &device.primitives,
            lights: &device.lights,
            mem: view,
        })
    }
}

/// Read-only scene queries against one memory region.
#[derive(Clone, Copy)]
pub struct SceneView<'a> {
    aggregate: Option<ListAggregateView<'a, Primitive>>,
    shape_aggregate: Option<ListAggregateView<'a, Shape>>,
    shapes: &'a [Shape],
    primitives: &'a [Primitive],
    lights: &'a [Light],
    mem: MemoryView<'a>,
}

impl<'a> SceneView<'a> {
    pub fn world_bound(&self) -> Bounds3f {
        let prims = self.aggregate.map_or_else(Bounds3f::empty, |agg| agg.world_bound());
        let shapes = self.shape_aggregate.map_or_else(Bounds3f::empty, |agg| agg.world_bound());
        prims.join(&shapes)
    }

    /// Closest hit over primitives and bare shapes. A bare shape only wins when strictly closer.
    pub fn intersect(&self, ray: &Ray) -> Option<ShapeIntersection> {
        let closest = self.aggregate.and_then(|agg| agg.intersect(ray));
        let t_max = closest.as_ref().map_or(ray.t_max, |c| c.t_hit);
        let bare = self.shape_aggregate.and_then(|agg| agg.intersect(&Ray { t_max, ..*ray }));
        match (closest, bare) {
            (Some(c), Some(b)) if b.t_hit < c.t_hit => Some(b),
            (Some(c), _) => Some(c),
            (None, b) => b,
        }
    }

    pub fn intersect_p(&self, ray: &Ray) -> bool {
        self.aggregate.map_or(false, |agg| agg.intersect_p(ray))
            || self.shape_aggregate.map_or(false, |agg| agg.intersect_p(ray))
    }

    pub fn lights(&self) -> &'a [Light] {
        self.lights
    }

    pub fn primitives(&self) -> &'a [Primitive] {
        self.primitives
    }

    pub fn shapes(&self) -> &'a [Shape] {
        self.shapes
    }

    pub fn memory(&self) -> MemoryView<'a> {
        self.mem
    }
}
