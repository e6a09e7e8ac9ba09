//! Linear-scan aggregate. Every query walks all members after a single box test, so it's only
//! meant for small scenes; anything that implements the same `intersect`/`intersect_p` pair over
//! [`AggregateMember`]s can take its place.

use crate::{Bounds3f, Float, Ray};
use crate::error::Result;
use crate::mem::MemoryView;
use crate::primitive::Primitive;
use crate::shapes::{Shape, ShapeIntersection};

/// Anything a list aggregate can hold.
pub trait AggregateMember: Copy + Send + Sync {
    fn world_bound(&self, mem: MemoryView) -> Result<Bounds3f>;

    fn intersect(&self, ray: &Ray, t_max: Float, mem: MemoryView) -> Result<Option<ShapeIntersection>>;

    fn intersect_p(&self, ray: &Ray, t_max: Float, mem: MemoryView) -> Result<bool>;
}

impl AggregateMember for Primitive {
    fn world_bound(&self, mem: MemoryView) -> Result<Bounds3f> {
        Primitive::world_bound(self, mem)
    }

    fn intersect(&self, ray: &Ray, t_max: Float, mem: MemoryView) -> Result<Option<ShapeIntersection>> {
        Primitive::intersect(self, ray, t_max, mem)
    }

    fn intersect_p(&self, ray: &Ray, t_max: Float, mem: MemoryView) -> Result<bool> {
        Primitive::intersect_p(self, ray, t_max, mem)
    }
}

impl AggregateMember for Shape {
    fn world_bound(&self, _mem: MemoryView) -> Result<Bounds3f> {
        Ok(Shape::world_bound(self))
    }

    fn intersect(&self, ray: &Ray, t_max: Float, mem: MemoryView) -> Result<Option<ShapeIntersection>> {
        Shape::intersect(self, ray, t_max, mem)
    }

    fn intersect_p(&self, ray: &Ray, t_max: Float, mem: MemoryView) -> Result<bool> {
        Shape::intersect_p(self, ray, t_max, mem)
    }
}

pub struct ListAggregate<T: AggregateMember> {
    members: Vec<T>,
    bounds: Bounds3f,
}

impl<T: AggregateMember> ListAggregate<T> {
    pub fn new() -> Self {
        Self { members: Vec::new(), bounds: Bounds3f::empty() }
    }

    /// Take ownership of `members` and compute the union of their bounds. A member that can't be
    /// resolved against `mem` fails the whole build.
    pub fn init(&mut self, members: Vec<T>, mem: MemoryView) -> Result<()> {
        let bounds = members.iter()
            .try_fold(Bounds3f::empty(), |b, m| Ok(b.join(&m.world_bound(mem)?)))?;
        tracing::info!(members = members.len(), ?bounds, "list aggregate initialized");
        self.members = members;
        self.bounds = bounds;
        Ok(())
    }

    pub fn world_bound(&self) -> Bounds3f {
        self.bounds
    }

    pub fn members(&self) -> &[T] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn view<'a>(&'a self, mem: MemoryView<'a>) -> ListAggregateView<'a, T> {
        ListAggregateView { members: &self.members, bounds: self.bounds, mem }
    }
}

impl<T: AggregateMember> Default for ListAggregate<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a [`ListAggregate`] resolved against one memory region.
pub struct ListAggregateView<'a, T> {
    members: &'a [T],
    bounds: Bounds3f,
    mem: MemoryView<'a>,
}

impl<T> Clone for ListAggregateView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ListAggregateView<'_, T> {}

impl<'a, T: AggregateMember> ListAggregateView<'a, T> {
    pub fn world_bound(&self) -> Bounds3f {
        self.bounds
    }

    pub fn members(&self) -> &'a [T] {
        self.members
    }

    /// Closest hit along `ray` within `[0, ray.t_max]`. On equal distances the earlier member wins.
    pub fn intersect(&self, ray: &Ray) -> Option<ShapeIntersection> {
        self.bounds.intersect_p(ray)?;

        let mut closest: Option<ShapeIntersection> = None;
        for (i, member) in self.members.iter().enumerate() {
            let t_max = closest.map_or(ray.t_max, |c| c.t_hit);
            match member.intersect(ray, t_max, self.mem) {
                Ok(Some(isect)) => {
                    if closest.map_or(true, |c| isect.t_hit < c.t_hit) {
                        closest = Some(isect);
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::error!(member = i, error = %e, "skipping unresolvable member"),
            }
        }
        closest
    }

    /// Whether anything at all is hit within `[0, ray.t_max]`.
    pub fn intersect_p(&self, ray: &Ray) -> bool {
        if self.bounds.intersect_p(ray).is_none() {
            return false;
        }

        self.members.iter().enumerate().any(|(i, member)| {
            match member.intersect_p(ray, ray.t_max, self.mem) {
                Ok(hit) => hit,
                Err(e) => {
                    tracing::error!(member = i, error = %e, "skipping unresolvable member");
                    false
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Transform;
    use crate::mem::MemoryManager;
    use crate::shapes::{ShapeFlags, ShapeType, Sphere, SphereParams};
    use approx::assert_abs_diff_eq;

    fn sphere_at(mem: &mut MemoryManager, z: Float) -> Shape {
        Sphere::create_shape(mem, Transform::translate(vec3f!(0, 0, z)), ShapeFlags::empty(), SphereParams::default()).unwrap()
    }

    #[test]
    fn closest_of_overlapping_members() {
        let mut mem = MemoryManager::new(4096).unwrap();
        let members = vec![sphere_at(&mut mem, -4.0), sphere_at(&mut mem, 0.0), sphere_at(&mut mem, -2.0)];
        let mut agg = ListAggregate::new();
        agg.init(members, mem.host_view()).unwrap();
        assert_eq!(agg.world_bound(), bounds3f!((-1, -1, -5), (1, 1, 1)));

        let view = agg.view(mem.host_view());
        let ray = Ray::new(point3f!(0, 0, 5), vec3f!(0, 0, -1));
        let isect = view.intersect(&ray).unwrap();
        assert_abs_diff_eq!(isect.t_hit, 4.0, epsilon = 1.0e-4);
        assert!(view.intersect_p(&ray));

        // stops before reaching anything
        let short = Ray::with_t_max(point3f!(0, 0, 5), vec3f!(0, 0, -1), 3.5);
        assert!(view.intersect(&short).is_none());
        assert!(!view.intersect_p(&short));
    }

    #[test]
    fn first_member_wins_ties() {
        let mut mem = MemoryManager::new(4096).unwrap();
        let a = sphere_at(&mut mem, 0.0);
        let b = sphere_at(&mut mem, 0.0);
        let mut agg = ListAggregate::new();
        agg.init(vec![a, b], mem.host_view()).unwrap();

        let ray = Ray::new(point3f!(0, 0, 5), vec3f!(0, 0, -1));
        let isect = agg.view(mem.host_view()).intersect(&ray).unwrap();
        assert_eq!(isect.interaction.shape.map(|s| s.data_ptr()), Some(a.data_ptr()));
    }

    #[test]
    fn empty_and_missed_bounds() {
        let mem = MemoryManager::new(64).unwrap();
        let agg: ListAggregate<Shape> = ListAggregate::new();
        let view = agg.view(mem.host_view());
        let ray = Ray::new(point3f!(0, 0, 5), vec3f!(0, 0, -1));
        assert!(agg.world_bound().is_empty());
        assert!(view.intersect(&ray).is_none());
        assert!(!view.intersect_p(&ray));

        let mut mem = MemoryManager::new(4096).unwrap();
        let mut agg = ListAggregate::new();
        agg.init(vec![sphere_at(&mut mem, 0.0)], mem.host_view()).unwrap();
        let away = Ray::new(point3f!(0, 0, 5), vec3f!(0, 0, 1));
        assert!(agg.view(mem.host_view()).intersect(&away).is_none());
    }

    #[test]
    fn unresolvable_members_are_skipped() {
        let mut mem = MemoryManager::new(4096).unwrap();
        let good = sphere_at(&mut mem, 0.0);
        let mesh = Shape::new(Transform::IDENTITY, ShapeType::Mesh, good.data_ptr(), good.world_bound(), ShapeFlags::empty());
        let mut agg = ListAggregate::new();
        agg.init(vec![mesh, good], mem.host_view()).unwrap();

        let view = agg.view(mem.host_view());
        let ray = Ray::new(point3f!(0, 0, 5), vec3f!(0, 0, -1));
        assert!(view.intersect(&ray).is_some());
        assert!(view.intersect_p(&ray));
    }
}
