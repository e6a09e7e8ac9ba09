//! Arena memory shared between the host and a device mirror.
//!
//! Scene objects are copied as plain bytes into a [`StackAllocator`] and referred to through
//! [`MemPtr`] handles: a byte offset plus the region the handle was last resolved against.
//! [`MemoryManager::send_to_gpu`] duplicates the host region wholesale, after which every handle
//! stored inside the copy must be [relocated](Relocate) before it can be read there.

use crate::error::{Error, Result};
use bytemuck::{Pod, Zeroable};
use std::sync::atomic::{AtomicU64, Ordering};

mod stack;

pub use stack::{StackAllocator, MemoryView, BLOCK_ALIGN};

pub const DEFAULT_ARENA_SIZE: usize = 1 << 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemoryKind {
    Host,
    Device,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(u64);

static NEXT_REGION: AtomicU64 = AtomicU64::new(1);

impl RegionId {
    /// Never matches a live region.
    pub const NONE: RegionId = RegionId(0);

    fn next() -> Self {
        RegionId(NEXT_REGION.fetch_add(1, Ordering::Relaxed))
    }
}

/// Opaque arena handle. The zeroed value is the null handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct MemPtr {
    address_index: u64,
    region: u64,
}

impl MemPtr {
    pub const NULL: MemPtr = MemPtr { address_index: 0, region: 0 };

    fn new(offset: usize, region: RegionId) -> Self {
        Self { address_index: offset as u64, region: region.0 }
    }

    pub fn is_null(&self) -> bool {
        self.region == RegionId::NONE.0
    }

    pub fn address_index(&self) -> usize {
        self.address_index as usize
    }

    pub fn region(&self) -> RegionId {
        RegionId(self.region)
    }

    /// Re-point the handle at another region holding the same bytes. Null stays null.
    pub fn update(&mut self, region: RegionId) {
        if !self.is_null() {
            self.region = region.0;
        }
    }

    pub fn get<'a, T: Pod>(&self, mem: MemoryView<'a>) -> Result<&'a T> {
        mem.get(*self)
    }
}

impl Default for MemPtr {
    fn default() -> Self {
        MemPtr::NULL
    }
}

/// Re-resolve every handle reachable from a value against `region`.
///
/// Implemented by hand for handle types (an exhaustive match on their kind) and through
/// [`impl_relocate!`](crate::impl_relocate) for records that embed handles.
pub trait Relocate {
    fn relocate(&mut self, region: &mut StackAllocator) -> Result<()>;
}

/// Point `ptr` at `region`, then relocate the `T` it refers to in place.
pub fn relocate_child<T: Pod + Relocate>(ptr: &mut MemPtr, region: &mut StackAllocator) -> Result<()> {
    if ptr.is_null() {
        return Ok(());
    }
    ptr.update(region.region());
    let mut child: T = *region.get::<T>(*ptr)?;
    child.relocate(region)?;
    region.set(*ptr, child)
}

pub struct MemoryManager {
    host: StackAllocator,
    device: Option<StackAllocator>,
}

impl MemoryManager {
    pub fn new(size: usize) -> Result<Self> {
        Ok(Self {
            host: StackAllocator::new(size, MemoryKind::Host)?,
            device: None,
        })
    }

    /// Replace the host arena with a fresh one of `size` bytes. Every outstanding handle
    /// becomes stale.
    pub fn init(&mut self, size: usize) -> Result<()> {
        self.host = StackAllocator::new(size, MemoryKind::Host)?;
        self.device = None;
        Ok(())
    }

    /// Any change to the host arena makes the device mirror stale.
    fn drop_device_mirror(&mut self) {
        if self.device.take().is_some() {
            tracing::debug!("host arena modified after transfer, dropping the device mirror");
        }
    }

    pub fn allocate<T: Pod>(&mut self, value: T) -> Result<MemPtr> {
        self.drop_device_mirror();
        self.host.allocate(value)
    }

    pub fn get<T: Pod>(&self, ptr: MemPtr) -> Result<&T> {
        self.host.get(ptr)
    }

    pub fn set<T: Pod>(&mut self, ptr: MemPtr, value: T) -> Result<()> {
        self.drop_device_mirror();
        self.host.set(ptr, value)
    }

    pub fn available_size(&self) -> usize {
        self.host.available_size()
    }

    pub fn host(&self) -> &StackAllocator {
        &self.host
    }

    pub fn host_view(&self) -> MemoryView<'_> {
        self.host.view()
    }

    pub fn device(&self) -> Option<&StackAllocator> {
        self.device.as_ref()
    }

    pub fn device_mut(&mut self) -> Result<&mut StackAllocator> {
        self.device.as_mut()
            .ok_or_else(|| Error::BadOperation("memory has not been sent to the device".to_string()))
    }

    pub fn device_view(&self) -> Result<MemoryView<'_>> {
        self.device.as_ref()
            .map(StackAllocator::view)
            .ok_or_else(|| Error::BadOperation("memory has not been sent to the device".to_string()))
    }

    /// Mirror the used part of the host arena into a device region.
    pub fn send_to_gpu(&mut self) -> Result<()> {
        let span = tracing::debug_span!("send_to_gpu", bytes = self.host.used());
        let _enter = span.enter();

        let device = self.host.duplicate(MemoryKind::Device)?;
        tracing::debug!(
            host_region = ?self.host.region(),
            device_region = ?device.region(),
            "duplicated {} of {} bytes", device.used(), device.capacity()
        );
        self.device = Some(device);
        Ok(())
    }

    pub fn dump_memory(&self) {
        tracing::info!(
            host_capacity = self.host.capacity(),
            host_used = self.host.used(),
            available = self.host.available_size(),
            host_region = ?self.host.region(),
            device_used = self.device.as_ref().map(|d| d.used()),
            device_region = ?self.device.as_ref().map(|d| d.region()),
            "arena memory"
        );
    }
}

impl Default for MemoryManager {
    fn default() -> Self {
        Self {
            host: StackAllocator::empty(MemoryKind::Host),
            device: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResultCode;

    #[derive(Clone, Copy, Debug, Pod, Zeroable)]
    #[repr(C)]
    struct Leaf {
        value: u32,
    }

    impl_relocate!(Leaf {} plain { value });

    #[derive(Clone, Copy, Pod, Zeroable)]
    #[repr(C)]
    struct Node {
        leaf: MemPtr,
        weight: f32,
        _pad: u32,
    }

    impl Relocate for MemPtr {
        fn relocate(&mut self, region: &mut StackAllocator) -> Result<()> {
            relocate_child::<Leaf>(self, region)
        }
    }

    impl_relocate!(Node { leaf } plain { weight, _pad });

    #[test]
    fn nested_handles_follow_the_copy() {
        let mut mem = MemoryManager::new(256).unwrap();
        let leaf = mem.allocate(Leaf { value: 7 }).unwrap();
        let mut node = mem.allocate(Node { leaf, weight: 0.5, _pad: 0 }).unwrap();
        mem.send_to_gpu().unwrap();

        let device = mem.device_mut().unwrap();
        // the embedded handle was copied verbatim and still names the host region
        node.update(device.region());
        let copied = *device.get::<Node>(node).unwrap();
        assert_eq!(device.get::<Leaf>(copied.leaf).unwrap_err().code(), ResultCode::BadOperation);

        let mut root = copied;
        root.relocate(device).unwrap();
        assert_eq!(device.get::<Leaf>(root.leaf).unwrap().value, 7);
    }

    #[test]
    fn allocating_drops_the_mirror() {
        let mut mem = MemoryManager::new(64).unwrap();
        mem.allocate(1u32).unwrap();
        mem.send_to_gpu().unwrap();
        assert!(mem.device_view().is_ok());
        mem.allocate(2u32).unwrap();
        assert!(mem.device_view().is_err());
    }

    #[test]
    fn writing_drops_the_mirror() {
        let mut mem = MemoryManager::new(64).unwrap();
        let ptr = mem.allocate(1u32).unwrap();
        mem.send_to_gpu().unwrap();
        mem.set(ptr, 5u32).unwrap();
        assert!(mem.device_view().is_err());
        assert_eq!(*mem.get::<u32>(ptr).unwrap(), 5);

        mem.send_to_gpu().unwrap();
        let mut on_device = ptr;
        on_device.update(mem.device_view().unwrap().region());
        assert_eq!(*on_device.get::<u32>(mem.device_view().unwrap()).unwrap(), 5);
    }

    #[test]
    fn init_resets_the_arena() {
        let mut mem = MemoryManager::default();
        assert_eq!(mem.available_size(), 0);
        mem.init(1024).unwrap();
        assert_eq!(mem.available_size(), 1024);
        let p = mem.allocate(3u64).unwrap();
        mem.init(1024).unwrap();
        assert!(mem.get::<u64>(p).is_err());
    }
}
