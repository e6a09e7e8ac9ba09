use crate::error::{Error, Result};
use crate::mem::{MemPtr, MemoryKind, RegionId};
use bytemuck::{Pod, Zeroable};
use std::mem::{align_of, size_of};

pub const BLOCK_ALIGN: usize = 16;

#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C, align(16))]
struct Block([u8; BLOCK_ALIGN]);

fn align_up(offset: usize, align: usize) -> usize {
    (offset + align - 1) & !(align - 1)
}

/// A bump region. Values are copied in as plain bytes, so the whole region can be duplicated
/// with a memcpy and stays valid, as long as embedded handles are re-pointed afterwards.
pub struct StackAllocator {
    blocks: Vec<Block>,
    size: usize,
    top: usize,
    region: RegionId,
    kind: MemoryKind,
}

impl StackAllocator {
    pub fn new(size: usize, kind: MemoryKind) -> Result<Self> {
        let n_blocks = (size + BLOCK_ALIGN - 1) / BLOCK_ALIGN;
        let mut blocks = Vec::new();
        blocks.try_reserve_exact(n_blocks)
            .map_err(|_| Error::BadAllocation { requested: size, available: 0 })?;
        blocks.resize(n_blocks, Block::zeroed());
        Ok(Self { blocks, size, top: 0, region: RegionId::next(), kind })
    }

    pub fn empty(kind: MemoryKind) -> Self {
        Self { blocks: Vec::new(), size: 0, top: 0, region: RegionId::next(), kind }
    }

    pub fn region(&self) -> RegionId { self.region }

    pub fn kind(&self) -> MemoryKind { self.kind }

    pub fn capacity(&self) -> usize { self.size }

    pub fn used(&self) -> usize { self.top }

    pub fn available_size(&self) -> usize { self.size - self.top }

    fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.blocks)
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.blocks)
    }

    /// Copy `value` to the top of the stack and return a handle to it.
    pub fn allocate<T: Pod>(&mut self, value: T) -> Result<MemPtr> {
        let align = align_of::<T>();
        if align > BLOCK_ALIGN {
            return Err(Error::InvalidInput(format!(
                "alignment {} exceeds the arena's maximum of {}", align, BLOCK_ALIGN
            )));
        }
        let len = size_of::<T>();
        let offset = align_up(self.top, align);
        let end = offset.checked_add(len)
            .filter(|&end| end <= self.size)
            .ok_or(Error::BadAllocation { requested: len, available: self.available_size() })?;

        self.bytes_mut()[offset..end].copy_from_slice(bytemuck::bytes_of(&value));
        self.top = end;
        Ok(MemPtr::new(offset, self.region))
    }

    pub fn get<T: Pod>(&self, ptr: MemPtr) -> Result<&T> {
        self.view().get(ptr)
    }

    pub fn get_mut<T: Pod>(&mut self, ptr: MemPtr) -> Result<&mut T> {
        let range = self.view().checked_range::<T>(ptr)?;
        bytemuck::try_from_bytes_mut(&mut self.bytes_mut()[range])
            .map_err(|e| Error::BadOperation(format!("cannot cast arena bytes: {:?}", e)))
    }

    pub fn set<T: Pod>(&mut self, ptr: MemPtr, value: T) -> Result<()> {
        *self.get_mut::<T>(ptr)? = value;
        Ok(())
    }

    /// Current top of the stack; pass to `release_to` to free everything allocated after it.
    pub fn marker(&self) -> usize {
        self.top
    }

    pub fn release_to(&mut self, marker: usize) -> Result<()> {
        if marker > self.top {
            return Err(Error::InvalidInput(format!(
                "marker {} is above the top of the stack ({})", marker, self.top
            )));
        }
        self.top = marker;
        Ok(())
    }

    /// Byte-for-byte copy of this region into a new one of the given kind. Handles embedded in
    /// the copy still point at this region until they are relocated.
    pub fn duplicate(&self, kind: MemoryKind) -> Result<StackAllocator> {
        let mut blocks = Vec::new();
        blocks.try_reserve_exact(self.blocks.len())
            .map_err(|_| Error::BadAllocation { requested: self.size, available: 0 })?;
        blocks.extend_from_slice(&self.blocks);
        Ok(Self {
            blocks,
            size: self.size,
            top: self.top,
            region: RegionId::next(),
            kind,
        })
    }

    pub fn view(&self) -> MemoryView<'_> {
        MemoryView {
            bytes: &self.bytes()[..self.top],
            region: self.region,
            kind: self.kind,
        }
    }
}

/// Read-only window onto a region, cheap to copy into worker threads once building is done.
#[derive(Clone, Copy)]
pub struct MemoryView<'a> {
    bytes: &'a [u8],
    region: RegionId,
    kind: MemoryKind,
}

impl<'a> MemoryView<'a> {
    pub fn region(&self) -> RegionId { self.region }

    pub fn kind(&self) -> MemoryKind { self.kind }

    pub fn len(&self) -> usize { self.bytes.len() }

    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }

    fn checked_range<T>(&self, ptr: MemPtr) -> Result<std::ops::Range<usize>> {
        if ptr.is_null() {
            return Err(Error::BadOperation("dereferenced a null handle".to_string()));
        }
        if ptr.region() != self.region {
            return Err(Error::BadOperation(format!(
                "stale handle: resolved against region {:?} but read from {:?}",
                ptr.region(), self.region
            )));
        }
        let offset = ptr.address_index();
        let len = size_of::<T>();
        match offset.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(offset..end),
            _ => Err(Error::OutOfBounds { offset, len, size: self.bytes.len() }),
        }
    }

    pub fn get<T: Pod>(&self, ptr: MemPtr) -> Result<&'a T> {
        let range = self.checked_range::<T>(ptr)?;
        let bytes: &'a [u8] = self.bytes;
        bytemuck::try_from_bytes(&bytes[range])
            .map_err(|e| Error::BadOperation(format!("cannot cast arena bytes: {:?}", e)))
    }
}

impl std::fmt::Debug for MemoryView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryView")
            .field("region", &self.region)
            .field("kind", &self.kind)
            .field("len", &self.bytes.len())
            .finish()
    }
}
