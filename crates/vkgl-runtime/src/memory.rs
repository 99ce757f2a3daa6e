//! Device memory allocations and the bindings they own.
//!
//! An allocation is a zeroed host byte block. Binding a buffer or image records the byte range
//! it occupies; the target object itself lives with the resource. Host access goes through the
//! mapped range, and `flush`/`invalidate` move bytes between the block and every bound target
//! object whose range intersects the request. Bindings may overlap (aliasing).

use std::collections::BTreeMap;
use std::ops::Range;

use crate::error::ValidationError;
use crate::memory_type::MemoryPropertyFlags;
use crate::resource::WHOLE_SIZE;

/// Intersection of two half-open ranges, `None` when empty.
pub fn intersect(a: &Range<u64>, b: &Range<u64>) -> Option<Range<u64>> {
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    (start < end).then_some(start..end)
}

/// `[offset, offset + size)` within `limit` bytes, with `WHOLE_SIZE` meaning "to the end".
pub fn checked_range(offset: u64, size: u64, limit: u64) -> Result<Range<u64>, ValidationError> {
    let size = if size == WHOLE_SIZE {
        limit.saturating_sub(offset)
    } else {
        size
    };
    match offset.checked_add(size) {
        Some(end) if end <= limit && offset <= limit => Ok(offset..end),
        _ => Err(ValidationError::OutOfRange {
            offset,
            size,
            limit,
        }),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BoundResource {
    Buffer(u32),
    Image(u32),
}

impl BoundResource {
    pub fn kind(self) -> &'static str {
        match self {
            BoundResource::Buffer(_) => "buffer",
            BoundResource::Image(_) => "image",
        }
    }

    pub fn id(self) -> u32 {
        match self {
            BoundResource::Buffer(id) | BoundResource::Image(id) => id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    /// Non-owning back-reference; the resource holds the matching `(allocation, slot)`.
    pub resource: BoundResource,
    /// Allocation-relative byte range.
    pub range: Range<u64>,
}

#[derive(Debug)]
pub struct AllocationState {
    pub id: u32,
    pub type_index: u32,
    pub flags: MemoryPropertyFlags,
    pub heap: u32,
    pub storage: Vec<u8>,
    pub bindings: BTreeMap<u32, Binding>,
    next_slot: u32,
    pub mapped: Option<Range<u64>>,
    /// Bytes written through the mapping since the last flush, sorted and disjoint.
    pub dirty: Vec<Range<u64>>,
    /// Whether anything was written since the current map.
    pub written: bool,
}

impl AllocationState {
    pub fn new(id: u32, size: u64, type_index: u32, flags: MemoryPropertyFlags, heap: u32) -> Self {
        Self {
            id,
            type_index,
            flags,
            heap,
            storage: vec![0u8; size as usize],
            bindings: BTreeMap::new(),
            next_slot: 0,
            mapped: None,
            dirty: Vec::new(),
            written: false,
        }
    }

    pub fn size(&self) -> u64 {
        self.storage.len() as u64
    }

    pub fn is_coherent(&self) -> bool {
        self.flags.contains(MemoryPropertyFlags::HOST_COHERENT)
    }

    /// Adds a binding and returns its slot.
    pub fn insert_binding(&mut self, resource: BoundResource, range: Range<u64>) -> u32 {
        let slot = self.next_slot;
        self.next_slot += 1;
        self.bindings.insert(slot, Binding { resource, range });
        slot
    }

    pub fn remove_binding(&mut self, slot: u32) -> Option<Binding> {
        self.bindings.remove(&slot)
    }

    pub fn map(&mut self, offset: u64, size: u64) -> Result<Range<u64>, ValidationError> {
        if !self.flags.contains(MemoryPropertyFlags::HOST_VISIBLE) {
            return Err(ValidationError::NotHostVisible(self.flags));
        }
        if self.mapped.is_some() {
            return Err(ValidationError::AlreadyMapped(self.id));
        }
        let range = checked_range(offset, size, self.size())?;
        self.mapped = Some(range.clone());
        self.written = false;
        Ok(range)
    }

    /// Clears the mapping and reports whether anything was written while mapped.
    pub fn unmap(&mut self) -> Result<bool, ValidationError> {
        if self.mapped.take().is_none() {
            return Err(ValidationError::NotMapped(self.id));
        }
        Ok(std::mem::take(&mut self.written))
    }

    /// Checks that `[offset, offset + size)` lies inside the mapped range.
    pub fn mapped_range(&self, offset: u64, size: u64) -> Result<Range<u64>, ValidationError> {
        let mapped = self.mapped.as_ref().ok_or(ValidationError::NotMapped(self.id))?;
        let size = if size == WHOLE_SIZE {
            mapped.end.saturating_sub(offset)
        } else {
            size
        };
        match offset.checked_add(size) {
            Some(end) if offset >= mapped.start && end <= mapped.end => Ok(offset..end),
            _ => Err(ValidationError::OutsideMappedRange { offset, size }),
        }
    }

    pub fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), ValidationError> {
        let range = self.mapped_range(offset, data.len() as u64)?;
        self.storage[range.start as usize..range.end as usize].copy_from_slice(data);
        if !range.is_empty() {
            self.mark_dirty(range);
            self.written = true;
        }
        Ok(())
    }

    pub fn read(&self, offset: u64, out: &mut [u8]) -> Result<(), ValidationError> {
        let range = self.mapped_range(offset, out.len() as u64)?;
        out.copy_from_slice(&self.storage[range.start as usize..range.end as usize]);
        Ok(())
    }

    /// Adds `range` to the dirty set, merging it with overlapping or adjacent ranges.
    fn mark_dirty(&mut self, range: Range<u64>) {
        let first = self.dirty.partition_point(|d| d.end < range.start);
        let last = self.dirty.partition_point(|d| d.start <= range.end);
        let merged = match &self.dirty[first..last] {
            [] => range,
            touched => {
                let start = touched[0].start.min(range.start);
                let end = touched[touched.len() - 1].end.max(range.end);
                start..end
            }
        };
        self.dirty.drain(first..last);
        self.dirty.insert(first, merged);
    }

    /// Removes `range` from the dirty set, splitting ranges that straddle it.
    pub fn clear_dirty(&mut self, range: &Range<u64>) {
        if range.is_empty() {
            return;
        }
        self.dirty = std::mem::take(&mut self.dirty)
            .into_iter()
            .flat_map(|d| {
                let before = d.start..d.end.min(range.start);
                let after = d.start.max(range.end)..d.end;
                [before, after]
            })
            .filter(|r| !r.is_empty())
            .collect();
    }

    /// Bindings intersecting `range`, with the allocation-relative intersection.
    pub fn intersecting(&self, range: &Range<u64>) -> Vec<(u32, BoundResource, Range<u64>)> {
        self.bindings
            .iter()
            .filter_map(|(&slot, b)| intersect(&b.range, range).map(|r| (slot, b.resource, r)))
            .collect()
    }
}
