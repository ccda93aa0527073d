//! # GPU Memory Budgeting
//!
//! Allocators track a byte budget; blocks carved from them are ref-counted
//! and return their bytes when the last reference is released. Map state is
//! an explicit guarded protocol: mapping twice or flushing while unmapped is
//! an error, never silent corruption.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use strata_core::sync::traced_lock;

use crate::error::GraphicsError;

/// Identity of a registered allocator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AllocatorUid(pub u32);

struct AllocatorState {
    budget: usize,
    used: usize,
}

/// One byte-budgeted memory pool.
#[derive(Clone)]
pub struct GpuMemoryAllocator {
    state: Arc<Mutex<AllocatorState>>,
}

impl GpuMemoryAllocator {
    /// Creates an allocator with `budget` bytes.
    #[must_use]
    pub fn new(budget: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(AllocatorState { budget, used: 0 })),
        }
    }

    /// Carves `size` bytes from the budget.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::OutOfDeviceMemory`] when the remaining
    /// budget cannot cover `size`.
    pub fn allocate(&self, size: usize) -> Result<GpuMemoryBlock, GraphicsError> {
        let mut state = traced_lock("gpu_allocator", &self.state);
        let available = state.budget - state.used;
        if size > available {
            return Err(GraphicsError::OutOfDeviceMemory {
                requested: size,
                available,
            });
        }
        state.used += size;
        tracing::debug!(size, used = state.used, "gpu block allocated");
        Ok(GpuMemoryBlock {
            state: Arc::new(Mutex::new(BlockState {
                refs: 1,
                mapped: false,
                dirty: false,
                bytes: vec![0; size],
            })),
            allocator: Arc::clone(&self.state),
        })
    }

    /// Bytes currently allocated.
    #[must_use]
    pub fn used(&self) -> usize {
        traced_lock("gpu_allocator", &self.state).used
    }

    /// Total budget in bytes.
    #[must_use]
    pub fn budget(&self) -> usize {
        traced_lock("gpu_allocator", &self.state).budget
    }
}

struct BlockState {
    refs: u32,
    mapped: bool,
    dirty: bool,
    bytes: Vec<u8>,
}

/// A ref-counted allocation with a guarded map/write/flush protocol.
#[derive(Clone)]
pub struct GpuMemoryBlock {
    state: Arc<Mutex<BlockState>>,
    allocator: Arc<Mutex<AllocatorState>>,
}

impl GpuMemoryBlock {
    /// Size of the allocation in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        traced_lock("gpu_block", &self.state).bytes.len()
    }

    /// Current reference count.
    #[must_use]
    pub fn ref_count(&self) -> u32 {
        traced_lock("gpu_block", &self.state).refs
    }

    /// Adds a reference.
    pub fn retain(&self) {
        traced_lock("gpu_block", &self.state).refs += 1;
    }

    /// Drops a reference; the last release returns the bytes to the
    /// allocator's budget. Returns whether storage was freed.
    pub fn release(&self) -> bool {
        let mut state = traced_lock("gpu_block", &self.state);
        assert!(state.refs > 0, "release of an already-freed block");
        state.refs -= 1;
        if state.refs > 0 {
            return false;
        }
        let size = state.bytes.len();
        state.bytes = Vec::new();
        drop(state);
        let mut allocator = traced_lock("gpu_allocator", &self.allocator);
        allocator.used -= size;
        tracing::debug!(size, used = allocator.used, "gpu block freed");
        true
    }

    /// Whether the block is currently mapped.
    #[must_use]
    pub fn is_mapped(&self) -> bool {
        traced_lock("gpu_block", &self.state).mapped
    }

    /// Opens the block for CPU writes.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::AlreadyMapped`] when a mapping is open.
    pub fn map(&self) -> Result<(), GraphicsError> {
        let mut state = traced_lock("gpu_block", &self.state);
        if state.mapped {
            return Err(GraphicsError::AlreadyMapped);
        }
        state.mapped = true;
        Ok(())
    }

    /// Copies `data` to the start of the mapped range and marks it dirty.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::NotMapped`] without a mapping open, or
    /// [`GraphicsError::WriteOutOfBounds`] when `data` exceeds the block.
    pub fn write(&self, data: &[u8]) -> Result<(), GraphicsError> {
        let mut state = traced_lock("gpu_block", &self.state);
        if !state.mapped {
            return Err(GraphicsError::NotMapped);
        }
        if data.len() > state.bytes.len() {
            return Err(GraphicsError::WriteOutOfBounds {
                len: data.len(),
                size: state.bytes.len(),
            });
        }
        state.bytes[..data.len()].copy_from_slice(data);
        state.dirty = true;
        Ok(())
    }

    /// Makes pending CPU writes visible to the device, clearing the dirty
    /// flag. Valid only while mapped.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::NotMapped`] without a mapping open.
    pub fn flush(&self) -> Result<(), GraphicsError> {
        let mut state = traced_lock("gpu_block", &self.state);
        if !state.mapped {
            return Err(GraphicsError::NotMapped);
        }
        state.dirty = false;
        Ok(())
    }

    /// Whether writes are pending a flush.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        traced_lock("gpu_block", &self.state).dirty
    }

    /// Closes the mapping.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::NotMapped`] when no mapping is open.
    pub fn unmap(&self) -> Result<(), GraphicsError> {
        let mut state = traced_lock("gpu_block", &self.state);
        if !state.mapped {
            return Err(GraphicsError::NotMapped);
        }
        state.mapped = false;
        Ok(())
    }
}

/// Registry of allocators, with a default that is always valid.
pub struct GpuMemoryManager {
    default_allocator: GpuMemoryAllocator,
    named: Mutex<HashMap<AllocatorUid, GpuMemoryAllocator>>,
    next_uid: Mutex<u32>,
}

impl GpuMemoryManager {
    /// Creates the manager with `default_budget` bytes for the default
    /// allocator.
    #[must_use]
    pub fn new(default_budget: usize) -> Self {
        Self {
            default_allocator: GpuMemoryAllocator::new(default_budget),
            named: Mutex::new(HashMap::new()),
            next_uid: Mutex::new(0),
        }
    }

    /// The default allocator. Never unregistered, always valid.
    #[must_use]
    pub fn default_allocator(&self) -> &GpuMemoryAllocator {
        &self.default_allocator
    }

    /// Registers a new allocator with its own budget, returning its uid.
    pub fn register_allocator(&self, budget: usize) -> AllocatorUid {
        let mut next = self.next_uid.lock();
        let uid = AllocatorUid(*next);
        *next += 1;
        drop(next);
        traced_lock("allocator_registry", &self.named)
            .insert(uid, GpuMemoryAllocator::new(budget));
        uid
    }

    /// Looks up a registered allocator.
    #[must_use]
    pub fn allocator(&self, uid: AllocatorUid) -> Option<GpuMemoryAllocator> {
        traced_lock("allocator_registry", &self.named).get(&uid).cloned()
    }

    /// Unregisters an allocator. Blocks already carved from it stay valid;
    /// only the registry entry goes away.
    pub fn unregister_allocator(&self, uid: AllocatorUid) -> bool {
        traced_lock("allocator_registry", &self.named)
            .remove(&uid)
            .is_some()
    }
}

/// Everything a factory may touch while constructing a resource.
pub struct DeviceContext {
    memory: GpuMemoryManager,
}

impl DeviceContext {
    /// Creates a context with `memory_budget` bytes in the default
    /// allocator.
    #[must_use]
    pub fn new(memory_budget: usize) -> Self {
        Self {
            memory: GpuMemoryManager::new(memory_budget),
        }
    }

    /// The memory manager.
    #[must_use]
    pub fn memory(&self) -> &GpuMemoryManager {
        &self.memory
    }
}
