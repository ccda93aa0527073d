//! # Resource Ownership
//!
//! Every GPU resource type has exactly one [`ObjectOwner`]: a slot table
//! that holds the value itself. Everyone else holds an [`Accessor`], a
//! non-owning reference that re-checks existence on every use. Releasing a
//! resource from its owner instantly invalidates every accessor; there is
//! no way to reach freed storage through one.

use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use strata_core::sync::traced_lock;

/// Typed index-plus-generation reference into an owner's slot table.
///
/// Plain data: holding a handle proves nothing about liveness. Resolve it
/// through an [`Accessor`] or [`ObjectOwner::contains`].
pub struct ResourceHandle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

// Manual impls: the handle is plain data regardless of `T`.
impl<T> Clone for ResourceHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for ResourceHandle<T> {}
impl<T> PartialEq for ResourceHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}
impl<T> Eq for ResourceHandle<T> {}
impl<T> std::hash::Hash for ResourceHandle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}
impl<T> std::fmt::Debug for ResourceHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("index", &self.index)
            .field("generation", &self.generation)
            .finish()
    }
}

impl<T> ResourceHandle<T> {
    /// Slot index inside the owner's table.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation the handle was issued with.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

struct OwnerTable<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> OwnerTable<T> {
    fn resolve(&self, handle: ResourceHandle<T>) -> Option<&T> {
        let slot = self.slots.get(handle.index as usize)?;
        (slot.generation == handle.generation)
            .then_some(slot.value.as_ref())
            .flatten()
    }

    fn resolve_mut(&mut self, handle: ResourceHandle<T>) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        (slot.generation == handle.generation)
            .then_some(slot.value.as_mut())
            .flatten()
    }
}

/// Sole owner of every resource of type `T`.
pub struct ObjectOwner<T> {
    table: Arc<Mutex<OwnerTable<T>>>,
}

impl<T> Default for ObjectOwner<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ObjectOwner<T> {
    /// Creates an empty owner.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: Arc::new(Mutex::new(OwnerTable {
                slots: Vec::new(),
                free: Vec::new(),
            })),
        }
    }

    /// Takes ownership of `value` and returns its accessor.
    pub fn register(&self, value: T) -> Accessor<T> {
        let mut table = traced_lock("owner_table", &self.table);
        let index = match table.free.pop() {
            Some(index) => {
                let slot = &mut table.slots[index as usize];
                slot.value = Some(value);
                index
            }
            None => {
                let index = table.slots.len() as u32;
                table.slots.push(Slot {
                    generation: 0,
                    value: Some(value),
                });
                index
            }
        };
        let generation = table.slots[index as usize].generation;
        Accessor {
            table: Arc::downgrade(&self.table),
            handle: ResourceHandle {
                index,
                generation,
                _marker: PhantomData,
            },
        }
    }

    /// Destroys the resource behind `handle`, returning it.
    ///
    /// Every accessor carrying `handle` goes dead immediately. Already-dead
    /// handles return `None`.
    pub fn release(&self, handle: ResourceHandle<T>) -> Option<T> {
        let mut table = traced_lock("owner_table", &self.table);
        let slot = table.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        table.free.push(handle.index);
        Some(value)
    }

    /// Whether `handle` still refers to a live resource.
    #[must_use]
    pub fn contains(&self, handle: ResourceHandle<T>) -> bool {
        traced_lock("owner_table", &self.table)
            .resolve(handle)
            .is_some()
    }

    /// Rebuilds an accessor for a handle obtained earlier.
    #[must_use]
    pub fn accessor(&self, handle: ResourceHandle<T>) -> Accessor<T> {
        Accessor {
            table: Arc::downgrade(&self.table),
            handle,
        }
    }

    /// Number of live resources.
    #[must_use]
    pub fn len(&self) -> usize {
        let table = traced_lock("owner_table", &self.table);
        table.slots.iter().filter(|s| s.value.is_some()).count()
    }

    /// True when the owner holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Non-owning reference to a resource held by an [`ObjectOwner`].
///
/// Existence is re-checked on every use; an accessor outliving its resource
/// (or its owner) degrades to a permanent dead reference, never a dangling
/// one.
pub struct Accessor<T> {
    table: Weak<Mutex<OwnerTable<T>>>,
    handle: ResourceHandle<T>,
}

impl<T> Clone for Accessor<T> {
    fn clone(&self) -> Self {
        Self {
            table: Weak::clone(&self.table),
            handle: self.handle,
        }
    }
}

impl<T> Accessor<T> {
    /// Whether the resource is still alive in its owner.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.table.upgrade().is_some_and(|table| {
            traced_lock("owner_table", &table)
                .resolve(self.handle)
                .is_some()
        })
    }

    /// The underlying handle.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> ResourceHandle<T> {
        self.handle
    }

    /// Runs `f` over the resource if it is still alive.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let table = self.table.upgrade()?;
        let guard = traced_lock("owner_table", &table);
        guard.resolve(self.handle).map(f)
    }

    /// Runs `f` over the resource mutably if it is still alive.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let table = self.table.upgrade()?;
        let mut guard = traced_lock("owner_table", &table);
        guard.resolve_mut(self.handle).map(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessor_follows_resource_lifetime() {
        let owner = ObjectOwner::new();
        let accessor = owner.register(42_u32);
        assert!(accessor.exists());
        assert_eq!(accessor.with(|v| *v), Some(42));

        assert_eq!(owner.release(accessor.handle()), Some(42));
        assert!(!accessor.exists());
        assert_eq!(accessor.with(|v| *v), None);
    }

    #[test]
    fn test_slot_reuse_does_not_revive_old_handles() {
        let owner = ObjectOwner::new();
        let first = owner.register(1_u32);
        owner.release(first.handle());

        let second = owner.register(2_u32);
        assert_eq!(second.handle().index(), first.handle().index());
        assert!(!first.exists());
        assert_eq!(second.with(|v| *v), Some(2));
    }

    #[test]
    fn test_accessor_survives_clone_not_owner_drop() {
        let owner = ObjectOwner::new();
        let accessor = owner.register("resource".to_string());
        let copy = accessor.clone();
        drop(owner);
        assert!(!copy.exists());
    }

    #[test]
    fn test_release_is_idempotent() {
        let owner = ObjectOwner::new();
        let accessor = owner.register(7_u32);
        assert!(owner.release(accessor.handle()).is_some());
        assert!(owner.release(accessor.handle()).is_none());
    }
}
