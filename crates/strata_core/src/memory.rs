//! # Slot Pools
//!
//! Pre-allocated, generation-checked storage for hot per-frame objects
//! (render items). A [`SlotKey`] stays cheap to copy and can be handed
//! across a frame boundary: if the slot was recycled in the meantime the
//! stale key simply stops resolving, so nothing is ever addressed by raw
//! pointer across frames.

/// Generation-checked key into a [`SlotPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotKey {
    index: u32,
    generation: u32,
}

impl SlotKey {
    /// The slot index (for stable sort tie-breaking).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// The generation the key was minted with.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

struct Slot<T> {
    value: Option<T>,
    generation: u32,
}

/// Fixed-capacity pool of `T` with generation-checked keys.
///
/// All slots are pre-allocated; insert and remove are O(1) and never touch
/// the heap. Not thread-safe - one pool per owning thread.
pub struct SlotPool<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> SlotPool<T> {
    /// Creates a pool with `capacity` pre-allocated slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or exceeds `u32::MAX`.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "SlotPool capacity must be greater than zero");
        assert!(capacity <= u32::MAX as usize, "SlotPool capacity too large");

        let slots = (0..capacity)
            .map(|_| Slot {
                value: None,
                generation: 0,
            })
            .collect();
        let free = (0..capacity as u32).rev().collect();

        Self {
            slots,
            free,
            live: 0,
        }
    }

    /// Total slot count.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live values.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// True when no values are live.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Stores `value`, returning its key, or `None` when the pool is full.
    ///
    /// A full pool is a degraded-frame condition, not a fault; the caller
    /// decides whether to drop the item or grow elsewhere.
    pub fn insert(&mut self, value: T) -> Option<SlotKey> {
        let index = self.free.pop()?;
        let slot = &mut self.slots[index as usize];
        slot.value = Some(value);
        self.live += 1;
        Some(SlotKey {
            index,
            generation: slot.generation,
        })
    }

    /// Resolves a key, or `None` if the key is stale or was removed.
    #[inline]
    #[must_use]
    pub fn get(&self, key: SlotKey) -> Option<&T> {
        let slot = self.slots.get(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        slot.value.as_ref()
    }

    /// Mutable variant of [`get`](Self::get).
    #[inline]
    pub fn get_mut(&mut self, key: SlotKey) -> Option<&mut T> {
        let slot = self.slots.get_mut(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Removes a value; stale keys return `None`.
    ///
    /// The slot's generation advances, so any outstanding copies of the key
    /// stop resolving.
    pub fn remove(&mut self, key: SlotKey) -> Option<T> {
        let slot = self.slots.get_mut(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);
        self.live -= 1;
        Some(value)
    }

    /// Removes every live value, invalidating all outstanding keys.
    ///
    /// Memory is retained; the pool is immediately reusable for the next
    /// frame.
    pub fn clear(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(index as u32);
        }
        self.free.reverse();
        self.live = 0;
    }

    /// Iterates over live values with their keys.
    pub fn iter(&self) -> impl Iterator<Item = (SlotKey, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    SlotKey {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }
}
