//! # Animatable Properties and Resetters
//!
//! An animated write is transient: it lands in the current update slot only
//! and must be restored to the property's base value before the next
//! frame's animation pass, or values would compound across frames. The
//! [`ResetterContext`] holds the set of properties needing that restore.
//!
//! Because state is double-buffered, one animated write dirties *two*
//! frames' worth of slots; the needs-reset flag is a two-count that the
//! reset pass decrements once per frame.

use std::sync::Arc;

use parking_lot::Mutex;

use strata_core::sync::{BufferRole, DoubleBuffered, UpdateBufferIndex};

use crate::node::NodeId;

/// Which animatable property of a node a resetter or animator targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// Local translation.
    Position,
    /// Local scale.
    Scale,
    /// Opacity.
    Opacity,
}

/// A double-buffered value with a base value and a needs-reset count.
#[derive(Clone, Copy, Debug)]
pub struct AnimatableProperty<T: Copy> {
    value: DoubleBuffered<T>,
    base: T,
    needs_reset: u8,
}

impl<T: Copy> AnimatableProperty<T> {
    /// Creates a property with `initial` as both current and base value.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            value: DoubleBuffered::new(initial),
            base: initial,
            needs_reset: 0,
        }
    }

    /// Reads the value for the given buffer role.
    #[inline]
    pub fn get<I: BufferRole>(&self, index: I) -> &T {
        self.value.get(index)
    }

    /// The pre-animation base value.
    #[inline]
    #[must_use]
    pub fn base(&self) -> T {
        self.base
    }

    /// Baked (non-animated) write: becomes the new base, visible in both
    /// slots, and cancels any pending reset.
    pub fn bake(&mut self, value: T) {
        self.value.set_both(value);
        self.base = value;
        self.needs_reset = 0;
    }

    /// Animated write into the current update slot only.
    ///
    /// Arms the reset count for both buffer slots.
    pub fn set_animated(&mut self, index: UpdateBufferIndex, value: T) {
        *self.value.get_mut(index) = value;
        self.needs_reset = 2;
    }

    /// Restores the base value into the update slot if a reset is pending.
    ///
    /// Returns whether a write happened.
    pub fn reset_to_base(&mut self, index: UpdateBufferIndex) -> bool {
        if self.needs_reset == 0 {
            return false;
        }
        *self.value.get_mut(index) = self.base;
        self.needs_reset -= 1;
        true
    }
}

/// One registered reset target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResetterEntry {
    /// Node owning the property.
    pub node: NodeId,
    /// Which property to restore.
    pub property: PropertyKind,
}

struct ResetterSlots {
    entries: Vec<Option<ResetterEntry>>,
}

/// The set of properties restored to base at the start of every tick.
///
/// Explicitly constructed and owned by the update manager - there is no
/// ambient global. Registration hands back a scoped [`ResetterHandle`];
/// dropping the handle unregisters. Registering the same (node, property)
/// pair twice while the first registration is live is a fatal programming
/// error, mirroring the single-registration rule of the reset machinery.
#[derive(Clone)]
pub struct ResetterContext {
    slots: Arc<Mutex<ResetterSlots>>,
}

impl ResetterContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(ResetterSlots {
                entries: Vec::new(),
            })),
        }
    }

    /// Registers a reset target, returning the handle that keeps it live.
    ///
    /// # Panics
    ///
    /// Panics if the same (node, property) pair is already registered.
    #[must_use]
    pub fn register(&self, node: NodeId, property: PropertyKind) -> ResetterHandle {
        let mut slots = self.slots.lock();
        let entry = ResetterEntry { node, property };
        assert!(
            !slots.entries.iter().flatten().any(|e| *e == entry),
            "resetter for node {} / {:?} registered twice",
            node.index(),
            property
        );

        let index = slots.entries.iter().position(Option::is_none);
        let index = match index {
            Some(i) => {
                slots.entries[i] = Some(entry);
                i
            }
            None => {
                slots.entries.push(Some(entry));
                slots.entries.len() - 1
            }
        };
        ResetterHandle {
            slots: Arc::clone(&self.slots),
            index,
        }
    }

    /// Number of live registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().entries.iter().flatten().count()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the registered set, for the reset walk.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ResetterEntry> {
        self.slots.lock().entries.iter().flatten().copied().collect()
    }
}

impl Default for ResetterContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped registration in a [`ResetterContext`]; dropping unregisters.
pub struct ResetterHandle {
    slots: Arc<Mutex<ResetterSlots>>,
    index: usize,
}

impl Drop for ResetterHandle {
    fn drop(&mut self) {
        self.slots.lock().entries[self.index] = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::sync::FrameClock;

    fn node_id_for_test(graph_capacity: usize) -> (crate::node::SceneGraph, NodeId) {
        let mut graph = crate::node::SceneGraph::new(graph_capacity);
        let id = graph.id_pool().reserve().unwrap();
        graph.create_node(id);
        (graph, id)
    }

    #[test]
    fn test_animated_write_resets_over_two_frames() {
        let clock = FrameClock::new();
        let mut prop = AnimatableProperty::new(10.0f32);

        prop.set_animated(clock.update_index(), 99.0);
        clock.swap(1);

        // Frame 2: reset restores the base into the new update slot.
        assert!(prop.reset_to_base(clock.update_index()));
        assert_eq!(*prop.get(clock.update_index()), 10.0);
        clock.swap(2);

        // Frame 3: the other slot still holds the stale animated value
        // until its reset runs.
        assert_eq!(*prop.get(clock.update_index()), 99.0);
        assert!(prop.reset_to_base(clock.update_index()));
        assert_eq!(*prop.get(clock.update_index()), 10.0);

        // Count exhausted: no further writes.
        assert!(!prop.reset_to_base(clock.update_index()));
    }

    #[test]
    fn test_bake_cancels_pending_reset() {
        let clock = FrameClock::new();
        let mut prop = AnimatableProperty::new(1.0f32);
        prop.set_animated(clock.update_index(), 5.0);

        prop.bake(7.0);
        assert!(!prop.reset_to_base(clock.update_index()));
        assert_eq!(*prop.get(clock.update_index()), 7.0);
        assert_eq!(prop.base(), 7.0);
    }

    #[test]
    fn test_handle_drop_unregisters() {
        let (_graph, id) = node_id_for_test(4);
        let ctx = ResetterContext::new();

        let handle = ctx.register(id, PropertyKind::Position);
        assert_eq!(ctx.len(), 1);
        drop(handle);
        assert!(ctx.is_empty());

        // Slot can be re-registered after release.
        let _handle = ctx.register(id, PropertyKind::Position);
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn test_duplicate_registration_panics() {
        let (_graph, id) = node_id_for_test(4);
        let ctx = ResetterContext::new();
        let _first = ctx.register(id, PropertyKind::Opacity);
        let _second = ctx.register(id, PropertyKind::Opacity);
    }
}
