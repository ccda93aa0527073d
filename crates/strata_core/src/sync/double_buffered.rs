//! Generic two-slot value storage.

use super::buffer_index::{BufferRole, UpdateBufferIndex};

/// A value held once per buffer slot.
///
/// Reads are allowed through either role index; the only mutator takes an
/// [`UpdateBufferIndex`], so event-role code cannot write even by accident.
///
/// ## Aging
///
/// After a swap the new update slot holds the value from two frames ago,
/// not last frame's. Code that writes a value and expects it to persist must
/// either write both slots ([`set_both`](Self::set_both), used when baking a
/// property) or re-write every frame (animators do, resetters cover the
/// frame after they stop).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DoubleBuffered<T> {
    values: [T; 2],
}

impl<T: Copy> DoubleBuffered<T> {
    /// Creates storage with both slots set to `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            values: [initial; 2],
        }
    }

    /// Reads the slot addressed by the given role.
    #[inline]
    pub fn get<I: BufferRole>(&self, index: I) -> &T {
        &self.values[index.slot()]
    }

    /// Mutably borrows the update slot. Update role only.
    #[inline]
    pub fn get_mut(&mut self, index: UpdateBufferIndex) -> &mut T {
        &mut self.values[index.slot()]
    }

    /// Writes `value` into both slots.
    ///
    /// Used for baked (non-animated) writes that must survive the next swap.
    #[inline]
    pub fn set_both(&mut self, value: T) {
        self.values = [value; 2];
    }
}
