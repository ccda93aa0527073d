//! Buffer indices and the atomic frame clock.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Index of the buffer slot the update thread writes this frame.
///
/// Obtained from [`FrameClock::update_index`]. Holding one of these is the
/// capability to mutate double-buffered state; only the update thread should
/// ever hold one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateBufferIndex(pub(crate) usize);

/// Index of the buffer slot the event and render roles read this frame.
///
/// Always the complement of the live [`UpdateBufferIndex`]. Grants read-only
/// access to double-buffered state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventBufferIndex(pub(crate) usize);

/// Common read capability of the two index types.
pub trait BufferRole: Copy {
    /// The raw slot (0 or 1) this role addresses.
    fn slot(self) -> usize;
}

impl BufferRole for UpdateBufferIndex {
    #[inline]
    fn slot(self) -> usize {
        self.0
    }
}

impl BufferRole for EventBufferIndex {
    #[inline]
    fn slot(self) -> usize {
        self.0
    }
}

impl UpdateBufferIndex {
    /// Raw slot value, for stats/debug output only.
    #[inline]
    #[must_use]
    pub fn raw(self) -> usize {
        self.0
    }
}

impl EventBufferIndex {
    /// Raw slot value, for stats/debug output only.
    #[inline]
    #[must_use]
    pub fn raw(self) -> usize {
        self.0
    }
}

/// The process-wide buffer toggle.
///
/// Holds a single atomic slot selector. The update index is the stored
/// value; the event index is its complement, so the two always differ by
/// exactly one (XOR). [`swap`](Self::swap) toggles the selector with one
/// `fetch_xor` - no lock is involved. Correctness rests on the frame
/// protocol: within one frame only one thread is live for a given role, and
/// the swap happens exactly once, from the update thread, after the tick.
///
/// The clock carries a frame-sequence counter so a double swap for the same
/// frame (or a swap racing another swap) fails loudly instead of silently
/// corrupting which copy is live.
pub struct FrameClock {
    /// Slot currently written by the update thread (0 or 1).
    update_slot: AtomicUsize,
    /// Number of completed swaps (= completed frames).
    frame: AtomicU64,
    /// Guard against concurrent swaps.
    swapping: AtomicBool,
}

impl FrameClock {
    /// Creates a clock at frame 0, update role writing slot 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            update_slot: AtomicUsize::new(0),
            frame: AtomicU64::new(0),
            swapping: AtomicBool::new(false),
        }
    }

    /// Returns the index the update thread writes this frame.
    #[inline]
    #[must_use]
    pub fn update_index(&self) -> UpdateBufferIndex {
        UpdateBufferIndex(self.update_slot.load(Ordering::Acquire))
    }

    /// Returns the index the event/render roles read this frame.
    ///
    /// Always the complement of [`update_index`](Self::update_index).
    #[inline]
    #[must_use]
    pub fn event_index(&self) -> EventBufferIndex {
        EventBufferIndex(self.update_slot.load(Ordering::Acquire) ^ 1)
    }

    /// Returns the number of completed frames.
    #[inline]
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame.load(Ordering::Acquire)
    }

    /// Toggles the buffer roles at the end of a completed update tick.
    ///
    /// `frame` is the tick sequence number of the frame being completed;
    /// it must be exactly one past the number of already-completed frames.
    /// Calling `swap` twice for the same tick, skipping a tick, or swapping
    /// from two threads concurrently is a programming error.
    ///
    /// # Panics
    ///
    /// Panics if another swap is in flight, or if `frame` is out of
    /// sequence.
    pub fn swap(&self, frame: u64) {
        let was_swapping = self.swapping.swap(true, Ordering::AcqRel);
        assert!(!was_swapping, "FrameClock::swap called concurrently");

        let completed = self.frame.load(Ordering::Acquire);
        assert_eq!(
            frame,
            completed + 1,
            "FrameClock::swap out of sequence: completing frame {frame} after {completed}"
        );

        self.update_slot.fetch_xor(1, Ordering::AcqRel);
        self.frame.store(frame, Ordering::Release);
        self.swapping.store(false, Ordering::Release);
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
