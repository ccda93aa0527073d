//! # Double-Buffered Frame State
//!
//! ## The Problem
//!
//! ```text
//! Update thread: WRITE frame N's property values
//! Event/Render:  READ a stable snapshot at the same time
//!
//! Without synchronization: torn frames
//! With a mutex per value:  contention on every property
//! ```
//!
//! ## The Solution
//!
//! Every mutable scene value is an array of exactly two copies. One atomic
//! index selects the copy the update thread writes; the complement is the
//! stable copy the event and render roles read. Once per completed tick the
//! index is toggled with a single `fetch_xor`.
//!
//! The indices are distinct types, so a function holding only an
//! [`EventBufferIndex`] cannot obtain `&mut` access to anything - cross-role
//! writes do not compile.

mod buffer_index;
mod double_buffered;

pub use buffer_index::{BufferRole, EventBufferIndex, FrameClock, UpdateBufferIndex};
pub use double_buffered::DoubleBuffered;

use parking_lot::{Mutex, MutexGuard};

/// Locks `mutex`, emitting the acquisition order at `trace!` level.
///
/// The few cross-thread locks in the engine are leaf locks; tracing their
/// order makes a violation of that rule visible in a capture.
pub fn traced_lock<'a, T>(name: &'static str, mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
    tracing::trace!(lock = name, "acquiring");
    let guard = mutex.lock();
    tracing::trace!(lock = name, "held");
    guard
}
