//! # Strata Core
//!
//! Thread-agnostic primitives for the strata scene-graph engine.
//!
//! ## Threading Model
//!
//! ```text
//! ┌─────────────┐  messages   ┌─────────────┐  render items  ┌─────────────┐
//! │ Event thread│────────────>│Update thread│───────────────>│Render thread│
//! │  (handles)  │<────────────│   (tick)    │<───────────────│ (controller)│
//! └─────────────┘ completions └─────────────┘  post-process  └─────────────┘
//! ```
//!
//! Three cooperating threads, not a pool. Every mutable scene value is held
//! twice; a single atomic index says which copy the update thread is writing
//! this frame. All other cross-thread traffic goes through the message queue
//! (event->update), the completion channel (update->event) or the
//! post-process request list (render->update). Nothing is shared raw.
//!
//! ## Modules
//!
//! - `sync`: buffer indices, the frame clock, `DoubleBuffered<T>`
//! - `messaging`: the event->update message queue
//! - `post_process`: the render->update resource request list
//! - `memory`: generation-checked slot pools
//! - `math`: minimal vector/matrix types for transforms

pub mod math;
pub mod memory;
pub mod messaging;
pub mod post_process;
pub mod sync;

pub use math::{Matrix4, Vec3};
pub use memory::{SlotKey, SlotPool};
pub use messaging::{Message, MessageQueue, MessageSender};
pub use post_process::{
    PostProcessAction, ResourceId, ResourcePostProcess, ResourcePostProcessQueue,
};
pub use sync::{
    traced_lock, BufferRole, DoubleBuffered, EventBufferIndex, FrameClock, UpdateBufferIndex,
};
