//! # Strata Scene
//!
//! The update-thread half of the engine: a single-owner node tree with
//! double-buffered properties, advanced once per frame by the update
//! manager's strictly ordered tick.
//!
//! ## Tick Order
//!
//! ```text
//! DrainMessages → ApplyPostProcess → ResetProperties → Animate
//!     → ApplyConstraints → BuildRenderItems → SwapBuffers → Notify
//! ```
//!
//! No state may observe the next frame's event-buffer writes; messages
//! posted after a tick's drain wait for the next tick. `ResetProperties`
//! must run before `Animate`: it restores every animated-this-frame-only
//! property to its base value so active animations re-apply from a clean
//! slate instead of compounding across frames.

pub mod animation;
pub mod node;
pub mod notification;
pub mod property;
pub mod render_item;
pub mod update_manager;

pub use animation::{
    AnimationId, Animator, Constraint, InterpolatorRegistry, PropertyValue, SceneError, ValueKind,
};
pub use node::{Node, NodeId, NodeIdPool, SceneGraph, StageEvent};
pub use notification::{notification_channel, Notification, NotificationPump, NotificationSender};
pub use property::{AnimatableProperty, PropertyKind, ResetterContext, ResetterHandle};
pub use render_item::{RenderFrame, RenderItem};
pub use update_manager::{
    FrameStats, ResourceBookkeeping, UpdateManager, UpdateManagerConfig, UpdateScene, UpdateStatus,
};
