//! Per-frame render output records.

use strata_core::math::Matrix4;

use crate::node::NodeId;

/// One renderable produced by the update tick.
///
/// Transient: rebuilt fresh every frame inside a generation-checked slot
/// pool. A render item is addressed by its pool key within the frame and
/// copied out for the render thread - never referenced by raw pointer
/// across a frame boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderItem {
    /// Node the item renders.
    pub node: NodeId,
    /// Resolved model-view matrix for the frame.
    pub model_view: Matrix4,
    /// Sort depth (world-space z).
    pub depth: f32,
    /// Resolved opacity.
    pub opacity: f32,
}

/// The update tick's complete output for one frame, handed to the render
/// thread by value.
#[derive(Debug, Default)]
pub struct RenderFrame {
    /// Frame sequence number the items were produced for.
    pub frame: u64,
    /// Items in back-to-front depth order.
    pub items: Vec<RenderItem>,
}
