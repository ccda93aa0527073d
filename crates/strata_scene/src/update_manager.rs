//! # Update Manager
//!
//! The update thread's single entry point. Each call to
//! [`UpdateManager::update`] runs one strictly ordered tick over the
//! [`UpdateScene`]:
//!
//! ```text
//! DrainMessages → ApplyPostProcess → ResetProperties → Animate
//!     → ApplyConstraints → BuildRenderItems → SwapBuffers → Notify
//! ```
//!
//! Everything the event thread wants changed arrives as a message and is
//! applied at the head of the tick, so the scene is internally consistent
//! for the rest of the frame. Buffers swap only after render items are
//! built, and completion notifications leave only after the swap: by the
//! time the event thread hears about a finished animation, its final value
//! is readable through the event buffer index.

use std::collections::HashSet;
use std::mem;
use std::sync::Arc;

use strata_core::memory::{SlotKey, SlotPool};
use strata_core::messaging::{MessageQueue, MessageSender};
use strata_core::post_process::{
    PostProcessAction, ResourceId, ResourcePostProcess, ResourcePostProcessQueue,
};
use strata_core::sync::{FrameClock, UpdateBufferIndex};

use crate::animation::{
    AnimationId, Animator, AnimatorState, Constraint, InterpolatorRegistry, PropertyValue,
    SceneError,
};
use crate::node::{Node, NodeId, SceneGraph};
use crate::notification::{Notification, NotificationSender};
use crate::property::{PropertyKind, ResetterContext};
use crate::render_item::{RenderFrame, RenderItem};

/// Capacities for the update-side preallocated storage.
#[derive(Clone, Copy, Debug)]
pub struct UpdateManagerConfig {
    /// Node slots in the scene graph.
    pub node_capacity: usize,
    /// Render item slots per frame.
    pub render_item_capacity: usize,
}

impl Default for UpdateManagerConfig {
    fn default() -> Self {
        Self {
            node_capacity: 1024,
            render_item_capacity: 1024,
        }
    }
}

/// Per-tick counters, reset every frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Tick sequence number of the completed frame.
    pub frame: u64,
    /// Messages drained and applied.
    pub messages_applied: usize,
    /// Resource post-process requests applied.
    pub post_process_applied: usize,
    /// Properties restored to their base value.
    pub properties_reset: usize,
    /// Animators that advanced this tick.
    pub animators_active: usize,
    /// Constraints evaluated without error.
    pub constraints_applied: usize,
    /// Render items emitted.
    pub render_items: usize,
}

/// Result of one update tick.
#[derive(Clone, Copy, Debug)]
pub struct UpdateStatus {
    /// Whether another tick is already known to have work (animators still
    /// playing, messages pending, or discards awaiting finalization).
    pub keep_updating: bool,
    /// Counters for the completed tick.
    pub stats: FrameStats,
}

/// Update-side record of which GPU resources are uploaded and saved.
///
/// Fed from the render thread through the post-process queue; the update
/// thread uses it to decide whether dependent work (a texture set, a
/// framebuffer) can proceed.
#[derive(Default)]
pub struct ResourceBookkeeping {
    uploaded: HashSet<ResourceId>,
    saved: HashSet<ResourceId>,
}

impl ResourceBookkeeping {
    /// Creates empty bookkeeping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one drained post-process request.
    pub fn apply(&mut self, request: &ResourcePostProcess) {
        match request.action {
            PostProcessAction::Uploaded => {
                self.uploaded.insert(request.id);
            }
            PostProcessAction::Save => {
                // A save for a never-uploaded resource is a render-side
                // ordering bug; record nothing rather than lie.
                if self.uploaded.contains(&request.id) {
                    self.saved.insert(request.id);
                } else {
                    tracing::warn!(id = request.id.0, "save reported before upload; ignored");
                }
            }
            PostProcessAction::Deleted => {
                self.uploaded.remove(&request.id);
                self.saved.remove(&request.id);
            }
        }
    }

    /// Whether the resource's data reached the device.
    #[must_use]
    pub fn is_uploaded(&self, id: ResourceId) -> bool {
        self.uploaded.contains(&id)
    }

    /// Whether the resource's contents were saved back.
    #[must_use]
    pub fn is_saved(&self, id: ResourceId) -> bool {
        self.saved.contains(&id)
    }
}

/// Everything a message may mutate: the graph plus the animation state
/// around it.
///
/// Messages receive `&mut UpdateScene`, so a single posted closure can
/// create a node, parent it, and start an animation on it atomically with
/// respect to the tick.
pub struct UpdateScene {
    /// The node tree.
    pub graph: SceneGraph,
    resetters: ResetterContext,
    interpolators: InterpolatorRegistry,
    animators: Vec<Animator>,
    constraints: Vec<Constraint>,
    pending_notifications: Vec<Notification>,
}

impl UpdateScene {
    fn new(node_capacity: usize) -> Self {
        Self {
            graph: SceneGraph::new(node_capacity),
            resetters: ResetterContext::new(),
            interpolators: InterpolatorRegistry::with_defaults(),
            animators: Vec::new(),
            constraints: Vec::new(),
            pending_notifications: Vec::new(),
        }
    }

    /// Registers an animator over one property of one node.
    ///
    /// The property is registered for per-frame resets for as long as the
    /// animator lives (plus the two retirement ticks that age out both
    /// buffer slots). Endpoint kinds must agree; everything else is
    /// validated per tick so a dying node never sinks the frame.
    ///
    /// A new animation takes over the property: any earlier animator for
    /// the same (node, property) pair, playing or retiring, is dropped
    /// without a completion notification, and its resetter with it.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::MismatchedEndpoints`] when `from` and `to`
    /// carry different value kinds.
    pub fn start_animation(
        &mut self,
        id: AnimationId,
        node: NodeId,
        property: PropertyKind,
        from: PropertyValue,
        to: PropertyValue,
        duration_frames: u32,
    ) -> Result<(), SceneError> {
        if from.kind() != to.kind() {
            return Err(SceneError::MismatchedEndpoints);
        }
        self.animators.retain(|a| {
            let replaced = a.node == node && a.property == property;
            if replaced {
                tracing::debug!(
                    animation = a.id.0,
                    node = node.index(),
                    "animation replaced by a newer one on the same property"
                );
            }
            !replaced
        });
        let resetter = self.resetters.register(node, property);
        self.animators.push(Animator {
            id,
            node,
            property,
            from,
            to,
            duration_frames,
            elapsed_frames: 0,
            state: AnimatorState::Playing,
            _resetter: resetter,
        });
        tracing::debug!(animation = id.0, node = node.index(), "animation started");
        Ok(())
    }

    /// Registers a constraint, evaluated every tick after animations.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Animators still registered (playing or retiring).
    #[must_use]
    pub fn animator_count(&self) -> usize {
        self.animators.len()
    }
}

/// Writes an interpolated value into the matching property slot.
fn apply_animated_value(
    node: &mut Node,
    kind: PropertyKind,
    value: PropertyValue,
    index: UpdateBufferIndex,
) -> Result<(), SceneError> {
    match (kind, value) {
        (PropertyKind::Position, PropertyValue::Vector3(v)) => node.position.set_animated(index, v),
        (PropertyKind::Scale, PropertyValue::Vector3(v)) => node.scale.set_animated(index, v),
        (PropertyKind::Opacity, PropertyValue::Float(f)) => node.opacity.set_animated(index, f),
        (kind, value) => {
            return Err(SceneError::WrongValueType {
                kind,
                value: value.kind(),
            })
        }
    }
    Ok(())
}

/// Owns the scene and drives the per-frame tick.
pub struct UpdateManager {
    clock: Arc<FrameClock>,
    queue: MessageQueue<UpdateScene>,
    scene: UpdateScene,
    post_process: Arc<ResourcePostProcessQueue>,
    resources: ResourceBookkeeping,
    notifier: NotificationSender,
    render_items: SlotPool<RenderItem>,
    draw_order: Vec<SlotKey>,
    frame: u64,
}

impl UpdateManager {
    /// Creates the manager around shared synchronization primitives.
    #[must_use]
    pub fn new(
        config: UpdateManagerConfig,
        clock: Arc<FrameClock>,
        post_process: Arc<ResourcePostProcessQueue>,
        notifier: NotificationSender,
    ) -> Self {
        Self {
            clock,
            queue: MessageQueue::new(),
            scene: UpdateScene::new(config.node_capacity),
            post_process,
            resources: ResourceBookkeeping::new(),
            notifier,
            render_items: SlotPool::with_capacity(config.render_item_capacity),
            draw_order: Vec::with_capacity(config.render_item_capacity),
            frame: 0,
        }
    }

    /// A cloneable handle the event thread posts messages through.
    #[must_use]
    pub fn message_sender(&self) -> MessageSender<UpdateScene> {
        self.queue.sender()
    }

    /// The scene, for update-thread-local inspection.
    #[must_use]
    pub fn scene(&self) -> &UpdateScene {
        &self.scene
    }

    /// Mutable scene access for update-thread-local setup.
    pub fn scene_mut(&mut self) -> &mut UpdateScene {
        &mut self.scene
    }

    /// Resource bookkeeping as of the last tick.
    #[must_use]
    pub fn resources(&self) -> &ResourceBookkeeping {
        &self.resources
    }

    /// Completed frame count.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Runs one full tick and completes the frame.
    pub fn update(&mut self) -> UpdateStatus {
        let index = self.clock.update_index();
        self.frame += 1;
        let mut stats = FrameStats {
            frame: self.frame,
            ..FrameStats::default()
        };

        stats.messages_applied = self.queue.drain_and_apply(&mut self.scene, index);
        stats.post_process_applied = self.apply_post_process();
        stats.properties_reset = self.reset_properties(index);
        stats.animators_active = self.animate(index);
        stats.constraints_applied = self.apply_constraints(index);
        stats.render_items = self.build_render_items(index);

        for destroyed in self.scene.graph.process_discards() {
            self.scene
                .pending_notifications
                .push(Notification::NodeDestroyed { node: destroyed });
        }

        let keep_updating = !self.scene.animators.is_empty()
            || self.queue.pending() > 0
            || self.scene.graph.pending_discards() > 0;

        self.clock.swap(self.frame);
        self.notifier
            .send_batch(mem::take(&mut self.scene.pending_notifications));

        tracing::trace!(
            frame = stats.frame,
            messages = stats.messages_applied,
            items = stats.render_items,
            "tick complete"
        );
        UpdateStatus {
            keep_updating,
            stats,
        }
    }

    /// Snapshot of the items built by the last tick, in draw order.
    #[must_use]
    pub fn take_render_frame(&self) -> RenderFrame {
        let items = self
            .draw_order
            .iter()
            .filter_map(|key| self.render_items.get(*key).copied())
            .collect();
        RenderFrame {
            frame: self.frame,
            items,
        }
    }

    fn apply_post_process(&mut self) -> usize {
        let drained = self.post_process.drain();
        for request in &drained {
            self.resources.apply(request);
        }
        drained.len()
    }

    /// Restores every registered animated property to its base value.
    ///
    /// Must precede `animate`: active animators re-apply on top of a clean
    /// slate, and retired ones leave nothing behind once their resetter
    /// has covered both buffer slots.
    fn reset_properties(&mut self, index: UpdateBufferIndex) -> usize {
        let mut reset = 0;
        for entry in self.scene.resetters.snapshot() {
            if self.scene.graph.reset_property(entry.node, entry.property, index) {
                reset += 1;
            }
        }
        reset
    }

    fn animate(&mut self, index: UpdateBufferIndex) -> usize {
        let UpdateScene {
            graph,
            interpolators,
            animators,
            pending_notifications,
            ..
        } = &mut self.scene;

        let mut active = 0;
        for animator in animators.iter_mut() {
            match animator.state {
                AnimatorState::Playing => {
                    let Some(node) = graph.get_mut(animator.node) else {
                        // Target died mid-flight; retire without notifying.
                        animator.state = AnimatorState::Retiring { age: 0 };
                        continue;
                    };
                    animator.elapsed_frames += 1;
                    let t = animator.progress();
                    let Some(interpolate) = interpolators.get(animator.from.kind()) else {
                        tracing::error!(
                            animation = animator.id.0,
                            "{}",
                            SceneError::MissingInterpolator(animator.from.kind())
                        );
                        animator.state = AnimatorState::Retiring { age: 0 };
                        continue;
                    };
                    let value = interpolate(animator.from, animator.to, t);
                    if let Err(error) =
                        apply_animated_value(node, animator.property, value, index)
                    {
                        tracing::error!(animation = animator.id.0, "{error}");
                        animator.state = AnimatorState::Retiring { age: 0 };
                        continue;
                    }
                    active += 1;
                    if animator.elapsed_frames >= animator.duration_frames {
                        animator.state = AnimatorState::Retiring { age: 0 };
                        pending_notifications.push(Notification::AnimationFinished {
                            animation: animator.id,
                        });
                    }
                }
                AnimatorState::Retiring { ref mut age } => {
                    *age += 1;
                }
            }
        }
        // Two retirement ticks keep the resetter alive over both slots.
        animators.retain(|a| !matches!(a.state, AnimatorState::Retiring { age } if age >= 2));
        active
    }

    /// Evaluates constraints, isolating each failure to its node.
    fn apply_constraints(&mut self, index: UpdateBufferIndex) -> usize {
        let UpdateScene {
            graph, constraints, ..
        } = &mut self.scene;

        let mut applied = 0;
        for constraint in constraints.iter_mut() {
            let Some(node) = graph.get_mut(constraint.node) else {
                continue;
            };
            match (constraint.apply)(node, index) {
                Ok(()) => applied += 1,
                Err(error) => {
                    tracing::error!(node = constraint.node.index(), "constraint failed: {error}");
                }
            }
        }
        constraints.retain(|c| graph.is_alive(c.node));
        applied
    }

    fn build_render_items(&mut self, index: UpdateBufferIndex) -> usize {
        self.scene.graph.update_world_matrices(index);
        self.render_items.clear();
        self.draw_order.clear();

        let pool = &mut self.render_items;
        let mut order: Vec<(SlotKey, f32, u32)> = Vec::new();
        self.scene.graph.for_each_on_stage(|node| {
            if !node.visible {
                return;
            }
            let world = *node.world_matrix(index);
            let item = RenderItem {
                node: node.id(),
                model_view: world,
                depth: world.translation().z,
                opacity: *node.opacity.get(index),
            };
            match pool.insert(item) {
                Some(key) => order.push((key, item.depth, node.id().index())),
                None => {
                    tracing::warn!(node = node.id().index(), "render item pool full; dropped");
                }
            }
        });

        // Back-to-front by depth, node index as the stable tie-break.
        order.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.2.cmp(&b.2)));
        self.draw_order.extend(order.into_iter().map(|(key, _, _)| key));
        self.draw_order.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::math::Vec3;

    fn manager() -> (UpdateManager, crate::notification::NotificationPump) {
        let clock = Arc::new(FrameClock::new());
        let post_process = Arc::new(ResourcePostProcessQueue::new());
        let (notifier, pump) = crate::notification::notification_channel(64);
        let config = UpdateManagerConfig {
            node_capacity: 32,
            render_item_capacity: 32,
        };
        (
            UpdateManager::new(config, clock, post_process, notifier),
            pump,
        )
    }

    fn spawn_staged_node(manager: &mut UpdateManager) -> NodeId {
        let id = manager.scene().graph.id_pool().reserve().unwrap();
        let scene = manager.scene_mut();
        scene.graph.create_node(id);
        scene.graph.connect_to_stage(id);
        id
    }

    #[test]
    fn test_messages_apply_exactly_once_in_order() {
        let (mut manager, _pump) = manager();
        let node = spawn_staged_node(&mut manager);
        let sender = manager.message_sender();

        sender.post(Box::new(move |scene: &mut UpdateScene, _| {
            scene
                .graph
                .get_mut(node)
                .unwrap()
                .position
                .bake(Vec3::new(1.0, 0.0, 0.0));
        }));
        sender.post(Box::new(move |scene: &mut UpdateScene, _| {
            scene
                .graph
                .get_mut(node)
                .unwrap()
                .position
                .bake(Vec3::new(2.0, 0.0, 0.0));
        }));

        let status = manager.update();
        assert_eq!(status.stats.messages_applied, 2);
        assert_eq!(
            manager.scene().graph.get(node).unwrap().position.base(),
            Vec3::new(2.0, 0.0, 0.0)
        );

        // Nothing left to re-apply.
        assert_eq!(manager.update().stats.messages_applied, 0);
    }

    #[test]
    fn test_tick_boundary_isolates_the_stale_snapshot() {
        let (mut manager, _pump) = manager();
        let node = spawn_staged_node(&mut manager);
        let clock = Arc::clone(&manager.clock);
        let sender = manager.message_sender();

        sender.post(Box::new(move |scene: &mut UpdateScene, index| {
            let n = scene.graph.get_mut(node).unwrap();
            n.position.set_animated(index, Vec3::new(1.0, 1.0, 1.0));
        }));
        sender.post(Box::new(move |scene: &mut UpdateScene, index| {
            let n = scene.graph.get_mut(node).unwrap();
            n.scale.set_animated(index, Vec3::new(2.0, 2.0, 2.0));
        }));
        sender.post(Box::new(move |scene: &mut UpdateScene, index| {
            let n = scene.graph.get_mut(node).unwrap();
            n.opacity.set_animated(index, 0.25);
        }));

        let stale = clock.event_index();
        let status = manager.update();
        assert_eq!(status.stats.messages_applied, 3);

        // After the swap the event role reads the freshly written slot.
        let n = manager.scene().graph.get(node).unwrap();
        assert_eq!(*n.position.get(clock.event_index()), Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(*n.scale.get(clock.event_index()), Vec3::new(2.0, 2.0, 2.0));
        assert_eq!(*n.opacity.get(clock.event_index()), 0.25);

        // The slot that was the event snapshot during the tick never saw
        // the writes; it is now the update slot for the next frame.
        assert_eq!(stale.raw(), clock.update_index().raw());
        assert_eq!(*n.position.get(clock.update_index()), Vec3::ZERO);
        assert_eq!(*n.scale.get(clock.update_index()), Vec3::ONE);
        assert_eq!(*n.opacity.get(clock.update_index()), 1.0);
    }

    #[test]
    fn test_animation_writes_then_resets_after_finish() {
        let (mut manager, pump) = manager();
        let node = spawn_staged_node(&mut manager);

        manager
            .scene_mut()
            .start_animation(
                AnimationId(7),
                node,
                PropertyKind::Opacity,
                PropertyValue::Float(1.0),
                PropertyValue::Float(0.0),
                2,
            )
            .unwrap();

        // Frame 1: halfway.
        let index = manager.clock.update_index();
        manager.update();
        assert!(
            (*manager.scene().graph.get(node).unwrap().opacity.get(index) - 0.5).abs() < 1e-6
        );

        // Frame 2: finished, notification sent after the swap.
        manager.update();
        assert_eq!(
            pump.pump(),
            vec![Notification::AnimationFinished {
                animation: AnimationId(7)
            }]
        );

        // Two more frames age out the resetter; both slots are back at base.
        manager.update();
        manager.update();
        assert_eq!(manager.scene().animator_count(), 0);
        let clock = Arc::clone(&manager.clock);
        assert_eq!(
            *manager
                .scene()
                .graph
                .get(node)
                .unwrap()
                .opacity
                .get(clock.update_index()),
            1.0
        );
        assert_eq!(
            *manager
                .scene()
                .graph
                .get(node)
                .unwrap()
                .opacity
                .get(clock.event_index()),
            1.0
        );
    }

    #[test]
    fn test_restarted_animation_takes_over_the_property() {
        let (mut manager, pump) = manager();
        let node = spawn_staged_node(&mut manager);
        let sender = manager.message_sender();

        // An app restarting a fade posts twice before the next tick; both
        // land in the same drain.
        for (id, to, frames) in [(1, 0.0, 4), (2, 0.5, 2)] {
            sender.post(Box::new(move |scene: &mut UpdateScene, _| {
                scene
                    .start_animation(
                        AnimationId(id),
                        node,
                        PropertyKind::Opacity,
                        PropertyValue::Float(1.0),
                        PropertyValue::Float(to),
                        frames,
                    )
                    .unwrap();
            }));
        }

        let index = manager.clock.update_index();
        let status = manager.update();
        assert_eq!(status.stats.messages_applied, 2);
        assert_eq!(manager.scene().animator_count(), 1);

        // Only the replacement advances: frame 1 of 2 toward 0.5.
        let opacity = *manager.scene().graph.get(node).unwrap().opacity.get(index);
        assert!((opacity - 0.75).abs() < 1e-6);

        // The replaced animation never reports completion.
        manager.update();
        assert_eq!(
            pump.pump(),
            vec![Notification::AnimationFinished {
                animation: AnimationId(2)
            }]
        );
    }

    #[test]
    fn test_retiring_animator_yields_to_a_new_one() {
        let (mut manager, _pump) = manager();
        let node = spawn_staged_node(&mut manager);

        manager
            .scene_mut()
            .start_animation(
                AnimationId(1),
                node,
                PropertyKind::Opacity,
                PropertyValue::Float(1.0),
                PropertyValue::Float(0.0),
                1,
            )
            .unwrap();
        // Finishes on the first tick; the animator is still retiring.
        manager.update();
        assert_eq!(manager.scene().animator_count(), 1);

        manager
            .scene_mut()
            .start_animation(
                AnimationId(2),
                node,
                PropertyKind::Opacity,
                PropertyValue::Float(1.0),
                PropertyValue::Float(0.5),
                4,
            )
            .unwrap();
        assert_eq!(manager.scene().animator_count(), 1);
    }

    #[test]
    fn test_constraint_error_isolated_to_its_node() {
        let (mut manager, _pump) = manager();
        let faulty = spawn_staged_node(&mut manager);
        let healthy = spawn_staged_node(&mut manager);

        let scene = manager.scene_mut();
        scene.add_constraint(Constraint::new(
            faulty,
            Box::new(|_, _| Err(SceneError::Constraint("bad input".into()))),
        ));
        scene.add_constraint(Constraint::new(
            healthy,
            Box::new(|node, index| {
                node.position.set_animated(index, Vec3::new(5.0, 0.0, 0.0));
                Ok(())
            }),
        ));

        let index = manager.clock.update_index();
        let status = manager.update();
        assert_eq!(status.stats.constraints_applied, 1);
        assert_eq!(
            *manager.scene().graph.get(healthy).unwrap().position.get(index),
            Vec3::new(5.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_render_items_sorted_back_to_front() {
        let (mut manager, _pump) = manager();
        let near = spawn_staged_node(&mut manager);
        let far = spawn_staged_node(&mut manager);

        let scene = manager.scene_mut();
        scene
            .graph
            .get_mut(near)
            .unwrap()
            .position
            .bake(Vec3::new(0.0, 0.0, 1.0));
        scene
            .graph
            .get_mut(far)
            .unwrap()
            .position
            .bake(Vec3::new(0.0, 0.0, -3.0));

        manager.update();
        let frame = manager.take_render_frame();
        assert_eq!(frame.items.len(), 2);
        assert_eq!(frame.items[0].node, far);
        assert_eq!(frame.items[1].node, near);
    }

    #[test]
    fn test_invisible_nodes_emit_no_items() {
        let (mut manager, _pump) = manager();
        let node = spawn_staged_node(&mut manager);
        manager.scene_mut().graph.get_mut(node).unwrap().visible = false;

        let status = manager.update();
        assert_eq!(status.stats.render_items, 0);
        assert!(manager.take_render_frame().items.is_empty());
    }

    #[test]
    fn test_node_destroyed_notification_after_two_ticks() {
        let (mut manager, pump) = manager();
        let node = spawn_staged_node(&mut manager);

        manager.scene_mut().graph.remove(node);
        manager.update();
        assert!(pump.pump().is_empty());
        manager.update();
        assert_eq!(pump.pump(), vec![Notification::NodeDestroyed { node }]);
    }

    #[test]
    fn test_post_process_feeds_bookkeeping() {
        let (mut manager, _pump) = manager();
        let id = ResourceId(9);
        manager.post_process.post(ResourcePostProcess {
            id,
            action: PostProcessAction::Uploaded,
        });
        manager.post_process.post(ResourcePostProcess {
            id,
            action: PostProcessAction::Save,
        });

        let status = manager.update();
        assert_eq!(status.stats.post_process_applied, 2);
        assert!(manager.resources().is_uploaded(id));
        assert!(manager.resources().is_saved(id));
    }

    #[test]
    fn test_keep_updating_tracks_outstanding_work() {
        let (mut manager, _pump) = manager();
        assert!(!manager.update().keep_updating);

        let node = spawn_staged_node(&mut manager);
        manager
            .scene_mut()
            .start_animation(
                AnimationId(1),
                node,
                PropertyKind::Opacity,
                PropertyValue::Float(1.0),
                PropertyValue::Float(0.0),
                4,
            )
            .unwrap();
        assert!(manager.update().keep_updating);
    }
}
