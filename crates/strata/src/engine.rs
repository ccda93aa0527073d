//! # Engine
//!
//! Thread topology and the event-thread facade.
//!
//! ```text
//! caller (event thread)          update thread            render thread
//! ───────────────────────        ─────────────────        ──────────────
//! Engine::create_node ──msg──>   UpdateManager tick ──frame──> Controller
//! Engine::pump_notifications <── completion batch          begin/end frame
//! ```
//!
//! The caller never touches scene state directly: every mutation is a
//! posted message, applied at the head of the next tick. Stopping the
//! engine means not scheduling another tick; the update thread drains out,
//! drops its side of the frame channel, and the render thread follows.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Receiver, Sender};

use strata_core::math::Vec3;
use strata_core::messaging::{Message, MessageSender};
use strata_core::post_process::ResourcePostProcessQueue;
use strata_core::sync::FrameClock;
use strata_graphics::Controller;
use strata_scene::animation::{AnimationId, Constraint, ConstraintFn, PropertyValue};
use strata_scene::node::{NodeId, NodeIdPool};
use strata_scene::notification::{notification_channel, Notification, NotificationPump};
use strata_scene::property::PropertyKind;
use strata_scene::render_item::RenderFrame;
use strata_scene::update_manager::{UpdateManager, UpdateManagerConfig, UpdateScene};

use crate::config::EngineConfig;
use crate::error::EngineError;

/// Per-frame callback on the render thread, between `begin_frame` and
/// `end_frame`.
pub type RenderHook = Box<dyn FnMut(&mut Controller, &RenderFrame) + Send>;

/// The running engine: two worker threads plus the caller's facade.
pub struct Engine {
    clock: Arc<FrameClock>,
    sender: MessageSender<UpdateScene>,
    id_pool: Arc<NodeIdPool>,
    pump: NotificationPump,
    next_animation_id: AtomicU64,
    stop_tx: Option<Sender<()>>,
    update_thread: Option<JoinHandle<()>>,
    render_thread: Option<JoinHandle<()>>,
}

impl Engine {
    /// Starts the engine with a no-op render hook.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for out-of-range
    /// configuration values; no thread is spawned in that case.
    pub fn start(config: EngineConfig) -> Result<Self, EngineError> {
        Self::start_with_render_hook(config, Box::new(|_, _| {}))
    }

    /// Starts the update and render threads.
    ///
    /// `render_hook` runs on the render thread once per received frame,
    /// inside the controller's frame scope.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for out-of-range
    /// configuration values; no thread is spawned in that case.
    pub fn start_with_render_hook(
        config: EngineConfig,
        render_hook: RenderHook,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let clock = Arc::new(FrameClock::new());
        let post_process = Arc::new(ResourcePostProcessQueue::new());
        let (notifier, pump) = notification_channel(config.notification_capacity);

        let manager = UpdateManager::new(
            UpdateManagerConfig {
                node_capacity: config.node_capacity,
                render_item_capacity: config.render_item_capacity,
            },
            Arc::clone(&clock),
            Arc::clone(&post_process),
            notifier,
        );
        let sender = manager.message_sender();
        let id_pool = manager.scene().graph.id_pool();

        let (frame_tx, frame_rx) = bounded::<RenderFrame>(config.render_queue_capacity);
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let tick_interval = Duration::from_secs_f64(1.0 / config.update_hz);
        let update_thread = std::thread::Builder::new()
            .name("strata-update".into())
            .spawn(move || update_loop(manager, &frame_tx, &stop_rx, tick_interval))
            .unwrap_or_else(|e| panic!("failed to spawn update thread: {e}"));

        let memory_budget = config.gpu_memory_budget;
        let render_thread = std::thread::Builder::new()
            .name("strata-render".into())
            .spawn(move || render_loop(memory_budget, post_process, &frame_rx, render_hook))
            .unwrap_or_else(|e| panic!("failed to spawn render thread: {e}"));

        tracing::info!(
            update_hz = config.update_hz,
            nodes = config.node_capacity,
            "engine started"
        );
        Ok(Self {
            clock,
            sender,
            id_pool,
            pump,
            next_animation_id: AtomicU64::new(1),
            stop_tx: Some(stop_tx),
            update_thread: Some(update_thread),
            render_thread: Some(render_thread),
        })
    }

    /// Completed update frames so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.clock.frame()
    }

    /// Posts a raw message for the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunning`] once the update thread is gone.
    pub fn post(&self, message: Message<UpdateScene>) -> Result<(), EngineError> {
        if self.sender.post(message) {
            Ok(())
        } else {
            Err(EngineError::NotRunning)
        }
    }

    /// Reserves an id and schedules the node's creation.
    ///
    /// The id is valid for posting against immediately; the node itself
    /// exists from the next tick on.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NodeCapacityExhausted`] when every slot is in
    /// use, or [`EngineError::NotRunning`] after shutdown.
    pub fn create_node(&self) -> Result<NodeId, EngineError> {
        let id = self
            .id_pool
            .reserve()
            .ok_or(EngineError::NodeCapacityExhausted)?;
        self.post(Box::new(move |scene, _| scene.graph.create_node(id)))?;
        Ok(id)
    }

    /// Schedules `child` to be linked under `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunning`] after shutdown.
    pub fn set_parent(&self, child: NodeId, parent: NodeId) -> Result<(), EngineError> {
        self.post(Box::new(move |scene, _| scene.graph.set_parent(child, parent)))
    }

    /// Schedules `node` to become a stage root.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunning`] after shutdown.
    pub fn connect_to_stage(&self, node: NodeId) -> Result<(), EngineError> {
        self.post(Box::new(move |scene, _| scene.graph.connect_to_stage(node)))
    }

    /// Schedules removal of `node` and its subtree.
    ///
    /// Storage is finalized two ticks later; a `NodeDestroyed` notification
    /// follows through [`pump_notifications`](Self::pump_notifications).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunning`] after shutdown.
    pub fn remove_node(&self, node: NodeId) -> Result<(), EngineError> {
        self.post(Box::new(move |scene, _| scene.graph.remove(node)))
    }

    /// Schedules a baked (non-animated) position write.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunning`] after shutdown.
    pub fn set_node_position(&self, node: NodeId, position: Vec3) -> Result<(), EngineError> {
        self.post(Box::new(move |scene, _| {
            if let Some(n) = scene.graph.get_mut(node) {
                n.position.bake(position);
            }
        }))
    }

    /// Schedules a baked scale write.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunning`] after shutdown.
    pub fn set_node_scale(&self, node: NodeId, scale: Vec3) -> Result<(), EngineError> {
        self.post(Box::new(move |scene, _| {
            if let Some(n) = scene.graph.get_mut(node) {
                n.scale.bake(scale);
            }
        }))
    }

    /// Schedules a baked opacity write.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunning`] after shutdown.
    pub fn set_node_opacity(&self, node: NodeId, opacity: f32) -> Result<(), EngineError> {
        self.post(Box::new(move |scene, _| {
            if let Some(n) = scene.graph.get_mut(node) {
                n.opacity.bake(opacity);
            }
        }))
    }

    /// Schedules a visibility flip.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunning`] after shutdown.
    pub fn set_node_visible(&self, node: NodeId, visible: bool) -> Result<(), EngineError> {
        self.post(Box::new(move |scene, _| {
            if let Some(n) = scene.graph.get_mut(node) {
                n.visible = visible;
            }
        }))
    }

    /// Starts animating `node`'s position from its current base to `to`.
    ///
    /// Completion arrives as `AnimationFinished` through
    /// [`pump_notifications`](Self::pump_notifications).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunning`] after shutdown.
    pub fn animate_position(
        &self,
        node: NodeId,
        to: Vec3,
        duration_frames: u32,
    ) -> Result<AnimationId, EngineError> {
        self.animate(node, PropertyKind::Position, PropertyValue::Vector3(to), duration_frames)
    }

    /// Starts animating `node`'s opacity from its current base to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunning`] after shutdown.
    pub fn animate_opacity(
        &self,
        node: NodeId,
        to: f32,
        duration_frames: u32,
    ) -> Result<AnimationId, EngineError> {
        self.animate(node, PropertyKind::Opacity, PropertyValue::Float(to), duration_frames)
    }

    fn animate(
        &self,
        node: NodeId,
        property: PropertyKind,
        to: PropertyValue,
        duration_frames: u32,
    ) -> Result<AnimationId, EngineError> {
        let id = AnimationId(self.next_animation_id.fetch_add(1, Ordering::Relaxed));
        self.post(Box::new(move |scene, _| {
            let Some(n) = scene.graph.get(node) else {
                tracing::warn!(node = node.index(), "animation target is dead");
                return;
            };
            let from = match property {
                PropertyKind::Position => PropertyValue::Vector3(n.position.base()),
                PropertyKind::Scale => PropertyValue::Vector3(n.scale.base()),
                PropertyKind::Opacity => PropertyValue::Float(n.opacity.base()),
            };
            if let Err(error) =
                scene.start_animation(id, node, property, from, to, duration_frames)
            {
                tracing::warn!(%error, "animation rejected");
            }
        }))?;
        Ok(id)
    }

    /// Registers a constraint evaluated every tick on `node`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunning`] after shutdown.
    pub fn constrain(&self, node: NodeId, apply: ConstraintFn) -> Result<(), EngineError> {
        self.post(Box::new(move |scene, _| {
            scene.add_constraint(Constraint::new(node, apply));
        }))
    }

    /// Delivers every pending completion notification.
    ///
    /// Call from the event thread, outside any of the engine's callbacks.
    #[must_use]
    pub fn pump_notifications(&self) -> Vec<Notification> {
        self.pump.pump()
    }

    /// Stops both threads. Idempotent; also runs on drop.
    pub fn stop(&mut self) {
        // Closing the stop channel ends the update loop; the render loop
        // follows when the frame channel closes behind it.
        if let Some(stop_tx) = self.stop_tx.take() {
            drop(stop_tx);
        }
        if let Some(handle) = self.update_thread.take() {
            if handle.join().is_err() {
                tracing::error!("update thread panicked");
            }
        }
        if let Some(handle) = self.render_thread.take() {
            if handle.join().is_err() {
                tracing::error!("render thread panicked");
            }
        }
        tracing::info!(frames = self.clock.frame(), "engine stopped");
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn update_loop(
    mut manager: UpdateManager,
    frame_tx: &Sender<RenderFrame>,
    stop_rx: &Receiver<()>,
    interval: Duration,
) {
    let ticker = tick(interval);
    loop {
        select! {
            recv(stop_rx) -> _ => break,
            recv(ticker) -> _ => {
                let status = manager.update();
                tracing::trace!(frame = status.stats.frame, "update tick");
                // A stalled render thread costs frames, not memory.
                if frame_tx.try_send(manager.take_render_frame()).is_err() {
                    tracing::trace!("render queue full; frame skipped");
                }
            }
        }
    }
    tracing::debug!(frames = manager.frame(), "update loop exit");
}

fn render_loop(
    memory_budget: usize,
    post_process: Arc<ResourcePostProcessQueue>,
    frame_rx: &Receiver<RenderFrame>,
    mut hook: RenderHook,
) {
    let mut controller = Controller::new(memory_budget, post_process);
    while let Ok(frame) = frame_rx.recv() {
        controller.begin_frame();
        hook(&mut controller, &frame);
        let commands = controller.end_frame();
        tracing::trace!(
            frame = frame.frame,
            items = frame.items.len(),
            commands = commands.len(),
            "frame rendered"
        );
    }
    tracing::debug!(
        frames = controller.frames_submitted(),
        "render loop exit"
    );
}
