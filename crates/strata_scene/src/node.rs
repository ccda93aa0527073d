//! # Scene Graph Nodes
//!
//! A single-owner tree: every node has at most one parent, no cycles, and
//! the whole tree is owned and mutated by the update thread only. Event-side
//! code refers to nodes through generation-checked [`NodeId`]s minted by the
//! shared [`NodeIdPool`], so a message that arrives after its target died is
//! a safe no-op.
//!
//! Destruction is deferred: a removed node is unlinked immediately but its
//! double-buffered storage survives until both buffer slots have been
//! swapped past it (two ticks), so in-flight render items never read freed
//! state.

use std::sync::Arc;

use parking_lot::Mutex;

use strata_core::math::{Matrix4, Vec3};
use strata_core::sync::{BufferRole, DoubleBuffered, UpdateBufferIndex};

use crate::property::{AnimatableProperty, PropertyKind};

/// Generation-checked identity of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Slot index inside the graph.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation the id was reserved with.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

/// Thread-safe id reservation, shared between the event-side facade and the
/// graph.
///
/// Reserving an id is the only node operation the event thread performs
/// synchronously; the node itself is created by a message on the update
/// thread. Generations are bumped at reservation so an id released after
/// deferred destruction never aliases a live one.
pub struct NodeIdPool {
    state: Mutex<IdPoolState>,
}

struct IdPoolState {
    free: Vec<u32>,
    generations: Vec<u32>,
}

impl NodeIdPool {
    /// Creates a pool with `capacity` node slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or exceeds `u32::MAX`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "node capacity must be greater than zero");
        assert!(capacity <= u32::MAX as usize, "node capacity too large");
        Self {
            state: Mutex::new(IdPoolState {
                free: (0..capacity as u32).rev().collect(),
                generations: vec![0; capacity],
            }),
        }
    }

    /// Reserves a fresh id, or `None` when every slot is in use.
    #[must_use]
    pub fn reserve(&self) -> Option<NodeId> {
        let mut state = self.state.lock();
        let index = state.free.pop()?;
        let generation = state.generations[index as usize].wrapping_add(1);
        state.generations[index as usize] = generation;
        Some(NodeId { index, generation })
    }

    /// Returns a finalized id's slot for reuse. Update thread only.
    fn release(&self, id: NodeId) {
        self.state.lock().free.push(id.index);
    }

    /// Total slot count.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.state.lock().generations.len()
    }
}

/// Stage lifecycle event delivered to registered observers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageEvent {
    /// The node became part of the on-stage tree.
    Connected,
    /// The node left the on-stage tree.
    Disconnected,
}

/// Observer callback for stage connection changes.
///
/// Flat callback registration, one table per graph - the seam towards the
/// excluded layout/relayout layer.
pub type StageObserver = Box<dyn FnMut(NodeId, StageEvent) + Send>;

/// A transformable, connectable node.
pub struct Node {
    id: NodeId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    on_stage: bool,
    discarded: bool,
    /// Whether the node produces a render item when on stage.
    pub visible: bool,
    /// Local translation.
    pub position: AnimatableProperty<Vec3>,
    /// Local scale.
    pub scale: AnimatableProperty<Vec3>,
    /// Opacity in `[0, 1]`.
    pub opacity: AnimatableProperty<f32>,
    world: DoubleBuffered<Matrix4>,
}

impl Node {
    fn new(id: NodeId) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            on_stage: false,
            discarded: false,
            visible: true,
            position: AnimatableProperty::new(Vec3::ZERO),
            scale: AnimatableProperty::new(Vec3::ONE),
            opacity: AnimatableProperty::new(1.0),
            world: DoubleBuffered::new(Matrix4::IDENTITY),
        }
    }

    /// This node's id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Parent id, if linked into a tree.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child ids in insertion order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether the node is part of the on-stage tree.
    #[inline]
    #[must_use]
    pub fn is_on_stage(&self) -> bool {
        self.on_stage
    }

    /// Reads the resolved world matrix for the given buffer role.
    #[inline]
    pub fn world_matrix<I: BufferRole>(&self, index: I) -> &Matrix4 {
        self.world.get(index)
    }

    /// Restores one property to its base value if it needs a reset.
    pub(crate) fn reset_property(&mut self, kind: PropertyKind, index: UpdateBufferIndex) -> bool {
        match kind {
            PropertyKind::Position => self.position.reset_to_base(index),
            PropertyKind::Scale => self.scale.reset_to_base(index),
            PropertyKind::Opacity => self.opacity.reset_to_base(index),
        }
    }
}

/// The update-thread-owned node tree.
pub struct SceneGraph {
    slots: Vec<Option<Node>>,
    id_pool: Arc<NodeIdPool>,
    stage_roots: Vec<NodeId>,
    // (node, tick it was discarded on)
    discard_queue: Vec<(NodeId, u64)>,
    observers: Vec<StageObserver>,
    ticks: u64,
    live: usize,
}

impl SceneGraph {
    /// Creates an empty graph with `capacity` node slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            id_pool: Arc::new(NodeIdPool::new(capacity)),
            stage_roots: Vec::new(),
            discard_queue: Vec::new(),
            observers: Vec::new(),
            ticks: 0,
            live: 0,
        }
    }

    /// The id pool shared with the event-side facade.
    #[must_use]
    pub fn id_pool(&self) -> Arc<NodeIdPool> {
        Arc::clone(&self.id_pool)
    }

    /// Number of live (not yet finalized) nodes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// True when the graph holds no nodes.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Registers a stage lifecycle observer.
    pub fn add_stage_observer(&mut self, observer: StageObserver) {
        self.observers.push(observer);
    }

    /// Creates the node for a reserved id. Update thread only.
    ///
    /// # Panics
    ///
    /// Panics if the slot already holds a live node - a reserved id is
    /// single-use, so a collision is a programming error in the caller.
    pub fn create_node(&mut self, id: NodeId) {
        let slot = &mut self.slots[id.index as usize];
        assert!(
            slot.is_none(),
            "node slot {} created twice without release",
            id.index
        );
        *slot = Some(Node::new(id));
        self.live += 1;
        tracing::debug!(node = id.index, "node created");
    }

    /// Whether `id` still refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Resolves an id; stale or discarded ids return `None`.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let node = self.slots.get(id.index as usize)?.as_ref()?;
        (node.id == id && !node.discarded).then_some(node)
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let node = self.slots.get_mut(id.index as usize)?.as_mut()?;
        (node.id == id && !node.discarded).then_some(node)
    }

    /// Links `child` under `parent`.
    ///
    /// If `parent` is on stage the child's subtree is connected and
    /// observers fire. A dead `child` or `parent` makes this a no-op (the
    /// caller is a message whose target may have died in flight).
    ///
    /// # Panics
    ///
    /// Panics if `child` already has a parent. Re-parenting requires an
    /// explicit unlink first; silently stealing a node would corrupt the
    /// single-owner tree.
    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) {
        if !self.is_alive(parent) || !self.is_alive(child) {
            tracing::warn!(?child, ?parent, "set_parent on dead node ignored");
            return;
        }
        {
            let child_node = self.get(child).expect("checked alive");
            assert!(
                child_node.parent.is_none(),
                "set_parent: node {} already has a parent",
                child.index
            );
        }

        self.get_mut(child).expect("checked alive").parent = Some(parent);
        let parent_node = self.get_mut(parent).expect("checked alive");
        parent_node.children.push(child);
        let stage = parent_node.on_stage;
        if stage {
            self.connect_subtree(child);
        }
    }

    /// Makes `node` a stage root and connects its subtree.
    ///
    /// Only parentless nodes become stage roots; a parented node reaches
    /// the stage through its parent chain, so connecting it directly is
    /// ignored with a warning. No-op if the node is dead or already on
    /// stage.
    pub fn connect_to_stage(&mut self, node: NodeId) {
        let Some(n) = self.get(node) else {
            tracing::warn!(?node, "connect_to_stage on dead node ignored");
            return;
        };
        if n.is_on_stage() {
            return;
        }
        if n.parent.is_some() {
            tracing::warn!(?node, "connect_to_stage on a parented node ignored");
            return;
        }
        self.stage_roots.push(node);
        self.connect_subtree(node);
    }

    /// Unlinks `node` from its parent (or the stage roots), disconnects its
    /// subtree, and schedules the subtree for deferred destruction.
    ///
    /// Dead ids are ignored. Storage survives two more ticks.
    pub fn remove(&mut self, node: NodeId) {
        let Some(n) = self.get(node) else {
            tracing::warn!(?node, "remove of dead node ignored");
            return;
        };
        let parent = n.parent;
        if n.is_on_stage() {
            self.disconnect_subtree(node);
        }
        if let Some(parent) = parent {
            if let Some(parent_node) = self.get_mut(parent) {
                parent_node.children.retain(|c| *c != node);
            }
        }
        self.stage_roots.retain(|r| *r != node);

        // Mark the whole subtree discarded; finalization is deferred until
        // both buffer slots have aged past it.
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(n) = self.get_mut(id) {
                n.discarded = true;
                n.parent = None;
                stack.extend(n.children.drain(..));
                self.discard_queue.push((id, self.ticks));
                tracing::debug!(node = id.index, "node discarded");
            }
        }
    }

    /// Finalizes discards whose storage has aged past both buffer slots.
    ///
    /// Called once per tick by the update manager; returns the ids whose
    /// slots were freed this tick.
    pub fn process_discards(&mut self) -> Vec<NodeId> {
        self.ticks += 1;
        let ticks = self.ticks;
        let mut finalized = Vec::new();
        self.discard_queue.retain(|(id, discarded_at)| {
            if ticks >= discarded_at + 2 {
                finalized.push(*id);
                false
            } else {
                true
            }
        });
        for id in &finalized {
            self.slots[id.index as usize] = None;
            self.live -= 1;
            self.id_pool.release(*id);
            tracing::debug!(node = id.index, "node destroyed");
        }
        finalized
    }

    /// Number of discarded nodes still waiting for finalization.
    #[inline]
    #[must_use]
    pub fn pending_discards(&self) -> usize {
        self.discard_queue.len()
    }

    /// Recomputes world matrices for every on-stage node.
    pub fn update_world_matrices(&mut self, index: UpdateBufferIndex) {
        let roots = self.stage_roots.clone();
        let mut stack: Vec<(NodeId, Matrix4)> = roots
            .into_iter()
            .map(|id| (id, Matrix4::IDENTITY))
            .collect();
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.get_mut(id) else {
                continue;
            };
            let local = Matrix4::from_translation_scale(
                *node.position.get(index),
                *node.scale.get(index),
            );
            let world = parent_world.multiply(&local);
            *node.world.get_mut(index) = world;
            for child in &node.children {
                stack.push((*child, world));
            }
        }
    }

    /// Visits every live on-stage node, parents before children.
    pub fn for_each_on_stage(&self, mut visit: impl FnMut(&Node)) {
        let mut stack: Vec<NodeId> = self.stage_roots.clone();
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            visit(node);
            stack.extend_from_slice(&node.children);
        }
    }

    /// Restores one property of one node to its base value.
    ///
    /// Dead targets are a no-op; returns whether a write happened.
    pub fn reset_property(
        &mut self,
        id: NodeId,
        kind: PropertyKind,
        index: UpdateBufferIndex,
    ) -> bool {
        self.get_mut(id)
            .is_some_and(|node| node.reset_property(kind, index))
    }

    fn connect_subtree(&mut self, root: NodeId) {
        let mut stack = vec![root];
        let mut connected = Vec::new();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.get_mut(id) {
                if !node.on_stage {
                    node.on_stage = true;
                    connected.push(id);
                }
                stack.extend_from_slice(&node.children);
            }
        }
        for id in connected {
            for observer in &mut self.observers {
                observer(id, StageEvent::Connected);
            }
        }
    }

    fn disconnect_subtree(&mut self, root: NodeId) {
        let mut stack = vec![root];
        let mut disconnected = Vec::new();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.get_mut(id) {
                if node.on_stage {
                    node.on_stage = false;
                    disconnected.push(id);
                }
                stack.extend_from_slice(&node.children);
            }
        }
        for id in disconnected {
            for observer in &mut self.observers {
                observer(id, StageEvent::Disconnected);
            }
        }
    }
}
