//! # Render -> Update Post-Process Requests
//!
//! The render thread cannot mutate update-thread resource bookkeeping
//! directly: different thread, different buffer epoch. Instead it posts
//! typed requests into a double-buffered list that the update thread drains
//! at a defined point in its next tick.
//!
//! ## Ordering
//!
//! Requests for one resource id are applied in post order, with one
//! documented tie-break: within a single drained batch, every `Save` for an
//! id is applied before any `Deleted` for that id. A `Deleted` therefore
//! always lands after the save it would otherwise race, and still
//! invalidates any uploaded state that precedes it.

use parking_lot::Mutex;

/// Identity of a GPU-side resource as tracked by update-side bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u64);

/// What happened to the resource on the render thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostProcessAction {
    /// Resource data finished uploading to the device.
    Uploaded,
    /// Resource contents should be saved out by the update side.
    Save,
    /// Resource was destroyed; cached upload state must be invalidated.
    Deleted,
}

/// One request crossing from render to update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourcePostProcess {
    /// Resource the request concerns.
    pub id: ResourceId,
    /// Lifecycle event being reported.
    pub action: PostProcessAction,
}

/// Double-buffered request list shared between render and update threads.
///
/// One of the few genuinely shared structures in the engine, so it carries
/// a mutex; the lock is held only to push or to swap the two lists, never
/// while requests are applied.
pub struct ResourcePostProcessQueue {
    pending: Mutex<Vec<ResourcePostProcess>>,
}

impl ResourcePostProcessQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Posts a request from the render thread. Never blocks beyond the push.
    pub fn post(&self, request: ResourcePostProcess) {
        tracing::trace!(id = request.id.0, action = ?request.action, "post-process request");
        self.pending.lock().push(request);
    }

    /// Number of requests waiting for the next drain.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Takes the pending batch, ordered for application.
    ///
    /// Called once per tick by the update thread. The returned requests are
    /// in post order per resource id, except that `Save` entries are hoisted
    /// ahead of `Deleted` entries posted in the same batch (the documented
    /// tie-break). Relative order of `Uploaded` and `Deleted` is preserved.
    #[must_use]
    pub fn drain(&self) -> Vec<ResourcePostProcess> {
        let batch = std::mem::take(&mut *self.pending.lock());
        if batch.is_empty() {
            return batch;
        }
        Self::apply_tie_break(batch)
    }

    /// Hoists saves over same-id deletes while keeping all other per-id
    /// ordering intact.
    fn apply_tie_break(batch: Vec<ResourcePostProcess>) -> Vec<ResourcePostProcess> {
        // Ids in first-posted order.
        let mut ids: Vec<ResourceId> = Vec::new();
        for request in &batch {
            if !ids.contains(&request.id) {
                ids.push(request.id);
            }
        }

        let mut ordered = Vec::with_capacity(batch.len());
        for id in ids {
            let mut held_deletes: Vec<ResourcePostProcess> = Vec::new();
            for request in batch.iter().filter(|r| r.id == id) {
                match request.action {
                    // A save skips over deletes buffered so far.
                    PostProcessAction::Save => ordered.push(*request),
                    PostProcessAction::Deleted => held_deletes.push(*request),
                    // An upload pins the deletes before it back in place,
                    // preserving upload/delete post order.
                    PostProcessAction::Uploaded => {
                        ordered.append(&mut held_deletes);
                        ordered.push(*request);
                    }
                }
            }
            ordered.append(&mut held_deletes);
        }
        ordered
    }
}

impl Default for ResourcePostProcessQueue {
    fn default() -> Self {
        Self::new()
    }
}
