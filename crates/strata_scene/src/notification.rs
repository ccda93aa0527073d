//! # Update -> Event Completion Notifications
//!
//! The reverse channel: the update thread marks work finished during its
//! tick, batches the notifications, and sends them after the buffer swap.
//! The event thread delivers them by pumping outside any tick critical
//! section, so completion callbacks can freely mutate handles without
//! re-entering a half-finished update.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::animation::AnimationId;
use crate::node::NodeId;

/// A completion crossing from update to event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notification {
    /// An animation played to completion.
    AnimationFinished {
        /// The finished animation.
        animation: AnimationId,
    },
    /// A removed node's storage was finally released.
    NodeDestroyed {
        /// The destroyed node.
        node: NodeId,
    },
}

/// Creates the paired sender (update side) and pump (event side).
///
/// The channel is bounded: a stalled event thread must not grow memory
/// without limit, so overflowing notifications are dropped with a warning
/// rather than blocking the tick.
#[must_use]
pub fn notification_channel(capacity: usize) -> (NotificationSender, NotificationPump) {
    let (sender, receiver) = bounded(capacity);
    (
        NotificationSender { sender },
        NotificationPump { receiver },
    )
}

/// Update-thread half: batched, non-blocking delivery.
#[derive(Clone)]
pub struct NotificationSender {
    sender: Sender<Notification>,
}

impl NotificationSender {
    /// Sends a batch collected during the tick. Never blocks.
    ///
    /// Returns how many notifications were actually enqueued.
    pub fn send_batch(&self, batch: Vec<Notification>) -> usize {
        let mut sent = 0;
        for notification in batch {
            match self.sender.try_send(notification) {
                Ok(()) => sent += 1,
                Err(TrySendError::Full(dropped)) => {
                    tracing::warn!(?dropped, "notification channel full; dropping");
                }
                Err(TrySendError::Disconnected(_)) => break,
            }
        }
        sent
    }
}

/// Event-thread half: drains pending notifications.
pub struct NotificationPump {
    receiver: Receiver<Notification>,
}

impl NotificationPump {
    /// Takes every pending notification. Non-blocking.
    #[must_use]
    pub fn pump(&self) -> Vec<Notification> {
        let mut batch = Vec::with_capacity(self.receiver.len());
        while let Ok(notification) = self.receiver.try_recv() {
            batch.push(notification);
        }
        batch
    }

    /// Whether anything is waiting.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.receiver.is_empty()
    }
}
