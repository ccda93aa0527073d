//! # Event -> Update Message Queue
//!
//! The only channel through which the update thread observes event-thread
//! intent. Event-side handle code never touches update-owned state; it posts
//! an owning, move-only closure that the update thread applies at the start
//! of its next tick.
//!
//! ## Guarantees
//!
//! - `post` never blocks (unbounded channel, producers stay responsive)
//! - FIFO per producer thread, single consumer
//! - Every message is applied exactly once; draining an empty queue applies
//!   nothing
//! - Every message posted before a tick's drain is visible to that tick;
//!   none posted after the drain begins are visible until the next tick, so
//!   a fast producer can never extend a drain
//!
//! Messages capture their target as a generation-checked id, never a
//! reference, so a message whose target died between post and drain is a
//! safe no-op inside the closure rather than a dangling access.

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::sync::UpdateBufferIndex;

/// An owning, move-only command applied against the update-owned state `T`.
pub type Message<T> = Box<dyn FnOnce(&mut T, UpdateBufferIndex) + Send>;

/// Multi-producer single-consumer queue of [`Message`]s.
///
/// The queue itself lives with the consumer (the update manager); producers
/// hold cloned [`MessageSender`]s.
pub struct MessageQueue<T> {
    sender: Sender<Message<T>>,
    receiver: Receiver<Message<T>>,
}

impl<T> MessageQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Creates a producer handle. Clone freely, one per event-side object.
    #[must_use]
    pub fn sender(&self) -> MessageSender<T> {
        MessageSender {
            sender: self.sender.clone(),
        }
    }

    /// Number of messages currently queued.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Applies, in enqueue order, exactly the messages queued when the call
    /// began. Called exactly once at the start of each update tick, from the
    /// update thread only.
    ///
    /// The cutoff is snapshotted up front: a message posted while the drain
    /// runs (including one posted by a draining message itself) waits for
    /// the next tick, and the drain applies a bounded amount of work.
    ///
    /// Returns the number of messages applied.
    pub fn drain_and_apply(&self, target: &mut T, index: UpdateBufferIndex) -> usize {
        let cutoff = self.receiver.len();
        let mut applied = 0;
        while applied < cutoff {
            let Ok(message) = self.receiver.try_recv() else {
                break;
            };
            message(target, index);
            applied += 1;
        }
        applied
    }
}

impl<T> Default for MessageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer handle for posting messages from the event thread.
pub struct MessageSender<T> {
    sender: Sender<Message<T>>,
}

impl<T> MessageSender<T> {
    /// Posts a message. Never blocks.
    ///
    /// Returns `false` if the consumer side has shut down (the message is
    /// dropped; there is no tick left to apply it to).
    pub fn post(&self, message: Message<T>) -> bool {
        self.sender.send(message).is_ok()
    }
}

impl<T> Clone for MessageSender<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::FrameClock;

    #[test]
    fn test_fifo_per_producer() {
        let clock = FrameClock::new();
        let queue: MessageQueue<Vec<u32>> = MessageQueue::new();
        let sender = queue.sender();

        sender.post(Box::new(|log, _| log.push(1)));
        sender.post(Box::new(|log, _| log.push(2)));
        sender.post(Box::new(|log, _| log.push(3)));

        let mut log = Vec::new();
        let applied = queue.drain_and_apply(&mut log, clock.update_index());
        assert_eq!(applied, 3);
        assert_eq!(log, vec![1, 2, 3]);
    }

    #[test]
    fn test_exactly_once() {
        let clock = FrameClock::new();
        let queue: MessageQueue<u32> = MessageQueue::new();
        queue.sender().post(Box::new(|count, _| *count += 1));

        let mut count = 0;
        queue.drain_and_apply(&mut count, clock.update_index());
        // Second drain without new posts applies nothing.
        queue.drain_and_apply(&mut count, clock.update_index());
        assert_eq!(count, 1);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_messages_cross_threads() {
        let clock = FrameClock::new();
        let queue: MessageQueue<u32> = MessageQueue::new();
        let sender = queue.sender();

        let producer = std::thread::spawn(move || {
            for _ in 0..100 {
                sender.post(Box::new(|count, _| *count += 1));
            }
        });
        producer.join().expect("producer thread panicked");

        let mut count = 0;
        queue.drain_and_apply(&mut count, clock.update_index());
        assert_eq!(count, 100);
    }

    #[test]
    fn test_drain_cutoff_excludes_messages_posted_mid_drain() {
        let clock = FrameClock::new();
        let queue: MessageQueue<Vec<u32>> = MessageQueue::new();
        let sender = queue.sender();
        let reentrant = queue.sender();

        // The first message posts another while the drain is running.
        sender.post(Box::new(move |log, _| {
            log.push(1);
            reentrant.post(Box::new(|log, _| log.push(2)));
        }));

        let mut log = Vec::new();
        let applied = queue.drain_and_apply(&mut log, clock.update_index());
        assert_eq!(applied, 1);
        assert_eq!(log, vec![1]);
        assert_eq!(queue.pending(), 1);

        // The mid-drain post surfaces on the next tick.
        assert_eq!(queue.drain_and_apply(&mut log, clock.update_index()), 1);
        assert_eq!(log, vec![1, 2]);
    }

    #[test]
    fn test_drain_applies_the_pre_drain_snapshot() {
        let clock = FrameClock::new();
        let queue: MessageQueue<u32> = MessageQueue::new();
        let sender = queue.sender();
        let live_producer = queue.sender();

        // While the drain applies this message, a producer thread posts
        // another; joining inside forces the post to land mid-drain.
        sender.post(Box::new(move |count, _| {
            *count += 1;
            let producer = std::thread::spawn(move || {
                live_producer.post(Box::new(|count, _| *count += 10));
            });
            producer.join().expect("producer thread panicked");
        }));

        let snapshot = queue.pending();
        let mut count = 0;
        let applied = queue.drain_and_apply(&mut count, clock.update_index());
        assert_eq!(applied, snapshot);
        assert_eq!(count, 1);

        // The concurrent post belongs to the next tick.
        assert_eq!(queue.drain_and_apply(&mut count, clock.update_index()), 1);
        assert_eq!(count, 11);
    }

    #[test]
    fn test_post_after_consumer_gone() {
        let queue: MessageQueue<u32> = MessageQueue::new();
        let sender = queue.sender();
        drop(queue);
        assert!(!sender.post(Box::new(|_, _| {})));
    }
}
