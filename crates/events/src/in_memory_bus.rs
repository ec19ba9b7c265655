//! In-memory event bus.

use std::sync::{Mutex, mpsc};

use crate::bus::{EventBus, MessageFilter, Subscription};

#[derive(Debug)]
pub enum InMemoryBusError {
    /// Publish failed due to internal lock poisoning.
    Poisoned,
}

struct Subscriber<M> {
    filter: MessageFilter<M>,
    sender: mpsc::Sender<M>,
}

/// In-memory pub/sub bus.
///
/// - No IO / no async
/// - Fan-out to every subscriber whose filter accepts the message
/// - Disconnected subscribers are dropped on the next publish
pub struct InMemoryEventBus<M> {
    subscribers: Mutex<Vec<Subscriber<M>>>,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscribers (as of the last publish).
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl<M> core::fmt::Debug for InMemoryEventBus<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryEventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    type Error = InMemoryBusError;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        let mut subs = self.subscribers.lock().map_err(|_| InMemoryBusError::Poisoned)?;

        subs.retain(|sub| {
            if (sub.filter)(&message) {
                sub.sender.send(message.clone()).is_ok()
            } else {
                // Keep filtered-out subscribers unless they are gone.
                true
            }
        });

        Ok(())
    }

    fn subscribe_filtered(&self, filter: MessageFilter<M>) -> Subscription<M> {
        let (sender, rx) = mpsc::channel();

        // If the lock is poisoned we still return a subscription;
        // it just never receives messages.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(Subscriber { filter, sender });
        }

        Subscription::new(rx)
    }
}
