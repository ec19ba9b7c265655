//! Publish/subscribe seam for change notifications.
//!
//! A bus fans each published message out to every live subscriber whose
//! filter accepts it. Messages describe writes that already happened; the
//! store stays the source of truth, so a reader that misses one simply
//! refreshes later.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};

/// Predicate deciding whether a subscriber receives a message.
pub type MessageFilter<M> = Box<dyn Fn(&M) -> bool + Send + Sync>;

/// Receiving end of a subscription.
///
/// Messages queue up until read, in publication order. Dropping the
/// subscription unregisters it on the next publish.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Next queued message, if any.
    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Every message queued so far.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Domain-agnostic pub/sub bus.
///
/// A failed `publish` means some subscribers may not have been told; the
/// message itself describes a committed write and is never retried.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    /// Subscribe to the messages accepted by `filter`.
    fn subscribe_filtered(&self, filter: MessageFilter<M>) -> Subscription<M>;

    /// Subscribe to every message.
    fn subscribe(&self) -> Subscription<M> {
        self.subscribe_filtered(Box::new(|_| true))
    }
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe_filtered(&self, filter: MessageFilter<M>) -> Subscription<M> {
        (**self).subscribe_filtered(filter)
    }
}
