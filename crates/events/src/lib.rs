//! Change notification mechanics.
//!
//! Stores publish a [`ChangeEvent`] after every successful write; readers that
//! want to refresh (dashboards, lists) subscribe with a [`ChangeFilter`].

pub mod bus;
pub mod change;
pub mod in_memory_bus;

pub use bus::{EventBus, MessageFilter, Subscription};
pub use change::{ChangeEvent, ChangeFilter, ChangeKind, Collection};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
