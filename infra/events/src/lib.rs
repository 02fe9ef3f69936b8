//! # Event Bus
//!
//! Typed publish/subscribe between the inventory slices.
//!
//! Each event type owns exactly one channel, picked on first use:
//!
//! * **broadcast** for notifications every listener must see (session opened, object
//!   changed). Slow listeners skip ahead instead of blocking publishers, unless they
//!   subscribe through [`EventBus::subscribe_lossless`].
//! * **watch** for state where only the latest value matters (the inventory revision that
//!   drives snapshot flushing).
//!
//! ```rust
//! use kw_event_bus::{EventBus, EventReceiverExt, EventBusError};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct ObjectDeleted { id: String }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), EventBusError> {
//!     let bus = EventBus::new();
//!     let mut rx = bus.subscribe::<ObjectDeleted>()?;
//!     bus.publish(ObjectDeleted { id: "r1".into() })?;
//!     assert_eq!(EventReceiverExt::recv(&mut rx).await.map(|e| e.id.clone()), Some("r1".into()));
//!     Ok(())
//! }
//! ```

mod bus;
mod error;
mod receiver;

pub use bus::{ChannelKind, Event, EventBus};
pub use error::{EventBusError, EventBusErrorExt};
pub use receiver::EventReceiverExt;
