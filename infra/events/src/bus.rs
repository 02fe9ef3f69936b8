use crate::error::EventBusError;
use fxhash::FxHashMap;
use parking_lot::{Mutex, RwLock};
use std::any::{Any, TypeId, type_name};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{trace, warn};

/// Buffer of a broadcast channel created implicitly by `publish` or `subscribe`.
const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Broadcast { capacity: usize },
    Watch,
}

/// Anything shareable between tasks can travel on the bus.
pub trait Event: Any + Send + Sync + 'static {}
impl<T: Any + Send + Sync + 'static> Event for T {}

/// The senders behind one broadcast event type: the bounded broadcast channel plus the
/// unbounded queues of listeners that must not miss anything.
struct Fanout<T> {
    broadcast: broadcast::Sender<Arc<T>>,
    queues: Arc<Mutex<Vec<mpsc::UnboundedSender<Arc<T>>>>>,
}

impl<T> Clone for Fanout<T> {
    fn clone(&self) -> Self {
        Self { broadcast: self.broadcast.clone(), queues: Arc::clone(&self.queues) }
    }
}

impl<T: Event> Fanout<T> {
    fn send(&self, event: Arc<T>) -> usize {
        let mut queues = self.queues.lock();
        queues.retain(|queue| queue.send(Arc::clone(&event)).is_ok());
        queues.len() + self.broadcast.send(event).unwrap_or(0)
    }
}

#[derive(Debug)]
struct ChannelState {
    kind: ChannelKind,
    sender: Box<dyn Any + Send + Sync>,
}

impl ChannelState {
    fn broadcast<T: Event>(&self) -> Result<Fanout<T>, EventBusError> {
        self.sender
            .downcast_ref::<Fanout<T>>()
            .cloned()
            .ok_or_else(|| mismatch::<T>())
    }

    fn watch<T: Event>(&self) -> Result<watch::Sender<Arc<T>>, EventBusError> {
        self.sender
            .downcast_ref::<watch::Sender<Arc<T>>>()
            .cloned()
            .ok_or_else(|| mismatch::<T>())
    }

    fn expect_kind<T: Event>(&self, wanted: ChannelKind) -> Result<(), EventBusError> {
        let same = matches!(
            (self.kind, wanted),
            (ChannelKind::Broadcast { .. }, ChannelKind::Broadcast { .. })
                | (ChannelKind::Watch, ChannelKind::Watch)
        );
        if same {
            return Ok(());
        }
        Err(EventBusError::ChannelKindMismatch {
            message: format!("{} is served by {:?}, not {wanted:?}", type_name::<T>(), self.kind)
                .into(),
            context: None,
        })
    }
}

fn mismatch<T: Event>() -> EventBusError {
    EventBusError::TypeMismatch { message: type_name::<T>().into(), context: None }
}

/// Process wide event bus. Cloning shares the same channels.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    channels: Arc<RwLock<FxHashMap<TypeId, ChannelState>>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to broadcast events of type `T`.
    ///
    /// # Errors
    /// [`EventBusError::ChannelKindMismatch`] when `T` travels on a watch channel.
    pub fn subscribe<T: Event>(&self) -> Result<broadcast::Receiver<Arc<T>>, EventBusError> {
        self.subscribe_with_capacity::<T>(DEFAULT_CAPACITY)
    }

    /// Like [`EventBus::subscribe`], sizing the buffer when this call creates the channel.
    ///
    /// # Errors
    /// [`EventBusError::InvalidCapacity`] for a zero capacity.
    pub fn subscribe_with_capacity<T: Event>(
        &self,
        capacity: usize,
    ) -> Result<broadcast::Receiver<Arc<T>>, EventBusError> {
        if capacity == 0 {
            return Err(EventBusError::InvalidCapacity {
                message: "broadcast capacity must be at least 1".into(),
                context: Some(type_name::<T>().into()),
            });
        }
        Ok(self.broadcast_sender::<T>(capacity)?.broadcast.subscribe())
    }

    /// Subscribes to broadcast events of type `T` without ever skipping one. The queue is
    /// unbounded, so the listener must keep draining it.
    ///
    /// # Errors
    /// [`EventBusError::ChannelKindMismatch`] when `T` travels on a watch channel.
    pub fn subscribe_lossless<T: Event>(&self) -> Result<mpsc::UnboundedReceiver<Arc<T>>, EventBusError> {
        let fanout = self.broadcast_sender::<T>(DEFAULT_CAPACITY)?;
        let (tx, rx) = mpsc::unbounded_channel();
        fanout.queues.lock().push(tx);
        Ok(rx)
    }

    /// Sends `event` to every current subscriber, lossless ones included, and returns how
    /// many got it.
    ///
    /// Publishing without subscribers is not an error.
    ///
    /// # Errors
    /// [`EventBusError::ChannelKindMismatch`] when `T` travels on a watch channel.
    pub fn publish<T: Event>(&self, event: T) -> Result<usize, EventBusError> {
        let sender = self.broadcast_sender::<T>(DEFAULT_CAPACITY)?;
        let delivered = sender.send(Arc::new(event));
        trace!(event = type_name::<T>(), delivered, "Event published");
        Ok(delivered)
    }

    /// Subscribes to the latest value of `T`, seeding the channel with `initial` when it
    /// does not exist yet.
    ///
    /// # Errors
    /// [`EventBusError::ChannelKindMismatch`] when `T` travels on a broadcast channel.
    pub fn subscribe_watch<T: Event>(
        &self,
        initial: T,
    ) -> Result<watch::Receiver<Arc<T>>, EventBusError> {
        Ok(self.watch_sender::<T>(|| Arc::new(initial))?.subscribe())
    }

    /// Replaces the current value of `T`. Receivers are woken even when nobody listens yet,
    /// later subscribers start from this value.
    ///
    /// # Errors
    /// [`EventBusError::ChannelKindMismatch`] when `T` travels on a broadcast channel.
    pub fn publish_watch<T: Event>(&self, value: T) -> Result<(), EventBusError> {
        let value = Arc::new(value);
        let seed = Arc::clone(&value);
        let sender = self.watch_sender::<T>(move || seed)?;
        sender.send_replace(value);
        Ok(())
    }

    /// Drops every channel. Pending receivers observe the close.
    pub fn shutdown(&self) -> usize {
        let mut channels = self.channels.write();
        let count = channels.len();
        channels.clear();
        count
    }

    fn broadcast_sender<T: Event>(
        &self,
        capacity: usize,
    ) -> Result<Fanout<T>, EventBusError> {
        let wanted = ChannelKind::Broadcast { capacity };
        if let Some(state) = self.channels.read().get(&TypeId::of::<T>()) {
            state.expect_kind::<T>(wanted)?;
            return state.broadcast::<T>();
        }

        let mut channels = self.channels.write();
        let state = channels.entry(TypeId::of::<T>()).or_insert_with(|| {
            trace!(event = type_name::<T>(), capacity, "Creating broadcast channel");
            let (tx, _) = broadcast::channel::<Arc<T>>(capacity);
            let fanout = Fanout { broadcast: tx, queues: Arc::default() };
            ChannelState { kind: wanted, sender: Box::new(fanout) }
        });
        if let ChannelKind::Broadcast { capacity: existing } = state.kind
            && existing != capacity
        {
            warn!(event = type_name::<T>(), existing, requested = capacity, "Capacity ignored");
        }
        state.expect_kind::<T>(wanted)?;
        state.broadcast::<T>()
    }

    fn watch_sender<T: Event>(
        &self,
        initial: impl FnOnce() -> Arc<T>,
    ) -> Result<watch::Sender<Arc<T>>, EventBusError> {
        if let Some(state) = self.channels.read().get(&TypeId::of::<T>()) {
            state.expect_kind::<T>(ChannelKind::Watch)?;
            return state.watch::<T>();
        }

        let mut channels = self.channels.write();
        let state = channels.entry(TypeId::of::<T>()).or_insert_with(|| {
            trace!(event = type_name::<T>(), "Creating watch channel");
            let (tx, _) = watch::channel(initial());
            ChannelState { kind: ChannelKind::Watch, sender: Box::new(tx) }
        });
        state.expect_kind::<T>(ChannelKind::Watch)?;
        state.watch::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    struct Revision(u64);

    #[test]
    fn kinds_are_exclusive_per_type() {
        let bus = EventBus::new();
        bus.subscribe_watch(Revision(0)).unwrap();
        let err = bus.subscribe::<Revision>().unwrap_err();
        assert!(matches!(err, EventBusError::ChannelKindMismatch { .. }));
        assert!(bus.publish(Revision(1)).is_err());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let bus = EventBus::new();
        assert!(matches!(
            bus.subscribe_with_capacity::<Revision>(0),
            Err(EventBusError::InvalidCapacity { .. })
        ));
    }

    #[test]
    fn publish_without_listeners_delivers_nothing() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(Revision(3)).unwrap(), 0);
    }

    #[test]
    fn lossless_queues_count_as_listeners() {
        let bus = EventBus::new();
        let queue = bus.subscribe_lossless::<Revision>().unwrap();
        let _live = bus.subscribe::<Revision>().unwrap();
        assert_eq!(bus.publish(Revision(1)).unwrap(), 2);
        drop(queue);
        assert_eq!(bus.publish(Revision(2)).unwrap(), 1);
    }

    #[test]
    fn shutdown_reports_channel_count() {
        let bus = EventBus::new();
        bus.publish(Revision(1)).unwrap();
        bus.publish_watch(String::from("ready")).unwrap();
        assert_eq!(bus.shutdown(), 2);
        assert_eq!(bus.shutdown(), 0);
    }
}
