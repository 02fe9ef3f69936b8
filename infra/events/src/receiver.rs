use crate::bus::Event;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::warn;

/// Uniform `recv` over both channel kinds.
///
/// Broadcast receivers skip over lag. Lossless queues yield every event in order. Watch
/// receivers wait for the next change and yield the latest value.
pub trait EventReceiverExt<T> {
    /// `None` once every sender is gone.
    fn recv(&mut self) -> impl Future<Output = Option<Arc<T>>> + Send;
}

impl<T: Event> EventReceiverExt<T> for broadcast::Receiver<Arc<T>> {
    async fn recv(&mut self) -> Option<Arc<T>> {
        let mut skipped = 0u64;
        loop {
            match broadcast::Receiver::recv(self).await {
                Ok(event) => {
                    if skipped > 0 {
                        warn!(event = std::any::type_name::<T>(), skipped, "Listener lagged behind");
                    }
                    return Some(event);
                },
                Err(broadcast::error::RecvError::Lagged(n)) => skipped = skipped.saturating_add(n),
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl<T: Event> EventReceiverExt<T> for mpsc::UnboundedReceiver<Arc<T>> {
    async fn recv(&mut self) -> Option<Arc<T>> {
        mpsc::UnboundedReceiver::recv(self).await
    }
}

impl<T: Event> EventReceiverExt<T> for watch::Receiver<Arc<T>> {
    async fn recv(&mut self) -> Option<Arc<T>> {
        self.changed().await.ok()?;
        Some(self.borrow_and_update().clone())
    }
}
