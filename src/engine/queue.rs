//! Unbounded FIFO queues shared across the isolation boundary.
//!
//! Thin wrappers over `tokio::sync::mpsc` unbounded channels. Producers never
//! block; the single consumer polls without waiting.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Returned by [`QueueSender::put`] when the consumer is gone; carries the
/// rejected item back to the producer.
#[derive(Debug)]
pub struct Closed<T>(pub T);

/// Producer half of a queue. Cheap to clone; each clone is a producer.
#[derive(Debug)]
pub struct QueueSender<T> {
    tx: UnboundedSender<T>,
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

/// Consumer half of a queue.
#[derive(Debug)]
pub struct QueueReceiver<T> {
    rx: UnboundedReceiver<T>,
}

/// Creates an unbounded queue.
#[must_use]
pub fn unbounded<T>() -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (QueueSender { tx }, QueueReceiver { rx })
}

impl<T> QueueSender<T> {
    /// Appends `item` without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`Closed`] with the item if the receiver has been dropped.
    pub fn put(&self, item: T) -> Result<(), Closed<T>> {
        self.tx.send(item).map_err(|e| Closed(e.0))
    }
}

impl<T> QueueReceiver<T> {
    /// Returns the oldest item, or `None` immediately if the queue is empty.
    pub fn try_get(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Best-effort emptiness snapshot; producers may race with it.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Best-effort length snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order_single_producer() {
        let (tx, mut rx) = unbounded();
        for i in 0..5 {
            tx.put(i).unwrap();
        }
        let drained: Vec<i32> = std::iter::from_fn(|| rx.try_get()).collect();
        assert_eq!(drained, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_try_get_on_empty_returns_none() {
        let (_tx, mut rx) = unbounded::<u8>();
        assert!(rx.is_empty());
        assert_eq!(rx.len(), 0);
        assert!(rx.try_get().is_none());
    }

    #[test]
    fn test_put_after_receiver_dropped_returns_item() {
        let (tx, rx) = unbounded();
        drop(rx);
        let Err(Closed(item)) = tx.put("lost") else {
            panic!("expected Closed");
        };
        assert_eq!(item, "lost");
    }

    #[test]
    fn test_items_survive_sender_drop() {
        let (tx, mut rx) = unbounded();
        tx.put(1).unwrap();
        drop(tx);
        assert_eq!(rx.try_get(), Some(1));
        assert_eq!(rx.try_get(), None);
    }

    #[test]
    fn test_concurrent_producers() {
        let (tx, mut rx) = unbounded();
        let handles: Vec<_> = (0..4)
            .map(|p| {
                let tx = tx.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        tx.put((p, i)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let drained: Vec<(i32, i32)> = std::iter::from_fn(|| rx.try_get()).collect();
        assert_eq!(drained.len(), 400);
        // Per-producer order is preserved.
        for p in 0..4 {
            let seq: Vec<i32> = drained.iter().filter(|(q, _)| *q == p).map(|(_, i)| *i).collect();
            assert_eq!(seq, (0..100).collect::<Vec<_>>());
        }
    }
}
