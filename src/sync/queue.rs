// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use crossbeam_channel::{self, Receiver, RecvError, Sender, TrySendError};

//==============================================================================
// Bounded queue
//==============================================================================

/// Returned by [`QueueProducer::insert`] when every consumer has already
/// gone away, i.e. the queue was closed out from under the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closed;

/// Builds a fixed-capacity FIFO hand-off queue, returning its producer and
/// consumer halves.
///
/// `insert` blocks while full, `remove` blocks while empty, and dropping
/// every [`QueueProducer`] clone (or calling [`QueueProducer::close`] on
/// the last one) is the *exit* sentinel — every blocked or future
/// `remove` observes end-of-stream once the queue drains. There is no
/// separate mutex/condvar pair to manage: the underlying bounded channel
/// already provides exactly these blocking semantics.
///
/// # Panics
///
/// Panics if `capacity` is zero; every hand-off queue in this collector is
/// sized ≥ 1.
pub fn bounded<T>(capacity: usize) -> (QueueProducer<T>, QueueConsumer<T>) {
    assert!(capacity >= 1, "queue capacity must be at least 1");
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (
        QueueProducer {
            tx,
            capacity,
        },
        QueueConsumer { rx, capacity },
    )
}

/// Producer half of a [`bounded`] queue. Clonable so a stage that fans out
/// to multiple downstream queues can hold one producer per queue, and so a
/// single queue can (in principle) be fed by more than one producer.
#[derive(Clone)]
pub struct QueueProducer<T> {
    tx: Sender<T>,
    capacity: usize,
}

/// Consumer half of a [`bounded`] queue.
#[derive(Clone)]
pub struct QueueConsumer<T> {
    rx: Receiver<T>,
    capacity: usize,
}

impl<T> QueueProducer<T> {
    /// Blocks while the queue is full, then inserts `item` at the tail.
    ///
    /// Returns [`Closed`] instead of blocking forever if every consumer has
    /// already gone away.
    pub fn insert(&self, item: T) -> Result<(), Closed> {
        self.tx.send(item).map_err(|_| Closed)
    }

    /// Non-blocking insert; used only where the caller has already checked
    /// capacity and wants to avoid parking.
    pub fn try_insert(&self, item: T) -> Result<(), TrySendError<T>> {
        self.tx.try_send(item)
    }

    /// Closes this producer: once every clone of it has been closed or
    /// dropped, blocked or future `remove` calls observe end-of-stream
    /// after the queue drains. Idempotent.
    pub fn close(self) {
        drop(self.tx);
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity
    }
}

impl<T> QueueConsumer<T> {
    /// Blocks while the queue is empty; returns `None` once every producer
    /// has closed and the queue has been fully drained (end-of-stream).
    pub fn remove(&self) -> Option<T> {
        match self.rx.recv() {
            Ok(item) => Some(item),
            Err(RecvError) => None,
        }
    }

    /// Non-blocking remove.
    pub fn try_remove(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// The underlying receiver, for use inside a
    /// `crossbeam_channel::select!` alongside another channel (e.g. a
    /// shutdown token).
    pub fn receiver(&self) -> &Receiver<T> {
        &self.rx
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    /// A producer and consumer on separate threads see every item exactly
    /// once, in order.
    #[test]
    fn fifo_order_preserved() {
        let (tx, rx) = bounded::<u32>(4);
        let handle = thread::spawn(move || {
            for i in 0..100 {
                tx.insert(i).unwrap();
            }
        });
        let mut seen = Vec::new();
        for _ in 0..100 {
            seen.push(rx.remove().unwrap());
        }
        handle.join().unwrap();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
    }

    /// `len` never exceeds `capacity`, and a full queue rejects a
    /// non-blocking insert rather than silently growing.
    #[test]
    fn len_never_exceeds_capacity() {
        let (tx, rx) = bounded::<u32>(2);
        tx.insert(1).unwrap();
        tx.insert(2).unwrap();
        assert_eq!(tx.len(), 2);
        assert!(tx.is_full());
        assert!(tx.try_insert(3).is_err());
        assert_eq!(rx.remove(), Some(1));
        assert!(!tx.is_full());
    }

    /// Closing an already-closed queue is a no-op: remove still observes a
    /// clean end-of-stream rather than panicking.
    #[test]
    fn close_then_drain_observes_end_of_stream() {
        let (tx, rx) = bounded::<u32>(4);
        tx.insert(1).unwrap();
        tx.insert(2).unwrap();
        tx.close();
        assert_eq!(rx.remove(), Some(1));
        assert_eq!(rx.remove(), Some(2));
        assert_eq!(rx.remove(), None);
        assert_eq!(rx.remove(), None);
    }

    /// A fan-out producer clone per downstream queue: closing one clone
    /// does not affect an independently-constructed queue.
    #[test]
    fn independent_queues_close_independently() {
        let (tx_a, rx_a) = bounded::<u32>(4);
        let (tx_b, rx_b) = bounded::<u32>(4);
        tx_a.close();
        tx_b.insert(7).unwrap();
        assert_eq!(rx_a.remove(), None);
        assert_eq!(rx_b.remove(), Some(7));
    }
}
