use std::sync::{Mutex, PoisonError};

use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HandoffError {
    AlreadySupplied,
    Closed,
}

enum Slot<T> {
    Open(oneshot::Sender<T>),
    Supplied,
    Closed,
}

/// Single-slot, single-use handoff from the host to a worker thread.
///
/// `put` never blocks. The worker side is a plain `oneshot::Receiver`, so
/// it can block with `blocking_recv` or be awaited.
pub(crate) struct Handoff<T> {
    slot: Mutex<Slot<T>>,
}

impl<T> Handoff<T> {
    pub(crate) fn new() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        let handoff = Self {
            slot: Mutex::new(Slot::Open(tx)),
        };
        (handoff, rx)
    }

    pub(crate) fn put(&self, value: T) -> Result<(), HandoffError> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match std::mem::replace(&mut *slot, Slot::Supplied) {
            Slot::Open(tx) => tx.send(value).map_err(|_| {
                *slot = Slot::Closed;
                HandoffError::Closed
            }),
            Slot::Supplied => Err(HandoffError::AlreadySupplied),
            Slot::Closed => {
                *slot = Slot::Closed;
                Err(HandoffError::Closed)
            }
        }
    }

    /// Drop the sender so a receiver still waiting is released.
    pub(crate) fn close(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Slot::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_once() {
        let (handoff, rx) = Handoff::new();
        handoff.put(7u32).unwrap();
        assert_eq!(handoff.put(8), Err(HandoffError::AlreadySupplied));
        assert_eq!(rx.blocking_recv().unwrap(), 7);
    }

    #[test]
    fn test_close_releases_receiver() {
        let (handoff, rx) = Handoff::<u32>::new();
        let waiter = std::thread::spawn(move || rx.blocking_recv());
        handoff.close();
        assert!(waiter.join().unwrap().is_err());
        assert_eq!(handoff.put(1), Err(HandoffError::Closed));
    }

    #[test]
    fn test_put_after_receiver_dropped() {
        let (handoff, rx) = Handoff::new();
        drop(rx);
        assert_eq!(handoff.put(1u8), Err(HandoffError::Closed));
        assert_eq!(handoff.put(2u8), Err(HandoffError::Closed));
    }
}
