//! Bounded rendezvous between a blocking consumer and an async producer.
//!
//! The consumer announces how many bytes it wants and blocks; the producer
//! learns that number through a watch channel and answers with exactly one
//! chunk. At most one request and one undelivered chunk exist at any time.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::sync::watch;

use crate::data::{Demand, ExcessPolicy};
use crate::error::ProtocolViolation;

/// How a rendezvous was shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Closure {
    Finished,
    Killed,
}

/// Why a delivery was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Refusal {
    Closed(Closure),
    Violation(ProtocolViolation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Idle,
    Want(usize),
    Closed(Closure),
}

impl Signal {
    fn resolve(self) -> Option<Result<Demand, Closure>> {
        match self {
            Signal::Idle => None,
            Signal::Want(n) => Some(Ok(Demand::Bytes(n))),
            Signal::Closed(Closure::Finished) => Some(Ok(Demand::Finished)),
            Signal::Closed(Closure::Killed) => Some(Err(Closure::Killed)),
        }
    }
}

#[derive(Default)]
struct State {
    pending: Option<usize>,
    chunk: Option<Bytes>,
    closed: Option<Closure>,
}

pub(crate) struct Rendezvous {
    state: Mutex<State>,
    arrived: Condvar,
    signal: watch::Sender<Signal>,
}

impl Rendezvous {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            arrived: Condvar::new(),
            signal: watch::Sender::new(Signal::Idle),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> { self.state.lock().unwrap_or_else(PoisonError::into_inner) }

    /// Ask for up to `n` bytes and block until the producer answers.
    ///
    /// Must only be called from one thread; the previous request has always
    /// been answered by the time the next one is made.
    pub(crate) fn request(&self, n: usize) -> Result<Bytes, Closure> {
        let mut state = self.lock();
        if let Some(closure) = state.closed {
            return Err(closure);
        }
        debug_assert!(state.pending.is_none() && state.chunk.is_none());

        state.pending = Some(n);
        self.signal.send_replace(Signal::Want(n));
        tracing::trace!(requested = n, "requesting bytes");

        loop {
            if let Some(chunk) = state.chunk.take() {
                state.pending = None;
                return Ok(chunk);
            }
            if let Some(closure) = state.closed {
                state.pending = None;
                return Err(closure);
            }
            state = self.arrived.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Hand one chunk to the blocked consumer.
    pub(crate) fn deliver(&self, chunk: Bytes, excess: ExcessPolicy) -> Result<(), Refusal> {
        let mut state = self.lock();
        if let Some(closure) = state.closed {
            return Err(Refusal::Closed(closure));
        }

        let requested = match (state.pending, &state.chunk) {
            (Some(requested), None) => requested,
            _ => return Err(Refusal::Violation(ProtocolViolation::UnrequestedWrite)),
        };
        if chunk.len() > requested && excess == ExcessPolicy::Reject {
            return Err(Refusal::Violation(ProtocolViolation::Overflow {
                requested,
                delivered: chunk.len(),
            }));
        }

        tracing::trace!(requested, delivered = chunk.len(), "chunk delivered");
        state.chunk = Some(chunk);
        self.signal.send_replace(Signal::Idle);
        self.arrived.notify_one();
        Ok(())
    }

    /// Wait until the consumer has an open request, or the rendezvous closes.
    pub(crate) async fn demand(&self) -> Result<Demand, Closure> {
        let mut rx = self.signal.subscribe();
        loop {
            let current = *rx.borrow_and_update();
            if let Some(resolved) = current.resolve() {
                return resolved;
            }
            rx.changed().await.map_err(|_| Closure::Killed)?;
        }
    }

    /// The request currently waiting for data, if any.
    pub(crate) fn pending(&self) -> Option<usize> {
        let state = self.lock();
        state.pending.filter(|_| state.chunk.is_none())
    }

    /// Shut down and release every waiter. The first closure wins.
    pub(crate) fn close(&self, closure: Closure) {
        let mut state = self.lock();
        if state.closed.is_some() {
            return;
        }
        state.closed = Some(closure);
        self.signal.send_replace(Signal::Closed(closure));
        self.arrived.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_deliver_without_request_is_rejected() {
        let rendezvous = Rendezvous::new();
        let result = rendezvous.deliver(Bytes::from_static(b"abc"), ExcessPolicy::Buffer);
        assert_eq!(result, Err(Refusal::Violation(ProtocolViolation::UnrequestedWrite)));
    }

    #[tokio::test]
    async fn test_request_deliver_cycle() {
        let rendezvous = Arc::new(Rendezvous::new());
        let consumer = {
            let rendezvous = Arc::clone(&rendezvous);
            std::thread::spawn(move || {
                let first = rendezvous.request(3).unwrap();
                let second = rendezvous.request(5).unwrap();
                (first, second)
            })
        };

        assert_eq!(rendezvous.demand().await, Ok(Demand::Bytes(3)));
        assert_eq!(rendezvous.pending(), Some(3));
        rendezvous.deliver(Bytes::from_static(b"abc"), ExcessPolicy::Buffer).unwrap();

        assert_eq!(rendezvous.demand().await, Ok(Demand::Bytes(5)));
        rendezvous.deliver(Bytes::from_static(b"defgh"), ExcessPolicy::Buffer).unwrap();

        let (first, second) = consumer.join().unwrap();
        assert_eq!(&first[..], b"abc");
        assert_eq!(&second[..], b"defgh");
    }

    #[tokio::test]
    async fn test_second_write_without_request_is_rejected() {
        let rendezvous = Arc::new(Rendezvous::new());
        let consumer = {
            let rendezvous = Arc::clone(&rendezvous);
            std::thread::spawn(move || rendezvous.request(4))
        };

        assert_eq!(rendezvous.demand().await, Ok(Demand::Bytes(4)));
        rendezvous.deliver(Bytes::from_static(b"ab"), ExcessPolicy::Buffer).unwrap();
        let second = rendezvous.deliver(Bytes::from_static(b"cd"), ExcessPolicy::Buffer);

        // Either the consumer has not taken the first chunk yet, or it has and
        // no new request exists; both leave the second write unrequested.
        assert_eq!(second, Err(Refusal::Violation(ProtocolViolation::UnrequestedWrite)));
        assert_eq!(&consumer.join().unwrap().unwrap()[..], b"ab");
    }

    #[tokio::test]
    async fn test_reject_policy_keeps_request_pending() {
        let rendezvous = Arc::new(Rendezvous::new());
        let consumer = {
            let rendezvous = Arc::clone(&rendezvous);
            std::thread::spawn(move || rendezvous.request(2))
        };

        assert_eq!(rendezvous.demand().await, Ok(Demand::Bytes(2)));
        let refused = rendezvous.deliver(Bytes::from_static(b"abc"), ExcessPolicy::Reject);
        assert_eq!(
            refused,
            Err(Refusal::Violation(ProtocolViolation::Overflow {
                requested: 2,
                delivered: 3
            }))
        );

        assert_eq!(rendezvous.demand().await, Ok(Demand::Bytes(2)));
        rendezvous.deliver(Bytes::from_static(b"ab"), ExcessPolicy::Reject).unwrap();
        assert_eq!(&consumer.join().unwrap().unwrap()[..], b"ab");
    }

    #[tokio::test]
    async fn test_kill_releases_blocked_consumer() {
        let rendezvous = Arc::new(Rendezvous::new());
        let consumer = {
            let rendezvous = Arc::clone(&rendezvous);
            std::thread::spawn(move || rendezvous.request(16))
        };

        assert_eq!(rendezvous.demand().await, Ok(Demand::Bytes(16)));
        rendezvous.close(Closure::Killed);

        assert_eq!(consumer.join().unwrap(), Err(Closure::Killed));
        assert_eq!(rendezvous.demand().await, Err(Closure::Killed));
        assert_eq!(
            rendezvous.deliver(Bytes::new(), ExcessPolicy::Buffer),
            Err(Refusal::Closed(Closure::Killed))
        );
    }

    #[tokio::test]
    async fn test_finished_resolves_waiting_host() {
        let rendezvous = Arc::new(Rendezvous::new());
        let waiter = {
            let rendezvous = Arc::clone(&rendezvous);
            tokio::spawn(async move { rendezvous.demand().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        rendezvous.close(Closure::Finished);
        rendezvous.close(Closure::Killed);

        assert_eq!(waiter.await.unwrap(), Ok(Demand::Finished));
    }
}
