use std::any::Any;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use baobridge_verify::{RootDigest, StreamVerifier};
use bytes::Bytes;
use tokio::sync::{oneshot, watch};

use crate::core::{Closure, Endpoint, Handoff, HandoffError, Refusal, Rendezvous};
use crate::data::{Demand, Failure, Outcome, SessionId, SessionOptions, SessionPhase};
use crate::effects::reader::PullReader;
use crate::error::{Error, ProtocolViolation, Result};

/// One isolated verification run.
///
/// A session owns the root and proof handoffs, the data rendezvous, and a
/// dedicated worker thread that blocks on them and drives the verifier.
/// Every host-facing method is non-blocking except the async waits.
pub struct Session {
    id: SessionId,
    options: SessionOptions,
    root: Handoff<RootDigest>,
    proof: Handoff<Bytes>,
    rendezvous: Arc<Rendezvous>,
    phase: watch::Sender<SessionPhase>,
    outcome: watch::Sender<Option<Outcome>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Create a session and start its worker thread.
    ///
    /// The worker immediately blocks until both the root and the proof have
    /// been supplied.
    pub fn start(options: SessionOptions, verifier: Arc<dyn StreamVerifier>) -> Result<Arc<Self>> {
        let id = SessionId::next();
        let (root, root_rx) = Handoff::new();
        let (proof, proof_rx) = Handoff::new();
        let rendezvous = Arc::new(Rendezvous::new());

        let session = Arc::new(Self {
            id,
            options,
            root,
            proof,
            rendezvous: Arc::clone(&rendezvous),
            phase: watch::Sender::new(SessionPhase::Created),
            outcome: watch::Sender::new(None),
            worker: Mutex::new(None),
        });
        session.options.notify_phase(id, SessionPhase::Created);

        let worker = Worker {
            session: Arc::clone(&session),
            root: root_rx,
            proof: proof_rx,
            reader: PullReader::new(rendezvous),
            verifier,
        };

        let mut builder = thread::Builder::new().name(format!("bao-session-{id}"));
        if let Some(stack_size) = session.options.stack_size {
            builder = builder.stack_size(stack_size);
        }
        let handle = builder.spawn(move || worker.run()).map_err(Error::Spawn)?;
        *session.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        tracing::debug!(session = %id, "session created");
        Ok(session)
    }

    pub fn id(&self) -> SessionId { self.id }

    pub fn phase(&self) -> SessionPhase { *self.phase.borrow() }

    /// Namespaced name of one of this session's endpoints.
    pub fn endpoint(&self, endpoint: Endpoint) -> String { endpoint.name(&self.options.prefix, self.id) }

    /// Supply the 32-byte root digest. One-shot.
    pub fn submit_root(&self, root: &[u8]) -> Result<()> {
        let root = RootDigest::try_from(root).map_err(Error::InvalidRoot)?;
        self.root
            .put(root)
            .map_err(|err| self.handoff_error(err, ProtocolViolation::RootAlreadySupplied))
    }

    /// Supply the proof bytes. One-shot.
    pub fn submit_proof(&self, proof: impl Into<Bytes>) -> Result<()> {
        self.proof
            .put(proof.into())
            .map_err(|err| self.handoff_error(err, ProtocolViolation::ProofAlreadySupplied))
    }

    /// Answer the pending request with one chunk.
    ///
    /// Only valid after [`Session::next_request`] has reported
    /// [`Demand::Bytes`] and before anything else answered that request.
    /// An empty chunk signals end of stream.
    pub fn submit_data(&self, chunk: impl Into<Bytes>) -> Result<()> {
        self.rendezvous
            .deliver(chunk.into(), self.options.excess)
            .map_err(|refusal| match refusal {
                Refusal::Closed(_) => Error::Closed(self.id),
                Refusal::Violation(violation) => self.violation(violation),
            })
    }

    /// Wait for the verifier to ask for more data.
    ///
    /// Resolves to the same request until it is answered by
    /// [`Session::submit_data`], and to [`Demand::Finished`] once
    /// verification has ended. A killed session reports [`Error::Closed`].
    pub async fn next_request(&self) -> Result<Demand> {
        self.rendezvous.demand().await.map_err(|_| Error::Closed(self.id))
    }

    /// The unanswered request, if the verifier is currently blocked on one.
    pub fn pending_request(&self) -> Option<usize> { self.rendezvous.pending() }

    pub fn outcome(&self) -> Option<Outcome> { self.outcome.borrow().clone() }

    /// Bytes verified, once the outcome is published.
    pub fn result(&self) -> Option<u64> { self.outcome.borrow().as_ref().map(|outcome| outcome.bytes_verified) }

    /// Failure, once the outcome is published and only if there was one.
    pub fn error(&self) -> Option<Failure> { self.outcome.borrow().as_ref().and_then(|outcome| outcome.error.clone()) }

    pub async fn wait_outcome(&self) -> Outcome {
        let mut rx = self.outcome.subscribe();
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(outcome) = current {
                return outcome;
            }
            if rx.changed().await.is_err() {
                return Outcome::cancelled(0);
            }
        }
    }

    /// Terminate the session, releasing its worker thread.
    ///
    /// Returns `false` if the session had already reached a terminal phase.
    /// A kill that lands after the verifier returned but before its outcome
    /// was published still wins: the outcome reports a cancellation.
    pub fn kill(&self) -> bool {
        let killed = self.advance(SessionPhase::Killed);
        if killed {
            tracing::warn!(session = %self.id, "session killed");
        }
        self.shutdown(Closure::Killed);
        killed
    }

    /// Block until the worker thread has exited.
    ///
    /// Returns `false` if the worker panicked, was already joined, or if
    /// called from the worker thread itself.
    pub fn join(&self) -> bool {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        match worker.take() {
            Some(handle) if handle.thread().id() == thread::current().id() => {
                *worker = Some(handle);
                false
            }
            Some(handle) => {
                drop(worker);
                handle.join().is_ok()
            }
            None => false,
        }
    }

    fn handoff_error(&self, err: HandoffError, violation: ProtocolViolation) -> Error {
        match err {
            HandoffError::AlreadySupplied => self.violation(violation),
            HandoffError::Closed => Error::Closed(self.id),
        }
    }

    fn violation(&self, violation: ProtocolViolation) -> Error {
        tracing::warn!(session = %self.id, %violation, "protocol violation");
        Error::Protocol {
            session: self.id,
            violation,
        }
    }

    /// Move to `next` unless a terminal phase was reached first.
    fn advance(&self, next: SessionPhase) -> bool {
        let changed = self.phase.send_if_modified(|phase| {
            if phase.is_terminal() {
                return false;
            }
            *phase = next;
            true
        });
        if changed {
            tracing::debug!(session = %self.id, phase = %next, "phase transition");
            self.options.notify_phase(self.id, next);
        }
        changed
    }

    /// Write the outcome and move to `Done` in one step.
    ///
    /// Both happen under the phase lock, so a concurrent [`Session::kill`]
    /// either lands first and turns the outcome into a cancellation, or
    /// finds the session already done and is refused.
    fn publish(&self, mut outcome: Outcome) {
        let done = self.phase.send_if_modified(|phase| {
            if *phase == SessionPhase::Killed {
                outcome.error = Some(Failure::Cancelled);
            }
            self.outcome.send_if_modified(|slot| {
                if slot.is_some() {
                    return false;
                }
                *slot = Some(outcome.clone());
                true
            });
            if phase.is_terminal() {
                return false;
            }
            *phase = SessionPhase::Done;
            true
        });

        tracing::info!(
            session = %self.id,
            bytes_verified = outcome.bytes_verified,
            error = outcome.error.as_ref().map(tracing::field::display),
            "verification finished"
        );
        if done {
            tracing::debug!(session = %self.id, phase = %SessionPhase::Done, "phase transition");
            self.options.notify_phase(self.id, SessionPhase::Done);
        }
        self.shutdown(Closure::Finished);
    }

    fn shutdown(&self, closure: Closure) {
        self.rendezvous.close(closure);
        self.root.close();
        self.proof.close();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("phase", &self.phase())
            .field("outcome", &self.outcome())
            .finish()
    }
}

struct Worker {
    session: Arc<Session>,
    root: oneshot::Receiver<RootDigest>,
    proof: oneshot::Receiver<Bytes>,
    reader: PullReader,
    verifier: Arc<dyn StreamVerifier>,
}

impl Worker {
    fn run(self) {
        let Worker {
            session,
            root,
            proof,
            mut reader,
            verifier,
        } = self;
        session.advance(SessionPhase::AwaitingRootAndProof);

        // Both handoffs buffer their value, so arrival order does not matter.
        let outcome = match (root.blocking_recv(), proof.blocking_recv()) {
            (Ok(root), Ok(proof)) => {
                session.advance(SessionPhase::Verifying);
                let run = panic::catch_unwind(AssertUnwindSafe(|| {
                    verifier.verify(&mut io::sink(), &mut reader, &proof, &root)
                }));
                match run {
                    Ok(report) => Outcome::from(report),
                    Err(payload) => Outcome {
                        bytes_verified: 0,
                        error: Some(Failure::Panicked(panic_message(payload.as_ref()))),
                    },
                }
            }
            _ => Outcome::cancelled(0),
        };

        session.publish(outcome);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
