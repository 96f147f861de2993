use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use baobridge_verify::{BaoVerifier, StreamVerifier};
use bytes::Bytes;

use crate::core::{Endpoint, parse_endpoint};
use crate::data::{Demand, Outcome, SessionId, SessionOptions};
use crate::effects::session::Session;
use crate::error::{Error, Result};

/// Table of live sessions, addressed by identifier.
///
/// The table is the only state shared between sessions; everything a
/// session pushes or pulls stays inside its own [`Session`].
pub struct Registry {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
    options: SessionOptions,
    verifier: Arc<dyn StreamVerifier>,
}

impl Default for Registry {
    fn default() -> Self { Self::new(SessionOptions::default()) }
}

impl Registry {
    /// Registry whose sessions verify with BLAKE3/BAO outboard proofs.
    pub fn new(options: SessionOptions) -> Self { Self::with_verifier(options, BaoVerifier::new()) }

    pub fn with_verifier(options: SessionOptions, verifier: impl StreamVerifier + 'static) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            options,
            verifier: Arc::new(verifier),
        }
    }

    pub fn options(&self) -> &SessionOptions { &self.options }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<SessionId, Arc<Session>>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, Arc<Session>>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new session and return its identifier.
    pub fn create(&self) -> Result<SessionId> {
        let session = Session::start(self.options.clone(), Arc::clone(&self.verifier))?;
        let id = session.id();
        self.write().insert(id, session);
        Ok(id)
    }

    pub fn session(&self, id: SessionId) -> Result<Arc<Session>> {
        self.read().get(&id).cloned().ok_or(Error::UnknownSession(id))
    }

    pub fn submit_root(&self, id: SessionId, root: &[u8]) -> Result<()> { self.session(id)?.submit_root(root) }

    pub fn submit_proof(&self, id: SessionId, proof: impl Into<Bytes>) -> Result<()> {
        self.session(id)?.submit_proof(proof)
    }

    pub fn submit_data(&self, id: SessionId, chunk: impl Into<Bytes>) -> Result<()> {
        self.session(id)?.submit_data(chunk)
    }

    pub async fn next_request(&self, id: SessionId) -> Result<Demand> {
        let session = self.session(id)?;
        session.next_request().await
    }

    pub fn outcome(&self, id: SessionId) -> Result<Option<Outcome>> { Ok(self.session(id)?.outcome()) }

    pub async fn wait_outcome(&self, id: SessionId) -> Result<Outcome> {
        let session = self.session(id)?;
        Ok(session.wait_outcome().await)
    }

    /// Kill a session and retire its identifier.
    pub fn kill(&self, id: SessionId) -> Result<()> {
        let session = self.write().remove(&id).ok_or(Error::UnknownSession(id))?;
        session.kill();
        Ok(())
    }

    /// Retire a session, killing it first if it has not published an outcome.
    pub fn release(&self, id: SessionId) -> Option<Arc<Session>> {
        let session = self.write().remove(&id)?;
        if session.outcome().is_none() {
            session.kill();
        }
        tracing::debug!(session = %id, "session released");
        Some(session)
    }

    /// Route a push to `<prefix>_<id>_<op>`.
    ///
    /// Only `set_root`, `set_proof` and `write` accept a payload; the other
    /// endpoints are queried through [`Registry::next_request`] and
    /// [`Registry::outcome`].
    pub fn dispatch(&self, name: &str, payload: impl Into<Bytes>) -> Result<()> {
        let invalid = || Error::InvalidEndpoint(name.to_string());
        let (id, endpoint) = parse_endpoint(&self.options.prefix, name).ok_or_else(invalid)?;
        let payload = payload.into();

        match endpoint {
            Endpoint::SetRoot => self.submit_root(id, &payload),
            Endpoint::SetProof => self.submit_proof(id, payload),
            Endpoint::Write => self.submit_data(id, payload),
            Endpoint::WritePromise | Endpoint::Result | Endpoint::Error => Err(invalid()),
        }
    }

    pub fn len(&self) -> usize { self.read().len() }

    pub fn is_empty(&self) -> bool { self.read().is_empty() }

    pub fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.read().keys().copied().collect();
        ids.sort();
        ids
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        let sessions = self.sessions.get_mut().unwrap_or_else(PoisonError::into_inner);
        for session in sessions.values() {
            if session.outcome().is_none() {
                session.kill();
            }
        }
    }
}
