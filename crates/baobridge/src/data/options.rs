use std::fmt;
use std::sync::Arc;

use super::outcome::SessionPhase;
use super::session_id::SessionId;

/// Callback invoked on every session phase transition.
pub type PhaseCallback = Arc<dyn Fn(SessionId, SessionPhase) + Send + Sync>;

/// What a session does with a write larger than the pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExcessPolicy {
    /// Accept the write; the reader hands out the requested prefix and
    /// keeps the remainder for its following reads.
    #[default]
    Buffer,

    /// Refuse the write with a protocol violation. The request stays
    /// pending so the host can retry with a smaller chunk.
    Reject,
}

/// Configuration shared by every session a registry creates.
///
/// # Examples
///
/// ```
/// use baobridge::{ExcessPolicy, SessionOptions};
///
/// let options = SessionOptions::default()
///     .prefix("upload")
///     .excess(ExcessPolicy::Reject)
///     .stack_size(256 * 1024);
/// ```
#[derive(Clone)]
pub struct SessionOptions {
    /// Namespace prefix for the session endpoints, `<prefix>_<id>_<op>`.
    ///
    /// Default: `"bao"`
    pub prefix: String,

    /// Policy for writes that exceed the pending request.
    ///
    /// Default: [`ExcessPolicy::Buffer`]
    pub excess: ExcessPolicy,

    /// Stack size for each session's verification thread.
    ///
    /// Default: None (platform default)
    pub stack_size: Option<usize>,

    /// Phase callback, invoked from whichever thread drives the transition.
    ///
    /// Default: None
    pub on_phase: Option<PhaseCallback>,
}

impl fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOptions")
            .field("prefix", &self.prefix)
            .field("excess", &self.excess)
            .field("stack_size", &self.stack_size)
            .field("on_phase", &self.on_phase.as_ref().map(|_| "{ ... }"))
            .finish()
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            prefix: "bao".to_string(),
            excess: ExcessPolicy::default(),
            stack_size: None,
            on_phase: None,
        }
    }
}

impl SessionOptions {
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn excess(mut self, policy: ExcessPolicy) -> Self {
        self.excess = policy;
        self
    }

    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    pub fn on_phase(mut self, callback: impl Fn(SessionId, SessionPhase) + Send + Sync + 'static) -> Self {
        self.on_phase = Some(Arc::new(callback));
        self
    }

    pub(crate) fn notify_phase(&self, id: SessionId, phase: SessionPhase) {
        if let Some(callback) = &self.on_phase {
            callback(id, phase);
        }
    }
}
