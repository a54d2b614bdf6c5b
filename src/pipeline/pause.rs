//! Suspend/resume protocol primitives
//!
//! A stage requests a pause through its [`crate::FilterContext`]; the
//! resulting `PauseSignal` travels up the chain as
//! `Err(PipelineError::Paused(_))`. Every Filter it passes through appends
//! the signal's identifier to its own on-hold registry and re-anchors the
//! continuation at its own downstream stage, so the continuation the
//! consumer finally receives belongs to the outermost Filter and resuming
//! it re-runs the chain from the stage that paused.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use crate::envelope::Envelope;
use crate::errors::PipelineError;
use crate::stage::{Callback, EventStage};

/// The signal carried by a suspended processing attempt.
pub struct PauseSignal {
    id: String,
    continuation: Option<Continuation>,
}

impl PauseSignal {
    /// A signal with a freshly generated unique identifier and no
    /// continuation yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            continuation: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn has_continuation(&self) -> bool {
        self.continuation.is_some()
    }

    /// Re-anchor the continuation at `stage` with `callback`. Called by each
    /// Filter the signal passes through; the last caller (the outermost
    /// Filter) wins.
    pub fn anchor(&mut self, stage: Arc<dyn EventStage>, callback: Callback) {
        self.continuation = Some(Continuation { stage, callback });
    }

    #[must_use]
    pub fn continuation(&self) -> Option<&Continuation> {
        self.continuation.as_ref()
    }

    /// Split the signal into its persisted and in-memory halves.
    ///
    /// Only the identifier (already flushed into the envelope) survives a
    /// process boundary; the continuation is process-local. A consumer that
    /// restarts must rebuild the chain from configuration and decide its own
    /// re-entry policy from the persisted identifiers.
    #[must_use]
    pub fn into_parts(self) -> (String, Option<Continuation>) {
        (self.id, self.continuation)
    }
}

impl Default for PauseSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PauseSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PauseSignal")
            .field("id", &self.id)
            .field("continuation", &self.continuation.is_some())
            .finish()
    }
}

/// A deferred call: "resume processing at this stage with this callback".
/// May be invoked from a different task or thread than the one that paused.
#[derive(Clone)]
pub struct Continuation {
    stage: Arc<dyn EventStage>,
    callback: Callback,
}

impl Continuation {
    pub fn resume(&self, env: &mut Envelope) -> Result<(), PipelineError> {
        self.stage.call(env, &self.callback)
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("stage", &self.stage.name())
            .finish_non_exhaustive()
    }
}

/// Per-Filter-instance list of pause identifiers awaiting a flush into the
/// envelope's pause-marker slot.
#[derive(Debug, Default)]
pub struct OnHoldRegistry {
    ids: Mutex<Vec<String>>,
}

impl OnHoldRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, id: &str) {
        self.lock().push(id.to_string());
    }

    /// Append `id` and drain every held identifier into the envelope, under
    /// one guard. Concurrent attempts pausing through the same stage
    /// instance each keep their own identifiers.
    pub fn push_and_flush(&self, id: &str, env: &mut Envelope) {
        let mut ids = self.lock();
        ids.push(id.to_string());
        for id in ids.drain(..) {
            env.push_pipeline_to_resume(&id);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drain every held identifier into the envelope. Draining guarantees a
    /// second flush never reintroduces identifiers from an attempt that
    /// already flushed.
    pub fn flush_into(&self, env: &mut Envelope) {
        let drained = std::mem::take(&mut *self.lock());
        for id in drained {
            env.push_pipeline_to_resume(&id);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
