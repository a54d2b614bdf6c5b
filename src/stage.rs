//! Typed stage interfaces
//!
//! Both chains compose stages over the same `(envelope, callback)` calling
//! convention. `EventStage` is the pipeline side: fallible, pause-aware.
//! `ChunkStage` is the crawler side: failures never escape a stage, they
//! degrade into a delivered error result. Chains are built explicitly at
//! startup; see [`crate::pipeline::chain`].

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::envelope::Envelope;
use crate::errors::PipelineError;

/// Continuation supplied by the consumer, invoked exactly once per
/// processing attempt with a final `(status, body)` outcome.
pub type Callback = Arc<dyn Fn(u16, &str) + Send + Sync>;

#[must_use]
pub fn is_success(status: u16) -> bool {
    (200..=299).contains(&status)
}

#[must_use]
pub fn is_error(status: u16) -> bool {
    (500..=599).contains(&status)
}

/// One stage of the event pipeline.
pub trait EventStage: Send + Sync {
    /// Process one event, forwarding to the downstream stage as needed.
    ///
    /// `Err(PipelineError::Paused(_))` means the attempt is suspended, not
    /// failed; every other error propagates unchanged to the consumer.
    fn call(&self, env: &mut Envelope, cb: &Callback) -> Result<(), PipelineError>;

    /// Stage label used in stats reports and diagnostics.
    fn name(&self) -> &str {
        "stage"
    }

    fn get_stats(&self) -> BTreeMap<String, u64> {
        BTreeMap::new()
    }

    fn reset_stats(&self) {}
}

/// One stage of the crawler chain. Never fails outward: whatever happens,
/// exactly one result is delivered through the callback.
pub trait ChunkStage: Send + Sync {
    fn call(&self, env: &mut Envelope, cb: &Callback);

    fn get_stats(&self) -> BTreeMap<String, u64> {
        BTreeMap::new()
    }

    fn reset_stats(&self) {}
}
