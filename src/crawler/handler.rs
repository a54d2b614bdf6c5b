//! Handler stages
//!
//! The crawler-side counterpart of the Filter: a `HandlerStage` wraps one
//! piece of per-chunk business logic with blanket error capture. A handler
//! invocation always delivers exactly one result through the callback; a
//! bad chunk never interrupts the crawler loop. Handlers are terminal by
//! contract (their state machine ends at delivery, there is no forwarding),
//! so retry policy, if any, lives in the crawler.

use std::collections::BTreeMap;

use crate::config::StageConf;
use crate::crawler::chunk::{ChunkResult, ChunkWrapper};
use crate::envelope::Envelope;
use crate::errors::HandlerError;
use crate::stage::{Callback, ChunkStage};

/// Per-chunk business logic.
///
/// The default `process` is the identity stage: an Ok result, no side
/// effects.
pub trait HandlerLogic: Send + Sync {
    fn process(&self, chunk: &ChunkWrapper) -> Result<ChunkResult, HandlerError> {
        Ok(ChunkResult::ok(chunk.clone()))
    }

    fn get_stats(&self) -> BTreeMap<String, u64> {
        BTreeMap::new()
    }

    /// Must be idempotent and non-throwing.
    fn reset_stats(&self) {}
}

/// The identity handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHandler;

impl HandlerLogic for DefaultHandler {}

/// One Handler stage: business logic plus error capture and delivery.
pub struct HandlerStage<L> {
    logic: L,
    conf: StageConf,
}

impl<L: HandlerLogic> HandlerStage<L> {
    pub fn new(logic: L, conf: StageConf) -> Self {
        Self { logic, conf }
    }

    #[must_use]
    pub fn conf(&self) -> &StageConf {
        &self.conf
    }
}

impl<L: HandlerLogic> ChunkStage for HandlerStage<L> {
    fn call(&self, env: &mut Envelope, cb: &Callback) {
        let chunk = ChunkWrapper::from_envelope(env);
        let res = match self.logic.process(&chunk) {
            Ok(res) => res,
            Err(HandlerError::Stopping) => {
                log::info!(
                    "chunk_id={} not handled: the process is stopping",
                    chunk.chunk_id().unwrap_or("-"),
                );
                ChunkResult::error(chunk, "Process is stopping")
            }
            Err(HandlerError::Other(err)) => {
                // Full detail goes to the log; the delivered body stays
                // generic and never leaks internal error text.
                log::error!(
                    "chunk_id={} not handled: {err:#}",
                    chunk.chunk_id().unwrap_or("-"),
                );
                ChunkResult::error(chunk, "An error occurred")
            }
        };
        res.deliver(cb);
    }

    fn get_stats(&self) -> BTreeMap<String, u64> {
        self.logic.get_stats()
    }

    fn reset_stats(&self) {
        self.logic.reset_stats();
    }
}
