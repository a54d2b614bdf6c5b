//! Error types for the pipeline and crawler engines

use crate::pipeline::pause::PauseSignal;

/// Errors raised while wrapping a raw payload into an [`crate::Envelope`].
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The decoded payload was not an attribute mapping
    #[error("event payload is not an object")]
    NotAnObject,
}

/// Outcome of a Filter stage call that did not complete normally.
///
/// `Paused` is control flow, not a failure: it travels up the chain until
/// the outermost caller takes charge of the resumption. Everything else
/// propagates unchanged to the consumer, whose retry or dead-letter policy
/// applies.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The processing attempt is suspended; the signal carries the resume
    /// continuation once the outermost Filter has seen it
    #[error("pipeline paused (signal {})", .0.id())]
    Paused(PauseSignal),

    /// Business logic returned a value where none is expected
    #[error("unexpected return value from filter {filter}: {value}")]
    UnexpectedReturn {
        filter: String,
        value: serde_json::Value,
    },

    /// Unclassified failure from business logic
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    #[must_use]
    pub fn is_paused(&self) -> bool {
        matches!(self, PipelineError::Paused(_))
    }

    /// Extract the pause signal, if this is a suspension.
    pub fn into_pause_signal(self) -> Result<PauseSignal, PipelineError> {
        match self {
            PipelineError::Paused(signal) => Ok(signal),
            other => Err(other),
        }
    }
}

/// Errors a Handler's business logic may raise. The Handler captures every
/// variant and degrades it into a delivered error result; none escape to
/// the crawler loop.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Cooperative graceful-shutdown signal: the worker is draining and
    /// should stop issuing new work
    #[error("process is stopping")]
    Stopping,

    /// Anything else
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
