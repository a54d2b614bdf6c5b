pub mod config;
pub mod context;
pub mod crawler;
pub mod envelope;
pub mod errors;
pub mod logging;
pub mod pipeline;
pub mod stage;
pub mod stats;

pub use config::StageConf;
pub use context::FilterContext;
pub use crawler::{ChunkResult, ChunkWrapper, DefaultHandler, HandlerLogic, HandlerStage};
pub use envelope::{Envelope, event_types};
pub use errors::{EnvelopeError, HandlerError, PipelineError};
pub use logging::{DEFAULT_LOG_FORMAT, LogTemplate};
pub use pipeline::{
    Continuation, FilterLogic, FilterStage, LoggerFilter, OnHoldRegistry, PauseSignal, Pipeline,
    PipelineBuilder, PipelineEnd,
};
pub use stage::{Callback, ChunkStage, EventStage, is_error, is_success};
pub use stats::Stats;
