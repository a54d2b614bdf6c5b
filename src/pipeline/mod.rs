//! Event pipeline engine
//!
//! Chain-of-responsibility composition for storage lifecycle events:
//! Filter stages, the pause/resume protocol, and explicit chain building.

pub mod chain;
pub mod filter;
pub mod pause;

pub use chain::{Pipeline, PipelineBuilder};
pub use filter::{FilterLogic, FilterStage, LoggerFilter, PipelineEnd};
pub use pause::{Continuation, OnHoldRegistry, PauseSignal};
