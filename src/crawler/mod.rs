//! Crawler handler chain
//!
//! The per-chunk side of the engine: chunk wrappers, delivered results,
//! and the Handler stage with its blanket error capture.

pub mod chunk;
pub mod handler;

pub use chunk::{ChunkResult, ChunkWrapper};
pub use handler::{DefaultHandler, HandlerLogic, HandlerStage};
