//! Chunk references and crawler results

use std::fmt;

use serde_json::Value;

use crate::envelope::Envelope;
use crate::stage::Callback;

/// Typed view over the chunk reference carried by a crawler envelope.
#[derive(Debug, Clone, Default)]
pub struct ChunkWrapper {
    volume_id: Option<String>,
    volume_path: Option<String>,
    chunk_id: Option<String>,
    chunk_path: Option<String>,
}

impl ChunkWrapper {
    #[must_use]
    pub fn from_envelope(env: &Envelope) -> Self {
        let field = |key| {
            env.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Self {
            volume_id: field("volume_id"),
            volume_path: field("volume_path"),
            chunk_id: field("chunk_id"),
            chunk_path: field("chunk_path"),
        }
    }

    #[must_use]
    pub fn volume_id(&self) -> Option<&str> {
        self.volume_id.as_deref()
    }

    #[must_use]
    pub fn volume_path(&self) -> Option<&str> {
        self.volume_path.as_deref()
    }

    #[must_use]
    pub fn chunk_id(&self) -> Option<&str> {
        self.chunk_id.as_deref()
    }

    #[must_use]
    pub fn chunk_path(&self) -> Option<&str> {
        self.chunk_path.as_deref()
    }
}

impl fmt::Display for ChunkWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chunk [{},{}]",
            self.volume_id.as_deref().unwrap_or("-"),
            self.chunk_path.as_deref().unwrap_or("-"),
        )
    }
}

/// Outcome of one Handler invocation, delivered exactly once through the
/// callback. Always carries the chunk it was produced for.
#[derive(Debug, Clone)]
pub struct ChunkResult {
    status: u16,
    body: String,
    chunk: ChunkWrapper,
}

impl ChunkResult {
    /// Success outcome with an empty body.
    #[must_use]
    pub fn ok(chunk: ChunkWrapper) -> Self {
        Self {
            status: 200,
            body: String::new(),
            chunk,
        }
    }

    /// Error outcome. `body` must stay generic; raw error detail belongs in
    /// the log, never here.
    #[must_use]
    pub fn error(chunk: ChunkWrapper, body: impl Into<String>) -> Self {
        Self {
            status: 500,
            body: body.into(),
            chunk,
        }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn chunk(&self) -> &ChunkWrapper {
        &self.chunk
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        crate::stage::is_success(self.status)
    }

    /// Deliver the outcome onward. Consumes the result; a result is
    /// delivered at most once.
    pub fn deliver(self, cb: &Callback) {
        cb(self.status, &self.body);
    }
}
