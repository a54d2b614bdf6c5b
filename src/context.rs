//! Per-invocation diagnostic context
//!
//! Each Filter call snapshots the envelope's diagnostic fields into a
//! `FilterContext` and passes it explicitly to business logic. The same
//! snapshot backs the `tracing` span the Filter enters for the duration of
//! the call, so the logging sink sees the fields of the attempt currently
//! executing on this task and never those of a concurrent one.

use serde::Serialize;
use tracing::field::Empty;
use tracing::Span;

use crate::envelope::Envelope;
use crate::errors::PipelineError;
use crate::pipeline::pause::PauseSignal;

/// Snapshot of the diagnostic fields of one processing attempt, plus the
/// name of the executing stage. Built fresh per Filter invocation, never
/// mutated afterwards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterContext {
    pub filter_name: Option<String>,
    pub event_type: Option<String>,
    pub request_id: Option<String>,
    pub account: Option<String>,
    pub container: Option<String>,
    pub cid: Option<String>,
    pub bucket: Option<String>,
    pub path: Option<String>,
    pub content_id: Option<String>,
    pub version_id: Option<String>,
    #[serde(skip)]
    pausable: bool,
}

impl FilterContext {
    #[must_use]
    pub fn from_envelope(env: &Envelope, filter_name: Option<&str>) -> Self {
        Self {
            filter_name: filter_name.map(str::to_string),
            event_type: env.event_type().map(str::to_string),
            request_id: env.request_id(),
            account: env.account(),
            container: env.container(),
            cid: env.cid(),
            bucket: env.bucket(),
            path: env.path(),
            content_id: env.content_id(),
            version_id: env.version_id(),
            pausable: env.is_pausable(),
        }
    }

    /// Whether this attempt may be suspended. Captured per call; concurrent
    /// attempts through the same Filter instance never share it.
    #[must_use]
    pub fn is_pausable(&self) -> bool {
        self.pausable
    }

    /// Ask to suspend the in-flight attempt. A no-op unless the envelope was
    /// marked pausable for this call, so business logic can request a pause
    /// unconditionally:
    ///
    /// ```ignore
    /// ctx.request_pause()?;
    /// ```
    pub fn request_pause(&self) -> Result<(), PipelineError> {
        if self.pausable {
            return Err(PipelineError::Paused(PauseSignal::new()));
        }
        Ok(())
    }

    /// Field access by template token name, for LTSV rendering.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "filter_name" => &self.filter_name,
            "event_type" => &self.event_type,
            "request_id" => &self.request_id,
            "account" => &self.account,
            "container" => &self.container,
            "cid" => &self.cid,
            "bucket" => &self.bucket,
            "path" => &self.path,
            "content_id" => &self.content_id,
            "version_id" => &self.version_id,
            _ => return None,
        };
        value.as_deref()
    }

    /// Span carrying this context, entered by the Filter for the duration of
    /// one call. Missing fields stay unrecorded.
    #[must_use]
    pub fn span(&self) -> Span {
        let span = tracing::info_span!(
            "filter",
            filter = Empty,
            event_type = Empty,
            request_id = Empty,
            account = Empty,
            container = Empty,
            cid = Empty,
            bucket = Empty,
            object = Empty,
            content_id = Empty,
            version_id = Empty,
        );
        if let Some(v) = self.filter_name.as_deref() {
            span.record("filter", v);
        }
        if let Some(v) = self.event_type.as_deref() {
            span.record("event_type", v);
        }
        if let Some(v) = self.request_id.as_deref() {
            span.record("request_id", v);
        }
        if let Some(v) = self.account.as_deref() {
            span.record("account", v);
        }
        if let Some(v) = self.container.as_deref() {
            span.record("container", v);
        }
        if let Some(v) = self.cid.as_deref() {
            span.record("cid", v);
        }
        if let Some(v) = self.bucket.as_deref() {
            span.record("bucket", v);
        }
        if let Some(v) = self.path.as_deref() {
            span.record("object", v);
        }
        if let Some(v) = self.content_id.as_deref() {
            span.record("content_id", v);
        }
        if let Some(v) = self.version_id.as_deref() {
            span.record("version_id", v);
        }
        span
    }
}
