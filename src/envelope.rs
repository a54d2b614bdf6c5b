//! Event and chunk envelopes
//!
//! An `Envelope` is the read-only view over the untyped attribute mapping
//! that represents one unit of work: a storage lifecycle event delivered by
//! the broker, or a chunk reference produced by the crawler scan. Stages may
//! only ever append to the pause-marker slot; every other attribute is
//! stable for the life of one processing attempt, across any number of
//! pause/resume cycles.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::truthy;
use crate::errors::EnvelopeError;

/// Well-known event type strings.
pub mod event_types {
    pub const CONTENT_NEW: &str = "storage.content.new";
    pub const CONTENT_DELETED: &str = "storage.content.deleted";
    pub const CHUNK_NEW: &str = "storage.chunk.new";
    pub const CHUNK_REPAIRED: &str = "storage.chunk.repaired";
    pub const CONTAINER_NEW: &str = "storage.container.new";
    pub const CONTAINER_DELETED: &str = "storage.container.deleted";

    /// Reserved marker closing an internal batch. Filters forward it to
    /// their downstream stage without running business logic, unless they
    /// opt in to seeing it.
    pub const INTERNAL_BATCH_END: &str = "internal.batch.end";
}

/// Envelope flag permitting suspension for the current processing attempt.
pub const PAUSABLE: &str = "pausable";
/// Slot accumulating pause-signal identifiers, persisted by the broker.
pub const PIPELINES_TO_RESUME: &str = "pipelines_to_resume";

/// One unit of work: an ordered attribute mapping with typed accessors for
/// the well-known fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Envelope {
    attrs: Map<String, Value>,
}

impl Envelope {
    #[must_use]
    pub fn new(attrs: Map<String, Value>) -> Self {
        Self { attrs }
    }

    /// Wrap a decoded broker payload. Anything but a JSON object is refused.
    pub fn from_value(value: Value) -> Result<Self, EnvelopeError> {
        match value {
            Value::Object(attrs) => Ok(Self { attrs }),
            _ => Err(EnvelopeError::NotAnObject),
        }
    }

    #[must_use]
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attrs
    }

    /// Top-level attribute access.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    /// Look a key up the way events are laid out on the wire: at the top
    /// level first, then under `url.shard`, `url` and `data`. Nulls are
    /// treated as absent.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        if let Some(v) = self.attrs.get(key).filter(|v| !v.is_null()) {
            return Some(v);
        }
        let url = self.attrs.get("url").and_then(Value::as_object);
        let shard = url
            .and_then(|u| u.get("shard"))
            .and_then(Value::as_object);
        let data = self.attrs.get("data").and_then(Value::as_object);
        shard
            .and_then(|m| m.get(key))
            .or_else(|| url.and_then(|m| m.get(key)))
            .or_else(|| data.and_then(|m| m.get(key)))
            .filter(|v| !v.is_null())
    }

    fn first(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().find_map(|k| self.lookup(k))
    }

    fn first_string(&self, keys: &[&str]) -> Option<String> {
        self.first(keys).and_then(stringify)
    }

    #[must_use]
    pub fn event_type(&self) -> Option<&str> {
        self.first(&["event_type", "event"]).and_then(Value::as_str)
    }

    #[must_use]
    pub fn request_id(&self) -> Option<String> {
        self.first_string(&["request_id"])
    }

    #[must_use]
    pub fn account(&self) -> Option<String> {
        self.first_string(&["account", "main_account"])
    }

    #[must_use]
    pub fn container(&self) -> Option<String> {
        self.first_string(&["container", "user"])
    }

    #[must_use]
    pub fn cid(&self) -> Option<String> {
        self.first_string(&["cid", "id"])
    }

    #[must_use]
    pub fn bucket(&self) -> Option<String> {
        self.first_string(&["bucket"])
    }

    #[must_use]
    pub fn path(&self) -> Option<String> {
        self.first_string(&["path", "object"])
    }

    #[must_use]
    pub fn content_id(&self) -> Option<String> {
        self.first_string(&["content_id", "content"])
    }

    #[must_use]
    pub fn version_id(&self) -> Option<String> {
        self.first_string(&["version_id", "version"])
    }

    /// Whether this processing attempt may be suspended.
    #[must_use]
    pub fn is_pausable(&self) -> bool {
        self.lookup(PAUSABLE).and_then(truthy).unwrap_or(false)
    }

    /// Append one pause-signal identifier to the pause-marker slot. This is
    /// the only mutation stages are allowed to perform.
    pub fn push_pipeline_to_resume(&mut self, id: &str) {
        let slot = self
            .attrs
            .entry(PIPELINES_TO_RESUME.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(ids) = slot {
            ids.push(Value::String(id.to_string()));
        }
    }

    /// Identifiers of the pipeline layers still owed a resume, in the order
    /// they were flushed. Opaque to everything but the layer that wrote them.
    #[must_use]
    pub fn pipelines_to_resume(&self) -> Vec<String> {
        self.attrs
            .get(PIPELINES_TO_RESUME)
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: Value) -> Envelope {
        Envelope::from_value(value).expect("object payload")
    }

    #[test]
    fn rejects_non_object_payloads() {
        assert!(Envelope::from_value(json!(["not", "an", "object"])).is_err());
        assert!(Envelope::from_value(json!("nope")).is_err());
    }

    #[test]
    fn nested_lookup_and_aliases() {
        let env = envelope(json!({
            "event": "storage.content.new",
            "request_id": "req-1",
            "url": {
                "user": "my-container",
                "id": "CID0123",
                "object": "photos/cat.jpg",
                "shard": {"account": "AUTH_demo"},
                "version": 17,
            },
            "data": {"bucket": "my-bucket", "content": "C1"},
        }));

        assert_eq!(env.event_type(), Some("storage.content.new"));
        assert_eq!(env.request_id().as_deref(), Some("req-1"));
        assert_eq!(env.container().as_deref(), Some("my-container"));
        assert_eq!(env.cid().as_deref(), Some("CID0123"));
        assert_eq!(env.path().as_deref(), Some("photos/cat.jpg"));
        // shard section wins over url and data
        assert_eq!(env.account().as_deref(), Some("AUTH_demo"));
        assert_eq!(env.bucket().as_deref(), Some("my-bucket"));
        assert_eq!(env.content_id().as_deref(), Some("C1"));
        // numbers come back as their decimal form
        assert_eq!(env.version_id().as_deref(), Some("17"));
    }

    #[test]
    fn pausable_flag_is_lenient() {
        assert!(!envelope(json!({})).is_pausable());
        assert!(envelope(json!({"pausable": true})).is_pausable());
        assert!(envelope(json!({"pausable": "yes"})).is_pausable());
        assert!(!envelope(json!({"pausable": "no"})).is_pausable());
    }

    #[test]
    fn pause_markers_accumulate_in_order() {
        let mut env = envelope(json!({"event": "storage.chunk.new"}));
        assert!(env.pipelines_to_resume().is_empty());

        env.push_pipeline_to_resume("aaa");
        env.push_pipeline_to_resume("bbb");
        assert_eq!(env.pipelines_to_resume(), vec!["aaa", "bbb"]);
    }
}
