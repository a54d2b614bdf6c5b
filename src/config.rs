//! Stage configuration handling
//!
//! Every stage in a chain receives a `StageConf`: the global worker
//! configuration overlaid with the stage-local section, stage-local keys
//! winning on conflict. Configurations are shared across stage types, so
//! unrecognized keys are always tolerated.

use serde_json::{Map, Value};

/// Template for structured log lines emitted under a stage's context.
pub const LOG_FORMAT: &str = "log_format";
/// Fragment appended to `log_format`.
pub const LOG_FORMAT_EXTRA: &str = "log_format_extra";
/// Label stored in the stage's diagnostic context.
pub const CTX_NAME: &str = "ctx_name";

/// Key/value configuration overlay for one stage.
#[derive(Debug, Clone, Default)]
pub struct StageConf {
    entries: Map<String, Value>,
}

impl StageConf {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_map(entries: Map<String, Value>) -> Self {
        Self { entries }
    }

    /// Build the effective configuration for one stage: start from the
    /// global settings, then apply the stage-local ones on top.
    #[must_use]
    pub fn overlay(global: &StageConf, local: &StageConf) -> StageConf {
        let mut entries = global.entries.clone();
        for (key, value) in &local.entries {
            entries.insert(key.clone(), value.clone());
        }
        StageConf { entries }
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.entries.insert(key.to_string(), value.into());
    }

    /// Builder-style `set`, convenient when assembling a chain.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    /// Lenient boolean lookup: accepts JSON booleans as well as the usual
    /// textual spellings (`true`/`yes`/`1`/`on`, `false`/`no`/`0`/`off`).
    /// Missing or unparseable values fall back to `default`.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.entries
            .get(key)
            .and_then(truthy)
            .unwrap_or(default)
    }

    /// Lenient integer lookup: JSON numbers or numeric strings.
    #[must_use]
    pub fn get_u64(&self, key: &str, default: u64) -> u64 {
        match self.entries.get(key) {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(default),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Interpret a JSON value as a boolean, the lenient way worker
/// configuration files spell them.
#[must_use]
pub fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" | "on" | "enabled" => Some(true),
            "false" | "no" | "0" | "off" | "disabled" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
