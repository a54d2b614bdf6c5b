mod common;

use std::collections::BTreeMap;

use serde_json::{Value, json};

use common::{Recorder, envelope, init_logging};
use eventpipe::context::FilterContext;
use eventpipe::{
    Callback, Envelope, EventStage, FilterLogic, LoggerFilter, PipelineBuilder, PipelineError,
    StageConf, Stats, event_types,
};

/// Counts successes and errors like a production stage would.
struct AuditFilter {
    stats: Stats,
}

impl AuditFilter {
    fn new() -> Self {
        Self { stats: Stats::new() }
    }
}

impl FilterLogic for AuditFilter {
    fn name(&self) -> &str {
        "audit"
    }

    fn process(
        &self,
        _ctx: &FilterContext,
        env: &mut Envelope,
        next: &dyn EventStage,
        cb: &Callback,
    ) -> Result<Option<Value>, PipelineError> {
        match next.call(env, cb) {
            Ok(()) => {
                self.stats.incr("successes");
                Ok(None)
            }
            Err(err) => {
                self.stats.incr("errors");
                Err(err)
            }
        }
    }

    fn get_stats(&self) -> BTreeMap<String, u64> {
        self.stats.snapshot()
    }

    fn reset_stats(&self) {
        self.stats.reset();
    }
}

#[test]
fn logger_filter_counts_and_forwards() {
    init_logging();
    let pipeline = PipelineBuilder::new()
        .with_filter(LoggerFilter::new(&StageConf::new()), StageConf::new())
        .build_to_end();

    let (recorder, cb) = Recorder::new();
    for _ in 0..3 {
        let mut env = envelope(json!({
            "event": event_types::CONTENT_NEW,
            "request_id": "req-log",
            "url": {"account": "acct", "user": "cnt"},
        }));
        pipeline.call(&mut env, &cb).expect("forwarded");
    }

    assert_eq!(recorder.calls().len(), 3);
    let stats = pipeline.get_stats();
    assert_eq!(
        stats.get("logger").and_then(|s| s.get("successes")),
        Some(&3)
    );
}

#[test]
fn stats_are_aggregated_per_stage_name() {
    init_logging();
    let pipeline = PipelineBuilder::new()
        .with_filter(AuditFilter::new(), StageConf::new())
        .with_filter(
            LoggerFilter::new(&StageConf::new()),
            StageConf::new().with("ctx_name", "tail-logger"),
        )
        .build_to_end();

    let (_recorder, cb) = Recorder::new();
    let mut env = envelope(json!({"event": event_types::CHUNK_NEW}));
    pipeline.call(&mut env, &cb).expect("forwarded");

    let stats = pipeline.get_stats();
    assert_eq!(stats.len(), 2);
    assert_eq!(
        stats.get("audit").and_then(|s| s.get("successes")),
        Some(&1)
    );
    // the conf name overrides the logic's own name
    assert_eq!(
        stats.get("tail-logger").and_then(|s| s.get("successes")),
        Some(&1)
    );
    assert!(stats.get("logger").is_none());
}

#[test]
fn reset_clears_every_stage() {
    init_logging();
    let pipeline = PipelineBuilder::new()
        .with_filter(AuditFilter::new(), StageConf::new())
        .with_filter(LoggerFilter::new(&StageConf::new()), StageConf::new())
        .build_to_end();

    let (_recorder, cb) = Recorder::new();
    let mut env = envelope(json!({"event": event_types::CONTAINER_DELETED}));
    pipeline.call(&mut env, &cb).expect("forwarded");
    assert!(!pipeline.get_stats().values().all(BTreeMap::is_empty));

    pipeline.reset_stats();
    pipeline.reset_stats();
    assert!(pipeline.get_stats().values().all(BTreeMap::is_empty));
}

#[test]
fn audit_filter_counts_downstream_errors() {
    struct Failing;

    impl FilterLogic for Failing {
        fn process(
            &self,
            _ctx: &FilterContext,
            _env: &mut Envelope,
            _next: &dyn EventStage,
            _cb: &Callback,
        ) -> Result<Option<Value>, PipelineError> {
            Err(anyhow::anyhow!("no quorum").into())
        }
    }

    init_logging();
    let pipeline = PipelineBuilder::new()
        .with_filter(AuditFilter::new(), StageConf::new())
        .with_filter(Failing, StageConf::new())
        .build_to_end();

    let (_recorder, cb) = Recorder::new();
    let mut env = envelope(json!({"event": event_types::CONTENT_NEW}));
    pipeline.call(&mut env, &cb).unwrap_err();

    assert_eq!(
        pipeline.get_stats().get("audit").and_then(|s| s.get("errors")),
        Some(&1)
    );
}
