mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use serde_json::json;

use common::{Recorder, envelope, init_logging};
use eventpipe::{
    ChunkResult, ChunkStage, ChunkWrapper, DefaultHandler, HandlerError, HandlerLogic,
    HandlerStage, StageConf, Stats, is_error, is_success,
};

#[test]
fn default_handler_delivers_ok() {
    init_logging();
    let stage = HandlerStage::new(DefaultHandler, StageConf::new());
    let mut env = envelope(json!({"chunk_id": "X", "volume_id": "vol-1"}));
    let (recorder, cb) = Recorder::new();

    stage.call(&mut env, &cb);

    let calls = recorder.calls();
    assert_eq!(calls, vec![(200, String::new())]);
    assert!(is_success(calls[0].0));
}

#[test]
fn generic_errors_degrade_into_an_opaque_result() {
    struct FailingHandler;

    impl HandlerLogic for FailingHandler {
        fn process(&self, _chunk: &ChunkWrapper) -> Result<ChunkResult, HandlerError> {
            Err(anyhow::anyhow!("disk read failed at sector 42").into())
        }
    }

    init_logging();
    let stage = HandlerStage::new(FailingHandler, StageConf::new());
    let mut env = envelope(json!({"chunk_id": "X"}));
    let (recorder, cb) = Recorder::new();

    stage.call(&mut env, &cb);

    let calls = recorder.calls();
    assert_eq!(calls.len(), 1, "exactly one result per invocation");
    let (status, body) = &calls[0];
    assert!(is_error(*status));
    assert_eq!(body, "An error occurred");
    // raw detail is for the log only
    assert!(!body.contains("sector 42"));
}

#[test]
fn stopping_signal_degrades_into_a_benign_result() {
    struct StoppingHandler;

    impl HandlerLogic for StoppingHandler {
        fn process(&self, _chunk: &ChunkWrapper) -> Result<ChunkResult, HandlerError> {
            Err(HandlerError::Stopping)
        }
    }

    init_logging();
    let stage = HandlerStage::new(StoppingHandler, StageConf::new());
    let mut env = envelope(json!({"chunk_id": "X"}));
    let (recorder, cb) = Recorder::new();

    stage.call(&mut env, &cb);

    assert_eq!(
        recorder.calls(),
        vec![(500, "Process is stopping".to_string())]
    );
}

#[test]
fn logic_sees_the_wrapped_chunk() {
    struct Capturing {
        seen: Arc<Mutex<Option<String>>>,
    }

    impl HandlerLogic for Capturing {
        fn process(&self, chunk: &ChunkWrapper) -> Result<ChunkResult, HandlerError> {
            *self.seen.lock().expect("seen lock") =
                chunk.chunk_id().map(str::to_string);
            Ok(ChunkResult::ok(chunk.clone()))
        }
    }

    init_logging();
    let seen = Arc::new(Mutex::new(None));
    let stage = HandlerStage::new(Capturing { seen: seen.clone() }, StageConf::new());
    let mut env = envelope(json!({
        "chunk_id": "AABBCC",
        "chunk_path": "/srv/vol-1/AAB/AABBCC",
        "volume_id": "vol-1",
    }));
    let (_recorder, cb) = Recorder::new();

    stage.call(&mut env, &cb);
    assert_eq!(seen.lock().expect("seen lock").as_deref(), Some("AABBCC"));
}

#[test]
fn handler_stats_are_exposed_and_resettable() {
    #[derive(Default)]
    struct CountingHandler {
        stats: Stats,
    }

    impl HandlerLogic for CountingHandler {
        fn process(&self, chunk: &ChunkWrapper) -> Result<ChunkResult, HandlerError> {
            self.stats.incr("chunks");
            Ok(ChunkResult::ok(chunk.clone()))
        }

        fn get_stats(&self) -> BTreeMap<String, u64> {
            self.stats.snapshot()
        }

        fn reset_stats(&self) {
            self.stats.reset();
        }
    }

    init_logging();
    let stage = HandlerStage::new(CountingHandler::default(), StageConf::new());
    let (_recorder, cb) = Recorder::new();

    for id in ["a", "b", "c"] {
        let mut env = envelope(json!({"chunk_id": id}));
        stage.call(&mut env, &cb);
    }
    assert_eq!(stage.get_stats().get("chunks"), Some(&3));

    // reset is idempotent
    stage.reset_stats();
    stage.reset_stats();
    assert!(stage.get_stats().is_empty());
}

#[test]
fn stage_conf_is_an_overlay() {
    let global = StageConf::new()
        .with("log_format", "g")
        .with("scanned_per_second", 30);
    let local = StageConf::new().with("log_format", "l");
    let conf = StageConf::overlay(&global, &local);

    let stage = HandlerStage::new(DefaultHandler, conf);
    assert_eq!(stage.conf().get_str("log_format"), Some("l"));
    assert_eq!(stage.conf().get_u64("scanned_per_second", 0), 30);
}
