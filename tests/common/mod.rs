use std::sync::{Arc, Mutex};

use eventpipe::{Callback, Envelope};
use serde_json::Value;

/// Install test log sinks once; safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn envelope(value: Value) -> Envelope {
    Envelope::from_value(value).expect("object payload")
}

/// Records every `(status, body)` outcome delivered through the callback.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<(u16, String)>>>,
}

impl Recorder {
    pub fn new() -> (Self, Callback) {
        let recorder = Recorder::default();
        let calls = recorder.calls.clone();
        let cb: Callback = Arc::new(move |status, body: &str| {
            calls
                .lock()
                .expect("recorder lock")
                .push((status, body.to_string()));
        });
        (recorder, cb)
    }

    pub fn calls(&self) -> Vec<(u16, String)> {
        self.calls.lock().expect("recorder lock").clone()
    }
}
