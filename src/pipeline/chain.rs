//! Chain building and stats aggregation
//!
//! Chains are composed explicitly at startup: stages are appended
//! front-to-back, the first appended becoming the outermost, and the whole
//! chain terminates at a caller-provided stage (usually [`PipelineEnd`] or
//! an event handler). The built `Pipeline` also aggregates per-stage stats
//! for the worker's periodic report.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::StageConf;
use crate::envelope::Envelope;
use crate::errors::PipelineError;
use crate::pipeline::filter::{FilterLogic, FilterStage, PipelineEnd};
use crate::stage::{Callback, EventStage};

type StageFactory = Box<dyn FnOnce(Arc<dyn EventStage>) -> Arc<dyn EventStage>>;

/// Builder composing Filter stages onto a terminal stage.
#[derive(Default)]
pub struct PipelineBuilder {
    factories: Vec<StageFactory>,
}

impl PipelineBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage built by `factory` from its downstream stage. The
    /// first appended stage becomes the outermost.
    #[must_use]
    pub fn with<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(Arc<dyn EventStage>) -> Arc<dyn EventStage> + 'static,
    {
        self.factories.push(Box::new(factory));
        self
    }

    /// Append a [`FilterStage`] wrapping `logic` with `conf`.
    #[must_use]
    pub fn with_filter<L>(self, logic: L, conf: StageConf) -> Self
    where
        L: FilterLogic + 'static,
    {
        self.with(move |app| Arc::new(FilterStage::new(logic, app, &conf)))
    }

    /// Close the chain on `terminal`.
    #[must_use]
    pub fn build(self, terminal: Arc<dyn EventStage>) -> Pipeline {
        let mut stages = Vec::with_capacity(self.factories.len());
        let mut app = terminal;
        for factory in self.factories.into_iter().rev() {
            app = factory(app);
            stages.push(app.clone());
        }
        stages.reverse();
        Pipeline { head: app, stages }
    }

    /// Close the chain on the default terminal stage.
    #[must_use]
    pub fn build_to_end(self) -> Pipeline {
        self.build(Arc::new(PipelineEnd))
    }
}

/// A fully composed Filter chain.
pub struct Pipeline {
    head: Arc<dyn EventStage>,
    stages: Vec<Arc<dyn EventStage>>,
}

impl Pipeline {
    /// Run one processing attempt through the whole chain.
    pub fn call(&self, env: &mut Envelope, cb: &Callback) -> Result<(), PipelineError> {
        self.head.call(env, cb)
    }

    /// The outermost stage, for consumers that drive the chain themselves.
    #[must_use]
    pub fn head(&self) -> &Arc<dyn EventStage> {
        &self.head
    }

    /// Counters per stage name.
    #[must_use]
    pub fn get_stats(&self) -> BTreeMap<String, BTreeMap<String, u64>> {
        self.stages
            .iter()
            .map(|stage| (stage.name().to_string(), stage.get_stats()))
            .collect()
    }

    pub fn reset_stats(&self) {
        for stage in &self.stages {
            stage.reset_stats();
        }
    }
}
