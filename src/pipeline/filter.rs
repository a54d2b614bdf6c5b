//! Filter stages
//!
//! A `FilterStage` wraps one piece of business logic ([`FilterLogic`]) with
//! the pipeline stage contract: per-call diagnostic context, skipping of
//! the internal batch-end marker, pause interception and decoration, the
//! contract-violation check, and the on-hold flush on every outcome.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::config::{CTX_NAME, StageConf};
use crate::context::FilterContext;
use crate::envelope::{Envelope, event_types};
use crate::errors::PipelineError;
use crate::logging::LogTemplate;
use crate::pipeline::pause::OnHoldRegistry;
use crate::stage::{Callback, EventStage};
use crate::stats::Stats;

/// Business logic of one Filter stage.
///
/// The default `process` is the identity stage: forward the envelope to the
/// downstream stage untouched.
pub trait FilterLogic: Send + Sync {
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Process one event, forwarding to `next` as appropriate.
    ///
    /// Returning `Ok(Some(_))` is a programming-contract violation the
    /// wrapping stage reports as an error; stage chains deliver outcomes
    /// through the callback, never through return values.
    fn process(
        &self,
        ctx: &FilterContext,
        env: &mut Envelope,
        next: &dyn EventStage,
        cb: &Callback,
    ) -> Result<Option<Value>, PipelineError> {
        let _ = ctx;
        next.call(env, cb)?;
        Ok(None)
    }

    /// Whether the internal batch-end marker bypasses this stage's business
    /// logic. Stages that need to observe batch boundaries return false.
    fn skip_end_batch_event(&self) -> bool {
        true
    }

    fn get_stats(&self) -> BTreeMap<String, u64> {
        BTreeMap::new()
    }

    fn reset_stats(&self) {}
}

/// One Filter stage of the event pipeline: business logic plus the stage
/// contract, bound to its downstream stage.
pub struct FilterStage<L> {
    logic: L,
    app: Arc<dyn EventStage>,
    ctx_name: Option<String>,
    on_hold: OnHoldRegistry,
}

impl<L: FilterLogic> FilterStage<L> {
    pub fn new(logic: L, app: Arc<dyn EventStage>, conf: &StageConf) -> Self {
        Self {
            logic,
            app,
            ctx_name: conf.get_str(CTX_NAME).map(str::to_string),
            on_hold: OnHoldRegistry::new(),
        }
    }

    fn run(
        &self,
        ctx: &FilterContext,
        env: &mut Envelope,
        cb: &Callback,
    ) -> Result<Option<Value>, PipelineError> {
        if env.event_type() == Some(event_types::INTERNAL_BATCH_END)
            && self.logic.skip_end_batch_event()
        {
            self.app.call(env, cb)?;
            return Ok(None);
        }
        self.logic.process(ctx, env, self.app.as_ref(), cb)
    }
}

impl<L: FilterLogic> EventStage for FilterStage<L> {
    fn call(&self, env: &mut Envelope, cb: &Callback) -> Result<(), PipelineError> {
        let ctx = FilterContext::from_envelope(env, Some(self.name()));
        let span = ctx.span();
        let _entered = span.enter();

        match self.run(&ctx, env, cb) {
            Ok(returned) => {
                self.on_hold.flush_into(env);
                if let Some(value) = returned {
                    return Err(PipelineError::UnexpectedReturn {
                        filter: self.name().to_string(),
                        value,
                    });
                }
                Ok(())
            }
            Err(PipelineError::Paused(mut signal)) => {
                // Re-anchor at this layer, then record and flush the id
                // under one guard: a concurrent attempt pausing through
                // this same instance must not carry it away.
                signal.anchor(self.app.clone(), cb.clone());
                self.on_hold.push_and_flush(signal.id(), env);
                tracing::debug!(signal = signal.id(), "pipeline paused");
                Err(PipelineError::Paused(signal))
            }
            Err(err) => {
                self.on_hold.flush_into(env);
                Err(err)
            }
        }
    }

    fn name(&self) -> &str {
        self.ctx_name.as_deref().unwrap_or_else(|| self.logic.name())
    }

    fn get_stats(&self) -> BTreeMap<String, u64> {
        self.logic.get_stats()
    }

    fn reset_stats(&self) {
        self.logic.reset_stats();
    }
}

/// Terminal stage: a normally-completed attempt invokes the callback once
/// with a success outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct PipelineEnd;

impl EventStage for PipelineEnd {
    fn call(&self, _env: &mut Envelope, cb: &Callback) -> Result<(), PipelineError> {
        cb(200, "");
        Ok(())
    }

    fn name(&self) -> &str {
        "end"
    }
}

/// Diagnostic filter: logs every event at info level and counts them.
pub struct LoggerFilter {
    template: LogTemplate,
    stats: Stats,
}

impl LoggerFilter {
    #[must_use]
    pub fn new(conf: &StageConf) -> Self {
        Self {
            template: LogTemplate::from_conf(conf),
            stats: Stats::new(),
        }
    }
}

impl FilterLogic for LoggerFilter {
    fn name(&self) -> &str {
        "logger"
    }

    fn process(
        &self,
        ctx: &FilterContext,
        env: &mut Envelope,
        next: &dyn EventStage,
        cb: &Callback,
    ) -> Result<Option<Value>, PipelineError> {
        let body = serde_json::to_string(&*env).unwrap_or_default();
        log::info!("{}", self.template.render(ctx, "INFO", &body, None));
        self.stats.incr("successes");
        next.call(env, cb)?;
        Ok(None)
    }

    fn get_stats(&self) -> BTreeMap<String, u64> {
        self.stats.snapshot()
    }

    fn reset_stats(&self) {
        self.stats.reset();
    }
}
