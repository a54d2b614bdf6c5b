//! LTSV log-line templates
//!
//! Stage log lines are rendered from `%(field)s` templates configured per
//! stage (`log_format`, plus an optional `log_format_extra` fragment).
//! The configuration is shared by several stage types, so templates may
//! reference fields a given stage never fills; those render as `-` rather
//! than being rejected.

use crate::config::{LOG_FORMAT, LOG_FORMAT_EXTRA, StageConf};
use crate::context::FilterContext;

/// Default line: one `label:value` pair per diagnostic field, tab separated.
pub const DEFAULT_LOG_FORMAT: &str = concat!(
    "pid:%(pid)s\t",
    "log_level:%(log_level)s\t",
    "filter:%(filter_name)s\t",
    "event_type:%(event_type)s\t",
    "request_id:%(request_id)s\t",
    "account:%(account)s\t",
    "container:%(container)s\t",
    "cid:%(cid)s\t",
    "bucket:%(bucket)s\t",
    "object:%(path)s\t",
    "content_id:%(content_id)s\t",
    "version_id:%(version_id)s\t",
    "exc_text:%(exc_text)s\t",
    "exc_filename:%(exc_filename)s\t",
    "exc_lineno:%(exc_lineno)s\t",
    "message:%(message)s"
);

const MISSING: &str = "-";

/// A compiled-once log line template for one stage.
#[derive(Debug, Clone)]
pub struct LogTemplate {
    fmt: String,
}

impl LogTemplate {
    #[must_use]
    pub fn new(fmt: impl Into<String>) -> Self {
        Self { fmt: fmt.into() }
    }

    /// Assemble the stage's template: configured `log_format` (default
    /// above) joined with the non-empty `log_format_extra` fragment.
    #[must_use]
    pub fn from_conf(conf: &StageConf) -> Self {
        let base = conf.get_str(LOG_FORMAT).unwrap_or(DEFAULT_LOG_FORMAT);
        let extra = conf.get_str(LOG_FORMAT_EXTRA).unwrap_or("");
        let fmt = if extra.is_empty() {
            base.to_string()
        } else {
            format!("{base}\t{extra}")
        };
        Self { fmt }
    }

    /// Render one line. Unknown or absent fields become `-`.
    #[must_use]
    pub fn render(
        &self,
        ctx: &FilterContext,
        level: &str,
        message: &str,
        error: Option<&anyhow::Error>,
    ) -> String {
        let mut out = String::with_capacity(self.fmt.len() + message.len());
        let mut rest = self.fmt.as_str();
        while let Some(start) = rest.find("%(") {
            out.push_str(&rest[..start]);
            let token = &rest[start + 2..];
            match token.find(")s") {
                Some(end) => {
                    push_field(&mut out, &token[..end], ctx, level, message, error);
                    rest = &token[end + 2..];
                }
                None => {
                    // Unterminated token, emit verbatim
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

impl Default for LogTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_FORMAT)
    }
}

fn push_field(
    out: &mut String,
    name: &str,
    ctx: &FilterContext,
    level: &str,
    message: &str,
    error: Option<&anyhow::Error>,
) {
    match name {
        "pid" => out.push_str(&std::process::id().to_string()),
        "log_level" => out.push_str(if level.is_empty() { MISSING } else { level }),
        "message" => out.push_str(if message.is_empty() { MISSING } else { message }),
        "exc_text" => match error {
            Some(err) => out.push_str(&err.to_string()),
            None => out.push_str(MISSING),
        },
        other => out.push_str(ctx.field(other).unwrap_or(MISSING)),
    }
}
