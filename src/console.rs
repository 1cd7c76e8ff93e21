use crate::record::{format_timestamp, Properties, Severity};
use chrono::{DateTime, Utc};

/// Target used for console lines, so the tracing bridge can skip them.
pub const CONSOLE_TARGET: &str = "throttled_log_sink::console";

/// Local, human-facing output used when console mode is on.
pub trait ConsoleSink: Send + Sync {
    fn write(&self, severity: Severity, timestamp: DateTime<Utc>, message: &str, props: &Properties);
}

/// Render `[2024-05-01T12:00:00.000Z] WARNING: message {"k":1}`.
///
/// The property suffix is omitted when there are no properties.
pub fn format_line(
    severity: Severity,
    timestamp: DateTime<Utc>,
    message: &str,
    props: &Properties,
) -> String {
    let label = match severity {
        Severity::Info => "INFO",
        Severity::Warn => "WARNING",
        Severity::Error => "ERROR",
    };
    let mut line = format!("[{}] {}: {}", format_timestamp(&timestamp), label, message);
    if !props.is_empty() {
        let rendered = serde_json::to_string(props).unwrap_or_else(|_| "{}".to_string());
        line.push(' ');
        line.push_str(&rendered);
    }
    line
}

/// Default console: re-emits each line as a `tracing` event, which the
/// application's `fmt` subscriber prints (see [`crate::init`]).
#[derive(Clone, Debug, Default)]
pub struct TracingConsole;

impl ConsoleSink for TracingConsole {
    fn write(&self, severity: Severity, _timestamp: DateTime<Utc>, message: &str, props: &Properties) {
        let props = serde_json::to_string(props).unwrap_or_else(|_| "{}".to_string());
        match severity {
            Severity::Info => tracing::info!(target: CONSOLE_TARGET, props = %props, "{}", message),
            Severity::Warn => tracing::warn!(target: CONSOLE_TARGET, props = %props, "{}", message),
            Severity::Error => tracing::error!(target: CONSOLE_TARGET, props = %props, "{}", message),
        }
    }
}

/// Writes [`format_line`] output straight to stderr.
#[derive(Clone, Debug, Default)]
pub struct StderrConsole;

impl ConsoleSink for StderrConsole {
    fn write(&self, severity: Severity, timestamp: DateTime<Utc>, message: &str, props: &Properties) {
        eprintln!("{}", format_line(severity, timestamp, message, props));
    }
}
