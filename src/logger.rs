use crate::config::{LoggerConfig, OutputModes};
use crate::console::{ConsoleSink, TracingConsole};
use crate::record::{LogRecord, Origin, Severity};
use crate::shipper::{FlushOutcome, Shipper, StatsSnapshot};
use crate::throttle::Throttle;
use crate::transport::Transport;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Severities that pass the configured minimum level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnabledSet {
    min: Severity,
}

impl EnabledSet {
    pub fn from_level(min: Severity) -> Self {
        Self { min }
    }

    pub fn contains(&self, severity: Severity) -> bool {
        severity >= self.min
    }
}

/// Entry point for emitting log records.
///
/// Cloning is cheap; clones share the buffer, throttle and transport.
/// Emitting never blocks and never fails: records are buffered and a
/// throttled flush ships them in the background.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

struct LoggerInner {
    enabled: EnabledSet,
    modes: OutputModes,
    origin: Origin,
    server_id: Option<String>,
    console: Box<dyn ConsoleSink>,
    shipper: Arc<Shipper>,
    throttled_flush: Throttle<()>,
}

impl Logger {
    /// Build a logger that prints through [`TracingConsole`] in console mode.
    pub fn new(config: LoggerConfig, transport: Arc<dyn Transport>) -> Self {
        Self::with_console(config, transport, Box::new(TracingConsole))
    }

    pub fn with_console(
        config: LoggerConfig,
        transport: Arc<dyn Transport>,
        console: Box<dyn ConsoleSink>,
    ) -> Self {
        let shipper = Arc::new(Shipper::new(transport));
        let flush_target = Arc::clone(&shipper);
        let throttled_flush = Throttle::new(config.effective_window(), move |()| {
            let shipper = Arc::clone(&flush_target);
            async move {
                shipper.flush().await;
            }
        });

        Self {
            inner: Arc::new(LoggerInner {
                enabled: EnabledSet::from_level(config.level),
                modes: config.output_modes(),
                origin: config.origin,
                server_id: config.server_id.clone(),
                console,
                shipper,
                throttled_flush,
            }),
        }
    }

    /// Server-side logger shipping to the authenticated ingestion API.
    #[cfg(feature = "http")]
    pub fn server(config: LoggerConfig) -> Self {
        use crate::axiom::{AxiomConfig, AxiomTransport};

        let transport = AxiomTransport::new(AxiomConfig::from_logger_config(&config));
        Self::new(config, Arc::new(transport))
    }

    /// Client-side logger shipping through the beacon proxy path.
    #[cfg(feature = "http")]
    pub fn client(config: LoggerConfig) -> Self {
        use crate::beacon::BeaconTransport;

        let transport = BeaconTransport::from_logger_config(&config);
        Self::new(config, Arc::new(transport))
    }

    pub fn info(&self, message: impl Into<String>, props: &[Value]) {
        self.emit(Severity::Info, message, props);
    }

    pub fn warn(&self, message: impl Into<String>, props: &[Value]) {
        self.emit(Severity::Warn, message, props);
    }

    pub fn error(&self, message: impl Into<String>, props: &[Value]) {
        self.emit(Severity::Error, message, props);
    }

    /// Emit one record at `severity`.
    ///
    /// Disabled severities return before anything is built. Console and
    /// remote output are applied independently according to the modes.
    pub fn emit(&self, severity: Severity, message: impl Into<String>, props: &[Value]) {
        let inner = &*self.inner;
        if !inner.enabled.contains(severity) {
            return;
        }
        if !inner.modes.console && !inner.modes.remote {
            return;
        }

        let record = LogRecord::build(
            severity,
            message,
            props,
            inner.origin,
            inner.server_id.clone(),
        );

        if inner.modes.console {
            inner
                .console
                .write(record.severity, record.timestamp, &record.message, &record.properties);
        }
        if inner.modes.remote {
            inner.shipper.push(record);
            inner.throttled_flush.call(());
        }
    }

    pub fn is_enabled(&self, severity: Severity) -> bool {
        self.inner.enabled.contains(severity)
    }

    pub fn modes(&self) -> OutputModes {
        self.inner.modes
    }

    /// Ship whatever is buffered right now, bypassing the throttle, then
    /// wait for every background send the transport still has queued.
    ///
    /// Intended for shutdown paths and for contexts without a runtime
    /// where throttled flushes cannot be scheduled. Once it returns, the
    /// runtime can be dropped without losing a queued beacon; how queued
    /// sends ended shows up in [`Logger::stats`].
    pub async fn flush_now(&self) -> FlushOutcome {
        let outcome = self.inner.shipper.flush().await;
        self.inner.shipper.settle().await;
        outcome
    }

    /// Records waiting for the next flush.
    pub fn buffered(&self) -> usize {
        self.inner.shipper.buffered()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.shipper.stats().snapshot()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("enabled", &self.inner.enabled)
            .field("modes", &self.inner.modes)
            .field("origin", &self.inner.origin)
            .field("server_id", &self.inner.server_id)
            .field("throttle", &self.inner.throttled_flush)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_set_follows_minimum_level() {
        let warn = EnabledSet::from_level(Severity::Warn);
        assert!(!warn.contains(Severity::Info));
        assert!(warn.contains(Severity::Warn));
        assert!(warn.contains(Severity::Error));

        let error = EnabledSet::from_level(Severity::Error);
        assert!(!error.contains(Severity::Warn));

        let info = EnabledSet::from_level(Severity::Info);
        assert!(Severity::ALL.iter().all(|s| info.contains(*s)));
    }
}
