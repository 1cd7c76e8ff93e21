use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Merged auxiliary properties attached to a [`LogRecord`].
pub type Properties = BTreeMap<String, Value>;

/// Log importance, ordered `Info < Warn < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Info, Severity::Warn, Severity::Error];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown log level: {0:?}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

/// Execution context a record was produced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Client,
    Server,
}

impl Origin {
    /// `Client` when compiled for the browser (`wasm32`), `Server` otherwise.
    pub fn detect() -> Self {
        if cfg!(target_arch = "wasm32") {
            Origin::Client
        } else {
            Origin::Server
        }
    }
}

impl Default for Origin {
    fn default() -> Self {
        Origin::detect()
    }
}

/// A single structured log entry as it travels over the wire.
///
/// Records are immutable once built; the buffer owns them until a flush
/// hands them to a transport.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    #[serde(rename = "level")]
    pub severity: Severity,
    pub message: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "source")]
    pub origin: Origin,
    #[serde(rename = "serverid", skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    #[serde(rename = "props")]
    pub properties: Properties,
}

impl LogRecord {
    /// Build a record stamped with the current time.
    ///
    /// **Parameters**
    /// - `props`: auxiliary property objects, merged in order with
    ///   [`merge_properties`]. Anything that is not a JSON object is ignored.
    /// - `origin` / `server_id`: supplied by the caller's configuration;
    ///   the builder does not inspect its environment.
    pub fn build(
        severity: Severity,
        message: impl Into<String>,
        props: &[Value],
        origin: Origin,
        server_id: Option<String>,
    ) -> Self {
        LogRecord {
            severity,
            message: message.into(),
            timestamp: Utc::now(),
            origin,
            server_id,
            properties: merge_properties(props),
        }
    }
}

/// Merge property objects left to right; later keys overwrite earlier ones.
pub fn merge_properties(props: &[Value]) -> Properties {
    let mut merged = Properties::new();
    for value in props {
        if let Value::Object(map) = value {
            for (key, v) in map {
                merged.insert(key.clone(), v.clone());
            }
        }
    }
    merged
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T12:00:00.123Z`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(ts))
}
