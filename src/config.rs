use crate::record::{Origin, Severity};
use std::time::Duration;

/// Default Axiom ingestion host.
pub const DEFAULT_BASE_URL: &str = "https://api.eu.axiom.co";

/// Default same-origin path the beacon transport posts to.
pub const DEFAULT_PROXY_PATH: &str = "/log";

/// Default minimum time between two batch sends.
pub const DEFAULT_THROTTLE_WINDOW: Duration = Duration::from_millis(1000);

/// Where the process is deployed. Selects the default [`OutputModes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Deployment {
    /// Developer machine: print to the console, ship nothing.
    Local,
    /// Anything else: ship to the ingestion endpoint, print nothing.
    #[default]
    Remote,
}

impl Deployment {
    /// `"local"` (any case) is [`Deployment::Local`]; every other value,
    /// including an empty one, is [`Deployment::Remote`].
    pub fn from_flag(flag: &str) -> Self {
        if flag.trim().eq_ignore_ascii_case("local") {
            Deployment::Local
        } else {
            Deployment::Remote
        }
    }
}

/// Which outputs an emitted record reaches. The two are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputModes {
    pub console: bool,
    pub remote: bool,
}

impl OutputModes {
    pub fn for_deployment(deployment: Deployment) -> Self {
        match deployment {
            Deployment::Local => OutputModes { console: true, remote: false },
            Deployment::Remote => OutputModes { console: false, remote: true },
        }
    }
}

/// Logger configuration, read once when the logger is built.
///
/// **Fields**
/// - `level`: minimum severity; finer severities become no-ops.
/// - `deployment` / `modes`: `modes` overrides the outputs implied by
///   `deployment` when set.
/// - `base_url`, `token`, `dataset`: authenticated ingestion endpoint.
///   Not validated; a missing value makes sends fail at delivery time.
/// - `proxy_path`: path the beacon transport posts to.
/// - `server_id`: instance identifier attached to every record.
/// - `origin`: execution context stamped on every record.
/// - `throttle_window`: minimum time between two sends (at least 1 ms).
#[derive(Clone, Debug)]
pub struct LoggerConfig {
    pub level: Severity,
    pub deployment: Deployment,
    pub modes: Option<OutputModes>,
    pub base_url: String,
    pub token: Option<String>,
    pub dataset: Option<String>,
    pub proxy_path: String,
    pub server_id: Option<String>,
    pub origin: Origin,
    pub throttle_window: Duration,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Severity::Info,
            deployment: Deployment::Remote,
            modes: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            dataset: None,
            proxy_path: DEFAULT_PROXY_PATH.to_string(),
            server_id: None,
            origin: Origin::detect(),
            throttle_window: DEFAULT_THROTTLE_WINDOW,
        }
    }
}

impl LoggerConfig {
    pub fn output_modes(&self) -> OutputModes {
        self.modes.unwrap_or_else(|| OutputModes::for_deployment(self.deployment))
    }

    pub(crate) fn effective_window(&self) -> Duration {
        self.throttle_window.max(Duration::from_millis(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_flag_selects_modes() {
        assert_eq!(Deployment::from_flag("LOCAL"), Deployment::Local);
        assert_eq!(Deployment::from_flag("production"), Deployment::Remote);
        assert_eq!(Deployment::from_flag(""), Deployment::Remote);

        let local = LoggerConfig { deployment: Deployment::Local, ..Default::default() };
        assert_eq!(local.output_modes(), OutputModes { console: true, remote: false });
        assert_eq!(
            LoggerConfig::default().output_modes(),
            OutputModes { console: false, remote: true }
        );
    }

    #[test]
    fn explicit_modes_override_deployment() {
        let config = LoggerConfig {
            deployment: Deployment::Local,
            modes: Some(OutputModes { console: true, remote: true }),
            ..Default::default()
        };
        assert_eq!(config.output_modes(), OutputModes { console: true, remote: true });
    }

    #[test]
    fn zero_window_is_clamped() {
        let config = LoggerConfig { throttle_window: Duration::ZERO, ..Default::default() };
        assert_eq!(config.effective_window(), Duration::from_millis(1));
    }
}
