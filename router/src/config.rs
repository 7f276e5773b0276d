//! Configuration
//!
//! All settings come from `EVENTROUTER_*` environment variables:
//!
//! | variable | default |
//! |---|---|
//! | `EVENTROUTER_ENABLE_PROMETHEUS` | `true` |
//! | `EVENTROUTER_SINKS` | `log` |
//! | `EVENTROUTER_METRICS_ADDR` | `0.0.0.0:8080` |
//! | `EVENTROUTER_NAMESPACE` | all namespaces |
//! | `EVENTROUTER_RESYNC_SECS` | `1800` (0 disables) |
//! | `EVENTROUTER_SYNC_TIMEOUT_SECS` | `300` (0 waits until stop) |
//! | `EVENTROUTER_LOG_LEVEL` | `info` |
//! | `EVENTROUTER_LOG_FORMAT` | `pretty` |

use crate::error::{Result, RouterError};
use crate::sink::{LogSink, Sink, SinkRegistry, StdoutSink};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_RESYNC_SECS: u64 = 30 * 60;
const DEFAULT_SYNC_TIMEOUT_SECS: u64 = 300;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(RouterError::Config(format!(
                "unknown log format '{other}' (expected pretty or json)"
            ))),
        }
    }
}

/// Built-in sink selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    /// JSON lines on standard output
    Stdout,
    /// Structured tracing events
    Log,
}

impl SinkKind {
    /// Instantiate the sink
    pub fn build(self) -> Arc<dyn Sink> {
        match self {
            Self::Stdout => Arc::new(StdoutSink::new()),
            Self::Log => Arc::new(LogSink::new()),
        }
    }
}

impl FromStr for SinkKind {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdout" => Ok(Self::Stdout),
            "log" => Ok(Self::Log),
            other => Err(RouterError::Config(format!(
                "unknown sink '{other}' (expected stdout or log)"
            ))),
        }
    }
}

/// Process configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Count events into the Prometheus counters
    pub enable_prometheus: bool,
    /// Sinks events are forwarded to, in delivery order
    pub sinks: Vec<SinkKind>,
    /// Listen address of the metrics server
    pub metrics_addr: SocketAddr,
    /// Watch a single namespace instead of the whole cluster
    pub namespace: Option<String>,
    /// Informer resync period, `None` when disabled
    pub resync_period: Option<Duration>,
    /// Bound on the initial sync, `None` to wait until stop
    pub sync_timeout: Option<Duration>,
    /// Filter used when `RUST_LOG` is unset
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_prometheus: true,
            sinks: vec![SinkKind::Log],
            metrics_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            namespace: None,
            resync_period: Some(Duration::from_secs(DEFAULT_RESYNC_SECS)),
            sync_timeout: Some(Duration::from_secs(DEFAULT_SYNC_TIMEOUT_SECS)),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variables
    ///
    /// Unset and empty variables take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let enable_prometheus = match get("EVENTROUTER_ENABLE_PROMETHEUS") {
            Some(v) => parse_bool("EVENTROUTER_ENABLE_PROMETHEUS", &v)?,
            None => true,
        };

        let sinks = match get("EVENTROUTER_SINKS") {
            Some(v) => parse_sinks(&v)?,
            None => vec![SinkKind::Log],
        };

        let metrics_addr = get("EVENTROUTER_METRICS_ADDR")
            .unwrap_or_else(|| DEFAULT_METRICS_ADDR.to_string())
            .trim()
            .parse()
            .map_err(|e| RouterError::Config(format!("EVENTROUTER_METRICS_ADDR: {e}")))?;

        let namespace = get("EVENTROUTER_NAMESPACE").map(|ns| ns.trim().to_string());

        let resync_period = optional_secs(
            "EVENTROUTER_RESYNC_SECS",
            get("EVENTROUTER_RESYNC_SECS"),
            DEFAULT_RESYNC_SECS,
        )?;
        let sync_timeout = optional_secs(
            "EVENTROUTER_SYNC_TIMEOUT_SECS",
            get("EVENTROUTER_SYNC_TIMEOUT_SECS"),
            DEFAULT_SYNC_TIMEOUT_SECS,
        )?;

        let log_level = get("EVENTROUTER_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_format = match get("EVENTROUTER_LOG_FORMAT") {
            Some(v) => v.parse()?,
            None => LogFormat::Pretty,
        };

        Ok(Self {
            enable_prometheus,
            sinks,
            metrics_addr,
            namespace,
            resync_period,
            sync_timeout,
            log_level,
            log_format,
        })
    }

    /// Build the configured sinks
    pub fn build_sinks(&self) -> SinkRegistry {
        self.sinks
            .iter()
            .fold(SinkRegistry::new(), |registry, kind| registry.with(kind.build()))
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(RouterError::Config(format!(
            "{key}: expected a boolean, got '{other}'"
        ))),
    }
}

fn parse_sinks(value: &str) -> Result<Vec<SinkKind>> {
    let mut sinks = Vec::new();
    for part in value.split(',').filter(|p| !p.trim().is_empty()) {
        let kind: SinkKind = part.parse()?;
        if !sinks.contains(&kind) {
            sinks.push(kind);
        }
    }
    if sinks.is_empty() {
        return Err(RouterError::Config(
            "EVENTROUTER_SINKS: at least one sink is required".to_string(),
        ));
    }
    Ok(sinks)
}

/// Seconds value where 0 means "disabled"
fn optional_secs(key: &str, value: Option<String>, default: u64) -> Result<Option<Duration>> {
    let secs = match value {
        Some(v) => v
            .trim()
            .parse::<u64>()
            .map_err(|e| RouterError::Config(format!("{key}: {e}")))?,
        None => default,
    };
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.metrics_addr.port(), 8080);
        assert_eq!(config.resync_period, Some(Duration::from_secs(1800)));
        assert_eq!(config.sync_timeout, Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("EVENTROUTER_ENABLE_PROMETHEUS", "false"),
            ("EVENTROUTER_SINKS", "stdout, log,stdout"),
            ("EVENTROUTER_METRICS_ADDR", "127.0.0.1:9100"),
            ("EVENTROUTER_NAMESPACE", "kube-system"),
            ("EVENTROUTER_RESYNC_SECS", "0"),
            ("EVENTROUTER_SYNC_TIMEOUT_SECS", "30"),
            ("EVENTROUTER_LOG_LEVEL", "debug"),
            ("EVENTROUTER_LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert!(!config.enable_prometheus);
        assert_eq!(config.sinks, vec![SinkKind::Stdout, SinkKind::Log]);
        assert_eq!(config.metrics_addr, "127.0.0.1:9100".parse().unwrap());
        assert_eq!(config.namespace.as_deref(), Some("kube-system"));
        assert_eq!(config.resync_period, None);
        assert_eq!(config.sync_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_empty_values_take_defaults() {
        let config = load(&[("EVENTROUTER_NAMESPACE", ""), ("EVENTROUTER_SINKS", " ")]).unwrap();
        assert_eq!(config.namespace, None);
        assert_eq!(config.sinks, vec![SinkKind::Log]);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let cases = [
            ("EVENTROUTER_ENABLE_PROMETHEUS", "maybe"),
            ("EVENTROUTER_SINKS", "kafka"),
            ("EVENTROUTER_SINKS", ",,"),
            ("EVENTROUTER_METRICS_ADDR", "not-an-addr"),
            ("EVENTROUTER_RESYNC_SECS", "-5"),
            ("EVENTROUTER_SYNC_TIMEOUT_SECS", "soon"),
            ("EVENTROUTER_LOG_FORMAT", "xml"),
        ];

        for (key, value) in cases {
            let err = load(&[(key, value)]).unwrap_err();
            assert!(
                matches!(err, RouterError::Config(_)),
                "{key}={value} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_build_sinks_in_order() {
        let config = load(&[("EVENTROUTER_SINKS", "log,stdout")]).unwrap();
        let sinks = config.build_sinks();

        let names: Vec<_> = sinks.all().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["log", "stdout"]);
    }
}
