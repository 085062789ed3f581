//! Resolving the log level, format and filter for one process.
//!
//! Level precedence, highest first: `--log-level` / `-v` / `-q`, `IB_LOG`,
//! the `ib_core` (or bare) directive in `RUST_LOG`, then `info`.
//! `--log-format` beats `IB_LOG_FORMAT`; the default is human output.

use clap::ValueEnum;

/// Level override for ib-curve.
pub const LEVEL_ENV: &str = "IB_LOG";
/// Consulted only when neither a flag nor `IB_LOG` sets a level.
pub const FALLBACK_LEVEL_ENV: &str = "RUST_LOG";
/// `human` or `jsonl`.
pub const FORMAT_ENV: &str = "IB_LOG_FORMAT";

/// Crates whose events pass the filter.
const FILTER_TARGETS: &[&str] = &["ib_core", "ib_math"];

/// Where log lines go and how they look. Both formats write to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// One readable line per event.
    #[default]
    Human,
    /// One JSON object per event, fields flattened.
    Jsonl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    /// Per-iteration search detail.
    Trace,
    /// Per-target outcomes.
    Debug,
    /// Request lifecycle.
    #[default]
    Info,
    /// Degraded points.
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(s.trim(), true).ok()
    }

    /// Level a `RUST_LOG` spec assigns to this crate. A directive naming
    /// `ib_core` wins over a bare level; other targets are ignored.
    fn from_rust_log(spec: &str) -> Option<Self> {
        let mut bare = None;
        for directive in spec.split(',').map(str::trim) {
            match directive.split_once('=') {
                Some((target, level)) if target == "ib_core" || target.starts_with("ib_core::") => {
                    return Self::parse(level);
                }
                Some(_) => {}
                None => bare = bare.or_else(|| Self::parse(directive)),
            }
        }
        bare
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully resolved logging settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
}

impl LogConfig {
    /// Resolve from CLI values and the process environment.
    pub fn resolve(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::resolve_with(|key| std::env::var(key).ok(), cli_level, cli_format)
    }

    /// Resolve against an arbitrary environment lookup.
    pub fn resolve_with<F>(env: F, cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let level = cli_level
            .or_else(|| env(LEVEL_ENV).and_then(|v| LogLevel::parse(&v)))
            .or_else(|| env(FALLBACK_LEVEL_ENV).and_then(|v| LogLevel::from_rust_log(&v)))
            .unwrap_or_default();
        let format = cli_format
            .or_else(|| env(FORMAT_ENV).and_then(|v| LogFormat::from_str(v.trim(), true).ok()))
            .unwrap_or_default();
        LogConfig { format, level }
    }

    /// `EnvFilter` directives for the resolved level; nothing else is read.
    pub fn filter_directives(&self) -> String {
        FILTER_TARGETS
            .iter()
            .map(|target| format!("{target}={}", self.level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(vars: &[(&str, &str)], level: Option<LogLevel>) -> LogConfig {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LogConfig::resolve_with(|key| env.get(key).cloned(), level, None)
    }

    #[test]
    fn default_is_human_info() {
        let config = resolve(&[], None);
        assert_eq!(config, LogConfig::default());
        assert_eq!(config.filter_directives(), "ib_core=info,ib_math=info");
    }

    #[test]
    fn cli_level_beats_every_variable() {
        let config = resolve(
            &[("IB_LOG", "trace"), ("RUST_LOG", "debug")],
            Some(LogLevel::Error),
        );
        assert_eq!(config.level, LogLevel::Error);
    }

    #[test]
    fn ib_log_beats_rust_log() {
        let config = resolve(&[("IB_LOG", "error"), ("RUST_LOG", "info")], None);
        assert_eq!(config.level, LogLevel::Error);
    }

    #[test]
    fn rust_log_prefers_crate_directive() {
        assert_eq!(
            resolve(&[("RUST_LOG", "warn,hyper=trace,ib_core=debug")], None).level,
            LogLevel::Debug
        );
        assert_eq!(resolve(&[("RUST_LOG", "hyper=trace,warn")], None).level, LogLevel::Warn);
        assert_eq!(resolve(&[("RUST_LOG", "hyper=trace")], None).level, LogLevel::Info);
    }

    #[test]
    fn unparsable_ib_log_falls_through() {
        let config = resolve(&[("IB_LOG", "loud"), ("RUST_LOG", "trace")], None);
        assert_eq!(config.level, LogLevel::Trace);
    }

    #[test]
    fn format_from_env_unless_flag() {
        let env = |key: &str| (key == FORMAT_ENV).then(|| "JSONL".to_string());
        assert_eq!(LogConfig::resolve_with(env, None, None).format, LogFormat::Jsonl);
        assert_eq!(
            LogConfig::resolve_with(env, None, Some(LogFormat::Human)).format,
            LogFormat::Human
        );
    }

    #[test]
    fn off_silences_both_crates() {
        let config = LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Off,
        };
        assert_eq!(config.filter_directives(), "ib_core=off,ib_math=off");
    }
}
