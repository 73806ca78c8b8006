//! Log configuration for embedders. Engine events go through `tracing`;
//! [`init`] installs a formatted subscriber for hosts that do not bring
//! their own.

use std::env;
use std::fmt;
use std::str::FromStr;

/// Output format for engine log events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Resolves to [`LogFormat::Text`] at subscriber installation.
    #[default]
    Auto,
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format `{other}`")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Auto => "auto",
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        })
    }
}

/// Logging verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    #[must_use]
    pub fn as_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "error" | "err" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" | "verbose" => Ok(Self::Trace),
            other => Err(format!("unknown log level `{other}`")),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    }
}

/// Log configuration resolved from the embedding environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    pub format: LogFormat,
    pub level: LogLevel,
}

impl LogOptions {
    /// Read `CARRIER_LOG_FORMAT` and `CARRIER_LOG_LEVEL`, keeping the
    /// defaults for unset or unparseable values.
    #[must_use]
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Some(value) = env::var_os("CARRIER_LOG_FORMAT")
            && let Ok(format) = value.to_string_lossy().parse()
        {
            options.format = format;
        }
        if let Some(value) = env::var_os("CARRIER_LOG_LEVEL")
            && let Ok(level) = value.to_string_lossy().parse()
        {
            options.level = level;
        }
        options
    }

    /// Collapse [`LogFormat::Auto`] to a concrete format.
    #[must_use]
    pub fn resolved(self) -> Self {
        let format = match self.format {
            LogFormat::Auto => LogFormat::Text,
            other => other,
        };
        Self { format, ..self }
    }
}

/// Install the global `tracing` subscriber described by `options`, writing
/// to stderr. The first installation in the process wins; when a subscriber
/// is already in place (a later call, or a host that set its own) this is a
/// no-op returning `false`.
#[must_use]
pub fn init(options: LogOptions) -> bool {
    use std::io::IsTerminal;
    use tracing_subscriber::{EnvFilter, fmt};

    let options = options.resolved();
    let use_ansi = env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.level.to_string()));
    let builder = fmt::fmt()
        .with_env_filter(filter)
        .with_max_level(options.level.as_tracing_level())
        .with_ansi(use_ansi)
        .with_writer(std::io::stderr)
        .with_target(true);
    match options.format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(builder.json().finish()).is_ok()
        }
        _ => tracing::subscriber::set_global_default(builder.compact().finish()).is_ok(),
    }
}
