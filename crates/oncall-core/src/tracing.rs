//! Tracing setup for oncall.
//!
//! Log output goes either to the terminal (stderr) or, when the tool runs
//! unattended from a monitoring system, to an append-only log file.
//!
//! # Usage
//!
//! ```ignore
//! use oncall_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::default().with_log_file("/var/log/oncall.log"))?;
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::Level;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to set global subscriber
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// Failed to parse env filter directive
    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),

    /// Failed to open the log file
    #[error("failed to open log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: InitError,
    },

    /// The log file path does not end in a file name
    #[error("log file path {} has no file name", path.display())]
    LogFileName { path: PathBuf },
}

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Compact single-line format (default)
    #[default]
    Compact,
    /// JSON lines, for log shippers
    Json,
}

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// The default log level when RUST_LOG is not set
    pub default_level: Level,
    /// Output format for log messages
    pub output_format: TracingOutputFormat,
    /// Append log lines to this file instead of writing to stderr
    pub log_file: Option<PathBuf>,
    /// Whether to include target (module path) in logs
    pub include_target: bool,
    /// Custom env filter directive (overrides default_level if set)
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::WARN,
            output_format: TracingOutputFormat::Compact,
            log_file: None,
            include_target: false,
            env_filter: None,
        }
    }
}

impl TracingConfig {
    /// Create a config suitable for CLI usage with debug mode
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            default_level: Level::DEBUG,
            include_target: true,
            ..Self::default()
        }
    }

    /// Set the default log level
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Set the output format
    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Send logs to a file instead of stderr
    #[must_use]
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Set a custom env filter directive
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    fn build_filter(&self) -> Result<EnvFilter, TracingError> {
        match self.env_filter {
            Some(ref filter) => Ok(EnvFilter::try_new(filter)?),
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("oncall={}", self.default_level)))),
        }
    }
}

/// Opens `path` for appending, creating missing parent directories. The
/// file is never rotated: rotation is left to the host's logrotate.
fn open_log_file(path: &Path) -> Result<RollingFileAppender, TracingError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| TracingError::LogFileName {
            path: path.to_path_buf(),
        })?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .map_err(|source| TracingError::LogFile {
            path: path.to_path_buf(),
            source,
        })
}

/// Initialize tracing with the given configuration.
///
/// This should be called once at the start of the application.
/// The `RUST_LOG` environment variable can be used to override the default level.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set, if the
/// env filter directive is invalid or if the log file cannot be opened.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let env_filter = config.build_filter()?;

    let layer = match config.log_file {
        Some(ref path) => {
            let writer = open_log_file(path)?;
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(config.include_target);
            match config.output_format {
                TracingOutputFormat::Compact => layer.compact().boxed(),
                TracingOutputFormat::Json => layer.json().boxed(),
            }
        }
        None => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(config.include_target);
            match config.output_format {
                TracingOutputFormat::Compact => layer.compact().without_time().boxed(),
                TracingOutputFormat::Json => layer.json().boxed(),
            }
        }
    };

    let subscriber = tracing_subscriber::registry().with(env_filter).with(layer);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.default_level, Level::WARN);
        assert_eq!(config.output_format, TracingOutputFormat::Compact);
        assert!(config.log_file.is_none());
        assert!(!config.include_target);
        assert!(config.env_filter.is_none());
    }

    #[test]
    fn test_cli_debug_config() {
        let config = TracingConfig::cli_debug();
        assert_eq!(config.default_level, Level::DEBUG);
        assert!(config.include_target);
    }

    #[test]
    fn test_builder_methods() {
        let config = TracingConfig::default()
            .with_level(Level::INFO)
            .with_format(TracingOutputFormat::Json)
            .with_log_file("/tmp/oncall.log")
            .with_env_filter("oncall=trace");

        assert_eq!(config.default_level, Level::INFO);
        assert_eq!(config.output_format, TracingOutputFormat::Json);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/oncall.log")));
        assert_eq!(config.env_filter, Some("oncall=trace".to_string()));
    }

    #[test]
    fn test_invalid_env_filter() {
        let config = TracingConfig::default().with_env_filter("oncall=[");
        assert!(matches!(
            config.build_filter(),
            Err(TracingError::EnvFilter(_))
        ));
    }

    #[test]
    fn test_log_file_appends_in_place() {
        use std::io::Write;

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("oncall.log");
        std::fs::write(&path, "earlier run\n").unwrap();

        let mut appender = open_log_file(&path).unwrap();
        appender.write_all(b"this run\n").unwrap();
        appender.flush().unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "earlier run\nthis run\n"
        );
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_log_file_creates_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("logs").join("oncall.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_log_file_needs_a_name() {
        assert!(matches!(
            open_log_file(Path::new("/")),
            Err(TracingError::LogFileName { .. })
        ));
    }
}
