/*!
 * Logging and tracing initialization
 */

use std::fs::File;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LogLevel;
use crate::error::{BridgeError, Result};

/// Logging switches taken from the command line
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub level: LogLevel,
    /// Write JSON lines here instead of human output on stderr
    pub file: Option<PathBuf>,
    /// Forces debug level
    pub verbose: bool,
}

impl LogOptions {
    pub fn effective_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else {
            self.level.to_tracing_level()
        }
    }

    /// Filter used when `RUST_LOG` is not set
    pub fn default_directive(&self) -> String {
        format!("s3bridge={}", self.effective_level())
    }
}

/// Initialize structured logging once per process
pub fn init_logging(options: &LogOptions) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(options.default_directive()))
        .map_err(|e| BridgeError::Config(format!("Failed to create log filter: {}", e)))?;

    if let Some(ref log_path) = options.file {
        init_file_logging(log_path, env_filter)?;
    } else {
        init_stderr_logging(env_filter);
    }

    Ok(())
}

/// Human readable output on stderr; stdout is kept for command output
fn init_stderr_logging(env_filter: EnvFilter) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn init_file_logging(log_path: &PathBuf, env_filter: EnvFilter) -> Result<()> {
    let file = File::create(log_path)
        .map_err(|e| BridgeError::Config(format!("Failed to create log file: {}", e)))?;

    let fmt_layer = fmt::layer()
        .with_writer(file)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(false)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}

/// Initialize logging with custom format for testing
#[cfg(test)]
pub fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("s3bridge=debug"));

        let fmt_layer = fmt::layer().with_test_writer().with_target(false).compact();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .ok();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        let options = LogOptions::default();
        assert_eq!(options.default_directive(), "s3bridge=INFO");
        assert!(EnvFilter::try_new(options.default_directive()).is_ok());
    }

    #[test]
    fn test_verbose_overrides_log_level() {
        let options = LogOptions {
            level: LogLevel::Error,
            file: None,
            verbose: true,
        };
        assert_eq!(options.effective_level(), Level::DEBUG);
    }

    #[test]
    fn test_level_without_verbose() {
        let options = LogOptions {
            level: LogLevel::Warn,
            ..Default::default()
        };
        assert_eq!(options.effective_level(), Level::WARN);
    }

    #[test]
    fn test_init_test_logging_is_idempotent() {
        init_test_logging();
        init_test_logging();
        tracing::debug!("test logging ready");
    }
}
