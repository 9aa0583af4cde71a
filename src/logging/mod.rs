//! Logging infrastructure - structured tracing across the bridge
//!
//! Design: Uses `tracing` for structured, contextual logging with:
//! - Configurable log levels per module
//! - Zero-cost when disabled
//! - Span-based performance tracking
//! - Console (text or JSON) and optional file output

use once_cell::sync::OnceCell;
use std::io;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

pub use tracing::{debug, error, info, trace, warn};

/// Global logging state
static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default log level
    pub level: Level,
    /// Enable file logging
    pub file_output: bool,
    /// Log file path (if file_output enabled)
    pub log_path: Option<String>,
    /// Enable JSON format (vs human-readable)
    pub json_format: bool,
    /// Show span events (enter/exit)
    pub show_spans: bool,
    /// Enable performance tracking
    pub track_performance: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            file_output: false,
            log_path: None,
            json_format: false,
            show_spans: false,
            track_performance: cfg!(debug_assertions),
        }
    }
}

fn parse_level(text: &str) -> Level {
    match text.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // LTCL_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level) = std::env::var("LTCL_LOG_LEVEL") {
            config.level = parse_level(&level);
        }

        if let Ok(path) = std::env::var("LTCL_LOG_FILE") {
            config.file_output = true;
            config.log_path = Some(path);
        }

        config.json_format = std::env::var("LTCL_LOG_JSON").is_ok();
        config.show_spans = std::env::var("LTCL_LOG_SPANS").is_ok();

        if let Ok(val) = std::env::var("LTCL_LOG_PERF") {
            config.track_performance = val == "1" || val.to_lowercase() == "true";
        }

        config
    }

    /// Minimal logging
    pub fn performance() -> Self {
        Self {
            level: Level::ERROR,
            file_output: false,
            log_path: None,
            json_format: false,
            show_spans: false,
            track_performance: false,
        }
    }

    /// Verbose logging, mirrored to `ltcl.log`
    pub fn debug() -> Self {
        Self {
            level: Level::TRACE,
            file_output: true,
            log_path: Some("ltcl.log".to_string()),
            json_format: false,
            show_spans: true,
            track_performance: true,
        }
    }
}

/// Initialize logging with configuration from the environment
pub fn init() {
    init_with_config(LogConfig::from_env());
}

/// Initialize logging with custom configuration
pub fn init_with_config(config: LogConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        perf::set_enabled(config.track_performance);

        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("ltcl={}", config.level.as_str().to_lowercase()))
        });

        let span_events = if config.show_spans {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let text_layer = (!config.json_format).then(|| {
            fmt::layer()
                .with_writer(io::stderr)
                .with_span_events(span_events.clone())
                .with_target(true)
                .with_line_number(cfg!(debug_assertions))
        });
        let json_layer = config.json_format.then(|| {
            fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_span_events(span_events.clone())
        });
        let file_layer = config
            .log_path
            .as_deref()
            .filter(|_| config.file_output)
            .map(|path| {
                let path = Path::new(path);
                let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
                let name = path.file_name().unwrap_or(path.as_os_str());
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(tracing_appender::rolling::never(dir, name))
            });

        // another subscriber may already be installed by the embedding program
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(text_layer)
            .with(json_layer)
            .with(file_layer)
            .try_init();
    });
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

// ============================================================================
// Bridge-specific logging functions
// ============================================================================

pub fn log_interp_create(id: usize) {
    info!(event = "interp_create", interp = id, "Interpreter created");
}

pub fn log_interp_destroy(id: usize) {
    info!(event = "interp_destroy", interp = id, "Interpreter destroyed");
}

#[inline]
pub fn log_eval(script_len: usize) {
    trace!(event = "eval", bytes = script_len, "Evaluating script");
}

#[inline]
pub fn log_call(command: &str, argc: usize) {
    debug!(event = "call", command = command, args = argc, "Dispatching command");
}

/// Log a failed evaluation; the message is the interpreter's result
pub fn log_eval_error(message: &str) {
    debug!(event = "eval_error", error = message, "Interpreter returned an error");
}

#[inline]
pub fn log_reverse_call(function: &str, argc: usize) {
    debug!(event = "reverse_call", function = function, args = argc, "Calling host function");
}

pub fn log_register(command: &str) {
    debug!(event = "register", command = command, "Host function registered");
}

pub fn log_unregister(command: &str) {
    debug!(event = "unregister", command = command, "Host function entry removed");
}

#[inline]
pub fn log_trace_fire(name1: &str, name2: Option<&str>, flags: i32) {
    trace!(
        event = "trace_fire",
        var = name1,
        element = name2.unwrap_or(""),
        flags = flags,
        "Variable trace fired"
    );
}

pub fn log_bundle_build(count: usize) {
    trace!(event = "bundle_build", values = count, "Argument bundle built");
}

pub fn log_bundle_teardown(count: usize) {
    trace!(event = "bundle_teardown", values = count, "Argument bundle released");
}

pub fn log_conversion_error(message: &str) {
    warn!(event = "conversion_error", error = message, "Value conversion failed");
}

/// Operation timing, active when `track_performance` was configured
pub mod perf {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Instant;
    use tracing::debug;

    static ENABLED: AtomicBool = AtomicBool::new(false);

    pub(super) fn set_enabled(enabled: bool) {
        ENABLED.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled() -> bool {
        ENABLED.load(Ordering::Relaxed)
    }

    /// Guard that logs the elapsed time of `operation` when dropped
    #[must_use]
    pub fn track(operation: &'static str) -> OperationTimer {
        OperationTimer {
            operation,
            start: is_enabled().then(Instant::now),
        }
    }

    pub struct OperationTimer {
        operation: &'static str,
        start: Option<Instant>,
    }

    impl Drop for OperationTimer {
        fn drop(&mut self) {
            if let Some(start) = self.start {
                debug!(
                    operation = self.operation,
                    duration_us = start.elapsed().as_micros() as u64,
                    "operation completed"
                );
            }
        }
    }
}
