//! Unified logging module for the adaptor services
//!
//! Console output uses a compact `timestamp [LEVEL] message` format, while
//! the same events are appended to a local log file (JSON lines by default).

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Environment variable overriding the log root directory
pub const LOG_DIR_ENV: &str = "ADAPTOR_LOG_DIR";

/// Default max file size: 100MB
const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Custom format for log level with brackets: `[INFO]`, `[WARN]`, etc.
fn format_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "[TRACE]",
        Level::DEBUG => "[DEBUG]",
        Level::INFO => "[INFO]",
        Level::WARN => "[WARN]",
        Level::ERROR => "[ERROR]",
    }
}

/// Custom event formatter that outputs: `timestamp [LEVEL] message`
///
/// Example output: `2025-12-02T00:50:44.809Z [INFO] Service started`
struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Utc::now();
        write!(writer, "{} ", now.format("%Y-%m-%dT%H:%M:%S%.6fZ"))?;

        let level = *event.metadata().level();
        if writer.has_ansi_escapes() {
            let color = match level {
                Level::TRACE => "\x1b[35m", // magenta
                Level::DEBUG => "\x1b[34m", // blue
                Level::INFO => "\x1b[32m",  // green
                Level::WARN => "\x1b[33m",  // yellow
                Level::ERROR => "\x1b[31m", // red
            };
            write!(writer, "{}{}\x1b[0m ", color, format_level(&level))?;
        } else {
            write!(writer, "{} ", format_level(&level))?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

// Keeps the non-blocking writer threads alive for the process lifetime
static GUARDS: OnceLock<Mutex<Vec<WorkerGuard>>> = OnceLock::new();

// ============================================================================
// Log Root Directory Configuration
// ============================================================================

/// Global log root directory (initialized once from config or env)
static LOG_ROOT: OnceLock<PathBuf> = OnceLock::new();

/// Initialize log root directory from config or environment
///
/// Priority:
/// 1. `ADAPTOR_LOG_DIR` environment variable (highest)
/// 2. `config_dir` parameter (from the service configuration)
/// 3. Default value "logs" (lowest)
pub fn init_log_root(config_dir: Option<&str>) {
    LOG_ROOT.get_or_init(|| resolve_log_root(config_dir));
}

fn resolve_log_root(config_dir: Option<&str>) -> PathBuf {
    std::env::var(LOG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            config_dir
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("logs"))
        })
}

/// Get log root directory
pub fn get_log_root() -> PathBuf {
    LOG_ROOT
        .get()
        .cloned()
        .unwrap_or_else(|| resolve_log_root(None))
}

// ============================================================================
// Rolling file writer
// ============================================================================

/// Append-only file writer named `{YYYYMMDD}_{service}.log`
///
/// Rolls over to a new file when the local date changes or when the current
/// file grows past `max_file_size` (`{YYYYMMDD}_{service}.N.log`).
struct RollingFileWriter {
    service_name: String,
    log_dir: PathBuf,
    current_date: Arc<Mutex<String>>,
    current_file: Arc<Mutex<File>>,
    current_size: Arc<AtomicU64>,
    max_file_size: u64,
    rotation_count: Arc<AtomicU32>,
}

impl RollingFileWriter {
    fn new(service_name: String, log_dir: PathBuf, max_file_size: u64) -> std::io::Result<Self> {
        let current_date = chrono::Local::now().format("%Y%m%d").to_string();
        fs::create_dir_all(&log_dir)?;

        let file = open_append(&log_dir.join(format!("{}_{}.log", current_date, service_name)))?;
        let initial_size = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            service_name,
            log_dir,
            current_date: Arc::new(Mutex::new(current_date)),
            current_file: Arc::new(Mutex::new(file)),
            current_size: Arc::new(AtomicU64::new(initial_size)),
            max_file_size,
            rotation_count: Arc::new(AtomicU32::new(0)),
        })
    }

    fn file_path(&self, date: &str, rotation: u32) -> PathBuf {
        if rotation == 0 {
            self.log_dir
                .join(format!("{}_{}.log", date, self.service_name))
        } else {
            self.log_dir
                .join(format!("{}_{}.{}.log", date, self.service_name, rotation))
        }
    }

    /// Swap the underlying file if the date changed or the size limit is hit
    fn roll_if_needed(&self, incoming: usize) -> std::io::Result<()> {
        let today = chrono::Local::now().format("%Y%m%d").to_string();
        let mut current_date = self
            .current_date
            .lock()
            .map_err(|e| std::io::Error::other(format!("Mutex poisoned: {}", e)))?;

        let path = if *current_date != today {
            *current_date = today;
            self.rotation_count.store(0, Ordering::SeqCst);
            Some(self.file_path(&current_date, 0))
        } else if self.current_size.load(Ordering::Relaxed) + incoming as u64 > self.max_file_size
        {
            let count = self.rotation_count.fetch_add(1, Ordering::SeqCst) + 1;
            Some(self.file_path(&current_date, count))
        } else {
            None
        };

        if let Some(path) = path {
            fs::create_dir_all(&self.log_dir)?;
            let file = open_append(&path)?;
            self.current_size
                .store(file.metadata().map(|m| m.len()).unwrap_or(0), Ordering::SeqCst);
            let mut current_file = self
                .current_file
                .lock()
                .map_err(|e| std::io::Error::other(format!("Mutex poisoned: {}", e)))?;
            *current_file = file;
        }

        Ok(())
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for RollingFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.roll_if_needed(buf.len())?;

        let mut file = self
            .current_file
            .lock()
            .map_err(|e| std::io::Error::other(format!("Mutex poisoned: {}", e)))?;
        let written = file.write(buf)?;
        self.current_size
            .fetch_add(written as u64, Ordering::Relaxed);
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.current_file
            .lock()
            .map_err(|e| std::io::Error::other(format!("Mutex poisoned: {}", e)))?
            .flush()
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Service name (e.g., "adaptorsrv")
    pub service_name: String,
    /// Base directory for logs
    pub log_dir: PathBuf,
    /// Default filter when `RUST_LOG` is not set
    pub level: String,
    /// Write JSON lines to the log file instead of the bracketed text format
    pub enable_json: bool,
    /// Use ANSI colours on the console
    pub ansi: bool,
    /// Size threshold for rolling to a new file within the same day
    pub max_file_size: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".to_string(),
            log_dir: get_log_root(),
            level: "info".to_string(),
            enable_json: true,
            ansi: true,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// Build the filter string: `RUST_LOG` wins, otherwise the configured level
/// with `api_access` pinned to info.
fn filter_directives(config: &LogConfig) -> String {
    match std::env::var("RUST_LOG") {
        Ok(env_str) if !env_str.trim().is_empty() => env_str,
        _ if config.level.contains("api_access") => config.level.clone(),
        _ => format!("{},api_access=info", config.level),
    }
}

/// File layer: one JSON object per event, or the bracketed text format
fn file_layer<S, W>(writer: W, enable_json: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    if enable_json {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_level(true)
            .with_target(true)
            .with_current_span(false)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .event_format(BracketedLevelFormat)
            .boxed()
    }
}

/// Initialize logging system with configuration
pub fn init_with_config(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let writer = RollingFileWriter::new(
        config.service_name.clone(),
        config.log_dir.clone(),
        config.max_file_size,
    )?;
    let (non_blocking, guard) = tracing_appender::non_blocking(writer);

    match GUARDS.get_or_init(|| Mutex::new(Vec::new())).lock() {
        Ok(mut guards) => guards.push(guard),
        Err(poisoned) => {
            eprintln!("Warning: GUARDS lock was poisoned, recovering...");
            poisoned.into_inner().push(guard);
        },
    }

    let env_filter = EnvFilter::try_new(filter_directives(&config))?;

    let console_layer = fmt::layer()
        .with_ansi(config.ansi)
        .event_format(BracketedLevelFormat)
        .boxed();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer(non_blocking, config.enable_json))
        .try_init()?;

    tracing::info!("Logging: {} @ {:?}", config.service_name, config.log_dir);
    Ok(())
}

// ============================================================================
// HTTP access logging
// ============================================================================

/// HTTP API request logger middleware
///
/// Every request is logged on the `api_access` target with method, path,
/// status and duration. Modifying methods log at INFO, everything else at
/// DEBUG.
///
/// Add this middleware to your Axum router **before** `.with_state()`:
/// ```rust,ignore
/// let app = Router::new()
///     // ... routes ...
///     .layer(middleware::from_fn(http_request_logger))
///     .with_state(state);
/// ```
pub async fn http_request_logger(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    use std::time::Instant;
    use tracing::{debug, info};

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status();

    if matches!(method.as_str(), "POST" | "PUT" | "PATCH" | "DELETE") {
        info!(
            target: "api_access",
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "HTTP request"
        );
    } else {
        debug!(
            target: "api_access",
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "HTTP request"
        );
    }

    response
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_format_level() {
        assert_eq!(format_level(&Level::INFO), "[INFO]");
        assert_eq!(format_level(&Level::ERROR), "[ERROR]");
    }

    #[test]
    fn test_writer_appends_to_dated_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer =
            RollingFileWriter::new("svc".to_string(), dir.path().to_path_buf(), 1024).unwrap();
        writer.write_all(b"first\n").unwrap();
        writer.flush().unwrap();
        drop(writer);

        // Reopening must append, never truncate
        let mut writer =
            RollingFileWriter::new("svc".to_string(), dir.path().to_path_buf(), 1024).unwrap();
        writer.write_all(b"second\n").unwrap();
        writer.flush().unwrap();

        let date = chrono::Local::now().format("%Y%m%d").to_string();
        let content = fs::read_to_string(dir.path().join(format!("{}_svc.log", date))).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn test_writer_rotates_by_size() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer =
            RollingFileWriter::new("svc".to_string(), dir.path().to_path_buf(), 8).unwrap();
        writer.write_all(b"123456\n").unwrap();
        writer.write_all(b"abcdef\n").unwrap();
        writer.flush().unwrap();

        let date = chrono::Local::now().format("%Y%m%d").to_string();
        let rotated = dir.path().join(format!("{}_svc.1.log", date));
        assert!(rotated.exists());
        assert_eq!(fs::read_to_string(rotated).unwrap(), "abcdef\n");
    }

    #[test]
    fn test_json_file_layer_mirrors_event_fields() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RollingFileWriter::new(
            "svc".to_string(),
            dir.path().to_path_buf(),
            DEFAULT_MAX_FILE_SIZE,
        )
        .unwrap();
        let subscriber = tracing_subscriber::registry().with(file_layer(Mutex::new(writer), true));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(
                data = %r#"{"data":{"device_id":"341"}}"#,
                res = %r#"{"partCode":"341"}"#,
                "/data"
            );
        });

        let date = chrono::Local::now().format("%Y%m%d").to_string();
        let content = fs::read_to_string(dir.path().join(format!("{}_svc.log", date))).unwrap();
        let line: serde_json::Value =
            serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(line["level"], "INFO");
        assert_eq!(line["fields"]["message"], "/data");
        assert_eq!(line["fields"]["data"], r#"{"data":{"device_id":"341"}}"#);
        assert_eq!(line["fields"]["res"], r#"{"partCode":"341"}"#);
    }

    #[test]
    fn test_filter_directives_pins_api_access() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LogConfig {
            level: "debug".to_string(),
            ..Default::default()
        };
        assert_eq!(filter_directives(&config), "debug,api_access=info");
    }

    #[test]
    fn test_resolve_log_root_prefers_config_dir() {
        if std::env::var(LOG_DIR_ENV).is_ok() {
            return;
        }
        assert_eq!(resolve_log_root(Some("/var/log/x")), PathBuf::from("/var/log/x"));
        assert_eq!(resolve_log_root(None), PathBuf::from("logs"));
    }
}
