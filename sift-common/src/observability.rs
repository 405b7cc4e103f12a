//! Logging setup shared by the `sift` binary and integration tests.
//!
//! Events go to a daily rolling file, optionally mirrored to stderr. Stdout is
//! never a sink: the stdio tool server owns it for protocol traffic.
//! [`init_logging`] installs the subscriber once per process; repeated calls
//! return the already-resolved file path.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_DIR_ENV: &str = "SIFT_LOG_DIR";

static FILE_WRITER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static ACTIVE_LOG_FILE: OnceLock<PathBuf> = OnceLock::new();

/// Encoding of each log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Used as the file stem and the default directory name.
    pub app_name: &'static str,
    /// Overrides `SIFT_LOG_DIR` and the `~/.local/share/<app_name>` default.
    pub log_dir: Option<PathBuf>,
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Directive used when `RUST_LOG` is unset or invalid.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "sift",
            log_dir: None,
            emit_stderr: false,
            format: LogFormat::Text,
            default_filter: "info".to_string(),
        }
    }
}

fn formatted_layer<S, W>(format: LogFormat, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Text => fmt::layer().with_writer(writer).with_ansi(ansi).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    }
}

/// Install the global subscriber and return today's log file path.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(active) = ACTIVE_LOG_FILE.get() {
        return Ok(active.clone());
    }

    let dir = log_dir_for(config.app_name, config.log_dir.as_deref());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;

    let stem = format!("{}.log", config.app_name);
    let log_file = dir.join(format!("{stem}.{}", Local::now().format("%Y-%m-%d")));

    let (file_writer, guard) = tracing_appender::non_blocking(rolling::daily(&dir, &stem));
    let _ = FILE_WRITER_GUARD.set(guard);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));
    let stderr = config
        .emit_stderr
        .then(|| formatted_layer(config.format, std::io::stderr, true));

    tracing_subscriber::registry()
        .with(filter)
        .with(formatted_layer(config.format, file_writer, false))
        .with(stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;

    let _ = ACTIVE_LOG_FILE.set(log_file.clone());
    Ok(log_file)
}

fn log_dir_for(app_name: &str, explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(with_home_expanded)
        .or_else(|| {
            std::env::var_os(LOG_DIR_ENV).map(|dir| with_home_expanded(Path::new(&dir)))
        })
        .unwrap_or_else(|| match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(".local/share").join(app_name),
            None => PathBuf::from(app_name),
        })
}

fn with_home_expanded(path: &Path) -> PathBuf {
    let home = std::env::var_os("HOME");
    match (path.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}
