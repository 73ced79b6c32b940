//! Tracing setup.
//!
//! Filtering comes from the `TABD_LOG` env var, falling back to the
//! configured filter or `info`. Stdout gets a compact fmt layer; file
//! logging, when enabled, writes daily-rotated files through a non-blocking
//! appender whose worker is tied to the returned guard.

use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "tabd.log";

pub struct TelemetryGuard {
    _guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
}

pub fn init(config: &LoggingConfig) -> TelemetryGuard {
    let default = config.filter.as_deref().unwrap_or("info");
    let filter = EnvFilter::builder()
        .with_default_directive(default.parse().unwrap_or_else(|_| "info".parse().expect("valid directive")))
        .with_env_var("TABD_LOG")
        .from_env_lossy();

    let mut guards = Vec::new();
    let mut layers: Vec<Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>> = Vec::new();

    if config.stdout {
        layers.push(fmt::layer().compact().boxed());
    }

    if config.file.enabled {
        let dir = config
            .file
            .dir
            .clone()
            .unwrap_or_else(|| crate::paths::config_dir().join("logs"));
        let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);
        layers.push(fmt::layer().with_writer(writer).with_ansi(false).boxed());
    }

    if let Err(err) = tracing_subscriber::registry()
        .with(filter)
        .with(layers)
        .try_init()
    {
        // No subscriber to log through at this point.
        eprintln!("tabd: tracing init failed: {err}");
    }

    TelemetryGuard { _guards: guards }
}
