//! Tracing setup: console (pretty or JSON) plus an optional rolling file sink.

use crate::cli::FILE_GUARD;
use eyre::{WrapErr, eyre};
use std::path::Path;
use thermo_config::Logging;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// `RUST_LOG` wins over `--log-level` for the console; the file sink uses `[logging] level`.
pub fn init_tracing(json: bool, level: &str, cfg: &Logging) -> eyre::Result<()> {
    let console_filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(level).wrap_err_with(|| format!("invalid --log-level {level:?}"))?,
    };

    let mut layers: Vec<BoxedLayer> = Vec::new();
    // stdout carries decisions; logs go to stderr
    let console = fmt::layer().with_writer(std::io::stderr).with_target(false);
    if json {
        layers.push(console.json().with_filter(console_filter).boxed());
    } else {
        layers.push(console.with_filter(console_filter).boxed());
    }

    if let Some(file) = cfg.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre!("logging.file must name a file, got {file:?}"))?;
        let appender = match cfg.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let file_level = cfg.level.as_deref().unwrap_or("info");
        let file_filter = EnvFilter::try_new(file_level)
            .wrap_err_with(|| format!("invalid logging.level {file_level:?}"))?;
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(file_filter)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .wrap_err("initialize tracing")
}
