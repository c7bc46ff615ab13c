//! Tracing subscriber setup: console layer plus optional rolling file sink.

use std::path::Path;

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{Layer, Registry, fmt};

use crate::cli::FILE_GUARD;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber.
///
/// Console output goes to stderr so stdout stays clean for command results.
/// `RUST_LOG` overrides `console_level`. The file sink, when configured,
/// always writes JSON lines at `logging.level` (default info).
pub fn init(json: bool, console_level: &str, logging: &cover_config::Logging) -> eyre::Result<()> {
    let console_filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(console_level)?,
    };
    let console: BoxedLayer = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(console_filter)
            .boxed()
    };

    let mut layers = vec![console];
    if let Some(file) = &logging.file {
        layers.push(file_layer(file, logging)?);
    }

    tracing_subscriber::registry().with(layers).try_init()?;
    Ok(())
}

fn file_layer(file: &str, logging: &cover_config::Logging) -> eyre::Result<BoxedLayer> {
    let path = Path::new(file);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let Some(name) = path.file_name() else {
        eyre::bail!("logging.file has no file name: {file}");
    };
    std::fs::create_dir_all(dir)?;

    let appender = match logging.rotation.as_deref().unwrap_or("never") {
        "daily" => tracing_appender::rolling::daily(dir, name),
        "hourly" => tracing_appender::rolling::hourly(dir, name),
        _ => tracing_appender::rolling::never(dir, name),
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = FILE_GUARD.set(guard);

    let level = logging.level.as_deref().unwrap_or("info");
    Ok(fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(EnvFilter::try_new(level)?)
        .boxed())
}
