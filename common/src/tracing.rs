use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing: pretty output on stdout plus, when a path is given,
/// an append-only file that receives ERROR-level events only.
pub fn init_tracing(error_log: Option<&Path>) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let error_layer = match error_log {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(LevelFilter::ERROR),
            )
        }
        None => None,
    };

    Registry::default()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(error_layer)
        .init();

    Ok(())
}
