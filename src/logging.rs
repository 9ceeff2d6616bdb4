use tracing::{Subscriber, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::shared::config::{LoggingConfig, settings};

pub const LOG_FILE_PREFIX: &str = "metastore_compactor.log";

/// Installs logging as configured under `[logging]` in the process settings.
/// Call once, before the first block is applied.
pub fn init() -> anyhow::Result<()> {
    let settings = settings()?;
    subscriber(&settings.logging)?.try_init()?;
    info!(
        target: "compaction::logging",
        log_dir = %settings.logging.log_dir,
        "Logging initialized"
    );
    Ok(())
}

/// Stdout layer plus a daily-rolling file under `log_dir`, each with its own
/// level filter.
pub fn subscriber(
    cfg: &LoggingConfig,
) -> anyhow::Result<impl Subscriber + Send + Sync + 'static> {
    let stdout_filter = cfg.stdout_level.parse::<LevelFilter>()?;
    let file_filter = cfg.file_level.parse::<LevelFilter>()?;

    let stdout_layer = fmt::layer().with_ansi(true).with_filter(stdout_filter);

    let file_appender = tracing_appender::rolling::daily(&cfg.log_dir, LOG_FILE_PREFIX);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(file_appender)
        .with_filter(file_filter);

    Ok(tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer))
}

#[cfg(test)]
pub fn init_for_tests() {
    use std::sync::Once;
    use tracing_subscriber::EnvFilter;

    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter = EnvFilter::from_default_env()
            .add_directive("compaction=debug".parse().expect("valid directive"));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}
