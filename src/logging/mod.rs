//! Логирование для CLI поверх `tracing-subscriber`.
//!
//! Ядро кодека только эмитит события `tracing`; подписчика устанавливает
//! приложение через [`init_logging`].

pub mod config;
mod filters;
mod formatter;

use std::io::{self, Stderr};

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use config::{LogFormat, LoggingConfig};
pub use filters::build_filter_from_config;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("unknown log level: {0}")]
    InvalidLevel(String),
    #[error("unknown log format: {0}")]
    InvalidFormat(String),
    #[error("failed to install subscriber: {0}")]
    Init(String),
}

/// Инициализация логирования с конфигурацией.
///
/// События пишутся в stderr, чтобы не смешиваться с выводом команд.
pub fn init_logging(mut config: LoggingConfig) -> Result<(), LoggingError> {
    config.apply_env_overrides()?;
    config.validate()?;

    let env_filter = build_filter_from_config(&config);
    let writer: fn() -> Stderr = io::stderr;
    let layer = formatter::build_formatter_from_config(&config, writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.level,
        log_format = %config.format,
        "Logging system initialized"
    );
    Ok(())
}
