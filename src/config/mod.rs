//! Настройки кодека из окружения.

pub mod settings;

pub use settings::{CodecSettings, SettingsError};
