use std::{env, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::LoggingError;

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Формат вывода событий.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    #[default]
    Compact,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(LoggingError::InvalidFormat(s.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
            LogFormat::Compact => "compact",
        };
        f.write_str(name)
    }
}

/// Настройки логирования CLI.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Уровень для событий крейта (`trace`..`error`).
    pub level: String,
    pub format: LogFormat,
    pub with_target: bool,
    pub with_ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
            with_target: false,
            with_ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Применяет `ZPACK_LOG_LEVEL` и `ZPACK_LOG_FORMAT`, если они заданы.
    pub fn apply_env_overrides(&mut self) -> Result<(), LoggingError> {
        if let Ok(level) = env::var("ZPACK_LOG_LEVEL") {
            self.level = level.to_ascii_lowercase();
        }
        if let Ok(format) = env::var("ZPACK_LOG_FORMAT") {
            self.format = format.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), LoggingError> {
        if !LEVELS.contains(&self.level.as_str()) {
            return Err(LoggingError::InvalidLevel(self.level.clone()));
        }
        Ok(())
    }

    /// Директива `EnvFilter`: уровень применяется к событиям `zpack`,
    /// остальные крейты ограничены `warn`.
    pub fn build_filter_directive(&self) -> String {
        format!("warn,zpack={},zpack_cli={}", self.level, self.level)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    /// Тест проверяет разбор формата без учёта регистра.
    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(LoggingError::InvalidFormat(_))
        ));
    }

    /// Тест проверяет переопределение уровня и формата из окружения.
    #[test]
    #[serial]
    fn test_env_overrides() {
        env::set_var("ZPACK_LOG_LEVEL", "DEBUG");
        env::set_var("ZPACK_LOG_FORMAT", "json");

        let mut config = LoggingConfig::default();
        let result = config.apply_env_overrides();
        env::remove_var("ZPACK_LOG_LEVEL");
        env::remove_var("ZPACK_LOG_FORMAT");

        result.unwrap();
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    /// Тест проверяет, что неизвестный уровень отклоняется.
    #[test]
    fn test_validate_rejects_unknown_level() {
        let config = LoggingConfig {
            level: "loud".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LoggingError::InvalidLevel(level)) if level == "loud"
        ));
    }

    #[test]
    fn test_filter_directive() {
        let config = LoggingConfig {
            level: "trace".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.build_filter_directive(),
            "warn,zpack=trace,zpack_cli=trace"
        );
    }
}
