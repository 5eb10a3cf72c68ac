use std::{any::Any, path::Path};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zpack_error::{ErrorExt, StatusCode};

use crate::codec::{
    PagePolicy, ReaderConfig, TreeConfig, WriterConfig, DEFAULT_BUFFER_SIZE, DEFAULT_MAX_DEPTH,
    DEFAULT_PAGE_SIZE,
};

/// Ошибка загрузки или проверки настроек.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] ConfigError),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl ErrorExt for SettingsError {
    fn status_code(&self) -> StatusCode {
        StatusCode::InvalidArgs
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Общие параметры читателя, писателя и дерева.
///
/// Источники по возрастанию приоритета: значения по умолчанию,
/// необязательный файл, переменные окружения `ZPACK_*`
/// (`ZPACK_BUFFER_SIZE`, `ZPACK_MAX_DEPTH`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecSettings {
    pub buffer_size: usize,
    pub max_depth: usize,
    pub max_bytes: Option<u32>,
    pub page_size: usize,
    pub max_nodes: Option<usize>,
    pub int_as_float: bool,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            max_bytes: None,
            page_size: DEFAULT_PAGE_SIZE,
            max_nodes: None,
            int_as_float: true,
        }
    }
}

impl CodecSettings {
    /// Загружает настройки из значений по умолчанию и окружения.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(None)
    }

    /// То же, что [`CodecSettings::load`], плюс файл настроек между
    /// значениями по умолчанию и окружением.
    pub fn load_from(file: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder()
            .set_default("buffer_size", DEFAULT_BUFFER_SIZE as u64)?
            .set_default("max_depth", DEFAULT_MAX_DEPTH as u64)?
            .set_default("page_size", DEFAULT_PAGE_SIZE as u64)?
            .set_default("int_as_float", true)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }

        let cfg = builder
            .add_source(Environment::with_prefix("ZPACK").try_parsing(true))
            .build()?;

        let settings: CodecSettings = cfg.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.buffer_size == 0 {
            return Err(SettingsError::Invalid {
                field: "buffer_size",
                reason: "must be greater than zero",
            });
        }
        if self.max_depth == 0 {
            return Err(SettingsError::Invalid {
                field: "max_depth",
                reason: "must be greater than zero",
            });
        }
        if self.page_size == 0 {
            return Err(SettingsError::Invalid {
                field: "page_size",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }

    pub fn reader_config(&self) -> ReaderConfig {
        ReaderConfig {
            buffer_size: self.buffer_size,
            max_depth: self.max_depth,
            max_bytes: self.max_bytes,
            int_as_float: self.int_as_float,
            ..ReaderConfig::default()
        }
    }

    pub fn writer_config(&self) -> WriterConfig {
        WriterConfig::default()
            .with_buffer_size(self.buffer_size)
            .with_max_depth(self.max_depth)
    }

    pub fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            buffer_size: self.buffer_size,
            max_bytes: self.max_bytes,
            ..TreeConfig::default()
        }
        .with_max_depth(self.max_depth)
        .with_max_nodes(self.max_nodes)
        .with_pages(PagePolicy::Dynamic {
            page_size: self.page_size,
        })
        .with_int_as_float(self.int_as_float)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
