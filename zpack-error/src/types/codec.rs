use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибка кодека MessagePack.
///
/// Компактное `Copy`-значение, которое читатель, писатель и дерево хранят
/// как «липкую» ошибку: первая возникшая ошибка фиксируется навсегда,
/// все последующие операции экземпляра становятся no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum CodecError {
    /// Сбой fill/flush/teardown callback'а или файла.
    #[error("I/O error in fill or flush callback")]
    Io,
    /// Повреждённые данные (зарезервированный байт 0xC1, неверный
    /// timestamp, неверный UTF-8).
    #[error("invalid MessagePack data")]
    Invalid,
    /// Данные корректны, но отключены конфигурацией (расширения).
    #[error("unsupported MessagePack feature")]
    Unsupported,
    /// Тип или диапазон значения не совпадает с запрошенным.
    #[error("type mismatch")]
    Type,
    /// Превышен лимит размера значения, буфера, глубины или числа узлов.
    #[error("value, buffer or depth limit exceeded")]
    TooBig,
    /// Не удалось выделить память.
    #[error("memory allocation failed")]
    Memory,
    /// Неверное использование API: несбалансированные или несовпадающие
    /// составные элементы.
    #[error("API misuse: unbalanced or mismatched compound element")]
    Bug,
    /// Данные корректны, но не совпадают с ожидаемыми (нет ключа, не та
    /// строка, дубликат ключа).
    #[error("data does not match the expected value")]
    Data,
    /// Входные данные закончились раньше, чем значение было прочитано.
    #[error("data too short: unexpected end of input")]
    Eof,
}

impl CodecError {
    /// Короткое имя ошибки (для логов и CLI).
    pub const fn name(self) -> &'static str {
        match self {
            Self::Io => "io",
            Self::Invalid => "invalid",
            Self::Unsupported => "unsupported",
            Self::Type => "type",
            Self::TooBig => "too_big",
            Self::Memory => "memory",
            Self::Bug => "bug",
            Self::Data => "data",
            Self::Eof => "eof",
        }
    }

    /// Ошибка вызвана недоверенными входными данными, а не вызывающим кодом.
    pub const fn is_data_error(self) -> bool {
        matches!(self, Self::Invalid | Self::TooBig | Self::Eof | Self::Unsupported)
    }
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => Self::Eof,
            std::io::ErrorKind::OutOfMemory => Self::Memory,
            _ => Self::Io,
        }
    }
}

impl ErrorExt for CodecError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Io => StatusCode::Io,
            Self::Invalid => StatusCode::InvalidData,
            Self::Unsupported => StatusCode::Unsupported,
            Self::Type => StatusCode::TypeError,
            Self::TooBig => StatusCode::SizeLimit,
            Self::Memory => StatusCode::OutOfMemory,
            Self::Bug => StatusCode::ApiMisuse,
            Self::Data => StatusCode::ValueMismatch,
            Self::Eof => StatusCode::UnexpectedEof,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
