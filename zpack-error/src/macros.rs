/// Немедленно возвращает ошибку (аналогично `anyhow::bail!`).
///
/// Макрос возвращает `Err(StackError)` из текущей функции. Поддерживает три
/// формы:
/// - `bail!(err)` - принимает уже готовый тип ошибки или
///   `StackError`-совместимый тип;
/// - `bail!(code, "msg")` - создаёт `GenericError` с кодом и сообщением;
/// - `bail!(code, "fmt {}", arg)` - форматирует сообщение.
///
/// Пример:
///
/// ```ignore
/// use zpack_error::{bail, StatusCode};
///
/// fn check_buffer(size: usize) -> Result<(), crate::StackError> {
///     if size == 0 {
///         bail!(StatusCode::InvalidArgs, "Buffer size cannot be zero");
///     }
///     if size > u32::MAX as usize {
///         bail!(StatusCode::SizeLimit, "Buffer too large: {} bytes", size);
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($crate::StackError::from($err))
    };
    ($code:expr, $msg:expr) => {
        return Err($crate::StackError::new(
            $crate::types::GenericError::new($code, $msg)
        ))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::StackError::new(
            $crate::types::GenericError::new($code, format!($fmt, $($arg)*))
        ))
    };
}

/// Проверяет условие и вызывает `bail!`, если условие ложно.
///
/// Формы аналогичны `bail!`:
/// - `ensure!(cond, err)` - если `cond` ложно, выполняется `bail!(err)`.
/// - `ensure!(cond, code, "msg")` - если `cond` ложно, выполняется `bail!(code,
///   "msg")`.
/// - `ensure!(cond, code, "fmt {}", arg)` - форматированная форма.
///
/// Пример:
///
/// ```ignore
/// use zpack_error::{ensure, StatusCode};
///
/// fn check_depth(depth: usize) -> Result<(), crate::StackError> {
///     ensure!(depth > 0, StatusCode::InvalidArgs, "Depth must be positive");
///     ensure!(depth <= 4096, StatusCode::DepthLimit, "Depth too large: {}", depth);
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            $crate::bail!($err);
        }
    };
    ($cond:expr, $code:expr, $msg:expr) => {
        if !($cond) {
            $crate::bail!($code, $msg);
        }
    };
    ($cond:expr, $code:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($code, $fmt, $($arg)*);
        }
    };
}

/// Добавляет контекст к `Result`.
///
/// Если аргумент - `Ok(val)`, возвращает `Ok(val)`. Если `Err(e)`, преобразует
/// `e` в `StackError` и добавляет указанный контекст (через
/// `StackError::context`).
///
/// Пример:
///
/// ```ignore
/// use zpack_error::context;
///
/// fn load(path: &str) -> Result<Vec<u8>, crate::StackError> {
///     context!(std::fs::read(path), "Failed to read {}", path)
/// }
/// ```
#[macro_export]
macro_rules! context {
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(val) => Ok(val),
            Err(e) => Err($crate::StackError::from(e).context($msg)),
        }
    };
    ($result:expr, $fmt:expr, $($arg:tt)*) => {
        match $result {
            Ok(val) => Ok(val),
            Err(e) => Err($crate::StackError::from(e).context(format!($fmt, $($arg)*))),
        }
    };
}

/// Трейт-расширение для `Result`, добавляющее удобные методы контекстирования.
///
/// Позволяет вызывать `.context(...)` и `.with_context(...)` на результатах,
/// превращая ошибку в [`StackError`] и приклеивая к ней контекст.
pub trait ResultExt<T> {
    /// Добавляет контекст к ошибке: если `self` - `Err`, оборачивает ошибку в
    /// `StackError` и добавляет указанный контекст.
    fn context<C>(
        self,
        ctx: C,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>;

    /// Добавляет ленивый контекст (вызывается только в случае ошибки).
    ///
    /// Полезно, если формирование строки контекста дорогостоящее.
    fn with_context<C, F>(
        self,
        f: F,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<crate::StackError>,
{
    #[track_caller]
    fn context<C>(
        self,
        ctx: C,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>,
    {
        self.map_err(|e| e.into().context(ctx))
    }

    #[track_caller]
    fn with_context<C, F>(
        self,
        f: F,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| e.into().context(f()))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CodecError, StatusCode, ZpackResult};

    #[test]
    fn test_bail_codec_error() {
        fn example() -> ZpackResult<()> {
            bail!(CodecError::Invalid);
        }

        let err = example().unwrap_err();
        assert_eq!(err.codec_error(), Some(CodecError::Invalid));
    }

    #[test]
    fn test_bail_with_format() {
        fn example(size: usize) -> ZpackResult<()> {
            bail!(StatusCode::InvalidArgs, "Invalid buffer size: {}", size);
        }

        let err = example(0).unwrap_err();
        assert!(err.to_string().contains("Invalid buffer size: 0"));
        assert_eq!(err.status_code(), StatusCode::InvalidArgs);
    }

    #[test]
    fn test_ensure() {
        fn validate(depth: usize) -> ZpackResult<()> {
            ensure!(depth > 0, StatusCode::InvalidArgs, "Depth must be positive");
            ensure!(depth < 100, CodecError::TooBig);
            Ok(())
        }

        assert!(validate(50).is_ok());
        assert!(validate(0).is_err());
        assert_eq!(validate(150).unwrap_err().codec_error(), Some(CodecError::TooBig));
    }

    #[test]
    fn test_context_macro() {
        fn example() -> ZpackResult<u8> {
            context!(Err::<u8, _>(CodecError::Eof), "Reading tag at {}", 3)
        }

        let err = example().unwrap_err();
        assert_eq!(err.contexts()[0].message, "Reading tag at 3");
    }

    #[test]
    fn test_result_ext() {
        fn inner() -> Result<(), CodecError> {
            Err(CodecError::Type)
        }

        fn outer() -> ZpackResult<()> {
            inner().context("outer context")?;
            Ok(())
        }

        let err = outer().unwrap_err();
        assert_eq!(err.contexts().len(), 1);
        assert_eq!(err.contexts()[0].message, "outer context");
    }

    #[test]
    fn test_with_context_lazy() {
        fn example(success: bool) -> ZpackResult<()> {
            let result: Result<(), CodecError> = if success {
                Ok(())
            } else {
                Err(CodecError::Io)
            };

            result.with_context(|| format!("flush of {} bytes", 16))?;
            Ok(())
        }

        // При успехе замыкание не вызывается
        assert!(example(true).is_ok());
        assert!(example(false)
            .unwrap_err()
            .to_string()
            .contains("flush of 16 bytes"));
    }
}
