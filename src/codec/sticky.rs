use std::fmt;

use tracing::debug;
use zpack_error::CodecError;

/// Обработчик, вызываемый один раз в момент фиксации ошибки.
pub type ErrorHandler<'a> = Box<dyn FnMut(CodecError) + 'a>;

/// «Липкая» ошибка читателя/писателя: первая ошибка фиксируется навсегда.
pub(crate) struct Sticky<'a> {
    error: Option<CodecError>,
    handler: Option<ErrorHandler<'a>>,
    origin: &'static str,
}

impl<'a> Sticky<'a> {
    pub(crate) fn new(origin: &'static str) -> Self {
        Self {
            error: None,
            handler: None,
            origin,
        }
    }

    #[inline]
    pub(crate) fn get(&self) -> Option<CodecError> {
        self.error
    }

    #[inline]
    pub(crate) fn is_set(&self) -> bool {
        self.error.is_some()
    }

    pub(crate) fn set_handler(
        &mut self,
        handler: ErrorHandler<'a>,
    ) {
        self.handler = Some(handler);
    }

    /// Фиксирует ошибку, если ещё нет другой. Повторные вызовы игнорируются.
    pub(crate) fn latch(
        &mut self,
        err: CodecError,
    ) {
        if self.error.is_some() {
            return;
        }
        debug!(origin = self.origin, error = err.name(), "codec error latched");
        self.error = Some(err);

        if let Some(handler) = self.handler.as_mut() {
            handler(err);
        }

        #[cfg(feature = "debug-panic")]
        if err == CodecError::Bug {
            panic!("{}: {}", self.origin, err);
        }
    }

    /// Фиксирует ошибку из `Result` и возвращает `Some` при успехе.
    #[inline]
    pub(crate) fn ok<T>(
        &mut self,
        res: Result<T, CodecError>,
    ) -> Option<T> {
        match res {
            Ok(v) => Some(v),
            Err(e) => {
                self.latch(e);
                None
            }
        }
    }
}

impl fmt::Debug for Sticky<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Sticky")
            .field("error", &self.error)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}
