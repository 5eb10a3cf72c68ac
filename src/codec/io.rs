//! Источники и приёмники байт для потоковых читателя и писателя.
//!
//! [`Source::fill`] дозаполняет буфер читателя, [`Sink::flush`] забирает
//! накопленные писателем байты. `teardown` вызывается ровно один раз при
//! уничтожении читателя/писателя (явном `destroy` или `Drop`).

use std::{
    fmt,
    io::{ErrorKind, Read, Write},
};

use tracing::trace;
use zpack_error::CodecError;

/// Поставщик входных байт.
pub trait Source {
    /// Записывает в `buf` до `buf.len()` байт и возвращает их число.
    /// `Ok(0)` означает конец входа.
    fn fill(
        &mut self,
        buf: &mut [u8],
    ) -> Result<usize, CodecError>;

    /// Освобождает ресурсы источника.
    fn teardown(&mut self) -> Result<(), CodecError> {
        Ok(())
    }
}

/// Потребитель выходных байт.
pub trait Sink {
    /// Принимает все байты `data` целиком.
    fn flush(
        &mut self,
        data: &[u8],
    ) -> Result<(), CodecError>;

    /// Освобождает ресурсы приёмника.
    fn teardown(&mut self) -> Result<(), CodecError> {
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// std::io адаптеры
////////////////////////////////////////////////////////////////////////////////

/// Источник поверх любого [`Read`].
pub struct IoSource<R> {
    inner: R,
}

impl<R: Read> IoSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Source for IoSource<R> {
    fn fill(
        &mut self,
        buf: &mut [u8],
    ) -> Result<usize, CodecError> {
        loop {
            match self.inner.read(buf) {
                Ok(n) => {
                    trace!(requested = buf.len(), filled = n, "source fill");
                    return Ok(n);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    trace!(error = %e, "source fill failed");
                    return Err(CodecError::from(e));
                }
            }
        }
    }
}

impl<R> fmt::Debug for IoSource<R> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("IoSource").finish_non_exhaustive()
    }
}

/// Приёмник поверх любого [`Write`]. `teardown` сбрасывает внутренний
/// буфер `W`.
pub struct IoSink<W: Write> {
    inner: W,
}

impl<W: Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }
}

impl<W: Write> Sink for IoSink<W> {
    fn flush(
        &mut self,
        data: &[u8],
    ) -> Result<(), CodecError> {
        trace!(len = data.len(), "sink flush");
        self.inner.write_all(data).map_err(CodecError::from)
    }

    fn teardown(&mut self) -> Result<(), CodecError> {
        self.inner.flush().map_err(CodecError::from)
    }
}

impl<W: Write> fmt::Debug for IoSink<W> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("IoSink").finish_non_exhaustive()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Замыкания
////////////////////////////////////////////////////////////////////////////////

/// Источник из замыкания `FnMut(&mut [u8]) -> Result<usize, CodecError>`.
pub struct FnSource<F> {
    fill: F,
}

impl<F> FnSource<F>
where
    F: FnMut(&mut [u8]) -> Result<usize, CodecError>,
{
    pub fn new(fill: F) -> Self {
        Self { fill }
    }
}

impl<F> Source for FnSource<F>
where
    F: FnMut(&mut [u8]) -> Result<usize, CodecError>,
{
    fn fill(
        &mut self,
        buf: &mut [u8],
    ) -> Result<usize, CodecError> {
        (self.fill)(buf)
    }
}

/// Приёмник из замыкания `FnMut(&[u8]) -> Result<(), CodecError>`.
pub struct FnSink<F> {
    flush: F,
}

impl<F> FnSink<F>
where
    F: FnMut(&[u8]) -> Result<(), CodecError>,
{
    pub fn new(flush: F) -> Self {
        Self { flush }
    }
}

impl<F> Sink for FnSink<F>
where
    F: FnMut(&[u8]) -> Result<(), CodecError>,
{
    fn flush(
        &mut self,
        data: &[u8],
    ) -> Result<(), CodecError> {
        (self.flush)(data)
    }
}
