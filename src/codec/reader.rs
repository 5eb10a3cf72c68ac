//! Потоковый читатель MessagePack.
//!
//! Читатель работает поверх буфера одного из трёх видов: заимствованных
//! данных целиком в памяти, заимствованного рабочего буфера или
//! собственного буфера. Если запросу не хватает буферизованных байт,
//! читатель дозаполняет буфер из [`Source`] (возможно, несколько раз);
//! крупные чтения в память вызывающего кода идут мимо буфера.
//!
//! Ошибки «залипают»: после первой ошибки все операции возвращают
//! нейтральные значения (`Tag::Nil`, нули, пустые срезы).

use tracing::{debug, trace};
use zpack_error::CodecError;

use super::{
    io::Source,
    sticky::{ErrorHandler, Sticky},
    tag::{tag_size, Tag, ValueType, MAX_TAG_SIZE},
    track::{Track, DEFAULT_MAX_DEPTH},
    writer::DEFAULT_BUFFER_SIZE,
};

/// Порция, которой растёт выделяемая под полезную нагрузку память.
/// Длина из заголовка не доверенная, поэтому память выделяется по мере
/// поступления данных.
const ALLOC_CHUNK: usize = 64 * 1024;

/// Параметры читателя.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Размер собственного буфера для [`Reader::from_source`].
    pub buffer_size: usize,
    /// Максимальная вложенность (учёт составных элементов и `discard`).
    pub max_depth: usize,
    /// Ограничение длины одного str/bin/ext.
    pub max_bytes: Option<u32>,
    /// Разрешить `expect_float`/`expect_double` принимать целые.
    pub int_as_float: bool,
    /// Разрешить ext-значения; иначе они дают `Unsupported`.
    pub allow_extensions: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            max_bytes: None,
            int_as_float: true,
            allow_extensions: true,
        }
    }
}

impl ReaderConfig {
    pub fn with_buffer_size(
        mut self,
        buffer_size: usize,
    ) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_max_depth(
        mut self,
        max_depth: usize,
    ) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_bytes(
        mut self,
        max_bytes: Option<u32>,
    ) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_int_as_float(
        mut self,
        int_as_float: bool,
    ) -> Self {
        self.int_as_float = int_as_float;
        self
    }

    pub fn with_extensions(
        mut self,
        allow: bool,
    ) -> Self {
        self.allow_extensions = allow;
        self
    }
}

enum Buffer<'a> {
    Data(&'a [u8]),
    Scratch(&'a mut [u8]),
    Owned(Box<[u8]>),
}

impl Buffer<'_> {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Data(data) => data,
            Buffer::Scratch(buf) => buf,
            Buffer::Owned(buf) => buf,
        }
    }

    fn as_mut(&mut self) -> Option<&mut [u8]> {
        match self {
            Buffer::Data(_) => None,
            Buffer::Scratch(buf) => Some(&mut buf[..]),
            Buffer::Owned(buf) => Some(&mut buf[..]),
        }
    }

    fn capacity(&self) -> usize {
        self.as_slice().len()
    }
}

/// Потоковый читатель.
pub struct Reader<'a> {
    buffer: Buffer<'a>,
    pos: usize,
    end: usize,
    source: Option<Box<dyn Source + 'a>>,
    error: Sticky<'a>,
    track: Track,
    config: ReaderConfig,
}

#[derive(Debug, Clone, Copy)]
struct Level {
    kind: ValueType,
    remaining: u64,
}

////////////////////////////////////////////////////////////////////////////////
// Конструкторы и жизненный цикл
////////////////////////////////////////////////////////////////////////////////

impl<'a> Reader<'a> {
    /// Читатель данных, целиком находящихся в памяти.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_config(data, ReaderConfig::default())
    }

    pub fn with_config(
        data: &'a [u8],
        config: ReaderConfig,
    ) -> Self {
        let end = data.len();
        Self::build(Buffer::Data(data), end, None, config)
    }

    /// Читатель с рабочим буфером вызывающего кода, дозаполняемым из
    /// `source`.
    pub fn with_buffer(
        buffer: &'a mut [u8],
        source: impl Source + 'a,
        config: ReaderConfig,
    ) -> Self {
        Self::build(Buffer::Scratch(buffer), 0, Some(Box::new(source)), config)
    }

    /// Читатель с собственным буфером размера `config.buffer_size`.
    pub fn from_source(
        source: impl Source + 'a,
        config: ReaderConfig,
    ) -> Self {
        let buffer = vec![0u8; config.buffer_size].into_boxed_slice();
        Self::build(Buffer::Owned(buffer), 0, Some(Box::new(source)), config)
    }

    /// Читатель, владеющий данными целиком; буфер освобождается вместе с
    /// читателем.
    pub fn from_vec(
        data: Vec<u8>,
        config: ReaderConfig,
    ) -> Self {
        let end = data.len();
        Self::build(Buffer::Owned(data.into_boxed_slice()), end, None, config)
    }

    fn build(
        buffer: Buffer<'a>,
        end: usize,
        source: Option<Box<dyn Source + 'a>>,
        config: ReaderConfig,
    ) -> Self {
        Self {
            buffer,
            pos: 0,
            end,
            source,
            error: Sticky::new("reader"),
            track: Track::new(config.max_depth),
            config,
        }
    }

    /// Устанавливает обработчик, вызываемый при фиксации ошибки.
    pub fn set_error_handler(
        &mut self,
        handler: impl FnMut(CodecError) + 'a,
    ) {
        let handler: ErrorHandler<'a> = Box::new(handler);
        self.error.set_handler(handler);
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Текущая ошибка читателя.
    pub fn error(&self) -> Option<CodecError> {
        self.error.get()
    }

    /// `Err` с текущей ошибкой, если она есть.
    pub fn check(&self) -> Result<(), CodecError> {
        match self.error.get() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Принудительно фиксирует ошибку, например при ошибке проверки данных
    /// на стороне вызывающего кода.
    pub fn flag_error(
        &mut self,
        err: CodecError,
    ) {
        self.error.latch(err);
    }

    /// Есть ли у читателя источник для дозаполнения.
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Непрочитанные байты в буфере. Для читателя данных в памяти - всё,
    /// что осталось после последнего прочитанного значения.
    pub fn remaining(&self) -> &[u8] {
        &self.buffer.as_slice()[self.pos..self.end]
    }

    /// Завершает чтение: все составные элементы должны быть закрыты
    /// (иначе `Bug`). Вызывает `teardown` источника и возвращает первую
    /// ошибку.
    pub fn destroy(mut self) -> Result<(), CodecError> {
        if !self.error.is_set() {
            let res = self.track.check_empty();
            self.error.ok(res);
        }
        let teardown = match self.source.take() {
            Some(mut source) => source.teardown(),
            None => Ok(()),
        };
        if let Err(e) = teardown {
            self.error.latch(e);
        }
        debug!(error = ?self.error.get(), "reader destroyed");
        self.check()
    }
}

impl Drop for Reader<'_> {
    fn drop(&mut self) {
        if let Some(mut source) = self.source.take() {
            let _ = source.teardown();
        }
    }
}

impl std::fmt::Debug for Reader<'_> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("pos", &self.pos)
            .field("end", &self.end)
            .field("capacity", &self.buffer.capacity())
            .field("has_source", &self.source.is_some())
            .field("error", &self.error.get())
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Буферизация
////////////////////////////////////////////////////////////////////////////////

impl Reader<'_> {
    /// Гарантирует не меньше `need` непрочитанных байт в буфере.
    fn ensure(
        &mut self,
        need: usize,
    ) -> Result<(), CodecError> {
        if self.end - self.pos >= need {
            return Ok(());
        }
        let Some(source) = self.source.as_mut() else {
            return Err(CodecError::Eof);
        };
        let Some(buf) = self.buffer.as_mut() else {
            return Err(CodecError::Eof);
        };
        if need > buf.len() {
            return Err(CodecError::TooBig);
        }

        buf.copy_within(self.pos..self.end, 0);
        self.end -= self.pos;
        self.pos = 0;

        while self.end < need {
            let free = &mut buf[self.end..];
            let n = source.fill(free)?;
            trace!(need, filled = n, "reader fill");
            if n == 0 {
                return Err(CodecError::Eof);
            }
            if n > free.len() {
                return Err(CodecError::Io);
            }
            self.end += n;
        }
        Ok(())
    }

    /// Копирует ровно `out.len()` байт, дозаполняя буфер при необходимости.
    fn read_native(
        &mut self,
        out: &mut [u8],
    ) -> Result<(), CodecError> {
        let avail = self.end - self.pos;
        if out.len() <= avail {
            out.copy_from_slice(&self.buffer.as_slice()[self.pos..self.pos + out.len()]);
            self.pos += out.len();
            return Ok(());
        }

        out[..avail].copy_from_slice(&self.buffer.as_slice()[self.pos..self.end]);
        self.pos = self.end;
        let mut filled = avail;

        let Some(source) = self.source.as_mut() else {
            return Err(CodecError::Eof);
        };

        if out.len() - filled >= self.buffer.capacity() {
            // крупное чтение: прямо в память вызывающего кода
            while filled < out.len() {
                let n = source.fill(&mut out[filled..])?;
                trace!(direct = true, filled = n, "reader fill");
                if n == 0 {
                    return Err(CodecError::Eof);
                }
                filled += n;
            }
            return Ok(());
        }

        let rest = out.len() - filled;
        self.ensure(rest)?;
        out[filled..].copy_from_slice(&self.buffer.as_slice()[self.pos..self.pos + rest]);
        self.pos += rest;
        Ok(())
    }

    fn skip_native(
        &mut self,
        mut n: usize,
    ) -> Result<(), CodecError> {
        loop {
            let avail = self.end - self.pos;
            if n <= avail {
                self.pos += n;
                return Ok(());
            }
            n -= avail;
            self.pos = self.end;
            self.ensure(1)?;
        }
    }

    /// Дописывает `n` байт полезной нагрузки в конец `out`.
    fn append_native(
        &mut self,
        n: usize,
        out: &mut Vec<u8>,
    ) -> Result<(), CodecError> {
        if self.source.is_none() && n > self.end - self.pos {
            return Err(CodecError::Eof);
        }
        let target = out.len() + n;
        while out.len() < target {
            let start = out.len();
            let chunk = (target - start).min(ALLOC_CHUNK);
            out.try_reserve(chunk).map_err(|_| CodecError::Memory)?;
            out.resize(start + chunk, 0);
            self.read_native(&mut out[start..])?;
        }
        Ok(())
    }

    fn parse_tag(&mut self) -> Result<Tag, CodecError> {
        let mut header = [0u8; MAX_TAG_SIZE];
        self.read_native(&mut header[..1])?;
        let size = tag_size(header[0])?;
        if size > 1 {
            self.read_native(&mut header[1..size])?;
        }
        let tag = Tag::decode(&header[..size])?;
        self.admit(tag)?;
        Ok(tag)
    }

    /// Проверяет ограничения и открывает кадр учёта вложенности.
    fn admit(
        &mut self,
        tag: Tag,
    ) -> Result<(), CodecError> {
        if matches!(tag, Tag::Ext(..)) && !self.config.allow_extensions {
            return Err(CodecError::Unsupported);
        }
        if let (Some(len), Some(max)) = (tag.payload_len(), self.config.max_bytes) {
            if len > max {
                return Err(CodecError::TooBig);
            }
        }
        self.track.element()?;
        match tag {
            Tag::Str(n) | Tag::Bin(n) | Tag::Ext(_, n) => {
                self.track.push(tag.value_type(), n as u64)
            }
            Tag::Array(_) | Tag::Map(_) => {
                let children = tag.child_count().unwrap_or(0);
                self.track.push(tag.value_type(), children)
            }
            _ => Ok(()),
        }
    }

    fn close(
        &mut self,
        kind: ValueType,
    ) {
        if self.error.is_set() {
            return;
        }
        let res = self.track.pop(kind);
        self.error.ok(res);
    }
}

////////////////////////////////////////////////////////////////////////////////
// Публичное чтение
////////////////////////////////////////////////////////////////////////////////

impl Reader<'_> {
    /// Читает заголовок следующего значения. Для str/bin/ext/map/array
    /// открывается составной элемент, который закрывается `done_*`.
    pub fn read_tag(&mut self) -> Tag {
        if self.error.is_set() {
            return Tag::Nil;
        }
        let res = self.parse_tag();
        self.error.ok(res).unwrap_or(Tag::Nil)
    }

    /// Возвращает заголовок следующего значения, не продвигая позицию.
    ///
    /// Заголовок должен целиком помещаться в буфер: при буфере меньше
    /// [`MAX_TAG_SIZE`] длинные заголовки дают `TooBig`.
    pub fn peek_tag(&mut self) -> Tag {
        if self.error.is_set() {
            return Tag::Nil;
        }
        let res = self.peek_inner();
        self.error.ok(res).unwrap_or(Tag::Nil)
    }

    fn peek_inner(&mut self) -> Result<Tag, CodecError> {
        self.ensure(1)?;
        let size = tag_size(self.buffer.as_slice()[self.pos])?;
        self.ensure(size)?;
        Tag::decode(&self.buffer.as_slice()[self.pos..self.pos + size])
    }

    /// Читает ровно `out.len()` байт полезной нагрузки открытого
    /// str/bin/ext. При ошибке `out` заполняется нулями.
    pub fn read_bytes(
        &mut self,
        out: &mut [u8],
    ) {
        if !self.error.is_set() {
            let res = self
                .track
                .bytes(out.len() as u64)
                .and_then(|_| self.read_native(out));
            if self.error.ok(res).is_some() {
                return;
            }
        }
        out.fill(0);
    }

    /// Читает `n` байт полезной нагрузки в новый вектор.
    pub fn read_bytes_alloc(
        &mut self,
        n: usize,
    ) -> Vec<u8> {
        let mut out = Vec::new();
        if self.read_bytes_append(n, &mut out) {
            out
        } else {
            Vec::new()
        }
    }

    /// Дописывает `n` байт полезной нагрузки в `out`; `false` при ошибке.
    pub(crate) fn read_bytes_append(
        &mut self,
        n: usize,
        out: &mut Vec<u8>,
    ) -> bool {
        if self.error.is_set() {
            return false;
        }
        let res = self
            .track
            .bytes(n as u64)
            .and_then(|_| self.append_native(n, out));
        self.error.ok(res).is_some()
    }

    /// Возвращает `n` байт прямо из буфера без копирования. `n` больше
    /// буфера даёт `TooBig`.
    pub fn read_bytes_inplace(
        &mut self,
        n: usize,
    ) -> &[u8] {
        if self.error.is_set() {
            return &[];
        }
        let res = self.track.bytes(n as u64).and_then(|_| self.ensure(n));
        if self.error.ok(res).is_none() {
            return &[];
        }
        let start = self.pos;
        self.pos += n;
        &self.buffer.as_slice()[start..start + n]
    }

    /// Читает `n` байт как UTF-8; неверная кодировка даёт `Invalid`.
    pub fn read_utf8(
        &mut self,
        n: usize,
    ) -> String {
        let bytes = self.read_bytes_alloc(n);
        if self.error.is_set() {
            return String::new();
        }
        match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(_) => {
                self.error.latch(CodecError::Invalid);
                String::new()
            }
        }
    }

    /// Пропускает `n` байт полезной нагрузки открытого str/bin/ext.
    pub fn skip_bytes(
        &mut self,
        n: usize,
    ) {
        if self.error.is_set() {
            return;
        }
        let res = self
            .track
            .bytes(n as u64)
            .and_then(|_| self.skip_native(n));
        self.error.ok(res);
    }

    /// Пропускает следующее значение целиком, включая все вложенные.
    ///
    /// Обход итеративный; вложенность глубже `max_depth` даёт `TooBig`.
    pub fn discard(&mut self) {
        if self.error.is_set() {
            return;
        }
        let res = self.discard_value();
        self.error.ok(res);
    }

    fn discard_value(&mut self) -> Result<(), CodecError> {
        let mut levels: Vec<Level> = Vec::new();
        loop {
            let tag = self.parse_tag()?;
            match tag {
                Tag::Str(n) | Tag::Bin(n) | Tag::Ext(_, n) => {
                    self.track.bytes(n as u64)?;
                    self.skip_native(n as usize)?;
                    self.track.pop(tag.value_type())?;
                }
                Tag::Array(_) | Tag::Map(_) => {
                    let children = tag.child_count().unwrap_or(0);
                    if children == 0 {
                        self.track.pop(tag.value_type())?;
                    } else {
                        if levels.len() >= self.config.max_depth {
                            return Err(CodecError::TooBig);
                        }
                        levels.try_reserve(1).map_err(|_| CodecError::Memory)?;
                        levels.push(Level {
                            kind: tag.value_type(),
                            remaining: children,
                        });
                    }
                }
                _ => {}
            }

            loop {
                match levels.last_mut() {
                    None => return Ok(()),
                    Some(level) if level.remaining == 0 => {
                        let kind = level.kind;
                        levels.pop();
                        self.track.pop(kind)?;
                    }
                    Some(level) => {
                        level.remaining -= 1;
                        break;
                    }
                }
            }
        }
    }

    pub fn done_map(&mut self) {
        self.close(ValueType::Map);
    }

    pub fn done_array(&mut self) {
        self.close(ValueType::Array);
    }

    pub fn done_str(&mut self) {
        self.close(ValueType::Str);
    }

    pub fn done_bin(&mut self) {
        self.close(ValueType::Bin);
    }

    pub fn done_ext(&mut self) {
        self.close(ValueType::Ext);
    }

    /// Закрывает составной элемент указанного типа.
    pub fn done_type(
        &mut self,
        kind: ValueType,
    ) {
        self.close(kind);
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;
    use crate::codec::{io::FnSource, writer::Writer};

    const COMPACT_SCHEMA: &[u8] = b"\x82\xA7compact\xC3\xA6schema\x00";

    /// Источник, отдающий данные порциями по `chunk` байт.
    fn chunked(
        data: &[u8],
        chunk: usize,
    ) -> FnSource<impl FnMut(&mut [u8]) -> Result<usize, CodecError> + '_> {
        let mut pos = 0;
        FnSource::new(move |buf: &mut [u8]| {
            let n = chunk.min(buf.len()).min(data.len() - pos);
            buf[..n].copy_from_slice(&data[pos..pos + n]);
            pos += n;
            Ok(n)
        })
    }

    /// Тест проверяет разбор эталонного сообщения тегами.
    #[test]
    fn test_read_compact_schema() {
        let mut reader = Reader::new(COMPACT_SCHEMA);
        assert_eq!(reader.read_tag(), Tag::Map(2));
        assert_eq!(reader.read_tag(), Tag::Str(7));
        assert_eq!(reader.read_bytes_inplace(7), b"compact");
        reader.done_str();
        assert_eq!(reader.read_tag(), Tag::Bool(true));
        assert_eq!(reader.read_tag(), Tag::Str(6));
        assert_eq!(reader.read_utf8(6), "schema");
        reader.done_str();
        assert_eq!(reader.read_tag(), Tag::Uint(0));
        reader.done_map();
        assert!(reader.remaining().is_empty());
        reader.destroy().unwrap();
    }

    /// Тест проверяет, что результат не зависит от размера буфера: ёмкость
    /// 7 меньше самого длинного заголовка.
    #[test]
    fn test_tiny_buffer_matches_in_memory() {
        let mut writer = Writer::growable();
        writer.start_array(4);
        writer.write_u64(u64::MAX);
        writer.write_str("a string that does not fit into seven bytes");
        writer.write_double(-2.5);
        writer.write_bin(&[7; 20]);
        writer.finish_array();
        let data = writer.into_vec().unwrap();

        let mut scratch = [0u8; 7];
        let mut reader = Reader::with_buffer(&mut scratch, chunked(&data, 3), ReaderConfig::default());
        assert_eq!(reader.read_tag(), Tag::Array(4));
        assert_eq!(reader.read_tag(), Tag::Uint(u64::MAX));
        let len = match reader.read_tag() {
            Tag::Str(n) => n as usize,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(
            reader.read_utf8(len),
            "a string that does not fit into seven bytes"
        );
        reader.done_str();
        assert_eq!(reader.read_tag(), Tag::Double(-2.5));
        assert_eq!(reader.read_tag(), Tag::Bin(20));
        let mut bin = [0u8; 20];
        reader.read_bytes(&mut bin);
        assert_eq!(bin, [7; 20]);
        reader.done_bin();
        reader.done_array();
        reader.destroy().unwrap();
    }

    /// Тест проверяет, что усечённые данные дают `Eof` и нейтральные
    /// значения дальше.
    #[test]
    fn test_truncation_is_eof() {
        let truncated = &COMPACT_SCHEMA[..5];
        let mut reader = Reader::new(truncated);
        assert_eq!(reader.read_tag(), Tag::Map(2));
        assert_eq!(reader.read_tag(), Tag::Str(7));
        let mut out = [0xAAu8; 7];
        reader.read_bytes(&mut out);
        assert_eq!(out, [0; 7]);
        assert_eq!(reader.error(), Some(CodecError::Eof));
        assert_eq!(reader.read_tag(), Tag::Nil);
        assert_eq!(reader.destroy(), Err(CodecError::Eof));

        let mut reader = Reader::new(&[0xCD, 0x01]);
        assert_eq!(reader.read_tag(), Tag::Nil);
        assert_eq!(reader.error(), Some(CodecError::Eof));
    }

    /// Тест проверяет, что источник, вернувший 0 до конца значения, даёт
    /// `Eof`.
    #[test]
    fn test_source_eof() {
        let mut reader = Reader::from_source(chunked(&[0xCE, 0, 0], 1), ReaderConfig::default());
        assert_eq!(reader.read_tag(), Tag::Nil);
        assert_eq!(reader.error(), Some(CodecError::Eof));
    }

    /// Тест проверяет отказ на зарезервированном байте.
    #[test]
    fn test_reserved_byte_invalid() {
        let mut reader = Reader::new(&[0xC1]);
        assert_eq!(reader.read_tag(), Tag::Nil);
        assert_eq!(reader.check(), Err(CodecError::Invalid));
    }

    /// Тест проверяет, что `peek_tag` не продвигает позицию и требует,
    /// чтобы заголовок помещался в буфер.
    #[test]
    fn test_peek_tag() {
        let mut reader = Reader::new(&[0xCD, 0x01, 0x00]);
        assert_eq!(reader.peek_tag(), Tag::Uint(256));
        assert_eq!(reader.peek_tag(), Tag::Uint(256));
        assert_eq!(reader.read_tag(), Tag::Uint(256));

        let data = [0xCF, 0, 0, 0, 0, 0, 0, 0, 1];
        let mut scratch = [0u8; 7];
        let mut reader = Reader::with_buffer(&mut scratch, chunked(&data, 9), ReaderConfig::default());
        assert_eq!(reader.peek_tag(), Tag::Nil);
        assert_eq!(reader.error(), Some(CodecError::TooBig));
    }

    /// Тест проверяет `discard` для вложенных значений.
    #[test]
    fn test_discard_nested() {
        let mut writer = Writer::growable();
        writer.start_array(2);
        writer.start_map(1);
        writer.write_str("k");
        writer.start_array(2);
        writer.write_bin(&[1, 2, 3]);
        writer.write_ext(4, &[0; 5]);
        writer.finish_array();
        writer.finish_map();
        writer.start_array(0);
        writer.finish_array();
        writer.finish_array();
        writer.write_str("after");
        let data = writer.into_vec().unwrap();

        let mut reader = Reader::new(&data);
        reader.discard();
        assert_eq!(reader.read_tag(), Tag::Str(5));
        reader.skip_bytes(5);
        reader.done_str();
        reader.destroy().unwrap();
    }

    /// Тест проверяет, что `discard` ограничен глубиной.
    #[test]
    fn test_discard_depth_bound() {
        let mut data = vec![0x91; 100];
        data.push(0xC0);

        let config = ReaderConfig::default().with_max_depth(8);
        let mut reader = Reader::with_config(&data, config);
        reader.discard();
        assert_eq!(reader.error(), Some(CodecError::TooBig));

        let mut reader = Reader::with_config(&data, ReaderConfig::default());
        reader.discard();
        assert!(reader.remaining().is_empty());
        reader.destroy().unwrap();
    }

    /// Тест проверяет ограничения `max_bytes` и запрет расширений.
    #[test]
    fn test_limits() {
        let config = ReaderConfig::default().with_max_bytes(Some(4));
        let mut reader = Reader::with_config(b"\xA5hello", config);
        assert_eq!(reader.read_tag(), Tag::Nil);
        assert_eq!(reader.error(), Some(CodecError::TooBig));

        let config = ReaderConfig::default().with_extensions(false);
        let mut reader = Reader::with_config(&[0xD4, 0x01, 0x00], config);
        assert_eq!(reader.read_tag(), Tag::Nil);
        assert_eq!(reader.error(), Some(CodecError::Unsupported));
    }

    /// Тест проверяет, что `read_bytes_inplace` больше буфера - `TooBig`.
    #[test]
    fn test_inplace_larger_than_buffer() {
        let mut data = vec![0xA9];
        data.extend_from_slice(b"123456789");
        let mut scratch = [0u8; 7];
        let mut reader = Reader::with_buffer(&mut scratch, chunked(&data, 4), ReaderConfig::default());
        assert_eq!(reader.read_tag(), Tag::Str(9));
        assert!(reader.read_bytes_inplace(9).is_empty());
        assert_eq!(reader.error(), Some(CodecError::TooBig));
    }

    /// Тест проверяет, что незакрытый элемент - `Bug` при destroy.
    #[cfg(feature = "tracking")]
    #[test]
    fn test_destroy_unclosed_is_bug() {
        let mut reader = Reader::new(&[0x91, 0xC0]);
        assert_eq!(reader.read_tag(), Tag::Array(1));
        assert_eq!(reader.read_tag(), Tag::Nil);
        assert_eq!(reader.destroy(), Err(CodecError::Bug));
    }

    /// Тест проверяет, что чтение сверх объявленного числа элементов -
    /// `Bug`.
    #[cfg(feature = "tracking")]
    #[test]
    fn test_read_past_array_is_bug() {
        let mut reader = Reader::new(&[0x91, 0xC0, 0xC0]);
        reader.read_tag();
        reader.read_tag();
        reader.read_tag();
        assert_eq!(reader.error(), Some(CodecError::Bug));
    }

    /// Тест проверяет, что teardown источника вызывается ровно один раз.
    #[test]
    fn test_source_teardown_once() {
        struct Counted(Rc<Cell<u32>>);
        impl Source for Counted {
            fn fill(
                &mut self,
                _buf: &mut [u8],
            ) -> Result<usize, CodecError> {
                Ok(0)
            }

            fn teardown(&mut self) -> Result<(), CodecError> {
                self.0.set(self.0.get() + 1);
                Ok(())
            }
        }

        let count = Rc::new(Cell::new(0));
        let reader = Reader::from_source(Counted(Rc::clone(&count)), ReaderConfig::default());
        reader.destroy().unwrap();
        assert_eq!(count.get(), 1);

        let reader = Reader::from_source(Counted(Rc::clone(&count)), ReaderConfig::default());
        drop(reader);
        assert_eq!(count.get(), 2);
    }

    /// Тест проверяет, что сбой источника фиксирует `Io` и больше не
    /// вызывается.
    #[test]
    fn test_source_failure_is_io() {
        let fills = Rc::new(Cell::new(0));
        let seen = Rc::clone(&fills);
        let source = FnSource::new(move |_buf: &mut [u8]| -> Result<usize, CodecError> {
            seen.set(seen.get() + 1);
            Err(CodecError::Io)
        });
        let mut reader = Reader::from_source(source, ReaderConfig::default());
        assert_eq!(reader.read_tag(), Tag::Nil);
        assert_eq!(reader.error(), Some(CodecError::Io));
        assert_eq!(reader.expect_u32(), 0);
        reader.discard();
        assert_eq!(reader.destroy(), Err(CodecError::Io));
        assert_eq!(fills.get(), 1);
    }

    /// Тест проверяет неверный UTF-8.
    #[test]
    fn test_invalid_utf8() {
        let mut reader = Reader::new(&[0xA2, 0xFF, 0xFE]);
        assert_eq!(reader.read_tag(), Tag::Str(2));
        assert_eq!(reader.read_utf8(2), "");
        assert_eq!(reader.error(), Some(CodecError::Invalid));
    }
}
