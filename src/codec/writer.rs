//! Потоковый писатель MessagePack.
//!
//! Байты копятся в буфере (заимствованном, собственном фиксированном или
//! растущем). Когда очередная запись не помещается, накопленное отдаётся
//! [`Sink::flush`], а буфер сбрасывается; данные крупнее всего буфера
//! уходят в приёмник напрямую. Без приёмника переполнение фиксированного
//! буфера даёт [`CodecError::TooBig`].
//!
//! Любая ошибка «залипает»: дальнейшие записи становятся no-op, а
//! [`Writer::destroy`] возвращает первую ошибку.

use tracing::{debug, trace};
use zpack_error::CodecError;

use super::{
    io::Sink,
    sticky::{ErrorHandler, Sticky},
    tag::{encode_timestamp, Tag, Timestamp, ValueType, MAX_TAG_SIZE},
    track::{Track, DEFAULT_MAX_DEPTH},
};

/// Размер буфера по умолчанию для писателя и читателя с приёмником/
/// источником.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Параметры писателя.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    /// Размер собственного буфера для [`Writer::from_sink`].
    pub buffer_size: usize,
    /// Максимальная вложенность открытых составных элементов.
    pub max_depth: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl WriterConfig {
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
}

enum Buffer<'a> {
    Borrowed(&'a mut [u8]),
    Fixed(Box<[u8]>),
    Growable(Vec<u8>),
}

impl Buffer<'_> {
    fn fixed_mut(&mut self) -> &mut [u8] {
        match self {
            Buffer::Borrowed(buf) => &mut buf[..],
            Buffer::Fixed(buf) => &mut buf[..],
            Buffer::Growable(vec) => vec.as_mut_slice(),
        }
    }

    fn capacity(&self) -> usize {
        match self {
            Buffer::Borrowed(buf) => buf.len(),
            Buffer::Fixed(buf) => buf.len(),
            Buffer::Growable(vec) => vec.capacity(),
        }
    }
}

/// Потоковый писатель.
pub struct Writer<'a> {
    buffer: Buffer<'a>,
    used: usize,
    sink: Option<Box<dyn Sink + 'a>>,
    error: Sticky<'a>,
    track: Track,
}

////////////////////////////////////////////////////////////////////////////////
// Конструкторы и жизненный цикл
////////////////////////////////////////////////////////////////////////////////

impl<'a> Writer<'a> {
    /// Писатель в заимствованный буфер без приёмника. Результат -
    /// первые [`Writer::buffer_used`] байт буфера.
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self::build(Buffer::Borrowed(buffer), None, DEFAULT_MAX_DEPTH)
    }

    /// Писатель в заимствованный буфер, который сбрасывается в `sink`.
    pub fn with_buffer(
        buffer: &'a mut [u8],
        sink: impl Sink + 'a,
    ) -> Self {
        Self::build(
            Buffer::Borrowed(buffer),
            Some(Box::new(sink)),
            DEFAULT_MAX_DEPTH,
        )
    }

    /// Писатель с собственным буфером размера `config.buffer_size`.
    pub fn from_sink(
        sink: impl Sink + 'a,
        config: WriterConfig,
    ) -> Self {
        let buffer = vec![0u8; config.buffer_size].into_boxed_slice();
        Self::build(
            Buffer::Fixed(buffer),
            Some(Box::new(sink)),
            config.max_depth,
        )
    }

    /// Писатель в растущий буфер; результат забирается через
    /// [`Writer::into_vec`].
    pub fn growable() -> Self {
        Self::growable_with(WriterConfig::default())
    }

    /// Растущий писатель; `config.buffer_size` задаёт начальную ёмкость.
    pub fn growable_with(config: WriterConfig) -> Self {
        Self::build(
            Buffer::Growable(Vec::with_capacity(config.buffer_size)),
            None,
            config.max_depth,
        )
    }

    fn build(
        buffer: Buffer<'a>,
        sink: Option<Box<dyn Sink + 'a>>,
        max_depth: usize,
    ) -> Self {
        Self {
            buffer,
            used: 0,
            sink,
            error: Sticky::new("writer"),
            track: Track::new(max_depth),
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

    /// Текущая ошибка писателя.
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

    /// Принудительно фиксирует ошибку (например, при ошибке в данных
    /// вызывающего кода).
    pub fn flag_error(
        &mut self,
        err: CodecError,
    ) {
        self.error.latch(err);
    }

    /// Число байт, ожидающих в буфере.
    pub fn buffer_used(&self) -> usize {
        self.used
    }

    /// Свободное место в буфере (для растущего буфера - до перевыделения).
    pub fn buffer_left(&self) -> usize {
        self.buffer.capacity() - self.used
    }

    /// Байты, накопленные в буфере и ещё не отданные приёмнику.
    pub fn buffered(&self) -> &[u8] {
        match &self.buffer {
            Buffer::Borrowed(buf) => &buf[..self.used],
            Buffer::Fixed(buf) => &buf[..self.used],
            Buffer::Growable(vec) => vec.as_slice(),
        }
    }

    /// Сбрасывает накопленное в приёмник между сообщениями. Открытый
    /// составной элемент - `Bug`; без приёмника - `Bug`.
    pub fn flush_message(&mut self) {
        if self.error.is_set() {
            return;
        }
        let res = self.track.check_empty();
        if self.error.ok(res).is_none() {
            return;
        }
        if self.sink.is_none() {
            self.error.latch(CodecError::Bug);
            return;
        }
        let res = self.flush_buffer();
        self.error.ok(res);
    }

    /// Завершает запись: проверяет баланс составных элементов, сбрасывает
    /// остаток в приёмник, вызывает `teardown` и возвращает первую ошибку.
    pub fn destroy(mut self) -> Result<(), CodecError> {
        if !self.error.is_set() {
            let res = self.track.check_empty().and_then(|_| self.flush_buffer());
            self.error.ok(res);
        }
        self.finish()
    }

    /// Завершает запись и возвращает произведённые байты вместо сброса
    /// остатка в приёмник.
    pub fn into_vec(mut self) -> Result<Vec<u8>, CodecError> {
        if !self.error.is_set() {
            let res = self.track.check_empty();
            self.error.ok(res);
        }
        let bytes = match &mut self.buffer {
            Buffer::Growable(vec) => std::mem::take(vec),
            Buffer::Borrowed(buf) => buf[..self.used].to_vec(),
            Buffer::Fixed(buf) => buf[..self.used].to_vec(),
        };
        self.used = 0;
        self.finish().map(|_| bytes)
    }

    fn finish(&mut self) -> Result<(), CodecError> {
        let teardown = match self.sink.take() {
            Some(mut sink) => sink.teardown(),
            None => Ok(()),
        };
        if let Err(e) = teardown {
            self.error.latch(e);
        }
        debug!(error = ?self.error.get(), "writer destroyed");
        self.check()
    }

    fn flush_buffer(&mut self) -> Result<(), CodecError> {
        let Some(sink) = self.sink.as_mut() else {
            return Ok(());
        };
        if self.used > 0 {
            trace!(len = self.used, "writer flush");
            sink.flush(&self.buffer.fixed_mut()[..self.used])?;
            self.used = 0;
        }
        Ok(())
    }
}

impl Drop for Writer<'_> {
    fn drop(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            let _ = sink.teardown();
        }
    }
}

impl std::fmt::Debug for Writer<'_> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("used", &self.used)
            .field("capacity", &self.buffer.capacity())
            .field("has_sink", &self.sink.is_some())
            .field("error", &self.error.get())
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Низкоуровневая запись
////////////////////////////////////////////////////////////////////////////////

impl Writer<'_> {
    fn write_native(
        &mut self,
        data: &[u8],
    ) {
        if self.error.is_set() {
            return;
        }
        let res = self.push_bytes(data);
        self.error.ok(res);
    }

    fn push_bytes(
        &mut self,
        data: &[u8],
    ) -> Result<(), CodecError> {
        if let Buffer::Growable(vec) = &mut self.buffer {
            vec.try_reserve(data.len())
                .map_err(|_| CodecError::Memory)?;
            vec.extend_from_slice(data);
            self.used = vec.len();
            return Ok(());
        }

        let capacity = self.buffer.capacity();
        if capacity - self.used >= data.len() {
            self.buffer.fixed_mut()[self.used..self.used + data.len()].copy_from_slice(data);
            self.used += data.len();
            return Ok(());
        }

        if self.sink.is_none() {
            return Err(CodecError::TooBig);
        }
        self.flush_buffer()?;

        if data.len() <= capacity {
            self.buffer.fixed_mut()[..data.len()].copy_from_slice(data);
            self.used = data.len();
            Ok(())
        } else if let Some(sink) = self.sink.as_mut() {
            trace!(len = data.len(), "writer direct flush");
            sink.flush(data)
        } else {
            Err(CodecError::TooBig)
        }
    }

    /// Учитывает элемент и открывает кадр для составного тега.
    fn track_tag(
        &mut self,
        tag: Tag,
    ) -> Result<(), CodecError> {
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
// Запись значений
////////////////////////////////////////////////////////////////////////////////

impl Writer<'_> {
    /// Пишет заголовок. Для str/bin/ext/map/array открывает составной
    /// элемент, который закрывается соответствующим `finish_*`.
    pub fn write_tag(
        &mut self,
        tag: Tag,
    ) {
        if self.error.is_set() {
            return;
        }
        let res = self.track_tag(tag);
        if self.error.ok(res).is_none() {
            return;
        }
        let mut header = [0u8; MAX_TAG_SIZE];
        let len = tag.encode(&mut header);
        self.write_native(&header[..len]);
    }

    pub fn write_nil(&mut self) {
        self.write_tag(Tag::Nil);
    }

    pub fn write_bool(
        &mut self,
        value: bool,
    ) {
        self.write_tag(Tag::Bool(value));
    }

    pub fn write_true(&mut self) {
        self.write_bool(true);
    }

    pub fn write_false(&mut self) {
        self.write_bool(false);
    }

    /// Пишет знаковое целое в самой короткой форме; неотрицательные -
    /// беззнаковыми формами.
    pub fn write_int(
        &mut self,
        value: i64,
    ) {
        self.write_tag(Tag::Int(value));
    }

    pub fn write_uint(
        &mut self,
        value: u64,
    ) {
        self.write_tag(Tag::Uint(value));
    }

    pub fn write_i8(
        &mut self,
        value: i8,
    ) {
        self.write_int(value as i64);
    }

    pub fn write_i16(
        &mut self,
        value: i16,
    ) {
        self.write_int(value as i64);
    }

    pub fn write_i32(
        &mut self,
        value: i32,
    ) {
        self.write_int(value as i64);
    }

    pub fn write_i64(
        &mut self,
        value: i64,
    ) {
        self.write_int(value);
    }

    pub fn write_u8(
        &mut self,
        value: u8,
    ) {
        self.write_uint(value as u64);
    }

    pub fn write_u16(
        &mut self,
        value: u16,
    ) {
        self.write_uint(value as u64);
    }

    pub fn write_u32(
        &mut self,
        value: u32,
    ) {
        self.write_uint(value as u64);
    }

    pub fn write_u64(
        &mut self,
        value: u64,
    ) {
        self.write_uint(value);
    }

    pub fn write_float(
        &mut self,
        value: f32,
    ) {
        self.write_tag(Tag::Float(value));
    }

    pub fn write_double(
        &mut self,
        value: f64,
    ) {
        self.write_tag(Tag::Double(value));
    }

    /// Пишет строку целиком (заголовок, байты, закрытие).
    pub fn write_str(
        &mut self,
        value: &str,
    ) {
        let Some(len) = self.len_u32(value.len()) else {
            return;
        };
        self.start_str(len);
        self.write_bytes(value.as_bytes());
        self.finish_str();
    }

    /// Пишет строку или nil для `None`.
    pub fn write_str_or_nil(
        &mut self,
        value: Option<&str>,
    ) {
        match value {
            Some(s) => self.write_str(s),
            None => self.write_nil(),
        }
    }

    pub fn write_bin(
        &mut self,
        data: &[u8],
    ) {
        let Some(len) = self.len_u32(data.len()) else {
            return;
        };
        self.start_bin(len);
        self.write_bytes(data);
        self.finish_bin();
    }

    pub fn write_ext(
        &mut self,
        ext_type: i8,
        data: &[u8],
    ) {
        let Some(len) = self.len_u32(data.len()) else {
            return;
        };
        self.start_ext(ext_type, len);
        self.write_bytes(data);
        self.finish_ext();
    }

    /// Пишет timestamp в самой короткой из форм 32/64/96 бит.
    pub fn write_timestamp(
        &mut self,
        timestamp: Timestamp,
    ) {
        let (tag, payload, len) = encode_timestamp(timestamp);
        self.write_tag(tag);
        self.write_bytes(&payload[..len]);
        self.finish_ext();
    }

    pub fn write_timestamp_seconds(
        &mut self,
        seconds: i64,
    ) {
        self.write_timestamp(Timestamp::from_seconds(seconds));
    }

    pub fn start_str(
        &mut self,
        len: u32,
    ) {
        self.write_tag(Tag::Str(len));
    }

    pub fn start_bin(
        &mut self,
        len: u32,
    ) {
        self.write_tag(Tag::Bin(len));
    }

    pub fn start_ext(
        &mut self,
        ext_type: i8,
        len: u32,
    ) {
        self.write_tag(Tag::Ext(ext_type, len));
    }

    /// Пишет часть полезной нагрузки открытого str/bin/ext. Запись сверх
    /// объявленной длины - `Bug`.
    pub fn write_bytes(
        &mut self,
        data: &[u8],
    ) {
        if self.error.is_set() {
            return;
        }
        let res = self.track.bytes(data.len() as u64);
        if self.error.ok(res).is_some() {
            self.write_native(data);
        }
    }

    pub fn finish_str(&mut self) {
        self.close(ValueType::Str);
    }

    pub fn finish_bin(&mut self) {
        self.close(ValueType::Bin);
    }

    pub fn finish_ext(&mut self) {
        self.close(ValueType::Ext);
    }

    /// Открывает карту из `count` пар: ожидается `2 * count` записей.
    pub fn start_map(
        &mut self,
        count: u32,
    ) {
        self.write_tag(Tag::Map(count));
    }

    pub fn finish_map(&mut self) {
        self.close(ValueType::Map);
    }

    pub fn start_array(
        &mut self,
        count: u32,
    ) {
        self.write_tag(Tag::Array(count));
    }

    pub fn finish_array(&mut self) {
        self.close(ValueType::Array);
    }

    /// Вставляет заранее закодированное значение как один элемент.
    /// Содержимое не проверяется.
    pub fn write_object_bytes(
        &mut self,
        encoded: &[u8],
    ) {
        if self.error.is_set() {
            return;
        }
        let res = self.track.element();
        if self.error.ok(res).is_some() {
            self.write_native(encoded);
        }
    }

    fn len_u32(
        &mut self,
        len: usize,
    ) -> Option<u32> {
        let res = u32::try_from(len).map_err(|_| CodecError::TooBig);
        self.error.ok(res)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
