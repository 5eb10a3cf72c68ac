//! Типизированное чтение поверх [`Reader`].
//!
//! Каждый `expect_*` читает одно значение и проверяет его тип и диапазон.
//! Несовпадение фиксирует ошибку читателя (`Type` для типа и диапазона,
//! `Data` для несовпадающих строк и дубликатов ключей) и возвращает
//! нейтральное значение. Операции, возвращающие содержимое str/bin/ext
//! целиком, сами закрывают элемент.

use zpack_error::CodecError;

use super::{
    reader::Reader,
    tag::{decode_timestamp, Tag, Timestamp, TIMESTAMP_EXT_TYPE},
};

/// Генерирует `expect_<T>` и `expect_<T>_range` для беззнаковых типов.
macro_rules! expect_unsigned {
    ($($name:ident, $range:ident, $ty:ty;)*) => {
        $(
            pub fn $name(&mut self) -> $ty {
                self.expect_unsigned(<$ty>::MAX as u64) as $ty
            }

            /// Как без `_range`, но значение вне `[min, max]` даёт `Type`.
            /// При ошибке возвращает `min`.
            pub fn $range(
                &mut self,
                min: $ty,
                max: $ty,
            ) -> $ty {
                let value = self.$name();
                self.within(value, min, max)
            }
        )*
    };
}

macro_rules! expect_signed {
    ($($name:ident, $range:ident, $ty:ty;)*) => {
        $(
            pub fn $name(&mut self) -> $ty {
                self.expect_signed(<$ty>::MIN as i64, <$ty>::MAX as i64) as $ty
            }

            pub fn $range(
                &mut self,
                min: $ty,
                max: $ty,
            ) -> $ty {
                let value = self.$name();
                self.within(value, min, max)
            }
        )*
    };
}

impl Reader<'_> {
    fn failed(&self) -> bool {
        self.error().is_some()
    }

    fn within<T: PartialOrd + Copy>(
        &mut self,
        value: T,
        min: T,
        max: T,
    ) -> T {
        if self.failed() {
            return min;
        }
        if value < min || value > max {
            self.flag_error(CodecError::Type);
            return min;
        }
        value
    }

    fn expect_unsigned(
        &mut self,
        max: u64,
    ) -> u64 {
        let tag = self.read_tag();
        if self.failed() {
            return 0;
        }
        match tag {
            Tag::Uint(v) if v <= max => v,
            Tag::Int(v) if v >= 0 && v as u64 <= max => v as u64,
            _ => {
                self.flag_error(CodecError::Type);
                0
            }
        }
    }

    fn expect_signed(
        &mut self,
        min: i64,
        max: i64,
    ) -> i64 {
        let tag = self.read_tag();
        if self.failed() {
            return 0;
        }
        match tag {
            Tag::Int(v) if v >= min && v <= max => v,
            Tag::Uint(v) if v <= max as u64 => v as i64,
            _ => {
                self.flag_error(CodecError::Type);
                0
            }
        }
    }

    expect_unsigned! {
        expect_u8, expect_u8_range, u8;
        expect_u16, expect_u16_range, u16;
        expect_u32, expect_u32_range, u32;
        expect_u64, expect_u64_range, u64;
        expect_uint, expect_uint_range, u64;
    }

    expect_signed! {
        expect_i8, expect_i8_range, i8;
        expect_i16, expect_i16_range, i16;
        expect_i32, expect_i32_range, i32;
        expect_i64, expect_i64_range, i64;
        expect_int, expect_int_range, i64;
    }

    /// Читает значение и проверяет, что его заголовок равен `expected`.
    /// Для составных тегов элемент остаётся открытым.
    pub fn expect_tag(
        &mut self,
        expected: Tag,
    ) {
        let tag = self.read_tag();
        if !self.failed() && tag != expected {
            self.flag_error(CodecError::Type);
        }
    }

    pub fn expect_nil(&mut self) {
        self.expect_tag(Tag::Nil);
    }

    pub fn expect_bool(&mut self) -> bool {
        match self.read_tag() {
            Tag::Bool(v) => v,
            _ => {
                self.flag_error(CodecError::Type);
                false
            }
        }
    }

    pub fn expect_true(&mut self) {
        self.expect_tag(Tag::Bool(true));
    }

    pub fn expect_false(&mut self) {
        self.expect_tag(Tag::Bool(false));
    }

    ////////////////////////////////////////////////////////////////////////////
    // Числа с плавающей точкой
    ////////////////////////////////////////////////////////////////////////////

    /// Читает `float`. Принимает `double` (с потерей точности) и, если
    /// включено `int_as_float`, целые.
    pub fn expect_float(&mut self) -> f32 {
        let int_as_float = self.config().int_as_float;
        match self.read_tag() {
            Tag::Float(v) => v,
            Tag::Double(v) => v as f32,
            Tag::Uint(v) if int_as_float => v as f32,
            Tag::Int(v) if int_as_float => v as f32,
            _ => {
                self.flag_error(CodecError::Type);
                0.0
            }
        }
    }

    pub fn expect_double(&mut self) -> f64 {
        let int_as_float = self.config().int_as_float;
        match self.read_tag() {
            Tag::Float(v) => v as f64,
            Tag::Double(v) => v,
            Tag::Uint(v) if int_as_float => v as f64,
            Tag::Int(v) if int_as_float => v as f64,
            _ => {
                self.flag_error(CodecError::Type);
                0.0
            }
        }
    }

    /// Принимает только `float`.
    pub fn expect_float_strict(&mut self) -> f32 {
        match self.read_tag() {
            Tag::Float(v) => v,
            _ => {
                self.flag_error(CodecError::Type);
                0.0
            }
        }
    }

    /// Принимает `float` и `double`, но не целые.
    pub fn expect_double_strict(&mut self) -> f64 {
        match self.read_tag() {
            Tag::Float(v) => v as f64,
            Tag::Double(v) => v,
            _ => {
                self.flag_error(CodecError::Type);
                0.0
            }
        }
    }

    pub fn expect_float_range(
        &mut self,
        min: f32,
        max: f32,
    ) -> f32 {
        let value = self.expect_float();
        self.within(value, min, max)
    }

    pub fn expect_double_range(
        &mut self,
        min: f64,
        max: f64,
    ) -> f64 {
        let value = self.expect_double();
        self.within(value, min, max)
    }

    ////////////////////////////////////////////////////////////////////////////
    // Карты и массивы
    ////////////////////////////////////////////////////////////////////////////

    /// Открывает карту и возвращает число пар. Закрывается `done_map`.
    pub fn expect_map(&mut self) -> u32 {
        match self.read_tag() {
            Tag::Map(n) => n,
            _ => {
                self.flag_error(CodecError::Type);
                0
            }
        }
    }

    /// Открывает карту ровно из `count` пар.
    pub fn expect_map_match(
        &mut self,
        count: u32,
    ) {
        let n = self.expect_map();
        if !self.failed() && n != count {
            self.flag_error(CodecError::Type);
        }
    }

    pub fn expect_map_range(
        &mut self,
        min: u32,
        max: u32,
    ) -> u32 {
        let n = self.expect_map();
        self.within(n, min, max)
    }

    pub fn expect_map_max(
        &mut self,
        max: u32,
    ) -> u32 {
        self.expect_map_range(0, max)
    }

    /// Открывает карту или принимает nil (`None`, закрывать нечего).
    pub fn expect_map_or_nil(&mut self) -> Option<u32> {
        match self.read_tag() {
            Tag::Map(n) => Some(n),
            Tag::Nil => None,
            _ => {
                self.flag_error(CodecError::Type);
                None
            }
        }
    }

    /// Открывает массив и возвращает число элементов. Закрывается
    /// `done_array`.
    pub fn expect_array(&mut self) -> u32 {
        match self.read_tag() {
            Tag::Array(n) => n,
            _ => {
                self.flag_error(CodecError::Type);
                0
            }
        }
    }

    pub fn expect_array_match(
        &mut self,
        count: u32,
    ) {
        let n = self.expect_array();
        if !self.failed() && n != count {
            self.flag_error(CodecError::Type);
        }
    }

    pub fn expect_array_range(
        &mut self,
        min: u32,
        max: u32,
    ) -> u32 {
        let n = self.expect_array();
        self.within(n, min, max)
    }

    pub fn expect_array_max(
        &mut self,
        max: u32,
    ) -> u32 {
        self.expect_array_range(0, max)
    }

    pub fn expect_array_or_nil(&mut self) -> Option<u32> {
        match self.read_tag() {
            Tag::Array(n) => Some(n),
            Tag::Nil => None,
            _ => {
                self.flag_error(CodecError::Type);
                None
            }
        }
    }

    ////////////////////////////////////////////////////////////////////////////
    // Строки, бинарные данные, расширения
    ////////////////////////////////////////////////////////////////////////////

    /// Открывает строку и возвращает её длину. Закрывается `done_str`.
    pub fn expect_str_len(&mut self) -> u32 {
        match self.read_tag() {
            Tag::Str(n) => n,
            _ => {
                self.flag_error(CodecError::Type);
                0
            }
        }
    }

    /// Читает строку не длиннее `max` байт (иначе `TooBig`).
    pub fn expect_str(
        &mut self,
        max: usize,
    ) -> String {
        let len = self.expect_str_len() as usize;
        if self.failed() {
            return String::new();
        }
        if len > max {
            self.flag_error(CodecError::TooBig);
            return String::new();
        }
        let s = self.read_utf8(len);
        self.done_str();
        s
    }

    /// Читает строку в `buf` и возвращает её длину. Строка длиннее
    /// буфера - `TooBig`, неверный UTF-8 - `Invalid`.
    pub fn expect_str_buf(
        &mut self,
        buf: &mut [u8],
    ) -> usize {
        let len = self.expect_str_len() as usize;
        if self.failed() {
            return 0;
        }
        if len > buf.len() {
            self.flag_error(CodecError::TooBig);
            return 0;
        }
        self.read_bytes(&mut buf[..len]);
        if self.failed() {
            return 0;
        }
        if std::str::from_utf8(&buf[..len]).is_err() {
            self.flag_error(CodecError::Invalid);
            return 0;
        }
        self.done_str();
        len
    }

    /// Читает строку и сверяет её с `expected`; несовпадение - `Data`.
    pub fn expect_str_match(
        &mut self,
        expected: &str,
    ) {
        let len = self.expect_str_len() as usize;
        if self.failed() {
            return;
        }
        if len != expected.len() {
            self.flag_error(CodecError::Data);
            return;
        }
        let mut chunk = [0u8; 32];
        for part in expected.as_bytes().chunks(chunk.len()) {
            let buf = &mut chunk[..part.len()];
            self.read_bytes(buf);
            if self.failed() {
                return;
            }
            if buf != part {
                self.flag_error(CodecError::Data);
                return;
            }
        }
        self.done_str();
    }

    /// Открывает bin и возвращает его длину. Закрывается `done_bin`.
    pub fn expect_bin_len(&mut self) -> u32 {
        match self.read_tag() {
            Tag::Bin(n) => n,
            _ => {
                self.flag_error(CodecError::Type);
                0
            }
        }
    }

    pub fn expect_bin(
        &mut self,
        max: usize,
    ) -> Vec<u8> {
        let len = self.expect_bin_len() as usize;
        if self.failed() {
            return Vec::new();
        }
        if len > max {
            self.flag_error(CodecError::TooBig);
            return Vec::new();
        }
        let data = self.read_bytes_alloc(len);
        self.done_bin();
        data
    }

    pub fn expect_bin_buf(
        &mut self,
        buf: &mut [u8],
    ) -> usize {
        let len = self.expect_bin_len() as usize;
        if self.failed() {
            return 0;
        }
        if len > buf.len() {
            self.flag_error(CodecError::TooBig);
            return 0;
        }
        self.read_bytes(&mut buf[..len]);
        self.done_bin();
        if self.failed() {
            0
        } else {
            len
        }
    }

    /// Читает ext-значение: тип и полезную нагрузку не длиннее `max`.
    pub fn expect_ext(
        &mut self,
        max: usize,
    ) -> (i8, Vec<u8>) {
        let (ext_type, len) = match self.read_tag() {
            Tag::Ext(t, n) => (t, n as usize),
            _ => {
                self.flag_error(CodecError::Type);
                return (0, Vec::new());
            }
        };
        if len > max {
            self.flag_error(CodecError::TooBig);
            return (0, Vec::new());
        }
        let data = self.read_bytes_alloc(len);
        self.done_ext();
        if self.failed() {
            (0, Vec::new())
        } else {
            (ext_type, data)
        }
    }

    /// Читает timestamp (ext типа -1). Другой тип - `Type`, неверная
    /// длина или наносекунды - `Invalid`.
    pub fn expect_timestamp(&mut self) -> Timestamp {
        let len = match self.read_tag() {
            Tag::Ext(TIMESTAMP_EXT_TYPE, n) => n as usize,
            _ => {
                self.flag_error(CodecError::Type);
                return Timestamp::default();
            }
        };
        if !matches!(len, 4 | 8 | 12) {
            self.flag_error(CodecError::Invalid);
            return Timestamp::default();
        }
        let mut payload = [0u8; 12];
        self.read_bytes(&mut payload[..len]);
        self.done_ext();
        if self.failed() {
            return Timestamp::default();
        }
        match decode_timestamp(&payload[..len]) {
            Ok(ts) => ts,
            Err(e) => {
                self.flag_error(e);
                Timestamp::default()
            }
        }
    }

    ////////////////////////////////////////////////////////////////////////////
    // Перечисления и ключи
    ////////////////////////////////////////////////////////////////////////////

    /// Читает строку и ищет её среди `strings`. Без совпадения возвращает
    /// `strings.len()`, не фиксируя ошибку.
    pub fn expect_enum_optional(
        &mut self,
        strings: &[&str],
    ) -> usize {
        let count = strings.len();
        let len = self.expect_str_len() as usize;
        if self.failed() {
            return count;
        }

        let longest = strings.iter().map(|s| s.len()).max().unwrap_or(0);
        if len > longest {
            self.skip_bytes(len);
            self.done_str();
            return count;
        }

        let bytes = self.read_bytes_alloc(len);
        self.done_str();
        if self.failed() {
            return count;
        }
        strings
            .iter()
            .position(|s| s.as_bytes() == bytes.as_slice())
            .unwrap_or(count)
    }

    /// Читает строку из `strings` и возвращает её индекс. Неизвестная
    /// строка - `Type` и `strings.len()`.
    pub fn expect_enum(
        &mut self,
        strings: &[&str],
    ) -> usize {
        let index = self.expect_enum_optional(strings);
        if !self.failed() && index == strings.len() {
            self.flag_error(CodecError::Type);
        }
        index
    }

    /// Читает ключ карты из `keys` и отмечает его в `found`.
    ///
    /// Неизвестный ключ возвращает `keys.len()` без ошибки (значение
    /// вызывающий код пропускает через `discard`). Повторный ключ - `Data`.
    pub fn expect_key(
        &mut self,
        keys: &[&str],
        found: &mut [bool],
    ) -> usize {
        if found.len() < keys.len() {
            self.flag_error(CodecError::Bug);
            return keys.len();
        }
        let index = self.expect_enum_optional(keys);
        if self.failed() {
            return keys.len();
        }
        if index < keys.len() {
            if found[index] {
                self.flag_error(CodecError::Data);
                return keys.len();
            }
            found[index] = true;
        }
        index
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
