//! Кодирование и декодирование заголовков (тегов) MessagePack.
//!
//! Каждое значение MessagePack начинается с заголовка: первый байт задаёт
//! тип, а для многобайтовых форм за ним следуют длина, количество элементов
//! или само значение в big-endian. Максимальный размер заголовка -
//! [`MAX_TAG_SIZE`] байт (`uint64`/`int64`/`float64`).
//!
//! Здесь же живёт расширение timestamp (тип `-1`) в формах 32, 64 и 96 бит.

use std::fmt;

use byteorder::{BigEndian, ByteOrder};
use zpack_error::CodecError;

/// Максимальный размер заголовка в байтах.
pub const MAX_TAG_SIZE: usize = 9;
/// Тип расширения, зарезервированный под timestamp.
pub const TIMESTAMP_EXT_TYPE: i8 = -1;
/// Зарезервированный байт, который никогда не встречается в корректных
/// данных.
pub const RESERVED_BYTE: u8 = 0xC1;

const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// Вид значения MessagePack без параметров.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Nil,
    Bool,
    Int,
    Uint,
    Float,
    Double,
    Str,
    Bin,
    Array,
    Map,
    Ext,
}

impl ValueType {
    /// Имя типа (для сообщений об ошибках и логов).
    pub const fn name(self) -> &'static str {
        match self {
            ValueType::Nil => "nil",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Uint => "uint",
            ValueType::Float => "float",
            ValueType::Double => "double",
            ValueType::Str => "str",
            ValueType::Bin => "bin",
            ValueType::Array => "array",
            ValueType::Map => "map",
            ValueType::Ext => "ext",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Разобранный заголовок одного значения.
///
/// Для `Str`/`Bin`/`Ext` хранится длина полезной нагрузки в байтах, для
/// `Array` - число элементов, для `Map` - число пар ключ–значение.
///
/// Сравнение учитывает, что одно и то же число может прийти как `Int` или
/// `Uint`: неотрицательный `Int(n)` равен `Uint(n)`. Числа с плавающей
/// точкой сравниваются побитово, поэтому `NaN` равен самому себе.
#[derive(Debug, Clone, Copy)]
pub enum Tag {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f32),
    Double(f64),
    Str(u32),
    Bin(u32),
    Array(u32),
    Map(u32),
    Ext(i8, u32),
}

impl Tag {
    /// Тип значения.
    pub const fn value_type(&self) -> ValueType {
        match self {
            Tag::Nil => ValueType::Nil,
            Tag::Bool(_) => ValueType::Bool,
            Tag::Int(_) => ValueType::Int,
            Tag::Uint(_) => ValueType::Uint,
            Tag::Float(_) => ValueType::Float,
            Tag::Double(_) => ValueType::Double,
            Tag::Str(_) => ValueType::Str,
            Tag::Bin(_) => ValueType::Bin,
            Tag::Array(_) => ValueType::Array,
            Tag::Map(_) => ValueType::Map,
            Tag::Ext(..) => ValueType::Ext,
        }
    }

    /// Длина полезной нагрузки для `Str`/`Bin`/`Ext`.
    pub const fn payload_len(&self) -> Option<u32> {
        match *self {
            Tag::Str(n) | Tag::Bin(n) | Tag::Ext(_, n) => Some(n),
            _ => None,
        }
    }

    /// Число дочерних значений для `Array`/`Map` (для карты - ключи и
    /// значения вместе).
    pub const fn child_count(&self) -> Option<u64> {
        match *self {
            Tag::Array(n) => Some(n as u64),
            Tag::Map(n) => Some(n as u64 * 2),
            _ => None,
        }
    }

    /// Кодирует заголовок в `out`, выбирая самую короткую форму.
    ///
    /// Возвращает число записанных байт. Неотрицательные `Int` кодируются
    /// беззнаковыми формами.
    pub fn encode(
        &self,
        out: &mut [u8; MAX_TAG_SIZE],
    ) -> usize {
        match *self {
            Tag::Nil => put1(out, 0xC0),
            Tag::Bool(false) => put1(out, 0xC2),
            Tag::Bool(true) => put1(out, 0xC3),
            Tag::Uint(v) => encode_uint(out, v),
            Tag::Int(v) if v >= 0 => encode_uint(out, v as u64),
            Tag::Int(v) => encode_negative(out, v),
            Tag::Float(v) => {
                out[0] = 0xCA;
                BigEndian::write_f32(&mut out[1..5], v);
                5
            }
            Tag::Double(v) => {
                out[0] = 0xCB;
                BigEndian::write_f64(&mut out[1..9], v);
                9
            }
            Tag::Str(n) => {
                if n <= 31 {
                    put1(out, 0xA0 | n as u8)
                } else {
                    encode_sized(out, n, [0xD9, 0xDA, 0xDB])
                }
            }
            Tag::Bin(n) => encode_sized(out, n, [0xC4, 0xC5, 0xC6]),
            Tag::Array(n) => {
                if n <= 15 {
                    put1(out, 0x90 | n as u8)
                } else {
                    encode_count(out, n, [0xDC, 0xDD])
                }
            }
            Tag::Map(n) => {
                if n <= 15 {
                    put1(out, 0x80 | n as u8)
                } else {
                    encode_count(out, n, [0xDE, 0xDF])
                }
            }
            Tag::Ext(ty, n) => encode_ext(out, ty, n),
        }
    }

    /// Декодирует заголовок из `bytes`.
    ///
    /// `bytes` должен начинаться с первого байта заголовка и содержать не
    /// меньше [`tag_size`] байт, иначе возвращается [`CodecError::Eof`].
    pub fn decode(bytes: &[u8]) -> Result<Tag, CodecError> {
        let first = *bytes.first().ok_or(CodecError::Eof)?;
        let size = tag_size(first)?;
        if bytes.len() < size {
            return Err(CodecError::Eof);
        }
        let b = &bytes[1..size];

        let tag = match first {
            0x00..=0x7F => Tag::Uint(first as u64),
            0x80..=0x8F => Tag::Map((first & 0x0F) as u32),
            0x90..=0x9F => Tag::Array((first & 0x0F) as u32),
            0xA0..=0xBF => Tag::Str((first & 0x1F) as u32),
            0xC0 => Tag::Nil,
            0xC2 => Tag::Bool(false),
            0xC3 => Tag::Bool(true),
            0xC4 => Tag::Bin(b[0] as u32),
            0xC5 => Tag::Bin(BigEndian::read_u16(b) as u32),
            0xC6 => Tag::Bin(BigEndian::read_u32(b)),
            0xC7 => Tag::Ext(b[1] as i8, b[0] as u32),
            0xC8 => Tag::Ext(b[2] as i8, BigEndian::read_u16(b) as u32),
            0xC9 => Tag::Ext(b[4] as i8, BigEndian::read_u32(b)),
            0xCA => Tag::Float(BigEndian::read_f32(b)),
            0xCB => Tag::Double(BigEndian::read_f64(b)),
            0xCC => Tag::Uint(b[0] as u64),
            0xCD => Tag::Uint(BigEndian::read_u16(b) as u64),
            0xCE => Tag::Uint(BigEndian::read_u32(b) as u64),
            0xCF => Tag::Uint(BigEndian::read_u64(b)),
            0xD0 => Tag::Int(b[0] as i8 as i64),
            0xD1 => Tag::Int(BigEndian::read_i16(b) as i64),
            0xD2 => Tag::Int(BigEndian::read_i32(b) as i64),
            0xD3 => Tag::Int(BigEndian::read_i64(b)),
            0xD4 => Tag::Ext(b[0] as i8, 1),
            0xD5 => Tag::Ext(b[0] as i8, 2),
            0xD6 => Tag::Ext(b[0] as i8, 4),
            0xD7 => Tag::Ext(b[0] as i8, 8),
            0xD8 => Tag::Ext(b[0] as i8, 16),
            0xD9 => Tag::Str(b[0] as u32),
            0xDA => Tag::Str(BigEndian::read_u16(b) as u32),
            0xDB => Tag::Str(BigEndian::read_u32(b)),
            0xDC => Tag::Array(BigEndian::read_u16(b) as u32),
            0xDD => Tag::Array(BigEndian::read_u32(b)),
            0xDE => Tag::Map(BigEndian::read_u16(b) as u32),
            0xDF => Tag::Map(BigEndian::read_u32(b)),
            0xE0..=0xFF => Tag::Int(first as i8 as i64),
            0xC1 => return Err(CodecError::Invalid),
        };
        Ok(tag)
    }
}

impl PartialEq for Tag {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        match (*self, *other) {
            (Tag::Int(a), Tag::Uint(b)) | (Tag::Uint(b), Tag::Int(a)) => a >= 0 && a as u64 == b,
            (Tag::Int(a), Tag::Int(b)) => a == b,
            (Tag::Uint(a), Tag::Uint(b)) => a == b,
            (Tag::Float(a), Tag::Float(b)) => a.to_bits() == b.to_bits(),
            (Tag::Double(a), Tag::Double(b)) => a.to_bits() == b.to_bits(),
            (Tag::Nil, Tag::Nil) => true,
            (Tag::Bool(a), Tag::Bool(b)) => a == b,
            (Tag::Str(a), Tag::Str(b))
            | (Tag::Bin(a), Tag::Bin(b))
            | (Tag::Array(a), Tag::Array(b))
            | (Tag::Map(a), Tag::Map(b)) => a == b,
            (Tag::Ext(ta, a), Tag::Ext(tb, b)) => ta == tb && a == b,
            _ => false,
        }
    }
}

/// Полный размер заголовка (включая первый байт) по первому байту.
///
/// Зарезервированный байт `0xC1` даёт [`CodecError::Invalid`].
pub const fn tag_size(first: u8) -> Result<usize, CodecError> {
    let size = match first {
        0x00..=0xC0 | 0xC2 | 0xC3 | 0xE0..=0xFF => 1,
        0xC4 | 0xCC | 0xD0 | 0xD9 => 2,
        0xD4..=0xD8 => 2,
        0xC5 | 0xCD | 0xD1 | 0xDA | 0xDC | 0xDE => 3,
        0xC7 => 3,
        0xC8 => 4,
        0xC6 | 0xCA | 0xCE | 0xD2 | 0xDB | 0xDD | 0xDF => 5,
        0xC9 => 6,
        0xCB | 0xCF | 0xD3 => 9,
        0xC1 => return Err(CodecError::Invalid),
    };
    Ok(size)
}

fn put1(
    out: &mut [u8; MAX_TAG_SIZE],
    byte: u8,
) -> usize {
    out[0] = byte;
    1
}

fn encode_uint(
    out: &mut [u8; MAX_TAG_SIZE],
    v: u64,
) -> usize {
    if v <= 0x7F {
        put1(out, v as u8)
    } else if v <= u8::MAX as u64 {
        out[0] = 0xCC;
        out[1] = v as u8;
        2
    } else if v <= u16::MAX as u64 {
        out[0] = 0xCD;
        BigEndian::write_u16(&mut out[1..3], v as u16);
        3
    } else if v <= u32::MAX as u64 {
        out[0] = 0xCE;
        BigEndian::write_u32(&mut out[1..5], v as u32);
        5
    } else {
        out[0] = 0xCF;
        BigEndian::write_u64(&mut out[1..9], v);
        9
    }
}

fn encode_negative(
    out: &mut [u8; MAX_TAG_SIZE],
    v: i64,
) -> usize {
    if v >= -32 {
        put1(out, v as i8 as u8)
    } else if v >= i8::MIN as i64 {
        out[0] = 0xD0;
        out[1] = v as i8 as u8;
        2
    } else if v >= i16::MIN as i64 {
        out[0] = 0xD1;
        BigEndian::write_i16(&mut out[1..3], v as i16);
        3
    } else if v >= i32::MIN as i64 {
        out[0] = 0xD2;
        BigEndian::write_i32(&mut out[1..5], v as i32);
        5
    } else {
        out[0] = 0xD3;
        BigEndian::write_i64(&mut out[1..9], v);
        9
    }
}

/// str8/16/32 и bin8/16/32: однобайтовая, двух- и четырёхбайтовая длина.
fn encode_sized(
    out: &mut [u8; MAX_TAG_SIZE],
    n: u32,
    markers: [u8; 3],
) -> usize {
    if n <= u8::MAX as u32 {
        out[0] = markers[0];
        out[1] = n as u8;
        2
    } else if n <= u16::MAX as u32 {
        out[0] = markers[1];
        BigEndian::write_u16(&mut out[1..3], n as u16);
        3
    } else {
        out[0] = markers[2];
        BigEndian::write_u32(&mut out[1..5], n);
        5
    }
}

/// array16/32 и map16/32.
fn encode_count(
    out: &mut [u8; MAX_TAG_SIZE],
    n: u32,
    markers: [u8; 2],
) -> usize {
    if n <= u16::MAX as u32 {
        out[0] = markers[0];
        BigEndian::write_u16(&mut out[1..3], n as u16);
        3
    } else {
        out[0] = markers[1];
        BigEndian::write_u32(&mut out[1..5], n);
        5
    }
}

fn encode_ext(
    out: &mut [u8; MAX_TAG_SIZE],
    ty: i8,
    n: u32,
) -> usize {
    let fixed = match n {
        1 => Some(0xD4),
        2 => Some(0xD5),
        4 => Some(0xD6),
        8 => Some(0xD7),
        16 => Some(0xD8),
        _ => None,
    };
    if let Some(marker) = fixed {
        out[0] = marker;
        out[1] = ty as u8;
        return 2;
    }

    if n <= u8::MAX as u32 {
        out[0] = 0xC7;
        out[1] = n as u8;
        out[2] = ty as u8;
        3
    } else if n <= u16::MAX as u32 {
        out[0] = 0xC8;
        BigEndian::write_u16(&mut out[1..3], n as u16);
        out[3] = ty as u8;
        4
    } else {
        out[0] = 0xC9;
        BigEndian::write_u32(&mut out[1..5], n);
        out[5] = ty as u8;
        6
    }
}

////////////////////////////////////////////////////////////////////////////////
// Timestamp
////////////////////////////////////////////////////////////////////////////////

/// Момент времени из расширения timestamp: секунды от Unix epoch и
/// наносекунды (всегда меньше 10^9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Timestamp {
    seconds: i64,
    nanoseconds: u32,
}

impl Timestamp {
    /// Создаёт timestamp; наносекунды вне `0..10^9` дают
    /// [`CodecError::Invalid`].
    pub const fn new(
        seconds: i64,
        nanoseconds: u32,
    ) -> Result<Self, CodecError> {
        if nanoseconds >= NANOS_PER_SECOND {
            return Err(CodecError::Invalid);
        }
        Ok(Self {
            seconds,
            nanoseconds,
        })
    }

    /// Timestamp из целого числа секунд.
    pub const fn from_seconds(seconds: i64) -> Self {
        Self {
            seconds,
            nanoseconds: 0,
        }
    }

    pub const fn seconds(&self) -> i64 {
        self.seconds
    }

    pub const fn nanoseconds(&self) -> u32 {
        self.nanoseconds
    }
}

/// Кодирует полезную нагрузку timestamp в самой короткой форме.
///
/// Возвращает заголовок `Tag::Ext(TIMESTAMP_EXT_TYPE, len)`, буфер и длину
/// полезной нагрузки (4, 8 или 12).
pub fn encode_timestamp(ts: Timestamp) -> (Tag, [u8; 12], usize) {
    let mut out = [0u8; 12];
    let Timestamp {
        seconds,
        nanoseconds,
    } = ts;

    if seconds >= 0 && (seconds as u64) >> 34 == 0 {
        let packed = ((nanoseconds as u64) << 34) | seconds as u64;
        if packed >> 32 == 0 {
            BigEndian::write_u32(&mut out[..4], packed as u32);
            return (Tag::Ext(TIMESTAMP_EXT_TYPE, 4), out, 4);
        }
        BigEndian::write_u64(&mut out[..8], packed);
        return (Tag::Ext(TIMESTAMP_EXT_TYPE, 8), out, 8);
    }

    BigEndian::write_u32(&mut out[..4], nanoseconds);
    BigEndian::write_i64(&mut out[4..12], seconds);
    (Tag::Ext(TIMESTAMP_EXT_TYPE, 12), out, 12)
}

/// Декодирует полезную нагрузку timestamp (4, 8 или 12 байт).
pub fn decode_timestamp(payload: &[u8]) -> Result<Timestamp, CodecError> {
    match payload.len() {
        4 => Ok(Timestamp::from_seconds(BigEndian::read_u32(payload) as i64)),
        8 => {
            let packed = BigEndian::read_u64(payload);
            let nanoseconds = (packed >> 34) as u32;
            let seconds = (packed & 0x0000_0003_FFFF_FFFF) as i64;
            Timestamp::new(seconds, nanoseconds)
        }
        12 => Timestamp::new(
            BigEndian::read_i64(&payload[4..12]),
            BigEndian::read_u32(&payload[..4]),
        ),
        _ => Err(CodecError::Invalid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(tag: Tag) -> Vec<u8> {
        let mut out = [0u8; MAX_TAG_SIZE];
        let n = tag.encode(&mut out);
        out[..n].to_vec()
    }

    fn roundtrip(tag: Tag) -> Tag {
        let bytes = encoded(tag);
        assert_eq!(tag_size(bytes[0]).unwrap(), bytes.len(), "size of {tag:?}");
        Tag::decode(&bytes).unwrap()
    }

    /// Тест проверяет однобайтовые формы.
    #[test]
    fn test_single_byte_forms() {
        assert_eq!(encoded(Tag::Nil), [0xC0]);
        assert_eq!(encoded(Tag::Bool(false)), [0xC2]);
        assert_eq!(encoded(Tag::Bool(true)), [0xC3]);
        assert_eq!(encoded(Tag::Uint(0)), [0x00]);
        assert_eq!(encoded(Tag::Uint(127)), [0x7F]);
        assert_eq!(encoded(Tag::Int(-1)), [0xFF]);
        assert_eq!(encoded(Tag::Int(-32)), [0xE0]);
        assert_eq!(encoded(Tag::Str(7)), [0xA7]);
        assert_eq!(encoded(Tag::Array(15)), [0x9F]);
        assert_eq!(encoded(Tag::Map(2)), [0x82]);
    }

    /// Тест проверяет выбор ширины на границах целых.
    #[test]
    fn test_integer_width_boundaries() {
        assert_eq!(encoded(Tag::Uint(128)), [0xCC, 0x80]);
        assert_eq!(encoded(Tag::Uint(255)), [0xCC, 0xFF]);
        assert_eq!(encoded(Tag::Uint(256)), [0xCD, 0x01, 0x00]);
        assert_eq!(encoded(Tag::Uint(65535)), [0xCD, 0xFF, 0xFF]);
        assert_eq!(encoded(Tag::Uint(65536)), [0xCE, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(encoded(Tag::Uint(u64::MAX)).len(), 9);
        assert_eq!(encoded(Tag::Int(-33)), [0xD0, 0xDF]);
        assert_eq!(encoded(Tag::Int(-128)), [0xD0, 0x80]);
        assert_eq!(encoded(Tag::Int(-129)), [0xD1, 0xFF, 0x7F]);
        assert_eq!(encoded(Tag::Int(i64::MIN))[0], 0xD3);
        // неотрицательный Int пишется беззнаковой формой
        assert_eq!(encoded(Tag::Int(200)), [0xCC, 0xC8]);
    }

    /// Тест проверяет заголовки строк, бинарных данных и коллекций.
    #[test]
    fn test_sized_forms() {
        assert_eq!(encoded(Tag::Str(31)), [0xBF]);
        assert_eq!(encoded(Tag::Str(32)), [0xD9, 0x20]);
        assert_eq!(encoded(Tag::Str(256)), [0xDA, 0x01, 0x00]);
        assert_eq!(encoded(Tag::Str(65536)), [0xDB, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(encoded(Tag::Bin(0)), [0xC4, 0x00]);
        assert_eq!(encoded(Tag::Bin(300)), [0xC5, 0x01, 0x2C]);
        assert_eq!(encoded(Tag::Array(16)), [0xDC, 0x00, 0x10]);
        assert_eq!(encoded(Tag::Map(65536)), [0xDF, 0x00, 0x01, 0x00, 0x00]);
    }

    /// Тест проверяет fixext и ext8/16/32.
    #[test]
    fn test_ext_forms() {
        assert_eq!(encoded(Tag::Ext(5, 1)), [0xD4, 0x05]);
        assert_eq!(encoded(Tag::Ext(-1, 8)), [0xD7, 0xFF]);
        assert_eq!(encoded(Tag::Ext(3, 16)), [0xD8, 0x03]);
        assert_eq!(encoded(Tag::Ext(3, 3)), [0xC7, 0x03, 0x03]);
        assert_eq!(encoded(Tag::Ext(-1, 12)), [0xC7, 0x0C, 0xFF]);
        assert_eq!(encoded(Tag::Ext(7, 256)), [0xC8, 0x01, 0x00, 0x07]);
        assert_eq!(
            encoded(Tag::Ext(7, 70000)),
            [0xC9, 0x00, 0x01, 0x11, 0x70, 0x07]
        );
    }

    /// Тест проверяет roundtrip на граничных значениях каждой ширины.
    #[test]
    fn test_roundtrip_boundaries() {
        let tags = [
            Tag::Nil,
            Tag::Bool(true),
            Tag::Uint(0),
            Tag::Uint(15),
            Tag::Uint(16),
            Tag::Uint(127),
            Tag::Uint(128),
            Tag::Uint(255),
            Tag::Uint(256),
            Tag::Uint(65535),
            Tag::Uint(65536),
            Tag::Uint(u32::MAX as u64),
            Tag::Uint(u32::MAX as u64 + 1),
            Tag::Uint(u64::MAX),
            Tag::Int(-1),
            Tag::Int(-32),
            Tag::Int(-33),
            Tag::Int(i8::MIN as i64),
            Tag::Int(i16::MIN as i64),
            Tag::Int(i32::MIN as i64),
            Tag::Int(i64::MIN),
            Tag::Float(f32::MAX),
            Tag::Float(f32::MIN_POSITIVE),
            Tag::Double(f64::MIN),
            Tag::Double(f64::NAN),
            Tag::Str(0),
            Tag::Str(u32::MAX),
            Tag::Bin(65535),
            Tag::Array(0),
            Tag::Array(u32::MAX),
            Tag::Map(15),
            Tag::Map(16),
            Tag::Ext(-128, 0),
            Tag::Ext(127, u32::MAX),
        ];
        for tag in tags {
            assert_eq!(roundtrip(tag), tag, "roundtrip of {tag:?}");
        }
    }

    /// Тест проверяет, что неотрицательный Int равен Uint того же значения.
    #[test]
    fn test_int_uint_equality() {
        assert_eq!(Tag::Int(5), Tag::Uint(5));
        assert_ne!(Tag::Int(-5), Tag::Uint(5));
        assert_ne!(Tag::Uint(1), Tag::Bool(true));
    }

    /// Тест проверяет, что зарезервированный байт и усечённые заголовки
    /// отвергаются.
    #[test]
    fn test_decode_errors() {
        assert_eq!(tag_size(RESERVED_BYTE), Err(CodecError::Invalid));
        assert_eq!(Tag::decode(&[RESERVED_BYTE]), Err(CodecError::Invalid));
        assert_eq!(Tag::decode(&[0xCD, 0x01]), Err(CodecError::Eof));
        assert_eq!(Tag::decode(&[]), Err(CodecError::Eof));
    }

    /// Тест проверяет выбор формы timestamp и обратное декодирование.
    #[test]
    fn test_timestamp_forms() {
        let ts32 = Timestamp::from_seconds(1_700_000_000);
        let (tag, buf, len) = encode_timestamp(ts32);
        assert_eq!(tag, Tag::Ext(TIMESTAMP_EXT_TYPE, 4));
        assert_eq!(len, 4);
        assert_eq!(decode_timestamp(&buf[..len]).unwrap(), ts32);

        let ts64 = Timestamp::new(1_700_000_000, 500).unwrap();
        let (_, buf, len) = encode_timestamp(ts64);
        assert_eq!(len, 8);
        assert_eq!(decode_timestamp(&buf[..len]).unwrap(), ts64);

        let ts96 = Timestamp::new(-1, 999_999_999).unwrap();
        let (tag, buf, len) = encode_timestamp(ts96);
        assert_eq!(tag, Tag::Ext(TIMESTAMP_EXT_TYPE, 12));
        assert_eq!(len, 12);
        assert_eq!(decode_timestamp(&buf[..len]).unwrap(), ts96);

        let far = Timestamp::from_seconds(1 << 40);
        assert_eq!(encode_timestamp(far).2, 12);
    }

    /// Тест проверяет отказ на неверных наносекундах и длинах.
    #[test]
    fn test_timestamp_invalid() {
        assert_eq!(Timestamp::new(0, 1_000_000_000), Err(CodecError::Invalid));
        assert_eq!(decode_timestamp(&[0; 5]), Err(CodecError::Invalid));

        // 64-битная форма с наносекундами = 10^9
        let packed = (1_000_000_000u64) << 34;
        assert_eq!(
            decode_timestamp(&packed.to_be_bytes()),
            Err(CodecError::Invalid)
        );
    }
}
