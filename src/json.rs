//! Преобразование между `serde_json::Value` и MessagePack.
//!
//! Запись идёт через [`Writer`], чтение через узлы [`Tree`](crate::Tree).
//! Типы MessagePack, которых нет в JSON, отображаются так:
//!
//! - bin: массив чисел-байт;
//! - timestamp: `{"seconds": s, "nanoseconds": ns}`;
//! - прочие ext: `{"type": t, "data": [...]}`;
//! - нестроковые ключи карты: их JSON-представление строкой.

use serde_json::{Map, Number, Value};
use zpack_error::CodecError;

use crate::codec::{Node, Tag, Writer, TIMESTAMP_EXT_TYPE};

/// Записывает JSON-значение как одно значение MessagePack.
///
/// Целые пишутся самой короткой формой, дробные как double.
pub fn write_json(
    writer: &mut Writer<'_>,
    value: &Value,
) {
    match value {
        Value::Null => writer.write_nil(),
        Value::Bool(b) => writer.write_bool(*b),
        Value::Number(n) => write_number(writer, n),
        Value::String(s) => writer.write_str(s),
        Value::Array(items) => {
            let Some(len) = count(writer, items.len()) else {
                return;
            };
            writer.start_array(len);
            for item in items {
                write_json(writer, item);
            }
            writer.finish_array();
        }
        Value::Object(fields) => {
            let Some(len) = count(writer, fields.len()) else {
                return;
            };
            writer.start_map(len);
            for (key, item) in fields {
                writer.write_str(key);
                write_json(writer, item);
            }
            writer.finish_map();
        }
    }
}

fn write_number(
    writer: &mut Writer<'_>,
    n: &Number,
) {
    if let Some(u) = n.as_u64() {
        writer.write_uint(u);
    } else if let Some(i) = n.as_i64() {
        writer.write_int(i);
    } else if let Some(f) = n.as_f64() {
        writer.write_double(f);
    }
}

fn count(
    writer: &mut Writer<'_>,
    len: usize,
) -> Option<u32> {
    match u32::try_from(len) {
        Ok(len) => Some(len),
        Err(_) => {
            writer.flag_error(CodecError::TooBig);
            None
        }
    }
}

/// Преобразует узел (и всё его поддерево) в JSON.
///
/// Ошибки запросов (например, неверный UTF-8 в строке) фиксируются в
/// дереве; результат в этом случае содержит нейтральные значения.
pub fn node_to_json(node: Node<'_>) -> Value {
    match node.tag() {
        Tag::Nil => Value::Null,
        Tag::Bool(b) => Value::Bool(b),
        Tag::Int(i) => Value::from(i),
        Tag::Uint(u) => Value::from(u),
        Tag::Float(f) => float(f64::from(f)),
        Tag::Double(d) => float(d),
        Tag::Str(_) => Value::String(node.as_str().to_string()),
        Tag::Bin(_) => bytes(node.as_bytes()),
        Tag::Ext(TIMESTAMP_EXT_TYPE, _) => {
            let ts = node.as_timestamp();
            let mut object = Map::new();
            object.insert("seconds".to_string(), Value::from(ts.seconds()));
            object.insert("nanoseconds".to_string(), Value::from(ts.nanoseconds()));
            Value::Object(object)
        }
        Tag::Ext(ext_type, _) => {
            let mut object = Map::new();
            object.insert("type".to_string(), Value::from(ext_type));
            object.insert("data".to_string(), bytes(node.as_bytes()));
            Value::Object(object)
        }
        Tag::Array(len) => Value::Array(
            (0..len as usize)
                .map(|i| node_to_json(node.array_at(i)))
                .collect(),
        ),
        Tag::Map(len) => {
            let mut object = Map::new();
            for i in 0..len as usize {
                let key = node.map_key_at(i);
                let key = match key.tag() {
                    Tag::Str(_) => key.as_str().to_string(),
                    _ => node_to_json(key).to_string(),
                };
                object.insert(key, node_to_json(node.map_value_at(i)));
            }
            Value::Object(object)
        }
    }
}

// NaN и бесконечности в JSON непредставимы.
fn float(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

fn bytes(data: &[u8]) -> Value {
    Value::Array(data.iter().map(|&b| Value::from(b)).collect())
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
