#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use zpack::codec::{Node, Reader, Tag, Tree, TreeConfig, Writer};

#[derive(Debug, Arbitrary)]
enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    Str(String),
    Bin(Vec<u8>),
    Ext(i8, Vec<u8>),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

fn write(
    writer: &mut Writer<'_>,
    value: &Value,
) {
    match value {
        Value::Nil => writer.write_nil(),
        Value::Bool(b) => writer.write_bool(*b),
        Value::Int(i) => writer.write_int(*i),
        Value::Uint(u) => writer.write_uint(*u),
        Value::Double(d) => writer.write_double(*d),
        Value::Str(s) => writer.write_str(s),
        Value::Bin(data) => writer.write_bin(data),
        // timestamp-тип проверяет полезную нагрузку при чтении
        Value::Ext(-1, data) => writer.write_bin(data),
        Value::Ext(t, data) => writer.write_ext(*t, data),
        Value::Array(items) => {
            writer.start_array(items.len() as u32);
            for item in items {
                write(writer, item);
            }
            writer.finish_array();
        }
        Value::Map(pairs) => {
            writer.start_map(pairs.len() as u32);
            for (k, v) in pairs {
                write(writer, k);
                write(writer, v);
            }
            writer.finish_map();
        }
    }
}

/// Сверяет узел с моделью; возвращает `false` при расхождении.
fn same(
    node: Node<'_>,
    value: &Value,
) -> bool {
    match (node.tag(), value) {
        (Tag::Nil, Value::Nil) => true,
        (Tag::Bool(a), Value::Bool(b)) => a == *b,
        (tag, Value::Int(i)) => tag == Tag::Int(*i),
        (tag, Value::Uint(u)) => tag == Tag::Uint(*u),
        (Tag::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
        (Tag::Str(_), Value::Str(s)) => node.as_str() == s,
        (Tag::Bin(_), Value::Bin(data)) | (Tag::Bin(_), Value::Ext(-1, data)) => {
            node.as_bytes() == data.as_slice()
        }
        (Tag::Ext(a, _), Value::Ext(b, data)) => a == *b && node.as_bytes() == data.as_slice(),
        (Tag::Array(n), Value::Array(items)) => {
            n as usize == items.len()
                && items
                    .iter()
                    .enumerate()
                    .all(|(i, item)| same(node.array_at(i), item))
        }
        (Tag::Map(n), Value::Map(pairs)) => {
            n as usize == pairs.len()
                && pairs.iter().enumerate().all(|(i, (k, v))| {
                    same(node.map_key_at(i), k) && same(node.map_value_at(i), v)
                })
        }
        _ => false,
    }
}

fuzz_target!(|value: Value| {
    let mut writer = Writer::growable();
    write(&mut writer, &value);
    let Ok(bytes) = writer.into_vec() else {
        // слишком глубокая модель
        return;
    };

    let mut reader = Reader::new(&bytes);
    reader.discard();
    assert_eq!(reader.remaining().len(), 0);
    assert_eq!(reader.destroy(), Ok(()));

    let tree = Tree::from_bytes(&bytes, TreeConfig::default());
    assert_eq!(tree.check(), Ok(()));
    assert!(same(tree.root(), &value));
});
