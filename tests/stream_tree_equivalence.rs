//! Дерево и потоковый читатель должны видеть одно и то же сообщение
//! одинаково: те же теги в том же порядке и те же полезные нагрузки.

use rstest::rstest;
use zpack::{
    codec::{
        FnSource, Node, PagePolicy, Reader, ReaderConfig, Tag, Timestamp, Tree, TreeConfig, Writer,
    },
    CodecError,
};

/// Сообщение, в котором встречаются все типы и несколько уровней
/// вложенности.
fn sample_message() -> Vec<u8> {
    let mut writer = Writer::growable();
    writer.start_map(6);

    writer.write_str("ints");
    writer.start_array(6);
    writer.write_uint(0);
    writer.write_uint(300);
    writer.write_int(-1);
    writer.write_int(-40000);
    writer.write_u64(u64::MAX);
    writer.write_i64(i64::MIN);
    writer.finish_array();

    writer.write_str("floats");
    writer.start_array(2);
    writer.write_float(0.5);
    writer.write_double(-1e300);
    writer.finish_array();

    writer.write_str("blobs");
    writer.start_array(3);
    writer.write_bin(&[0xDE, 0xAD, 0xBE, 0xEF]);
    writer.write_ext(7, &[1; 40]);
    writer.write_timestamp(Timestamp::new(1_700_000_000, 123).unwrap());
    writer.finish_array();

    writer.write_str("long");
    writer.write_str(&"x".repeat(300));

    writer.write_uint(42);
    writer.start_map(2);
    writer.write_nil();
    writer.write_bool(false);
    writer.write_str("deep");
    writer.start_array(1);
    writer.start_array(1);
    writer.start_array(0);
    writer.finish_array();
    writer.finish_array();
    writer.finish_array();
    writer.finish_map();

    writer.write_str("empty");
    writer.start_map(0);
    writer.finish_map();

    writer.finish_map();
    writer.into_vec().unwrap()
}

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

/// Обходит поддерево узла, сверяя каждый шаг с читателем.
fn assert_same(
    reader: &mut Reader<'_>,
    node: Node<'_>,
) {
    let tag = reader.read_tag();
    assert_eq!(tag, node.tag());
    match tag {
        Tag::Str(n) | Tag::Bin(n) | Tag::Ext(_, n) => {
            let payload = reader.read_bytes_alloc(n as usize);
            assert_eq!(payload.as_slice(), node.as_bytes());
            reader.done_type(tag.value_type());
        }
        Tag::Array(n) => {
            assert_eq!(node.array_len(), n);
            for i in 0..n as usize {
                assert_same(reader, node.array_at(i));
            }
            reader.done_array();
        }
        Tag::Map(n) => {
            assert_eq!(node.map_count(), n);
            for i in 0..n as usize {
                assert_same(reader, node.map_key_at(i));
                assert_same(reader, node.map_value_at(i));
            }
            reader.done_map();
        }
        _ => {}
    }
}

/// Тест проверяет совпадение дерева и потока при разных буферах читателя
/// и разных политиках страниц.
#[rstest]
#[case(7, 3, PagePolicy::Dynamic { page_size: 4 })]
#[case(16, 16, PagePolicy::Dynamic { page_size: 256 })]
#[case(4096, 1000, PagePolicy::Fixed { pages: 8, page_size: 64 })]
fn test_tree_matches_stream(
    #[case] buffer_size: usize,
    #[case] chunk: usize,
    #[case] pages: PagePolicy,
) {
    let bytes = sample_message();

    let tree = Tree::from_bytes(&bytes, TreeConfig::default().with_pages(pages));
    assert_eq!(tree.check(), Ok(()));

    let mut reader = Reader::from_source(
        chunked(&bytes, chunk),
        ReaderConfig::default().with_buffer_size(buffer_size),
    );
    assert_same(&mut reader, tree.root());
    assert_eq!(reader.destroy(), Ok(()));
    assert_eq!(tree.check(), Ok(()));
}

/// Тест проверяет, что дерево, построенное из потокового читателя,
/// совпадает с деревом из памяти.
#[rstest]
#[case(7, 1)]
#[case(32, 7)]
fn test_tree_from_stream_matches_in_memory(
    #[case] buffer_size: usize,
    #[case] chunk: usize,
) {
    let bytes = sample_message();
    let config = TreeConfig {
        buffer_size,
        ..TreeConfig::default()
    };

    let streamed = Tree::from_reader(
        Reader::from_source(chunked(&bytes, chunk), config.reader_config()),
        config,
    );
    assert_eq!(streamed.check(), Ok(()));

    let mut reader = Reader::new(&bytes);
    assert_same(&mut reader, streamed.root());
    assert_eq!(reader.destroy(), Ok(()));

    let in_memory = Tree::from_bytes(&bytes, config);
    assert_eq!(in_memory.node_count(), streamed.node_count());
}

/// Тест проверяет, что `discard` пропускает ровно одно сообщение, как и
/// построение дерева.
#[test]
fn test_discard_consumes_whole_message() {
    let mut bytes = sample_message();
    let len = bytes.len();
    bytes.extend_from_slice(&[0xC3]);

    let mut reader = Reader::new(&bytes);
    reader.discard();
    assert_eq!(reader.remaining(), &[0xC3]);
    assert!(reader.expect_bool());
    assert_eq!(reader.destroy(), Ok(()));

    let tree = Tree::from_bytes(&bytes[..len], TreeConfig::default());
    assert_eq!(tree.check(), Ok(()));
}

/// Тест проверяет, что повреждённый байт даёт одинаковую ошибку в обоих
/// путях.
#[test]
fn test_reserved_byte_same_error() {
    let mut bytes = sample_message();
    let last = bytes.len() - 1;
    bytes[last] = 0xC1;

    let mut reader = Reader::new(&bytes);
    reader.discard();
    assert_eq!(reader.error(), Some(CodecError::Invalid));

    let tree = Tree::from_bytes(&bytes, TreeConfig::default());
    assert_eq!(tree.error(), Some(CodecError::Invalid));
    assert!(tree.root().id().is_none());
}
