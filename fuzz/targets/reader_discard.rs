#![no_main]

use libfuzzer_sys::fuzz_target;
use zpack::{
    codec::{FnSource, Reader, ReaderConfig, Tree, TreeConfig},
    CodecError,
};

fuzz_target!(|data: &[u8]| {
    // In-memory и потоковый читатель должны прийти к одному результату.
    let mut reader = Reader::with_config(data, ReaderConfig::default().with_max_depth(64));
    reader.discard();
    let in_memory = reader.error();
    let consumed = data.len() - reader.remaining().len();
    drop(reader);

    let mut pos = 0;
    let source = FnSource::new(|buf: &mut [u8]| -> Result<usize, CodecError> {
        let n = buf.len().min(3).min(data.len() - pos);
        buf[..n].copy_from_slice(&data[pos..pos + n]);
        pos += n;
        Ok(n)
    });
    let mut reader = Reader::from_source(
        source,
        ReaderConfig::default().with_buffer_size(16).with_max_depth(64),
    );
    reader.discard();
    let streamed = reader.error();
    drop(reader);

    // Поток может упереться в размер буфера там, где данные в памяти
    // закончились; остальные исходы совпадают.
    if in_memory.is_none() {
        assert_eq!(streamed, None);
        let tree = Tree::from_bytes(&data[..consumed], TreeConfig::default().with_max_depth(64));
        assert_eq!(tree.error(), None);
    } else if streamed != Some(CodecError::TooBig) {
        assert_eq!(streamed, in_memory);
    }
});
