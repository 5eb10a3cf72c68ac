//! Потоковый кодек MessagePack.
//!
//! ## Подмодули
//!
//! - `tag`: заголовки значений, их кодирование и разбор, timestamp.
//! - `track`: стек учёта открытых составных элементов (фича `tracking`).
//! - `io`: трейты источника и приёмника байт и их адаптеры.
//! - `writer`: потоковый писатель с фиксированным или растущим буфером.
//! - `reader`: потоковый читатель, `discard` и `done_*`.
//! - `expect`: типизированное чтение поверх читателя.
//! - `node`: дерево узлов, построенное по одному сообщению.
//! - `file`: открытие файлов для читателя, писателя и дерева.

pub mod expect;
pub mod file;
pub mod io;
pub mod node;
pub mod reader;
mod sticky;
pub mod tag;
pub mod track;
pub mod writer;

pub use io::{FnSink, FnSource, IoSink, IoSource, Sink, Source};
pub use node::{Node, NodeId, PagePolicy, Tree, TreeConfig, DEFAULT_PAGE_SIZE};
pub use reader::{Reader, ReaderConfig};
pub use sticky::ErrorHandler;
pub use tag::{
    decode_timestamp, encode_timestamp, tag_size, Tag, Timestamp, ValueType, MAX_TAG_SIZE,
    TIMESTAMP_EXT_TYPE,
};
pub use track::DEFAULT_MAX_DEPTH;
pub use writer::{Writer, WriterConfig, DEFAULT_BUFFER_SIZE};
