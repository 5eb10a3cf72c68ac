/// Streaming MessagePack codec: tags, writer, reader, expect API, node tree.
pub mod codec;
/// Codec settings loaded from the environment.
pub mod config;
/// Conversion between `serde_json::Value` and MessagePack.
pub mod json;
/// Logging setup for the CLI (formatting, filters).
pub mod logging;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Reader, writer and tree with their configuration.
pub use codec::{
    Node, NodeId, PagePolicy, Reader, ReaderConfig, Tree, TreeConfig, Writer, WriterConfig,
};
/// Byte sources and sinks.
pub use codec::{FnSink, FnSource, IoSink, IoSource, Sink, Source};
/// Wire-level types.
pub use codec::{Tag, Timestamp, ValueType};
/// config
pub use config::{CodecSettings, SettingsError};
/// JSON bridge.
pub use json::{node_to_json, write_json};
/// Error taxonomy and error stack.
pub use zpack_error::{CodecError, StackError, StatusCode, ZpackResult};
