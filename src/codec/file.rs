//! Работа с файлами: открыть путь и подключить его чтение/запись как
//! источник/приёмник.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::Path,
};

use tracing::debug;
use zpack_error::{context, ensure, ResultExt, StatusCode, ZpackResult};

use super::{
    io::{IoSink, IoSource},
    node::{Tree, TreeConfig},
    reader::{Reader, ReaderConfig},
    writer::{Writer, WriterConfig},
};

impl Reader<'static> {
    /// Открывает файл для потокового чтения.
    pub fn from_file(
        path: impl AsRef<Path>,
        config: ReaderConfig,
    ) -> ZpackResult<Self> {
        let path = path.as_ref();
        ensure!(config.buffer_size > 0, StatusCode::InvalidArgs, "Reader buffer size cannot be zero");
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        debug!(path = %path.display(), "reader opened file");
        Ok(Reader::from_source(IoSource::new(file), config))
    }
}

impl Writer<'static> {
    /// Создаёт (или перезаписывает) файл для потоковой записи. Файл
    /// сбрасывается на диск в `teardown`.
    pub fn to_file(
        path: impl AsRef<Path>,
        config: WriterConfig,
    ) -> ZpackResult<Self> {
        let path = path.as_ref();
        ensure!(config.buffer_size > 0, StatusCode::InvalidArgs, "Writer buffer size cannot be zero");
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        debug!(path = %path.display(), "writer opened file");
        Ok(Writer::from_sink(IoSink::new(BufWriter::new(file)), config))
    }
}

impl Tree {
    /// Загружает файл целиком в память и строит по нему дерево.
    ///
    /// Ошибка открытия файла возвращается как `Err`; ошибка разбора - тоже,
    /// с контекстом пути.
    pub fn from_file(
        path: impl AsRef<Path>,
        config: TreeConfig,
    ) -> ZpackResult<Tree> {
        let path = path.as_ref();
        let data = fs::read(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let tree = Tree::from_reader(Reader::from_vec(data, config.reader_config()), config);
        context!(tree.check(), "Failed to parse {}", path.display())?;
        Ok(tree)
    }

    /// Строит дерево, читая файл потоково через буфер читателя.
    pub fn from_file_streaming(
        path: impl AsRef<Path>,
        config: TreeConfig,
    ) -> ZpackResult<Tree> {
        let path = path.as_ref();
        ensure!(config.buffer_size > 0, StatusCode::InvalidArgs, "Reader buffer size cannot be zero");
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let reader = Reader::from_source(IoSource::new(BufReader::new(file)), config.reader_config());
        let tree = Tree::from_reader(reader, config);
        context!(tree.check(), "Failed to parse {}", path.display())?;
        Ok(tree)
    }
}
