//! Дерево узлов: сообщение, разобранное целиком для произвольного доступа.
//!
//! Построение один раз прогоняет [`Reader`] по сообщению и создаёт по
//! одному узлу на значение. Дочерние узлы составного значения выделяются
//! одной непрерывной серией внутри страницы; серия больше страницы получает
//! собственную страницу. Обход итеративный, с явным стеком уровней,
//! ограниченным `max_depth`.
//!
//! Запросы к дереву идут через копируемый дескриптор [`Node`]. Первая
//! неудачная операция фиксирует ошибку дерева, после чего все запросы
//! возвращают нейтральные значения (0, `false`, `""`, nil-узел), так что
//! проверить ошибку можно один раз в конце через [`Tree::check`].

use std::{cell::Cell, fmt};

use tracing::debug;
use zpack_error::CodecError;

use super::{
    reader::{Reader, ReaderConfig},
    tag::{decode_timestamp, Tag, Timestamp, ValueType, TIMESTAMP_EXT_TYPE},
    track::DEFAULT_MAX_DEPTH,
    writer::DEFAULT_BUFFER_SIZE,
};

/// Размер страницы узлов по умолчанию.
pub const DEFAULT_PAGE_SIZE: usize = 256;

/// Способ получения страниц под узлы.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePolicy {
    /// `pages` страниц выделяются заранее; исчерпание даёт `TooBig`.
    /// Серия детей больше страницы тоже даёт `TooBig`.
    Fixed { pages: usize, page_size: usize },
    /// Страницы выделяются по мере надобности.
    Dynamic { page_size: usize },
}

impl PagePolicy {
    pub fn page_size(&self) -> usize {
        match *self {
            PagePolicy::Fixed { page_size, .. } | PagePolicy::Dynamic { page_size } => page_size,
        }
    }
}

impl Default for PagePolicy {
    fn default() -> Self {
        PagePolicy::Dynamic {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Параметры построения дерева.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    /// Размер буфера читателя для потоковых источников.
    pub buffer_size: usize,
    pub max_depth: usize,
    pub max_bytes: Option<u32>,
    /// Ограничение общего числа узлов.
    pub max_nodes: Option<usize>,
    pub pages: PagePolicy,
    pub int_as_float: bool,
    pub allow_extensions: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            max_bytes: None,
            max_nodes: None,
            pages: PagePolicy::default(),
            int_as_float: true,
            allow_extensions: true,
        }
    }
}

impl TreeConfig {
    pub fn with_max_depth(
        mut self,
        max_depth: usize,
    ) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_nodes(
        mut self,
        max_nodes: Option<usize>,
    ) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn with_pages(
        mut self,
        pages: PagePolicy,
    ) -> Self {
        self.pages = pages;
        self
    }

    pub fn with_int_as_float(
        mut self,
        int_as_float: bool,
    ) -> Self {
        self.int_as_float = int_as_float;
        self
    }

    /// Параметры читателя, которым строится дерево.
    pub fn reader_config(&self) -> ReaderConfig {
        ReaderConfig {
            buffer_size: self.buffer_size,
            max_depth: self.max_depth,
            max_bytes: self.max_bytes,
            int_as_float: self.int_as_float,
            allow_extensions: self.allow_extensions,
        }
    }
}

/// Стабильный идентификатор узла в арене дерева.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    page: u32,
    slot: u32,
}

impl NodeId {
    fn offset(
        self,
        index: usize,
    ) -> NodeId {
        NodeId {
            page: self.page,
            slot: self.slot + index as u32,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Link {
    None,
    /// Первый из непрерывной серии детей.
    Children(NodeId),
    /// Смещение полезной нагрузки в хранилище байт дерева.
    Bytes(usize),
}

#[derive(Debug, Clone, Copy)]
struct NodeData {
    tag: Tag,
    link: Link,
}

const EMPTY: NodeData = NodeData {
    tag: Tag::Nil,
    link: Link::None,
};

/// Разобранное сообщение.
pub struct Tree {
    pages: Vec<Vec<NodeData>>,
    bytes: Vec<u8>,
    root: Option<NodeId>,
    node_count: usize,
    int_as_float: bool,
    error: Cell<Option<CodecError>>,
    handler: Option<Box<dyn Fn(CodecError)>>,
}

////////////////////////////////////////////////////////////////////////////////
// Построение
////////////////////////////////////////////////////////////////////////////////

/// Арена страниц на время построения.
struct Arena {
    pages: Vec<Vec<NodeData>>,
    policy: PagePolicy,
    /// Страница, в которую сейчас добавляются серии.
    current: Option<usize>,
    /// Для `Fixed`: следующая не начатая предвыделенная страница.
    next_fixed: usize,
    node_count: usize,
    max_nodes: Option<usize>,
}

impl Arena {
    fn new(
        policy: PagePolicy,
        max_nodes: Option<usize>,
    ) -> Result<Self, CodecError> {
        let mut pages = Vec::new();
        if let PagePolicy::Fixed { pages: count, page_size } = policy {
            pages.try_reserve_exact(count).map_err(|_| CodecError::Memory)?;
            for _ in 0..count {
                let mut page = Vec::new();
                page.try_reserve_exact(page_size).map_err(|_| CodecError::Memory)?;
                pages.push(page);
            }
        }
        Ok(Self {
            pages,
            policy,
            current: None,
            next_fixed: 0,
            node_count: 0,
            max_nodes,
        })
    }

    /// Выделяет непрерывную серию из `len` узлов.
    fn alloc_run(
        &mut self,
        len: usize,
    ) -> Result<NodeId, CodecError> {
        let total = self.node_count.checked_add(len).ok_or(CodecError::TooBig)?;
        if self.max_nodes.is_some_and(|max| total > max) {
            return Err(CodecError::TooBig);
        }
        let page_size = self.policy.page_size();

        if len > page_size {
            // выделенная страница растёт в `set` по мере чтения детей
            let page = self.dedicated_page()?;
            self.node_count = total;
            return Ok(NodeId {
                page: page as u32,
                slot: 0,
            });
        }

        let page = match self.current {
            Some(i) if page_size - self.pages[i].len() >= len => i,
            _ => {
                let i = self.fresh_page(page_size)?;
                self.current = Some(i);
                i
            }
        };

        let nodes = &mut self.pages[page];
        let slot = nodes.len();
        nodes.resize(slot + len, EMPTY);
        self.node_count = total;
        Ok(NodeId {
            page: page as u32,
            slot: slot as u32,
        })
    }

    fn fresh_page(
        &mut self,
        page_size: usize,
    ) -> Result<usize, CodecError> {
        match self.policy {
            PagePolicy::Fixed { pages, .. } => {
                if self.next_fixed >= pages {
                    return Err(CodecError::TooBig);
                }
                self.next_fixed += 1;
                Ok(self.next_fixed - 1)
            }
            PagePolicy::Dynamic { .. } => self.push_page(page_size),
        }
    }

    fn dedicated_page(&mut self) -> Result<usize, CodecError> {
        match self.policy {
            PagePolicy::Fixed { .. } => Err(CodecError::TooBig),
            PagePolicy::Dynamic { .. } => self.push_page(0),
        }
    }

    fn push_page(
        &mut self,
        capacity: usize,
    ) -> Result<usize, CodecError> {
        let mut page = Vec::new();
        page.try_reserve_exact(capacity).map_err(|_| CodecError::Memory)?;
        self.pages.try_reserve(1).map_err(|_| CodecError::Memory)?;
        self.pages.push(page);
        Ok(self.pages.len() - 1)
    }

    fn set(
        &mut self,
        id: NodeId,
        data: NodeData,
    ) -> Result<(), CodecError> {
        let page = &mut self.pages[id.page as usize];
        let slot = id.slot as usize;
        if slot >= page.len() {
            page.try_reserve(slot + 1 - page.len())
                .map_err(|_| CodecError::Memory)?;
            page.resize(slot + 1, EMPTY);
        }
        page[slot] = data;
        Ok(())
    }
}

struct Level {
    kind: ValueType,
    first: NodeId,
    len: u64,
    next: u64,
}

fn build(
    reader: &mut Reader<'_>,
    arena: &mut Arena,
    bytes: &mut Vec<u8>,
    max_depth: usize,
) -> Result<NodeId, CodecError> {
    let root = arena.alloc_run(1)?;
    let mut target = root;
    let mut levels: Vec<Level> = Vec::new();

    loop {
        let tag = reader.read_tag();
        reader.check()?;

        let link = match tag {
            Tag::Str(n) | Tag::Bin(n) | Tag::Ext(_, n) => {
                let offset = bytes.len();
                if !reader.read_bytes_append(n as usize, bytes) {
                    reader.check()?;
                }
                reader.done_type(tag.value_type());
                Link::Bytes(offset)
            }
            Tag::Array(_) | Tag::Map(_) => {
                let children = tag.child_count().unwrap_or(0);
                if children == 0 {
                    reader.done_type(tag.value_type());
                    Link::None
                } else {
                    if levels.len() >= max_depth {
                        return Err(CodecError::TooBig);
                    }
                    // каждый дочерний узел занимает хотя бы один байт
                    if !reader.has_source() && children > reader.remaining().len() as u64 {
                        return Err(CodecError::Eof);
                    }
                    let len = usize::try_from(children).map_err(|_| CodecError::TooBig)?;
                    let first = arena.alloc_run(len)?;
                    levels.try_reserve(1).map_err(|_| CodecError::Memory)?;
                    levels.push(Level {
                        kind: tag.value_type(),
                        first,
                        len: children,
                        next: 0,
                    });
                    Link::Children(first)
                }
            }
            _ => Link::None,
        };
        arena.set(target, NodeData { tag, link })?;

        loop {
            match levels.last_mut() {
                None => {
                    reader.check()?;
                    return Ok(root);
                }
                Some(level) if level.next == level.len => {
                    let kind = level.kind;
                    levels.pop();
                    reader.done_type(kind);
                }
                Some(level) => {
                    target = level.first.offset(level.next as usize);
                    level.next += 1;
                    break;
                }
            }
        }
    }
}

impl Tree {
    /// Строит дерево по сообщению в памяти.
    pub fn from_bytes(
        data: &[u8],
        config: TreeConfig,
    ) -> Tree {
        Self::from_reader(Reader::with_config(data, config.reader_config()), config)
    }

    /// Строит дерево по первому сообщению читателя и уничтожает читатель.
    ///
    /// Ошибка разбора фиксируется в дереве: корень становится nil-узлом,
    /// а [`Tree::check`] возвращает ошибку.
    pub fn from_reader(
        mut reader: Reader<'_>,
        config: TreeConfig,
    ) -> Tree {
        let mut bytes = Vec::new();
        let parsed = Arena::new(config.pages, config.max_nodes).and_then(|mut arena| {
            build(&mut reader, &mut arena, &mut bytes, config.max_depth).map(|root| (arena, root))
        });

        let (pages, root, node_count) = match parsed {
            Ok((arena, root)) => (arena.pages, Some(root), arena.node_count),
            Err(e) => {
                reader.flag_error(e);
                (Vec::new(), None, 0)
            }
        };
        let error = reader.destroy().err();

        debug!(
            nodes = node_count,
            pages = pages.len(),
            bytes = bytes.len(),
            error = ?error,
            "tree parsed"
        );

        Tree {
            pages,
            bytes,
            root: if error.is_some() { None } else { root },
            node_count,
            int_as_float: config.int_as_float,
            error: Cell::new(error),
            handler: None,
        }
    }

    /// Корневой узел (nil-узел при ошибке).
    pub fn root(&self) -> Node<'_> {
        Node {
            tree: self,
            id: self.root,
        }
    }

    /// Число узлов в дереве.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn error(&self) -> Option<CodecError> {
        self.error.get()
    }

    pub fn check(&self) -> Result<(), CodecError> {
        match self.error.get() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Фиксирует ошибку дерева, если её ещё нет.
    pub fn flag_error(
        &self,
        err: CodecError,
    ) {
        if self.error.get().is_some() {
            return;
        }
        debug!(origin = "tree", error = err.name(), "codec error latched");
        self.error.set(Some(err));
        if let Some(handler) = &self.handler {
            handler(err);
        }
    }

    /// Устанавливает обработчик, вызываемый при фиксации ошибки запросом.
    pub fn set_error_handler(
        &mut self,
        handler: impl Fn(CodecError) + 'static,
    ) {
        self.handler = Some(Box::new(handler));
    }

    /// Освобождает дерево целиком и возвращает его ошибку.
    pub fn destroy(self) -> Result<(), CodecError> {
        self.check()
    }

    fn data(
        &self,
        id: NodeId,
    ) -> &NodeData {
        &self.pages[id.page as usize][id.slot as usize]
    }

    fn payload(
        &self,
        data: &NodeData,
    ) -> &[u8] {
        match (data.link, data.tag.payload_len()) {
            (Link::Bytes(offset), Some(len)) => &self.bytes[offset..offset + len as usize],
            _ => &[],
        }
    }
}

impl fmt::Debug for Tree {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Tree")
            .field("nodes", &self.node_count)
            .field("pages", &self.pages.len())
            .field("bytes", &self.bytes.len())
            .field("error", &self.error.get())
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Запросы
////////////////////////////////////////////////////////////////////////////////

/// Дескриптор узла дерева. `id == None` - nil-узел, возвращаемый после
/// ошибки.
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t Tree,
    id: Option<NodeId>,
}

macro_rules! node_unsigned {
    ($($name:ident, $ty:ty;)*) => {
        $(
            pub fn $name(&self) -> $ty {
                self.unsigned(<$ty>::MAX as u64) as $ty
            }
        )*
    };
}

macro_rules! node_signed {
    ($($name:ident, $ty:ty;)*) => {
        $(
            pub fn $name(&self) -> $ty {
                self.signed(<$ty>::MIN as i64, <$ty>::MAX as i64) as $ty
            }
        )*
    };
}

impl<'t> Node<'t> {
    fn nil_node(&self) -> Node<'t> {
        Node {
            tree: self.tree,
            id: None,
        }
    }

    /// Данные узла, если дерево не в состоянии ошибки.
    fn data(&self) -> Option<&'t NodeData> {
        if self.tree.error().is_some() {
            return None;
        }
        self.id.map(|id| self.tree.data(id))
    }

    fn fail(
        &self,
        err: CodecError,
    ) {
        self.tree.flag_error(err);
    }

    /// Идентификатор узла в арене (`None` для nil-узла).
    pub fn id(&self) -> Option<NodeId> {
        self.id
    }

    pub fn tag(&self) -> Tag {
        self.data().map(|d| d.tag).unwrap_or(Tag::Nil)
    }

    pub fn node_type(&self) -> ValueType {
        self.tag().value_type()
    }

    /// `true`, если узел - nil. После ошибки дерева любой узел - nil.
    pub fn is_nil(&self) -> bool {
        self.tag() == Tag::Nil
    }

    /// Проверяет, что узел - nil; иначе `Type`.
    pub fn nil(&self) {
        if let Some(d) = self.data() {
            if !matches!(d.tag, Tag::Nil) {
                self.fail(CodecError::Type);
            }
        }
    }

    pub fn as_bool(&self) -> bool {
        match self.data().map(|d| d.tag) {
            Some(Tag::Bool(v)) => v,
            Some(_) => {
                self.fail(CodecError::Type);
                false
            }
            None => false,
        }
    }

    fn unsigned(
        &self,
        max: u64,
    ) -> u64 {
        match self.data().map(|d| d.tag) {
            Some(Tag::Uint(v)) if v <= max => v,
            Some(Tag::Int(v)) if v >= 0 && v as u64 <= max => v as u64,
            Some(_) => {
                self.fail(CodecError::Type);
                0
            }
            None => 0,
        }
    }

    fn signed(
        &self,
        min: i64,
        max: i64,
    ) -> i64 {
        match self.data().map(|d| d.tag) {
            Some(Tag::Int(v)) if v >= min && v <= max => v,
            Some(Tag::Uint(v)) if v <= max as u64 => v as i64,
            Some(_) => {
                self.fail(CodecError::Type);
                0
            }
            None => 0,
        }
    }

    node_unsigned! {
        as_u8, u8;
        as_u16, u16;
        as_u32, u32;
        as_u64, u64;
        as_uint, u64;
    }

    node_signed! {
        as_i8, i8;
        as_i16, i16;
        as_i32, i32;
        as_i64, i64;
        as_int, i64;
    }

    pub fn as_float(&self) -> f32 {
        self.as_double_inner(self.tree.int_as_float, true) as f32
    }

    pub fn as_double(&self) -> f64 {
        self.as_double_inner(self.tree.int_as_float, true)
    }

    /// Только `float`.
    pub fn as_float_strict(&self) -> f32 {
        match self.data().map(|d| d.tag) {
            Some(Tag::Float(v)) => v,
            Some(_) => {
                self.fail(CodecError::Type);
                0.0
            }
            None => 0.0,
        }
    }

    /// `float` или `double`, но не целые.
    pub fn as_double_strict(&self) -> f64 {
        self.as_double_inner(false, true)
    }

    fn as_double_inner(
        &self,
        allow_int: bool,
        allow_float: bool,
    ) -> f64 {
        match self.data().map(|d| d.tag) {
            Some(Tag::Double(v)) => v,
            Some(Tag::Float(v)) if allow_float => v as f64,
            Some(Tag::Uint(v)) if allow_int => v as f64,
            Some(Tag::Int(v)) if allow_int => v as f64,
            Some(_) => {
                self.fail(CodecError::Type);
                0.0
            }
            None => 0.0,
        }
    }

    /// Полезная нагрузка str/bin/ext; другой тип - `Type`.
    pub fn as_bytes(&self) -> &'t [u8] {
        match self.data() {
            Some(d) if d.tag.payload_len().is_some() => self.tree.payload(d),
            Some(_) => {
                self.fail(CodecError::Type);
                &[]
            }
            None => &[],
        }
    }

    /// Строка без копирования; другой тип - `Type`, неверный UTF-8 -
    /// `Invalid`.
    pub fn as_str(&self) -> &'t str {
        match self.data() {
            Some(d) if matches!(d.tag, Tag::Str(_)) => {
                match std::str::from_utf8(self.tree.payload(d)) {
                    Ok(s) => s,
                    Err(_) => {
                        self.fail(CodecError::Invalid);
                        ""
                    }
                }
            }
            Some(_) => {
                self.fail(CodecError::Type);
                ""
            }
            None => "",
        }
    }

    pub fn as_string(&self) -> String {
        self.as_str().to_owned()
    }

    /// Длина полезной нагрузки str/bin/ext.
    pub fn data_len(&self) -> u32 {
        match self.data().map(|d| d.tag) {
            Some(tag) => match tag.payload_len() {
                Some(n) => n,
                None => {
                    self.fail(CodecError::Type);
                    0
                }
            },
            None => 0,
        }
    }

    pub fn ext_type(&self) -> i8 {
        match self.data().map(|d| d.tag) {
            Some(Tag::Ext(t, _)) => t,
            Some(_) => {
                self.fail(CodecError::Type);
                0
            }
            None => 0,
        }
    }

    /// Timestamp из ext типа -1; другой тип - `Type`, неверная полезная
    /// нагрузка - `Invalid`.
    pub fn as_timestamp(&self) -> Timestamp {
        match self.data() {
            Some(d) if matches!(d.tag, Tag::Ext(TIMESTAMP_EXT_TYPE, _)) => {
                match decode_timestamp(self.tree.payload(d)) {
                    Ok(ts) => ts,
                    Err(e) => {
                        self.fail(e);
                        Timestamp::default()
                    }
                }
            }
            Some(_) => {
                self.fail(CodecError::Type);
                Timestamp::default()
            }
            None => Timestamp::default(),
        }
    }

    ////////////////////////////////////////////////////////////////////////////
    // Массивы и карты
    ////////////////////////////////////////////////////////////////////////////

    /// Серия детей (для карты - ключи и значения вперемешку), если узел
    /// нужного вида.
    fn children(
        &self,
        kind: ValueType,
    ) -> Option<(&'t [NodeData], Option<NodeId>)> {
        let d = self.data()?;
        if d.tag.value_type() != kind {
            self.fail(CodecError::Type);
            return None;
        }
        match d.link {
            Link::Children(first) => {
                let len = d.tag.child_count().unwrap_or(0) as usize;
                let page = &self.tree.pages[first.page as usize];
                let start = first.slot as usize;
                Some((&page[start..start + len], Some(first)))
            }
            _ => Some((&[], None)),
        }
    }

    fn child(
        &self,
        first: Option<NodeId>,
        index: usize,
    ) -> Node<'t> {
        Node {
            tree: self.tree,
            id: first.map(|f| f.offset(index)),
        }
    }

    pub fn array_len(&self) -> u32 {
        match self.children(ValueType::Array) {
            Some((children, _)) => children.len() as u32,
            None => 0,
        }
    }

    /// Элемент массива; индекс вне диапазона - `Data`.
    pub fn array_at(
        &self,
        index: usize,
    ) -> Node<'t> {
        match self.children(ValueType::Array) {
            Some((children, first)) if index < children.len() => self.child(first, index),
            Some(_) => {
                self.fail(CodecError::Data);
                self.nil_node()
            }
            None => self.nil_node(),
        }
    }

    /// Число пар карты.
    pub fn map_count(&self) -> u32 {
        match self.children(ValueType::Map) {
            Some((children, _)) => (children.len() / 2) as u32,
            None => 0,
        }
    }

    pub fn map_key_at(
        &self,
        index: usize,
    ) -> Node<'t> {
        self.map_entry(index, 0)
    }

    pub fn map_value_at(
        &self,
        index: usize,
    ) -> Node<'t> {
        self.map_entry(index, 1)
    }

    fn map_entry(
        &self,
        index: usize,
        which: usize,
    ) -> Node<'t> {
        match self.children(ValueType::Map) {
            Some((children, first)) if index < children.len() / 2 => {
                self.child(first, index * 2 + which)
            }
            Some(_) => {
                self.fail(CodecError::Data);
                self.nil_node()
            }
            None => self.nil_node(),
        }
    }

    /// Ищет значение по ключу. `Ok(None)` - ключа нет; дубликат - `Data`.
    fn lookup(
        &self,
        matches: impl Fn(&NodeData) -> bool,
    ) -> Option<Option<Node<'t>>> {
        let (children, first) = self.children(ValueType::Map)?;
        let mut found = None;
        for (i, pair) in children.chunks_exact(2).enumerate() {
            if matches(&pair[0]) {
                if found.is_some() {
                    self.fail(CodecError::Data);
                    return None;
                }
                found = Some(self.child(first, i * 2 + 1));
            }
        }
        Some(found)
    }

    fn lookup_str(
        &self,
        key: &str,
    ) -> Option<Option<Node<'t>>> {
        let tree = self.tree;
        self.lookup(|k| matches!(k.tag, Tag::Str(_)) && tree.payload(k) == key.as_bytes())
    }

    /// Значение по строковому ключу; нет ключа - `Data`.
    pub fn map_str(
        &self,
        key: &str,
    ) -> Node<'t> {
        match self.lookup_str(key) {
            Some(Some(node)) => node,
            Some(None) => {
                self.fail(CodecError::Data);
                self.nil_node()
            }
            None => self.nil_node(),
        }
    }

    /// Значение по строковому ключу или `None` без ошибки, если ключа нет.
    pub fn map_str_opt(
        &self,
        key: &str,
    ) -> Option<Node<'t>> {
        self.lookup_str(key).flatten()
    }

    pub fn map_contains_str(
        &self,
        key: &str,
    ) -> bool {
        self.map_str_opt(key).is_some()
    }

    /// Значение по целочисленному ключу (знаковое и беззнаковое
    /// представление одного числа совпадают).
    pub fn map_int(
        &self,
        key: i64,
    ) -> Node<'t> {
        self.map_by_tag(Tag::Int(key))
    }

    pub fn map_uint(
        &self,
        key: u64,
    ) -> Node<'t> {
        self.map_by_tag(Tag::Uint(key))
    }

    fn map_by_tag(
        &self,
        key: Tag,
    ) -> Node<'t> {
        match self.lookup(|k| k.tag == key) {
            Some(Some(node)) => node,
            Some(None) => {
                self.fail(CodecError::Data);
                self.nil_node()
            }
            None => self.nil_node(),
        }
    }

    /// Индекс строки узла в `strings`; нет совпадения - `Type` и
    /// `strings.len()`.
    pub fn enum_index(
        &self,
        strings: &[&str],
    ) -> usize {
        let value = self.as_str();
        if self.tree.error().is_some() {
            return strings.len();
        }
        match strings.iter().position(|s| *s == value) {
            Some(i) => i,
            None => {
                self.fail(CodecError::Type);
                strings.len()
            }
        }
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("tag", &self.tag())
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
