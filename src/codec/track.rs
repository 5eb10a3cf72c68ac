//! Стек вложенности составных элементов.
//!
//! Читатель и писатель открывают кадр на каждый map/array/str/bin/ext и
//! закрывают его соответствующим `done_*`/`finish_*`. Кадр хранит, сколько
//! дочерних элементов (или байт) объявлено и сколько уже обработано.
//! Карта из `n` пар ожидает `2n` дочерних элементов.
//!
//! С выключенной фичей `tracking` [`Track`] становится пустой структурой,
//! все проверки которой всегда успешны.

use zpack_error::CodecError;

use super::tag::ValueType;

/// Глубина вложенности по умолчанию для чтения, `discard` и дерева.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

#[cfg(feature = "tracking")]
pub use enabled::Track;

#[cfg(not(feature = "tracking"))]
pub use disabled::Track;

#[cfg(feature = "tracking")]
mod enabled {
    use super::*;

    /// Единица учёта кадра: элементы для map/array, байты для str/bin/ext.
    fn counts_bytes(kind: ValueType) -> bool {
        matches!(kind, ValueType::Str | ValueType::Bin | ValueType::Ext)
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Frame {
        kind: ValueType,
        total: u64,
        progress: u64,
    }

    /// Стек открытых составных элементов.
    #[derive(Debug, Clone)]
    pub struct Track {
        frames: Vec<Frame>,
        max_depth: usize,
    }

    impl Track {
        pub fn new(max_depth: usize) -> Self {
            Self {
                frames: Vec::new(),
                max_depth,
            }
        }

        /// Текущая глубина вложенности.
        pub fn depth(&self) -> usize {
            self.frames.len()
        }

        /// Открывает кадр. `total` - число дочерних элементов (для карты
        /// уже удвоенное) или байт полезной нагрузки.
        pub fn push(
            &mut self,
            kind: ValueType,
            total: u64,
        ) -> Result<(), CodecError> {
            if self.frames.len() >= self.max_depth {
                return Err(CodecError::TooBig);
            }
            self.frames
                .try_reserve(1)
                .map_err(|_| CodecError::Memory)?;
            self.frames.push(Frame {
                kind,
                total,
                progress: 0,
            });
            Ok(())
        }

        /// Закрывает верхний кадр; тип должен совпадать, а все объявленные
        /// элементы должны быть обработаны.
        pub fn pop(
            &mut self,
            kind: ValueType,
        ) -> Result<(), CodecError> {
            let top = self.frames.last().ok_or(CodecError::Bug)?;
            if top.kind != kind || top.progress != top.total {
                return Err(CodecError::Bug);
            }
            self.frames.pop();
            Ok(())
        }

        /// Учитывает один элемент в открытом map/array.
        ///
        /// Внутри открытого str/bin/ext и сверх объявленного числа - `Bug`.
        pub fn element(&mut self) -> Result<(), CodecError> {
            let Some(top) = self.frames.last_mut() else {
                return Ok(());
            };
            if counts_bytes(top.kind) || top.progress >= top.total {
                return Err(CodecError::Bug);
            }
            top.progress += 1;
            Ok(())
        }

        /// Учитывает `n` байт полезной нагрузки открытого str/bin/ext.
        pub fn bytes(
            &mut self,
            n: u64,
        ) -> Result<(), CodecError> {
            let top = self.frames.last_mut().ok_or(CodecError::Bug)?;
            if !counts_bytes(top.kind) || top.total - top.progress < n {
                return Err(CodecError::Bug);
            }
            top.progress += n;
            Ok(())
        }

        /// Проверяет, что все составные элементы закрыты.
        pub fn check_empty(&self) -> Result<(), CodecError> {
            if self.frames.is_empty() {
                Ok(())
            } else {
                Err(CodecError::Bug)
            }
        }
    }
}

#[cfg(not(feature = "tracking"))]
mod disabled {
    use super::*;

    /// Пустая заглушка: учёт вложенности выключен.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Track;

    impl Track {
        pub fn new(_max_depth: usize) -> Self {
            Self
        }

        pub fn depth(&self) -> usize {
            0
        }

        pub fn push(
            &mut self,
            _kind: ValueType,
            _total: u64,
        ) -> Result<(), CodecError> {
            Ok(())
        }

        pub fn pop(
            &mut self,
            _kind: ValueType,
        ) -> Result<(), CodecError> {
            Ok(())
        }

        pub fn element(&mut self) -> Result<(), CodecError> {
            Ok(())
        }

        pub fn bytes(
            &mut self,
            _n: u64,
        ) -> Result<(), CodecError> {
            Ok(())
        }

        pub fn check_empty(&self) -> Result<(), CodecError> {
            Ok(())
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(all(test, feature = "tracking"))]
mod tests {
    use super::*;

    /// Тест проверяет, что карта из n пар ожидает 2n элементов.
    #[test]
    fn test_map_counts_keys_and_values() {
        let mut track = Track::new(8);
        track.push(ValueType::Map, 2).unwrap();
        track.element().unwrap();
        assert_eq!(track.pop(ValueType::Map), Err(CodecError::Bug));
        track.element().unwrap();
        assert_eq!(track.element(), Err(CodecError::Bug));
        track.pop(ValueType::Map).unwrap();
        track.check_empty().unwrap();
    }

    /// Тест проверяет, что элемент внутри открытой строки - ошибка.
    #[test]
    fn test_element_inside_bytes_frame() {
        let mut track = Track::new(8);
        track.push(ValueType::Str, 3).unwrap();
        assert_eq!(track.element(), Err(CodecError::Bug));
        track.bytes(2).unwrap();
        assert_eq!(track.bytes(2), Err(CodecError::Bug));
        track.bytes(1).unwrap();
        assert_eq!(track.pop(ValueType::Bin), Err(CodecError::Bug));
        track.pop(ValueType::Str).unwrap();
    }

    /// Тест проверяет ограничение глубины.
    #[test]
    fn test_depth_limit() {
        let mut track = Track::new(2);
        track.push(ValueType::Array, 1).unwrap();
        track.element().unwrap();
        track.push(ValueType::Array, 1).unwrap();
        assert_eq!(track.push(ValueType::Array, 0), Err(CodecError::TooBig));
        assert_eq!(track.depth(), 2);
        assert_eq!(track.check_empty(), Err(CodecError::Bug));
    }

    /// Тест проверяет, что закрытие без открытия - ошибка.
    #[test]
    fn test_pop_empty() {
        let mut track = Track::new(4);
        assert_eq!(track.pop(ValueType::Array), Err(CodecError::Bug));
        assert_eq!(track.bytes(1), Err(CodecError::Bug));
        // элемент верхнего уровня всегда допустим
        track.element().unwrap();
    }
}
