use std::num::NonZeroUsize;

/// Ограничения API на размер одного запроса обновления
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub stocks: NonZeroUsize,
    pub prices: NonZeroUsize,
}

/// Разделить список на части не больше `size` элементов
///
/// Порядок сохраняется, последняя часть может быть короче. Итератор
/// клонируется, так что проход можно повторить.
pub fn divide<T>(items: &[T], size: NonZeroUsize) -> std::slice::Chunks<'_, T> {
    items.chunks(size.get())
}
