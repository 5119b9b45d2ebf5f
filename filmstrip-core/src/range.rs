//! Dense storage addressed by a signed index range.
//!
//! The strip keeps a fixed window of boxes around the focused item, indexed
//! from `-BOX_MAX` to `BOX_MAX`. A `RangeArray` is a plain vector plus a
//! constant offset; the window size never changes at runtime.

/// Fixed-size array indexed by `min..=max` (both signed, inclusive).
#[derive(Debug, Clone)]
pub(crate) struct RangeArray<T> {
    min: i32,
    max: i32,
    items: Vec<T>,
}

impl<T> RangeArray<T> {
    /// Build an array covering `min..=max`, filling each slot with `init(i)`.
    pub fn new_with(min: i32, max: i32, mut init: impl FnMut(i32) -> T) -> Self {
        debug_assert!(min <= max);
        let items = (min..=max).map(&mut init).collect();
        Self { min, max, items }
    }

    fn slot(&self, index: i32) -> usize {
        debug_assert!(
            index >= self.min && index <= self.max,
            "index {index} outside [{}, {}]",
            self.min,
            self.max
        );
        (index - self.min) as usize
    }

    pub fn get(&self, index: i32) -> &T {
        &self.items[self.slot(index)]
    }

    pub fn get_mut(&mut self, index: i32) -> &mut T {
        let slot = self.slot(index);
        &mut self.items[slot]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_indexing() {
        let a = RangeArray::new_with(-3, 3, |i| i * 10);
        assert_eq!(*a.get(-3), -30);
        assert_eq!(*a.get(0), 0);
        assert_eq!(*a.get(3), 30);
    }

    #[test]
    fn mutation_in_place() {
        let mut a = RangeArray::new_with(-1, 1, |_| 0);
        *a.get_mut(-1) = 7;
        assert_eq!(*a.get(-1), 7);
        assert_eq!(*a.get(0), 0);
    }

    #[test]
    #[should_panic]
    fn out_of_range_panics() {
        let a = RangeArray::new_with(-2, 2, |i| i);
        let _ = a.get(3);
    }
}
