//! Growable array with the source language's Array semantics.
//!
//! Storage is managed by hand with `realloc` so that capacity and length stay
//! distinct and growth follows the runtime's own policy. Slots that become
//! part of the array without an explicit value are zero-filled.

use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::{self, NonNull};
use std::slice;

use crate::error::{ArrayError, ArrayResult};

/// Capacity of the first allocation made by a growing operation.
pub const DEFAULT_CAPACITY: usize = 16;

/// Growth multiplier applied to the current capacity.
const CAPACITY_GROW_FACTOR: usize = 2;

/// Largest number of elements an array can hold (the maximum index type value).
pub const MAX_CAPACITY: usize = i32::MAX as usize;

/// Types that can be stored in an [`Array`].
///
/// # Safety
/// The type must not be zero-sized and the all-zero bit pattern must be a
/// valid value of it, since un-set slots are filled with zero bytes.
pub unsafe trait Element: Copy {}

macro_rules! impl_element {
    ($($ty:ty),* $(,)?) => {
        $(unsafe impl Element for $ty {})*
    };
}

impl_element!(i8, i16, i32, i64, u8, u16, u32, u64, isize, usize, f32, f64, bool);

/// A growable array exclusively owning its element buffer.
///
/// Invariants: `length <= capacity`; `elements` is `None` iff `capacity == 0`;
/// every slot in `[0, length)` is initialized.
pub struct Array<T: Element> {
    length: usize,
    capacity: usize,
    elements: Option<NonNull<T>>,
}

impl<T: Element> Array<T> {
    /// Create an empty array without allocating.
    pub fn new() -> Self {
        Self {
            length: 0,
            capacity: 0,
            elements: None,
        }
    }

    /// Create an array of `size` zero-valued elements.
    pub fn with_len(size: usize) -> ArrayResult<Self> {
        let mut array = Self::new();
        if size > 0 {
            check_limit(size)?;
            array.reallocate(size)?;
            // SAFETY: the buffer was just allocated with room for `size` elements.
            unsafe { ptr::write_bytes(array.base(), 0, size) };
            array.length = size;
        }
        Ok(array)
    }

    /// Create an array holding a copy of `elements`, with capacity equal to its length.
    pub fn from_slice(elements: &[T]) -> ArrayResult<Self> {
        let mut array = Self::new();
        if !elements.is_empty() {
            check_limit(elements.len())?;
            array.reallocate(elements.len())?;
            // SAFETY: fresh buffer of `elements.len()` slots, cannot overlap the input.
            unsafe { ptr::copy_nonoverlapping(elements.as_ptr(), array.base(), elements.len()) };
            array.length = elements.len();
        }
        Ok(array)
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[T] {
        match self.elements {
            // SAFETY: slots [0, length) are initialized and owned by `self`.
            Some(elements) => unsafe { slice::from_raw_parts(elements.as_ptr(), self.length) },
            None => &[],
        }
    }

    /// Return the element at `index`.
    pub fn get(&self, index: u32) -> ArrayResult<T> {
        self.as_slice()
            .get(index as usize)
            .copied()
            .ok_or(ArrayError::IndexOutOfRange {
                index: index.into(),
                length: self.length,
            })
    }

    /// Store `value` at `index`, growing the array to `index + 1` elements if
    /// needed. Slots between the old length and `index` become zero.
    pub fn set(&mut self, index: u32, value: T) -> ArrayResult<()> {
        let index = index as usize;
        if index >= MAX_CAPACITY {
            // index + 1 can wrap when usize is 32 bits wide
            return Err(ArrayError::CapacityExceeded {
                requested: index.saturating_add(1),
            });
        }
        if index >= self.length {
            self.resize(index + 1)?;
        }

        // SAFETY: index < length <= capacity.
        unsafe { self.base().add(index).write(value) };
        Ok(())
    }

    /// Set every element in `[start, length)` to `value`.
    pub fn fill_from(&mut self, value: T, start: i32) -> ArrayResult<()> {
        // length never exceeds MAX_CAPACITY, so it fits an i32
        self.fill(value, start, self.length as i32)
    }

    /// Set every element in `[start, end)` to `value`. Negative positions count
    /// back from the end. An empty or inverted range is a no-op.
    pub fn fill(&mut self, value: T, start: i32, end: i32) -> ArrayResult<()> {
        let length = self.length as i64;
        let start = self.resolve_position(start);
        let end = self.resolve_position(end);

        if start < 0 || start >= length {
            return Err(ArrayError::IndexOutOfRange {
                index: start,
                length: self.length,
            });
        }

        if end < 0 || end > length {
            return Err(ArrayError::IndexOutOfRange {
                index: end,
                length: self.length,
            });
        }

        if end < start {
            return Ok(());
        }

        // SAFETY: 0 <= start <= end <= length, all slots initialized.
        let elements = unsafe { slice::from_raw_parts_mut(self.base(), self.length) };
        elements[start as usize..end as usize].fill(value);
        Ok(())
    }

    /// Append `elements` and return the new length.
    pub fn push(&mut self, elements: &[T]) -> ArrayResult<usize> {
        let new_length = self.grown_length(elements.len())?;
        if elements.is_empty() {
            return Ok(new_length);
        }
        self.ensure_capacity(new_length)?;

        // SAFETY: capacity >= new_length, the source is a caller slice disjoint from our buffer.
        unsafe {
            ptr::copy_nonoverlapping(elements.as_ptr(), self.base().add(self.length), elements.len());
        }
        self.length = new_length;
        Ok(new_length)
    }

    /// Prepend `elements` and return the new length.
    pub fn unshift(&mut self, elements: &[T]) -> ArrayResult<usize> {
        let new_length = self.grown_length(elements.len())?;
        if elements.is_empty() {
            return Ok(new_length);
        }
        self.ensure_capacity(new_length)?;

        // SAFETY: capacity >= new_length; `ptr::copy` handles the overlapping shift.
        unsafe {
            let base = self.base();
            ptr::copy(base, base.add(elements.len()), self.length);
            ptr::copy_nonoverlapping(elements.as_ptr(), base, elements.len());
        }
        self.length = new_length;
        Ok(new_length)
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> ArrayResult<T> {
        if self.length == 0 {
            return Err(ArrayError::EmptyArray);
        }

        self.length -= 1;
        // SAFETY: the slot at the old last index is initialized.
        Ok(unsafe { self.base().add(self.length).read() })
    }

    /// Remove and return the first element, moving the rest one slot left.
    pub fn shift(&mut self) -> ArrayResult<T> {
        if self.length == 0 {
            return Err(ArrayError::EmptyArray);
        }

        // SAFETY: length >= 1, the move stays within [0, length).
        let first = unsafe {
            let base = self.base();
            let first = base.read();
            ptr::copy(base.add(1), base, self.length - 1);
            first
        };
        self.length -= 1;
        Ok(first)
    }

    /// Change the length to `new_size`. Growth zero-fills the new slots;
    /// shrinking keeps the capacity.
    pub fn resize(&mut self, new_size: usize) -> ArrayResult<()> {
        self.ensure_capacity(new_size)?;

        if self.length < new_size {
            // SAFETY: capacity >= new_size.
            unsafe { ptr::write_bytes(self.base().add(self.length), 0, new_size - self.length) };
        }

        self.length = new_size;
        Ok(())
    }

    fn resolve_position(&self, position: i32) -> i64 {
        if position < 0 {
            self.length as i64 + position as i64
        } else {
            position as i64
        }
    }

    fn grown_length(&self, additional: usize) -> ArrayResult<usize> {
        self.length
            .checked_add(additional)
            .ok_or(ArrayError::CapacityExceeded { requested: usize::MAX })
    }

    /// Ensure room for at least `min` elements.
    fn ensure_capacity(&mut self, min: usize) -> ArrayResult<()> {
        if self.capacity >= min {
            return Ok(());
        }

        check_limit(min)?;

        let grown = if self.capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            self.capacity.saturating_mul(CAPACITY_GROW_FACTOR)
        };

        self.reallocate(grown.max(min).min(MAX_CAPACITY))
    }

    /// (Re)allocate the buffer with `new_capacity` slots, keeping existing elements.
    /// On failure the old buffer is left in place.
    fn reallocate(&mut self, new_capacity: usize) -> ArrayResult<()> {
        let layout = Layout::array::<T>(new_capacity).map_err(|_| ArrayError::CapacityExceeded {
            requested: new_capacity,
        })?;

        let raw = match self.elements {
            None => unsafe { alloc::alloc(layout) },
            Some(elements) => {
                let old_layout = buffer_layout::<T>(self.capacity);
                // SAFETY: `elements` was allocated with `old_layout` by this array.
                unsafe { alloc::realloc(elements.as_ptr().cast(), old_layout, layout.size()) }
            }
        };

        let elements = NonNull::new(raw.cast::<T>()).ok_or(ArrayError::OutOfMemory {
            capacity: new_capacity,
        })?;

        self.elements = Some(elements);
        self.capacity = new_capacity;
        Ok(())
    }

    fn base(&self) -> *mut T {
        self.elements.map_or(ptr::null_mut(), NonNull::as_ptr)
    }
}

fn check_limit(requested: usize) -> ArrayResult<()> {
    if requested > MAX_CAPACITY {
        return Err(ArrayError::CapacityExceeded { requested });
    }
    Ok(())
}

fn buffer_layout<T>(capacity: usize) -> Layout {
    // SAFETY: the same layout was validated by `Layout::array` when the buffer was allocated.
    unsafe {
        Layout::from_size_align_unchecked(capacity * std::mem::size_of::<T>(), std::mem::align_of::<T>())
    }
}

impl<T: Element> Drop for Array<T> {
    fn drop(&mut self) {
        if let Some(elements) = self.elements.take() {
            // SAFETY: allocated by this array with `buffer_layout(capacity)`.
            unsafe { alloc::dealloc(elements.as_ptr().cast(), buffer_layout::<T>(self.capacity)) };
        }
    }
}

impl<T: Element> Default for Array<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep copy preserving both length and capacity.
impl<T: Element> Clone for Array<T> {
    fn clone(&self) -> Self {
        let mut copy = Self::new();
        if self.capacity > 0 {
            if copy.reallocate(self.capacity).is_err() {
                alloc::handle_alloc_error(buffer_layout::<T>(self.capacity));
            }
            // SAFETY: both buffers hold at least `length` slots and are distinct.
            unsafe { ptr::copy_nonoverlapping(self.base(), copy.base(), self.length) };
            copy.length = self.length;
        }
        copy
    }
}

impl<T: Element + PartialEq> PartialEq for Array<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Element + fmt::Debug> fmt::Debug for Array<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array")
            .field("length", &self.length)
            .field("capacity", &self.capacity)
            .field("elements", &self.as_slice())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array_of(values: &[i32]) -> Array<i32> {
        Array::from_slice(values).unwrap()
    }

    #[test]
    fn test_empty_array_does_not_allocate() {
        let array = Array::<f64>::new();
        assert_eq!(array.len(), 0);
        assert_eq!(array.capacity(), 0);
        assert!(array.elements.is_none());
        assert!(array.as_slice().is_empty());
    }

    #[test]
    fn test_with_len_zero_fills() {
        let array = Array::<f64>::with_len(4).unwrap();
        assert_eq!(array.as_slice(), &[0.0; 4]);
        assert_eq!(array.capacity(), 4);
    }

    #[test]
    fn test_get_out_of_range() {
        let array = array_of(&[1, 2]);
        assert_eq!(array.get(1), Ok(2));
        assert_eq!(
            array.get(2),
            Err(ArrayError::IndexOutOfRange { index: 2, length: 2 })
        );
    }

    #[test]
    fn test_set_beyond_length_zero_fills_gap() {
        let mut array = array_of(&[7, 8]);
        array.set(5, 42).unwrap();

        assert_eq!(array.len(), 6);
        assert_eq!(array.as_slice(), &[7, 8, 0, 0, 0, 42]);
    }

    #[test]
    fn test_set_within_length_keeps_length() {
        let mut array = array_of(&[1, 2, 3]);
        array.set(1, 9).unwrap();
        assert_eq!(array.as_slice(), &[1, 9, 3]);
        assert_eq!(array.capacity(), 3);
    }

    #[test]
    fn test_get_after_set_has_no_side_effects() {
        let mut array = Array::new();
        array.set(3, 1.5f64).unwrap();
        let (length, capacity) = (array.len(), array.capacity());

        for _ in 0..3 {
            assert_eq!(array.get(3), Ok(1.5));
            assert_eq!(array.len(), length);
            assert_eq!(array.capacity(), capacity);
        }
    }

    #[test]
    fn test_set_at_maximum_index_exceeds_capacity() {
        let mut array = array_of(&[1]);
        assert_eq!(
            array.set(u32::MAX, 3),
            Err(ArrayError::CapacityExceeded {
                requested: u32::MAX as usize + 1
            })
        );
        assert_eq!(array.as_slice(), &[1]);
    }

    #[test]
    fn test_set_past_capacity_limit_leaves_array_untouched() {
        let mut array = array_of(&[1, 2]);
        assert_eq!(
            array.set(MAX_CAPACITY as u32, 3),
            Err(ArrayError::CapacityExceeded {
                requested: MAX_CAPACITY + 1
            })
        );
        assert_eq!(array.len(), 2);
        assert_eq!(array.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_fill_negative_range() {
        let mut array = array_of(&[0, 0, 0, 0, 0]);
        array.fill(9, -2, -1).unwrap();
        assert_eq!(array.as_slice(), &[0, 0, 0, 9, 0]);
    }

    #[test]
    fn test_fill_defaults_to_end() {
        let mut array = array_of(&[1, 2, 3, 4]);
        array.fill_from(0, 1).unwrap();
        assert_eq!(array.as_slice(), &[1, 0, 0, 0]);
    }

    #[test]
    fn test_fill_inverted_range_is_noop() {
        let mut array = array_of(&[1, 2, 3]);
        array.fill(5, 2, 1).unwrap();
        assert_eq!(array.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_fill_rejects_out_of_range_bounds() {
        let mut array = array_of(&[1, 2, 3]);
        assert_eq!(
            array.fill(5, 3, 3),
            Err(ArrayError::IndexOutOfRange { index: 3, length: 3 })
        );
        assert_eq!(
            array.fill(5, 0, 4),
            Err(ArrayError::IndexOutOfRange { index: 4, length: 3 })
        );
        assert_eq!(
            array.fill(5, -4, 2),
            Err(ArrayError::IndexOutOfRange { index: -1, length: 3 })
        );
        assert_eq!(array.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_fill_on_empty_array_fails() {
        let mut array = Array::<i32>::new();
        assert!(matches!(
            array.fill_from(1, 0),
            Err(ArrayError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_push_returns_new_length() {
        let mut array = Array::new();
        assert_eq!(array.push(&[1, 2]), Ok(2));
        assert_eq!(array.push(&[3]), Ok(3));
        assert_eq!(array.push(&[]), Ok(3));
        assert_eq!(array.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_growth_policy() {
        let mut array = Array::new();
        array.push(&[0u8]).unwrap();
        assert_eq!(array.capacity(), DEFAULT_CAPACITY);

        for value in 1..16u8 {
            array.push(&[value]).unwrap();
        }
        assert_eq!(array.capacity(), 16);

        array.push(&[16]).unwrap();
        assert_eq!(array.len(), 17);
        assert_eq!(array.capacity(), 32);
        assert_eq!(array.get(0), Ok(0));
        assert_eq!(array.get(16), Ok(16));
    }

    #[test]
    fn test_growth_never_below_required_minimum() {
        let mut array = array_of(&[1, 2]);
        array.push(&[0; 40]).unwrap();
        assert_eq!(array.len(), 42);
        assert_eq!(array.capacity(), 42);
    }

    #[test]
    fn test_unshift_shifts_existing_elements() {
        let mut array = array_of(&[3, 4]);
        assert_eq!(array.unshift(&[1, 2]), Ok(4));
        assert_eq!(array.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_pop_and_shift() {
        let mut array = array_of(&[1, 2, 3]);
        assert_eq!(array.pop(), Ok(3));
        assert_eq!(array.shift(), Ok(1));
        assert_eq!(array.as_slice(), &[2]);
        assert_eq!(array.capacity(), 3);
    }

    #[test]
    fn test_pop_on_empty_array() {
        let mut array = Array::<i32>::new();
        assert_eq!(array.pop(), Err(ArrayError::EmptyArray));
        assert_eq!(array.shift(), Err(ArrayError::EmptyArray));
        assert_eq!(array.len(), 0);
    }

    #[test]
    fn test_resize_shrink_keeps_capacity() {
        let mut array = array_of(&[1, 2, 3, 4]);
        array.resize(1).unwrap();
        assert_eq!(array.len(), 1);
        assert_eq!(array.capacity(), 4);

        array.resize(3).unwrap();
        assert_eq!(array.as_slice(), &[1, 0, 0]);
    }

    #[test]
    fn test_resize_beyond_limit() {
        let mut array = Array::<u8>::new();
        assert_eq!(
            array.resize(MAX_CAPACITY + 1),
            Err(ArrayError::CapacityExceeded {
                requested: MAX_CAPACITY + 1
            })
        );
        assert_eq!(array.capacity(), 0);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut original = Array::new();
        original.push(&[1.0f64, 2.0]).unwrap();
        let copy = original.clone();

        original.set(0, 10.0).unwrap();
        assert_eq!(copy.as_slice(), &[1.0, 2.0]);
        assert_eq!(copy.capacity(), original.capacity());
    }

    #[test]
    fn test_take_empties_source() {
        let mut source = array_of(&[1, 2, 3]);
        let moved = std::mem::take(&mut source);
        assert_eq!(moved.len(), 3);
        assert_eq!(source.len(), 0);
        assert_eq!(source.capacity(), 0);
    }
}
