//! C ABI for arrays, called by compiled code.
//!
//! Arrays cross the boundary as owned heap handles. Every fallible entry
//! point returns an [`ArrayStatus`] and writes results through out-pointers.

use std::slice;

use crate::array::{Array, Element};
use crate::error::{ArrayResult, ArrayStatus};

fn into_handle<T: Element>(array: ArrayResult<Array<T>>) -> *mut Array<T> {
    match array {
        Ok(array) => Box::into_raw(Box::new(array)),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Run `operation` on the array behind `handle`, storing its result in `out`
/// when both are non-null.
///
/// # Safety
/// `handle` must be null or a live handle returned by a `*_new` function;
/// `out` must be null or valid for writes.
unsafe fn with_array<T: Element, R>(
    handle: *mut Array<T>,
    out: *mut R,
    operation: impl FnOnce(&mut Array<T>) -> ArrayResult<R>,
) -> ArrayStatus {
    // SAFETY: guaranteed by the caller.
    let Some(array) = (unsafe { handle.as_mut() }) else {
        return ArrayStatus::NullHandle;
    };

    match operation(array) {
        Ok(value) => {
            if !out.is_null() {
                // SAFETY: guaranteed by the caller.
                unsafe { out.write(value) };
            }
            ArrayStatus::Ok
        }
        Err(error) => error.into(),
    }
}

/// # Safety
/// `elements` must be valid for `count` reads, or `count` must be zero.
unsafe fn elements_slice<'a, T>(elements: *const T, count: u32) -> &'a [T] {
    if count == 0 || elements.is_null() {
        &[]
    } else {
        // SAFETY: guaranteed by the caller.
        unsafe { slice::from_raw_parts(elements, count as usize) }
    }
}

macro_rules! array_abi {
    (
        $ty:ty,
        new: $new:ident,
        free: $free:ident,
        length: $length:ident,
        get: $get:ident,
        set: $set:ident,
        fill: $fill:ident,
        push: $push:ident,
        unshift: $unshift:ident,
        pop: $pop:ident,
        shift: $shift:ident,
        resize: $resize:ident $(,)?
    ) => {
        /// Allocate an array of `length` zeroed elements. Returns null on failure.
        #[unsafe(no_mangle)]
        pub extern "C" fn $new(length: u32) -> *mut Array<$ty> {
            into_handle(Array::with_len(length as usize))
        }

        /// # Safety
        /// `handle` must be null or a live handle; it is invalid afterwards.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $free(handle: *mut Array<$ty>) {
            if !handle.is_null() {
                // SAFETY: guaranteed by the caller.
                drop(unsafe { Box::from_raw(handle) });
            }
        }

        /// # Safety
        /// `handle` must be null or a live handle.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $length(handle: *const Array<$ty>) -> u32 {
            // SAFETY: guaranteed by the caller.
            unsafe { handle.as_ref() }.map_or(0, |array| array.len() as u32)
        }

        /// # Safety
        /// `handle` must be null or a live handle; `out` must be valid for writes.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $get(handle: *mut Array<$ty>, index: u32, out: *mut $ty) -> ArrayStatus {
            unsafe { with_array(handle, out, |array| array.get(index)) }
        }

        /// # Safety
        /// `handle` must be null or a live handle.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $set(handle: *mut Array<$ty>, index: u32, value: $ty) -> ArrayStatus {
            unsafe { with_array(handle, std::ptr::null_mut(), |array| array.set(index, value)) }
        }

        /// # Safety
        /// `handle` must be null or a live handle.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $fill(
            handle: *mut Array<$ty>,
            value: $ty,
            start: i32,
            end: i32,
        ) -> ArrayStatus {
            unsafe { with_array(handle, std::ptr::null_mut(), |array| array.fill(value, start, end)) }
        }

        /// # Safety
        /// `handle` must be null or a live handle, `elements` valid for `count`
        /// reads, `out_length` null or valid for writes.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $push(
            handle: *mut Array<$ty>,
            elements: *const $ty,
            count: u32,
            out_length: *mut u32,
        ) -> ArrayStatus {
            let elements = unsafe { elements_slice(elements, count) };
            unsafe { with_array(handle, out_length, |array| array.push(elements).map(|n| n as u32)) }
        }

        /// # Safety
        /// Same contract as the push entry point.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $unshift(
            handle: *mut Array<$ty>,
            elements: *const $ty,
            count: u32,
            out_length: *mut u32,
        ) -> ArrayStatus {
            let elements = unsafe { elements_slice(elements, count) };
            unsafe { with_array(handle, out_length, |array| array.unshift(elements).map(|n| n as u32)) }
        }

        /// # Safety
        /// `handle` must be null or a live handle; `out` null or valid for writes.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $pop(handle: *mut Array<$ty>, out: *mut $ty) -> ArrayStatus {
            unsafe { with_array(handle, out, Array::pop) }
        }

        /// # Safety
        /// `handle` must be null or a live handle; `out` null or valid for writes.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $shift(handle: *mut Array<$ty>, out: *mut $ty) -> ArrayStatus {
            unsafe { with_array(handle, out, Array::shift) }
        }

        /// # Safety
        /// `handle` must be null or a live handle.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $resize(handle: *mut Array<$ty>, new_size: u32) -> ArrayStatus {
            unsafe { with_array(handle, std::ptr::null_mut(), |array| array.resize(new_size as usize)) }
        }
    };
}

array_abi!(
    f64,
    new: fathom_array_f64_new,
    free: fathom_array_f64_free,
    length: fathom_array_f64_length,
    get: fathom_array_f64_get,
    set: fathom_array_f64_set,
    fill: fathom_array_f64_fill,
    push: fathom_array_f64_push,
    unshift: fathom_array_f64_unshift,
    pop: fathom_array_f64_pop,
    shift: fathom_array_f64_shift,
    resize: fathom_array_f64_resize,
);

array_abi!(
    i32,
    new: fathom_array_i32_new,
    free: fathom_array_i32_free,
    length: fathom_array_i32_length,
    get: fathom_array_i32_get,
    set: fathom_array_i32_set,
    fill: fathom_array_i32_fill,
    push: fathom_array_i32_push,
    unshift: fathom_array_i32_unshift,
    pop: fathom_array_i32_pop,
    shift: fathom_array_i32_shift,
    resize: fathom_array_i32_resize,
);

array_abi!(
    bool,
    new: fathom_array_bool_new,
    free: fathom_array_bool_free,
    length: fathom_array_bool_length,
    get: fathom_array_bool_get,
    set: fathom_array_bool_set,
    fill: fathom_array_bool_fill,
    push: fathom_array_bool_push,
    unshift: fathom_array_bool_unshift,
    pop: fathom_array_bool_pop,
    shift: fathom_array_bool_shift,
    resize: fathom_array_bool_resize,
);
