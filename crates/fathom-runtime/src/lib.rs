//! fathom runtime library.
//!
//! Provides the native support code linked into compiled programs:
//! - [`Array`], a manually managed growable array with the source language's
//!   Array semantics
//! - C ABI entry points (`fathom_array_*`) called from generated code

pub mod array;
pub mod error;
pub mod ffi;

pub use array::{Array, Element, DEFAULT_CAPACITY, MAX_CAPACITY};
pub use error::{ArrayError, ArrayResult, ArrayStatus};
