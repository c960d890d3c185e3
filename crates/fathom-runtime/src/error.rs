//! Error types for runtime array operations.

use derive_more::{Display, Error};

pub type ArrayResult<T> = Result<T, ArrayError>;

/// Failure of an array operation. The array is left untouched.
#[derive(Clone, Copy, Debug, Display, Error, PartialEq, Eq)]
pub enum ArrayError {
    #[display("Index {index} is out of range for length {length}")]
    IndexOutOfRange { index: i64, length: usize },

    #[display("Array is empty")]
    EmptyArray,

    #[display("Array size {requested} exceeds the maximum of {}", crate::array::MAX_CAPACITY)]
    CapacityExceeded { requested: usize },

    #[display("Failed to allocate storage for {capacity} elements")]
    OutOfMemory { capacity: usize },
}

/// Status codes returned across the C ABI.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayStatus {
    Ok = 0,
    IndexOutOfRange = 1,
    EmptyArray = 2,
    CapacityExceeded = 3,
    OutOfMemory = 4,
    NullHandle = 5,
}

impl From<ArrayError> for ArrayStatus {
    fn from(error: ArrayError) -> Self {
        match error {
            ArrayError::IndexOutOfRange { .. } => ArrayStatus::IndexOutOfRange,
            ArrayError::EmptyArray => ArrayStatus::EmptyArray,
            ArrayError::CapacityExceeded { .. } => ArrayStatus::CapacityExceeded,
            ArrayError::OutOfMemory { .. } => ArrayStatus::OutOfMemory,
        }
    }
}
