//! Mapping of source value types onto Cranelift types.

use cranelift_codegen::ir::{AbiParam, Type, types};
use fathom_core::ValueType;

/// Cranelift type of a value, `None` for `void`.
pub fn clif_type(ty: ValueType) -> Option<Type> {
    match ty {
        ValueType::Number => Some(types::F64),
        ValueType::Int => Some(types::I32),
        // Comparisons produce i8, so booleans use it too
        ValueType::Boolean => Some(types::I8),
        ValueType::Void => None,
    }
}

pub fn abi_param(ty: ValueType) -> Option<AbiParam> {
    clif_type(ty).map(AbiParam::new)
}
