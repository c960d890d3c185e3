//! Per-function generation state.
//!
//! A context wraps the Cranelift function builder for one function body and
//! is mutated by exactly one generator call at a time. Expression generators
//! leave their result on an operand stack; statement generators consume it.

use std::collections::HashMap;

use cranelift_codegen::ir::{Block, InstBuilder, Value, types};
use cranelift_frontend::FunctionBuilder;
use cranelift_module::{FuncId, Module};
use cranelift_object::ObjectModule;
use fathom_core::{Diagnostic, DiagnosticCategory, SyntaxNode, ValueType};
use tracing::trace;

use crate::dispatch::GeneratorTable;
use crate::errors::CompilationResult;

/// An SSA value together with its source type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypedValue {
    pub value: Value,
    pub ty: ValueType,
}

/// A function known to the compilation unit.
#[derive(Clone, Debug)]
pub struct FunctionSignature {
    pub id: FuncId,
    pub params: Vec<ValueType>,
    pub returns: ValueType,
}

pub struct CodeGenerationContext<'a, 'f> {
    pub(crate) builder: FunctionBuilder<'f>,
    module: &'a mut ObjectModule,
    functions: &'a HashMap<String, FunctionSignature>,
    table: &'a GeneratorTable,
    scopes: Vec<HashMap<String, TypedValue>>,
    operands: Vec<TypedValue>,
    return_type: ValueType,
    terminated: bool,
}

impl<'a, 'f> CodeGenerationContext<'a, 'f> {
    pub(crate) fn new(
        builder: FunctionBuilder<'f>,
        module: &'a mut ObjectModule,
        functions: &'a HashMap<String, FunctionSignature>,
        table: &'a GeneratorTable,
        return_type: ValueType,
    ) -> Self {
        Self {
            builder,
            module,
            functions,
            table,
            scopes: vec![HashMap::new()],
            operands: Vec::new(),
            return_type,
            terminated: false,
        }
    }

    /// Generate code for `node` through the dispatch table.
    pub fn generate(&mut self, node: &SyntaxNode) -> CompilationResult<()> {
        let table = self.table;
        table.generate(node, self)
    }

    /// Generate an expression and take its value off the operand stack.
    pub fn generate_value(&mut self, node: &SyntaxNode) -> CompilationResult<TypedValue> {
        let depth = self.operands.len();
        self.generate(node)?;
        if self.operands.len() <= depth {
            return Err(Diagnostic::new(
                node,
                DiagnosticCategory::TypeMismatch,
                format!("`{}` does not produce a value", node.kind),
            )
            .into());
        }
        self.pop_value(node)
    }

    pub fn push_value(&mut self, value: TypedValue) {
        self.operands.push(value);
    }

    pub fn pop_value(&mut self, node: &SyntaxNode) -> CompilationResult<TypedValue> {
        self.operands.pop().ok_or_else(|| {
            Diagnostic::new(node, DiagnosticCategory::MalformedNode, "missing operand").into()
        })
    }

    pub fn operand_depth(&self) -> usize {
        self.operands.len()
    }

    /// Drop operands pushed above `depth`.
    pub fn discard_operands(&mut self, depth: usize) {
        self.operands.truncate(depth);
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn exit_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn define(&mut self, name: impl Into<String>, value: TypedValue) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), value);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<TypedValue> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    pub fn function(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(name)
    }

    pub fn return_type(&self) -> ValueType {
        self.return_type
    }

    /// Whether the current block already ends in a terminator.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn create_block(&mut self) -> Block {
        self.builder.create_block()
    }

    /// Continue emitting into `block`.
    pub fn switch_to(&mut self, block: Block) {
        self.builder.switch_to_block(block);
        self.terminated = false;
    }

    pub fn seal(&mut self, block: Block) {
        self.builder.seal_block(block);
    }

    pub fn jump(&mut self, block: Block) {
        self.builder.ins().jump(block, &[]);
        self.terminated = true;
    }

    pub fn ret(&mut self, values: &[Value]) {
        self.builder.ins().return_(values);
        self.terminated = true;
    }

    /// Call `callee` with `args`, returning its single result if any.
    pub fn call(&mut self, callee: FuncId, args: &[Value]) -> Option<Value> {
        let func_ref = self.module.declare_func_in_func(callee, self.builder.func);
        let call = self.builder.ins().call(func_ref, args);
        self.builder.inst_results(call).first().copied()
    }

    /// Terminate the function body and finalize the builder.
    ///
    /// A body that can fall off its end is only valid for `void` functions.
    pub(crate) fn finish(mut self, function: &SyntaxNode) -> CompilationResult<()> {
        if !self.terminated {
            match self.return_type {
                ValueType::Void => self.ret(&[]),
                // Every path already returned; this block is dead
                _ if self.builder.is_unreachable() => self.ret_default(),
                ty => {
                    return Err(Diagnostic::new(
                        function,
                        DiagnosticCategory::MissingReturn,
                        format!(
                            "function `{}` must return a value of type `{ty}` on every path",
                            function.text()
                        ),
                    )
                    .into());
                }
            }
        }

        trace!("finalizing `{}`", function.text());
        self.builder.finalize();
        Ok(())
    }

    /// Return the zero value of the function's return type. Only used to
    /// terminate blocks no path can reach.
    pub(crate) fn ret_default(&mut self) {
        match self.return_type {
            ValueType::Void => self.ret(&[]),
            ty => {
                let zero = self.zero(ty);
                self.ret(&[zero]);
            }
        }
    }

    fn zero(&mut self, ty: ValueType) -> Value {
        match ty {
            ValueType::Number => self.builder.ins().f64const(0.0),
            ValueType::Int => self.builder.ins().iconst(types::I32, 0),
            ValueType::Boolean | ValueType::Void => self.builder.ins().iconst(types::I8, 0),
        }
    }
}
