//! Generators for the supported syntax kinds.
//!
//! Node layouts expected from the frontend:
//! - literals and identifiers carry their token in `text`
//! - unary and binary expressions carry the operator in `text` and their
//!   operands as children
//! - calls carry the callee name in `text` and the arguments as children
//! - variable statements carry the bound name in `text` and the initializer
//!   as the only child
//! - if statements have children `[condition, then, else?]`

use cranelift_codegen::ir::condcodes::{FloatCC, IntCC};
use cranelift_codegen::ir::{InstBuilder, Value, types};
use fathom_core::{Diagnostic, DiagnosticCategory, SyntaxNode, ValueType};

use crate::context::{CodeGenerationContext, TypedValue};
use crate::errors::CompilationResult;

type Ctx<'c, 'a, 'f> = &'c mut CodeGenerationContext<'a, 'f>;

fn malformed(node: &SyntaxNode, message: impl Into<String>) -> Diagnostic {
    Diagnostic::new(node, DiagnosticCategory::MalformedNode, message)
}

fn type_mismatch(node: &SyntaxNode, expected: ValueType, found: ValueType) -> Diagnostic {
    Diagnostic::new(
        node,
        DiagnosticCategory::TypeMismatch,
        format!("expected `{expected}`, found `{found}`"),
    )
}

fn unsupported_operator(node: &SyntaxNode, operand: ValueType) -> Diagnostic {
    Diagnostic::new(
        node,
        DiagnosticCategory::UnsupportedOperator,
        format!("operator `{}` is not supported for `{operand}`", node.text()),
    )
}

fn expect_children(node: &SyntaxNode, count: usize) -> Result<&[SyntaxNode], Diagnostic> {
    if node.children.len() == count {
        Ok(&node.children)
    } else {
        Err(malformed(
            node,
            format!(
                "`{}` expects {count} child node(s), found {}",
                node.kind,
                node.children.len()
            ),
        ))
    }
}

pub fn numeric_literal(node: &SyntaxNode, ctx: Ctx<'_, '_, '_>) -> CompilationResult<()> {
    let text = node.text().replace('_', "");
    let ty = node.ty.unwrap_or(ValueType::Number);

    let value = match ty {
        ValueType::Number => {
            let number = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                Some(hex) => i64::from_str_radix(hex, 16).ok().map(|n| n as f64),
                None => text.parse::<f64>().ok(),
            };
            let number = number.ok_or_else(|| malformed(node, format!("invalid number `{text}`")))?;
            ctx.builder.ins().f64const(number)
        }
        ValueType::Int => {
            let int = text
                .parse::<i32>()
                .map_err(|_| malformed(node, format!("invalid int `{text}`")))?;
            ctx.builder.ins().iconst(types::I32, i64::from(int))
        }
        other => return Err(type_mismatch(node, ValueType::Number, other).into()),
    };

    ctx.push_value(TypedValue { value, ty });
    Ok(())
}

pub fn boolean_literal(node: &SyntaxNode, ctx: Ctx<'_, '_, '_>) -> CompilationResult<()> {
    let flag = match node.text() {
        "true" => 1,
        "false" => 0,
        other => return Err(malformed(node, format!("invalid boolean `{other}`")).into()),
    };

    let value = ctx.builder.ins().iconst(types::I8, flag);
    ctx.push_value(TypedValue {
        value,
        ty: ValueType::Boolean,
    });
    Ok(())
}

pub fn identifier(node: &SyntaxNode, ctx: Ctx<'_, '_, '_>) -> CompilationResult<()> {
    let value = ctx.lookup(node.text()).ok_or_else(|| {
        Diagnostic::new(
            node,
            DiagnosticCategory::UnknownIdentifier,
            format!("cannot find `{}` in this scope", node.text()),
        )
    })?;
    ctx.push_value(value);
    Ok(())
}

pub fn parenthesized(node: &SyntaxNode, ctx: Ctx<'_, '_, '_>) -> CompilationResult<()> {
    let children = expect_children(node, 1)?;
    let value = ctx.generate_value(&children[0])?;
    ctx.push_value(value);
    Ok(())
}

pub fn prefix_unary(node: &SyntaxNode, ctx: Ctx<'_, '_, '_>) -> CompilationResult<()> {
    let children = expect_children(node, 1)?;
    let operand = ctx.generate_value(&children[0])?;

    let value = match (node.text(), operand.ty) {
        ("+", ValueType::Number | ValueType::Int) => operand.value,
        ("-", ValueType::Number) => ctx.builder.ins().fneg(operand.value),
        ("-", ValueType::Int) => ctx.builder.ins().ineg(operand.value),
        ("!", ValueType::Boolean) => ctx.builder.ins().icmp_imm(IntCC::Equal, operand.value, 0),
        (_, ty) => return Err(unsupported_operator(node, ty).into()),
    };

    ctx.push_value(TypedValue {
        value,
        ty: operand.ty,
    });
    Ok(())
}

fn float_condition(op: &str) -> Option<FloatCC> {
    Some(match op {
        "<" => FloatCC::LessThan,
        "<=" => FloatCC::LessThanOrEqual,
        ">" => FloatCC::GreaterThan,
        ">=" => FloatCC::GreaterThanOrEqual,
        "==" | "===" => FloatCC::Equal,
        "!=" | "!==" => FloatCC::NotEqual,
        _ => return None,
    })
}

fn int_condition(op: &str) -> Option<IntCC> {
    Some(match op {
        "<" => IntCC::SignedLessThan,
        "<=" => IntCC::SignedLessThanOrEqual,
        ">" => IntCC::SignedGreaterThan,
        ">=" => IntCC::SignedGreaterThanOrEqual,
        "==" | "===" => IntCC::Equal,
        "!=" | "!==" => IntCC::NotEqual,
        _ => return None,
    })
}

pub fn binary(node: &SyntaxNode, ctx: Ctx<'_, '_, '_>) -> CompilationResult<()> {
    let children = expect_children(node, 2)?;
    let lhs = ctx.generate_value(&children[0])?;
    let rhs = ctx.generate_value(&children[1])?;
    if lhs.ty != rhs.ty {
        return Err(type_mismatch(&children[1], lhs.ty, rhs.ty).into());
    }

    let (a, b) = (lhs.value, rhs.value);
    let op = node.text();
    let ins = ctx.builder.ins();
    let (value, ty): (Value, ValueType) = match lhs.ty {
        ValueType::Number => match op {
            "+" => (ins.fadd(a, b), ValueType::Number),
            "-" => (ins.fsub(a, b), ValueType::Number),
            "*" => (ins.fmul(a, b), ValueType::Number),
            "/" => (ins.fdiv(a, b), ValueType::Number),
            _ => match float_condition(op) {
                Some(cc) => (ins.fcmp(cc, a, b), ValueType::Boolean),
                None => return Err(unsupported_operator(node, lhs.ty).into()),
            },
        },
        ValueType::Int => match op {
            "+" => (ins.iadd(a, b), ValueType::Int),
            "-" => (ins.isub(a, b), ValueType::Int),
            "*" => (ins.imul(a, b), ValueType::Int),
            "/" => (ins.sdiv(a, b), ValueType::Int),
            "%" => (ins.srem(a, b), ValueType::Int),
            _ => match int_condition(op) {
                Some(cc) => (ins.icmp(cc, a, b), ValueType::Boolean),
                None => return Err(unsupported_operator(node, lhs.ty).into()),
            },
        },
        ValueType::Boolean => match op {
            "==" | "===" => (ins.icmp(IntCC::Equal, a, b), ValueType::Boolean),
            "!=" | "!==" => (ins.icmp(IntCC::NotEqual, a, b), ValueType::Boolean),
            _ => return Err(unsupported_operator(node, lhs.ty).into()),
        },
        ValueType::Void => return Err(unsupported_operator(node, lhs.ty).into()),
    };

    ctx.push_value(TypedValue { value, ty });
    Ok(())
}

pub fn call(node: &SyntaxNode, ctx: Ctx<'_, '_, '_>) -> CompilationResult<()> {
    let name = node.text();
    let signature = ctx.function(name).cloned().ok_or_else(|| {
        Diagnostic::new(
            node,
            DiagnosticCategory::UnknownFunction,
            format!("cannot find function `{name}`"),
        )
    })?;

    if signature.params.len() != node.children.len() {
        return Err(Diagnostic::new(
            node,
            DiagnosticCategory::TypeMismatch,
            format!(
                "`{name}` takes {} argument(s) but {} were supplied",
                signature.params.len(),
                node.children.len()
            ),
        )
        .into());
    }

    let mut args = Vec::with_capacity(node.children.len());
    for (arg, expected) in node.children.iter().zip(&signature.params) {
        let value = ctx.generate_value(arg)?;
        if value.ty != *expected {
            return Err(type_mismatch(arg, *expected, value.ty).into());
        }
        args.push(value.value);
    }

    if let Some(value) = ctx.call(signature.id, &args) {
        ctx.push_value(TypedValue {
            value,
            ty: signature.returns,
        });
    }
    Ok(())
}

pub fn variable_statement(node: &SyntaxNode, ctx: Ctx<'_, '_, '_>) -> CompilationResult<()> {
    let children = expect_children(node, 1)?;
    let value = ctx.generate_value(&children[0])?;
    if let Some(declared) = node.ty
        && declared != value.ty
    {
        return Err(type_mismatch(&children[0], declared, value.ty).into());
    }

    ctx.define(node.text(), value);
    Ok(())
}

pub fn expression_statement(node: &SyntaxNode, ctx: Ctx<'_, '_, '_>) -> CompilationResult<()> {
    let children = expect_children(node, 1)?;
    let depth = ctx.operand_depth();
    ctx.generate(&children[0])?;
    ctx.discard_operands(depth);
    Ok(())
}

pub fn return_statement(node: &SyntaxNode, ctx: Ctx<'_, '_, '_>) -> CompilationResult<()> {
    let expected = ctx.return_type();
    match node.children.as_slice() {
        [] if expected == ValueType::Void => ctx.ret(&[]),
        [] => return Err(type_mismatch(node, expected, ValueType::Void).into()),
        [value] => {
            let returned = ctx.generate_value(value)?;
            if returned.ty != expected {
                return Err(type_mismatch(value, expected, returned.ty).into());
            }
            ctx.ret(&[returned.value]);
        }
        _ => return Err(malformed(node, "return takes at most one expression").into()),
    }
    Ok(())
}

pub fn if_statement(node: &SyntaxNode, ctx: Ctx<'_, '_, '_>) -> CompilationResult<()> {
    let (condition, then_branch, else_branch) = match node.children.as_slice() {
        [condition, then_branch] => (condition, then_branch, None),
        [condition, then_branch, else_branch] => (condition, then_branch, Some(else_branch)),
        _ => return Err(malformed(node, "if statement expects 2 or 3 child nodes").into()),
    };

    let cond = ctx.generate_value(condition)?;
    if cond.ty != ValueType::Boolean {
        return Err(type_mismatch(condition, ValueType::Boolean, cond.ty).into());
    }

    let then_block = ctx.create_block();
    let merge_block = ctx.create_block();
    let else_block = match else_branch {
        Some(_) => ctx.create_block(),
        None => merge_block,
    };

    ctx.builder
        .ins()
        .brif(cond.value, then_block, &[], else_block, &[]);

    for (block, branch) in [(then_block, Some(then_branch)), (else_block, else_branch)] {
        let Some(branch) = branch else {
            continue;
        };
        ctx.switch_to(block);
        ctx.seal(block);
        // Bindings made in a branch do not dominate the merge block
        ctx.enter_scope();
        ctx.generate(branch)?;
        ctx.exit_scope();
        if !ctx.is_terminated() {
            ctx.jump(merge_block);
        }
    }

    ctx.switch_to(merge_block);
    ctx.seal(merge_block);
    Ok(())
}

pub fn block(node: &SyntaxNode, ctx: Ctx<'_, '_, '_>) -> CompilationResult<()> {
    ctx.enter_scope();
    let mut dead = false;
    for statement in &node.children {
        // Statements after a return never run but still go through dispatch
        if ctx.is_terminated() {
            let unreachable = ctx.create_block();
            ctx.switch_to(unreachable);
            ctx.seal(unreachable);
            dead = true;
        }
        ctx.generate(statement)?;
    }
    if dead && !ctx.is_terminated() {
        ctx.ret_default();
    }
    ctx.exit_scope();
    Ok(())
}
