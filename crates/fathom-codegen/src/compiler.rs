//! Compilation of one unit to a native object file.
//!
//! A unit is a `SourceFile` node whose children are function declarations:
//!
//! - `text`: function name, `ty`: return type (`void` when absent)
//! - `Parameter` children, each with a name in `text` and a type in `ty`
//! - an optional `Block` child as the body
//!
//! Declarations with a body are exported from the object; body-less ones are
//! imported and left for the linker to resolve.

use std::collections::HashMap;

use cranelift_codegen::ir::{AbiParam, Signature};
use cranelift_codegen::settings::{self, Configurable};
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_module::{Linkage, Module};
use cranelift_object::{ObjectBuilder, ObjectModule};
use fathom_core::{Diagnostic, DiagnosticCategory, SyntaxKind, SyntaxNode, ValueType};
use target_lexicon::Triple;
use tracing::debug;

use crate::context::{CodeGenerationContext, FunctionSignature, TypedValue};
use crate::dispatch::GeneratorTable;
use crate::errors::{CompilationErrorKind, CompilationResult};
use crate::types::abi_param;

#[derive(Clone, Debug)]
pub struct CompilerOptions {
    /// Target triple; the host when `None`.
    pub target: Option<Triple>,
    /// Name of the unit, used for the object file and its symbol table.
    pub unit_name: String,
}

impl CompilerOptions {
    pub fn new(unit_name: impl Into<String>) -> Self {
        Self {
            target: None,
            unit_name: unit_name.into(),
        }
    }
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self::new("unit")
    }
}

/// A successfully compiled unit.
#[derive(Clone, Debug)]
pub struct CompiledUnit {
    pub name: String,
    /// The object file bytes for the target.
    pub object: Vec<u8>,
    /// Functions defined by the unit.
    pub exported: Vec<String>,
    /// Functions the unit calls but does not define.
    pub imported: Vec<String>,
}

/// A declared function, before its body is generated.
struct Declaration<'n> {
    node: &'n SyntaxNode,
    name: String,
    params: Vec<(String, ValueType)>,
    body: Option<&'n SyntaxNode>,
}

pub struct UnitCompiler {
    module: ObjectModule,
    table: GeneratorTable,
    name: String,
}

impl UnitCompiler {
    pub fn new(options: &CompilerOptions) -> CompilationResult<Self> {
        let target = options.target.clone().unwrap_or_else(Triple::host);
        let triple = target.to_string();
        let target_error = |reason: String| CompilationErrorKind::Target {
            triple: triple.clone(),
            reason,
        };

        let mut flag_builder = settings::builder();
        for (name, value) in [
            ("use_colocated_libcalls", "false"),
            ("is_pic", "false"),
            ("opt_level", "speed"),
        ] {
            flag_builder
                .set(name, value)
                .map_err(|e| target_error(e.to_string()))?;
        }

        let isa = cranelift_codegen::isa::lookup(target)
            .map_err(|e| target_error(e.to_string()))?
            .finish(settings::Flags::new(flag_builder))
            .map_err(|e| target_error(e.to_string()))?;

        let object_builder = ObjectBuilder::new(
            isa,
            options.unit_name.clone(),
            cranelift_module::default_libcall_names(),
        )?;

        Ok(Self {
            module: ObjectModule::new(object_builder),
            table: GeneratorTable::standard(),
            name: options.unit_name.clone(),
        })
    }

    /// Replace the dispatch table.
    pub fn with_table(mut self, table: GeneratorTable) -> Self {
        self.table = table;
        self
    }

    /// Compile `unit`. Every diagnostic in the unit is collected before
    /// failing; a unit with any diagnostic produces no object.
    pub fn compile(mut self, unit: &SyntaxNode) -> CompilationResult<CompiledUnit> {
        debug!("compiling unit `{}`", self.name);
        if unit.kind != SyntaxKind::SourceFile {
            return Err(Diagnostic::unsupported_syntax(unit).into());
        }

        let mut diagnostics = Vec::new();
        let mut declarations = Vec::new();
        let mut functions = HashMap::new();

        for item in &unit.children {
            if item.kind != SyntaxKind::FunctionDeclaration {
                diagnostics.push(Diagnostic::unsupported_syntax(item));
                continue;
            }

            match self.declare(item, &functions) {
                Ok((declaration, signature)) => {
                    functions.insert(declaration.name.clone(), signature);
                    declarations.push(declaration);
                }
                Err(error) if !error.diagnostics().is_empty() => {
                    diagnostics.extend_from_slice(error.diagnostics());
                }
                Err(error) => return Err(error),
            }
        }

        for declaration in &declarations {
            let Some(body) = declaration.body else {
                continue;
            };
            match self.define(declaration, body, &functions) {
                Ok(()) => {}
                Err(error) if !error.diagnostics().is_empty() => {
                    diagnostics.extend_from_slice(error.diagnostics());
                }
                Err(error) => return Err(error),
            }
        }

        if !diagnostics.is_empty() {
            debug!("unit `{}` has {} diagnostic(s)", self.name, diagnostics.len());
            return Err(CompilationErrorKind::Diagnostics(diagnostics).into());
        }

        let (exported, imported): (Vec<_>, Vec<_>) = declarations
            .iter()
            .partition(|declaration| declaration.body.is_some());
        let exported = exported.into_iter().map(|d| d.name.clone()).collect();
        let imported = imported.into_iter().map(|d| d.name.clone()).collect();

        let object = self.module.finish().emit()?;
        Ok(CompiledUnit {
            name: self.name,
            object,
            exported,
            imported,
        })
    }

    fn declare<'n>(
        &mut self,
        node: &'n SyntaxNode,
        functions: &HashMap<String, FunctionSignature>,
    ) -> CompilationResult<(Declaration<'n>, FunctionSignature)> {
        let name = node.text();
        if name.is_empty() {
            return Err(Diagnostic::new(
                node,
                DiagnosticCategory::MalformedNode,
                "function declaration without a name",
            )
            .into());
        }
        if functions.contains_key(name) {
            return Err(Diagnostic::new(
                node,
                DiagnosticCategory::MalformedNode,
                format!("function `{name}` is declared more than once"),
            )
            .into());
        }

        let mut sig: Signature = self.module.make_signature();
        let mut params = Vec::new();
        let mut body = None;

        for child in &node.children {
            match child.kind {
                SyntaxKind::Parameter => {
                    let ty = child.ty.ok_or_else(|| {
                        Diagnostic::new(
                            child,
                            DiagnosticCategory::MalformedNode,
                            format!("parameter `{}` has no type", child.text()),
                        )
                    })?;
                    let param: AbiParam = abi_param(ty).ok_or_else(|| {
                        Diagnostic::new(
                            child,
                            DiagnosticCategory::TypeMismatch,
                            format!("parameter `{}` cannot be `void`", child.text()),
                        )
                    })?;
                    sig.params.push(param);
                    params.push((child.text().to_string(), ty));
                }
                SyntaxKind::Block if body.is_none() => body = Some(child),
                _ => return Err(Diagnostic::unsupported_syntax(child).into()),
            }
        }

        let returns = node.ty.unwrap_or(ValueType::Void);
        sig.returns.extend(abi_param(returns));

        let linkage = if body.is_some() {
            Linkage::Export
        } else {
            Linkage::Import
        };
        let id = self.module.declare_function(name, linkage, &sig)?;
        debug!("declared `{name}` ({linkage:?})");

        let signature = FunctionSignature {
            id,
            params: params.iter().map(|(_, ty)| *ty).collect(),
            returns,
        };
        let declaration = Declaration {
            node,
            name: name.to_string(),
            params,
            body,
        };
        Ok((declaration, signature))
    }

    fn define(
        &mut self,
        declaration: &Declaration<'_>,
        body: &SyntaxNode,
        functions: &HashMap<String, FunctionSignature>,
    ) -> CompilationResult<()> {
        let Some(signature) = functions.get(&declaration.name) else {
            return Ok(());
        };

        let mut ctx = self.module.make_context();
        ctx.func.signature = self
            .module
            .declarations()
            .get_function_decl(signature.id)
            .signature
            .clone();

        let mut func_ctx = FunctionBuilderContext::new();
        let mut builder = FunctionBuilder::new(&mut ctx.func, &mut func_ctx);

        let entry_block = builder.create_block();
        builder.append_block_params_for_function_params(entry_block);
        builder.switch_to_block(entry_block);
        builder.seal_block(entry_block);
        let param_values = builder.block_params(entry_block).to_vec();

        let mut generation = CodeGenerationContext::new(
            builder,
            &mut self.module,
            functions,
            &self.table,
            signature.returns,
        );
        for ((name, ty), value) in declaration.params.iter().zip(param_values) {
            generation.define(name.clone(), TypedValue { value, ty: *ty });
        }

        generation.generate(body)?;
        generation.finish(declaration.node)?;

        self.module.define_function(signature.id, &mut ctx)?;
        debug!("defined `{}`", declaration.name);
        Ok(())
    }
}
