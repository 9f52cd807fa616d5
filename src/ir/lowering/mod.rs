use std::path::PathBuf;

use crate::{
    ast::common::{Ident, Span},
    driver::config::DatapackConfig,
    ir::{Operand, codes::CodeGenerators},
    scope::{ScopeIndex, SymbolIndex, SymbolKind, SymbolTable, types::Type},
};

mod errors;
mod expressions;
pub mod fallthrough;
mod functions;
mod lower;
mod statements;

pub use errors::LoweringError;
pub use lower::{EntryPoints, GLOBAL_INIT_LABEL, LoweredProgram, lower_program};
pub use statements::desugar_for;

/// Context to help build the IR.
#[derive(Debug)]
pub struct IrBuilder<'a> {
    pub symbols: &'a SymbolTable,
    pub codes: &'a mut CodeGenerators,
    pub config: &'a DatapackConfig,
    pub file_path: PathBuf,
    root: ScopeIndex,
    scopes: Vec<ScopeIndex>,
    /// The function whose body is being lowered.
    pub current_function: Option<SymbolIndex>,
}

impl<'a> IrBuilder<'a> {
    pub fn new(
        symbols: &'a SymbolTable,
        codes: &'a mut CodeGenerators,
        config: &'a DatapackConfig,
        file_path: PathBuf,
        root: ScopeIndex,
    ) -> Self {
        Self {
            symbols,
            codes,
            config,
            file_path,
            root,
            scopes: Vec::new(),
            current_function: None,
        }
    }

    pub fn get_file_path(&self) -> &PathBuf {
        &self.file_path
    }

    pub fn current_scope(&self) -> ScopeIndex {
        self.scopes.last().copied().unwrap_or(self.root)
    }

    /// Runs `f` with `scope` entered, if there is one.
    pub fn with_scope<T>(
        &mut self,
        scope: Option<ScopeIndex>,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        match scope {
            Some(scope) => {
                self.scopes.push(scope);
                let result = f(self);
                self.scopes.pop();
                result
            }
            None => f(self),
        }
    }

    pub fn resolve(&self, ident: &Ident) -> Result<SymbolIndex, LoweringError> {
        self.symbols
            .lookup(self.current_scope(), &ident.name)
            .ok_or_else(|| LoweringError::UndefinedSymbol {
                span: ident.span,
                name: ident.name.clone(),
                path: self.file_path.clone(),
            })
    }

    /// The storage slot of a variable or parameter.
    pub fn symbol_operand(&self, idx: SymbolIndex, span: Span) -> Result<Operand, LoweringError> {
        let symbol = self
            .symbols
            .get(idx)
            .ok_or_else(|| LoweringError::InternalError(format!("dangling symbol {idx:?}")))?;

        if let SymbolKind::Function(_) = symbol.kind {
            return Err(LoweringError::NotAVariable {
                span,
                name: symbol.name.clone(),
                path: self.file_path.clone(),
            });
        }

        operand_for(&symbol.ty, &symbol.code).ok_or_else(|| LoweringError::UnresolvedType {
            span,
            name: symbol.name.clone(),
            ty: symbol.ty.to_string(),
            path: self.file_path.clone(),
        })
    }

    /// A fresh temporary able to hold a value of `ty`.
    pub fn temp(&mut self, ty: &Type, span: Span) -> Result<Operand, LoweringError> {
        let code = self.codes.variables.next_code();
        operand_for(ty, &code).ok_or_else(|| LoweringError::UnresolvedType {
            span,
            name: format!("temporary {code}"),
            ty: ty.to_string(),
            path: self.file_path.clone(),
        })
    }

    /// A fresh temporary in the same storage class as `operand`.
    pub fn temp_like(&mut self, operand: &Operand) -> Operand {
        let code = self.codes.variables.next_code();
        match operand {
            Operand::Structured(_) => Operand::Structured(code),
            _ => Operand::Register(code),
        }
    }

    /// A fresh label name, e.g. `then_4`.
    pub fn next_label(&mut self, role: &str) -> String {
        format!("{role}_{}", self.codes.labels.next_code())
    }
}

/// The storage class a value of `ty` lives in.
fn operand_for(ty: &Type, code: &str) -> Option<Operand> {
    if !ty.is_value() {
        None
    } else if ty.is_storable_in_register() {
        Some(Operand::Register(code.to_string()))
    } else {
        Some(Operand::Structured(code.to_string()))
    }
}
