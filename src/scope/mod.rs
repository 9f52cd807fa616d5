//! Symbols, scopes and types.
//!
//! Scopes form a tree stored in an arena: a scope refers to its parent by
//! index, and lookups walk the parent chain so the nearest declaration wins.
//! Every symbol gets its storage code from the shared [`CodeGenerators`] at
//! declaration time.

use std::{collections::HashMap, ops::Index, sync::Arc};

use tracing::trace;
use typed_generational_arena::{SmallSlab, SmallSlabIndex};

use crate::{ast::common::Span, ir::codes::CodeGenerators, library::LibraryFunction};

use types::Type;

pub mod types;

pub type ScopeIndex = SmallSlabIndex<Scope>;
pub type SymbolIndex = SmallSlabIndex<Symbol>;

#[derive(Debug, Clone)]
pub struct Scope {
    pub name: String,
    pub parent: Option<ScopeIndex>,
    pub symbols: HashMap<String, SymbolIndex>,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    /// Unique storage code, used as scoreboard holder or storage path.
    pub code: String,
    pub ty: Type,
    pub kind: SymbolKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function(FunctionSymbol),
}

#[derive(Debug, Clone)]
pub struct FunctionSymbol {
    pub params: Vec<SymbolIndex>,
    /// Dedicated slot the function writes its result to.
    pub ret: SymbolIndex,
    pub implementation: FunctionImpl,
}

#[derive(Debug, Clone)]
pub enum FunctionImpl {
    User,
    Library(Arc<dyn LibraryFunction>),
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    pub scopes: SmallSlab<Scope>,
    pub symbols: SmallSlab<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: SmallSlab::new(),
            symbols: SmallSlab::new(),
        }
    }

    pub fn create_scope(&mut self, name: &str, parent: Option<ScopeIndex>) -> ScopeIndex {
        self.scopes.insert(Scope {
            name: name.to_string(),
            parent,
            symbols: HashMap::new(),
        })
    }

    pub fn declare_variable(
        &mut self,
        scope: ScopeIndex,
        name: &str,
        ty: Type,
        span: Span,
        codes: &mut CodeGenerators,
    ) -> SymbolIndex {
        self.declare(scope, name, ty, SymbolKind::Variable, span, codes)
    }

    /// Declares a function in `scope` and opens the scope holding its parameters.
    pub fn declare_function(
        &mut self,
        scope: ScopeIndex,
        name: &str,
        params: &[(&str, Type)],
        ret: Type,
        implementation: FunctionImpl,
        span: Span,
        codes: &mut CodeGenerators,
    ) -> (SymbolIndex, ScopeIndex) {
        let fn_scope = self.create_scope(name, Some(scope));

        let param_idxs = params
            .iter()
            .map(|(param, ty)| {
                self.declare(
                    fn_scope,
                    param,
                    ty.clone(),
                    SymbolKind::Parameter,
                    span,
                    codes,
                )
            })
            .collect();

        // The return slot is reachable only through the function symbol.
        let ret_idx = self.symbols.insert(Symbol {
            name: format!("{name}#return"),
            code: codes.variables.next_code(),
            ty: ret.clone(),
            kind: SymbolKind::Variable,
            span,
        });

        let symbol = Symbol {
            name: name.to_string(),
            code: codes.labels.next_code(),
            ty: Type::Function {
                params: params.iter().map(|(_, ty)| ty.clone()).collect(),
                ret: Box::new(ret),
            },
            kind: SymbolKind::Function(FunctionSymbol {
                params: param_idxs,
                ret: ret_idx,
                implementation,
            }),
            span,
        };
        trace!("declared function {:?} as {:?}", symbol.name, symbol.code);
        let idx = self.symbols.insert(symbol);
        self.scopes[scope].symbols.insert(name.to_string(), idx);

        (idx, fn_scope)
    }

    fn declare(
        &mut self,
        scope: ScopeIndex,
        name: &str,
        ty: Type,
        kind: SymbolKind,
        span: Span,
        codes: &mut CodeGenerators,
    ) -> SymbolIndex {
        let symbol = Symbol {
            name: name.to_string(),
            code: codes.variables.next_code(),
            ty,
            kind,
            span,
        };
        trace!("declared {:?} as {:?}", symbol.name, symbol.code);
        let idx = self.symbols.insert(symbol);
        self.scopes[scope].symbols.insert(name.to_string(), idx);
        idx
    }

    /// Finds `name` starting at `scope`, walking outwards.
    pub fn lookup(&self, scope: ScopeIndex, name: &str) -> Option<SymbolIndex> {
        let mut current = Some(scope);
        while let Some(idx) = current {
            let scope = self.scopes.get(idx)?;
            if let Some(symbol) = scope.symbols.get(name) {
                return Some(*symbol);
            }
            current = scope.parent;
        }
        None
    }

    pub fn get(&self, idx: SymbolIndex) -> Option<&Symbol> {
        self.symbols.get(idx)
    }

    /// Binds a still unresolved symbol type. Returns false if it was already concrete.
    pub fn refine_type(&mut self, idx: SymbolIndex, ty: Type) -> bool {
        match self.symbols.get_mut(idx) {
            Some(symbol) if matches!(symbol.ty, Type::Unresolved(_)) => {
                symbol.ty = ty;
                true
            }
            _ => false,
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<SymbolIndex> for SymbolTable {
    type Output = Symbol;

    fn index(&self, index: SymbolIndex) -> &Self::Output {
        &self.symbols[index]
    }
}
