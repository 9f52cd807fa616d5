//! Typed, scope-annotated syntax tree.
//!
//! This is the input contract of the backend: every expression carries its
//! resolved [`Type`](crate::scope::types::Type) and every block that opens a
//! lexical scope carries the index of that scope in the
//! [`SymbolTable`](crate::scope::SymbolTable).

use std::path::PathBuf;

use functions::FunctionDef;
use statements::VariableDef;

use crate::scope::ScopeIndex;

pub mod common;
pub mod expressions;
pub mod functions;
pub mod statements;

/// A whole compilation unit.
#[derive(Clone, Debug)]
pub struct Program {
    pub file_path: PathBuf,
    /// The root scope, holding globals and function symbols.
    pub scope: ScopeIndex,
    pub globals: Vec<VariableDef>,
    pub functions: Vec<FunctionDef>,
}
