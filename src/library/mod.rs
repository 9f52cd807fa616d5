//! Intrinsic functions.
//!
//! A library function has no command sequence of its own: a call to it is
//! replaced by the commands its [`LibraryFunction::emit`] produces, operating
//! directly on the already lowered argument operands.

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::{
    ast::common::Span,
    driver::config::DatapackConfig,
    ir::{Operand, codes::CodeGenerators},
    scope::{FunctionImpl, ScopeIndex, SymbolIndex, SymbolTable, types::Type},
};

mod function;
mod print;

pub use function::RunFunction;
pub use print::Print;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LibraryError {
    #[error("argument {param:?} must be a constant, found {found}")]
    ExpectedConstant { param: &'static str, found: String },
    #[error("expected {expected} arguments, found {found}")]
    ArgumentCount { expected: usize, found: usize },
}

pub trait LibraryFunction: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Parameter names and types. Calls are checked against the count only,
    /// so a generic parameter may declare any type.
    fn params(&self) -> Vec<(&'static str, Type)>;

    fn return_type(&self) -> Type {
        Type::Void
    }

    /// Appends the commands implementing one call to `ctx`.
    /// `ret` is the slot the result must be written to, for non-void functions.
    fn emit(
        &self,
        ctx: &mut LibContext<'_>,
        args: &[Operand],
        ret: Option<&Operand>,
    ) -> Result<(), LibraryError>;
}

/// Collects the commands of one library call.
#[derive(Debug)]
pub struct LibContext<'a> {
    pub config: &'a DatapackConfig,
    commands: Vec<String>,
}

impl<'a> LibContext<'a> {
    pub fn new(config: &'a DatapackConfig) -> Self {
        Self {
            config,
            commands: Vec::new(),
        }
    }

    pub fn command(&mut self, command: impl Into<String>) {
        self.commands.push(command.into());
    }

    pub fn into_commands(self) -> Vec<String> {
        self.commands
    }
}

pub fn builtins() -> Vec<Arc<dyn LibraryFunction>> {
    vec![Arc::new(Print), Arc::new(RunFunction)]
}

/// Declares every builtin in `scope`, returning their symbols.
pub fn register_builtins(
    table: &mut SymbolTable,
    scope: ScopeIndex,
    codes: &mut CodeGenerators,
) -> Vec<SymbolIndex> {
    builtins()
        .into_iter()
        .map(|function| {
            let (idx, _) = table.declare_function(
                scope,
                function.name(),
                &function.params(),
                function.return_type(),
                FunctionImpl::Library(function.clone()),
                Span::default(),
                codes,
            );
            idx
        })
        .collect()
}

/// The text of a string constant, without its quotes.
pub(crate) fn unquote(constant: &str) -> String {
    serde_json::from_str::<String>(constant).unwrap_or_else(|_| constant.to_string())
}

fn expect_args(args: &[Operand], expected: usize) -> Result<(), LibraryError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(LibraryError::ArgumentCount {
            expected,
            found: args.len(),
        })
    }
}
