use std::path::PathBuf;

use crate::{ast::common::Span, library::LibraryError};
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum LoweringError {
    #[error("use of undeclared symbol {name:?}")]
    UndefinedSymbol {
        span: Span,
        name: String,
        path: PathBuf,
    },
    #[error("{name:?} is not a function")]
    NotAFunction {
        span: Span,
        name: String,
        path: PathBuf,
    },
    #[error("function {name:?} can't be used as a value")]
    NotAVariable {
        span: Span,
        name: String,
        path: PathBuf,
    },
    #[error("expression has no value")]
    VoidValue { span: Span, path: PathBuf },
    #[error("{name:?} has unresolved type {ty}")]
    UnresolvedType {
        span: Span,
        name: String,
        ty: String,
        path: PathBuf,
    },
    #[error("function call parameter count mismatch, found {found}, needs {needs}")]
    CallParamCountMismatch {
        span: Span,
        found: usize,
        needs: usize,
        path: PathBuf,
    },
    #[error("return outside of a function")]
    ReturnOutsideFunction { span: Span, path: PathBuf },
    #[error("call to {name:?} failed: {source}")]
    LibraryCall {
        span: Span,
        name: String,
        source: LibraryError,
        path: PathBuf,
    },
    #[error("internal error: {0}")]
    InternalError(String),
}

impl LoweringError {
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UndefinedSymbol { span, .. }
            | Self::NotAFunction { span, .. }
            | Self::NotAVariable { span, .. }
            | Self::VoidValue { span, .. }
            | Self::UnresolvedType { span, .. }
            | Self::CallParamCountMismatch { span, .. }
            | Self::ReturnOutsideFunction { span, .. }
            | Self::LibraryCall { span, .. } => Some(*span),
            Self::InternalError(_) => None,
        }
    }
}
