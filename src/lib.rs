pub mod ast;
pub mod check;
pub mod codegen;
pub mod driver;
pub mod ir;
pub mod library;
pub mod scope;
