use crate::scope::{ScopeIndex, types::Type};

use super::{
    common::{Ident, Span},
    expressions::Expression,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    VariableDef(VariableDef),
    Assign(AssignStmt),
    Expression(Expression),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Return(ReturnStmt),
    Block(Block),
    /// A raw target command, passed through untouched.
    Command(CommandStmt),
}

/// A sequence of statements, optionally opening its own lexical scope.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub scope: Option<ScopeIndex>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariableDef {
    pub name: Ident,
    pub ty: Type,
    pub value: Option<Expression>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssignStmt {
    pub target: Ident,
    pub value: Expression,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IfStmt {
    pub condition: Expression,
    pub then_block: Block,
    pub else_block: Option<Block>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WhileStmt {
    pub condition: Expression,
    pub body: Block,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ForStmt {
    pub init: Option<Box<Statement>>,
    /// A missing condition loops forever.
    pub condition: Option<Expression>,
    pub step: Option<Box<Statement>>,
    pub body: Block,
    /// The scope holding the variables declared by `init`.
    pub scope: Option<ScopeIndex>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expression>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CommandStmt {
    pub command: String,
    pub span: Span,
}
