use crate::scope::ScopeIndex;

use super::{
    common::{Ident, Span},
    statements::Block,
};

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDef {
    pub name: Ident,
    pub modifiers: Vec<Modifier>,
    /// The scope holding the parameters and the return value symbol.
    pub scope: ScopeIndex,
    pub body: Block,
    pub span: Span,
}

/// Marks a function as an entry point of the generated datapack.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// Run once when the datapack is (re)loaded.
    Load,
    /// Run every game tick.
    Tick,
    /// Added to an arbitrary function tag, e.g. `mypack:on_join`.
    Tag(String),
}
