use std::fmt;

use itertools::Itertools;

/// A resolved (or not yet resolved) source type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Float,
    Bool,
    String,
    Void,
    Function { params: Vec<Type>, ret: Box<Type> },
    /// A type name scope resolution has not bound yet.
    Unresolved(String),
}

impl Type {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// Whether values of this type fit in a scoreboard register.
    /// Everything else lives in structured storage.
    pub fn is_storable_in_register(&self) -> bool {
        matches!(self, Self::Int | Self::Bool)
    }

    /// Whether a value of this type can occupy a storage slot at all.
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Int | Self::Float | Self::Bool | Self::String)
    }

    /// The constant a variable of this type holds when defined without an initializer.
    pub fn default_value(&self) -> Option<&'static str> {
        match self {
            Self::Int | Self::Bool => Some("0"),
            Self::Float => Some("0f"),
            Self::String => Some("\"\""),
            Self::Void | Self::Function { .. } | Self::Unresolved(_) => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Bool => write!(f, "bool"),
            Self::String => write!(f, "string"),
            Self::Void => write!(f, "void"),
            Self::Function { params, ret } => {
                write!(f, "fn({}) -> {}", params.iter().join(", "), ret)
            }
            Self::Unresolved(name) => write!(f, "{name}?"),
        }
    }
}
