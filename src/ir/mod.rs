//! Linear intermediate representation.
//!
//! Lowering produces a flat `Vec<Instruction>` where [`Instruction::Label`]
//! markers separate the named command sequences. The
//! [nesting pass](passes::nest) moves every instruction into the body of the
//! label preceding it, and [link-merging](passes::link_merge) splices anchor
//! bodies in place of their [`Instruction::Link`].

use std::fmt;

use itertools::Itertools;

pub mod codes;
pub mod lowering;
pub mod passes;

/// A value an instruction reads or writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    /// Compile time constant, already in target syntax.
    Constant(String),
    /// Scoreboard holder backed value.
    Register(String),
    /// Storage path backed value.
    Structured(String),
}

impl Operand {
    pub fn constant(value: impl Into<String>) -> Self {
        Self::Constant(value.into())
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Self::Constant(_))
    }

    /// The constant as an integer, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Constant(value) => value.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => write!(f, "{value}"),
            Self::Register(code) => write!(f, "%{code}"),
            Self::Structured(code) => write!(f, "${code}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparator {
    /// The comparator that holds with both sides swapped.
    pub fn flipped(self) -> Self {
        match self {
            Self::Eq => Self::Eq,
            Self::Ne => Self::Ne,
            Self::Lt => Self::Gt,
            Self::Le => Self::Ge,
            Self::Gt => Self::Lt,
            Self::Ge => Self::Le,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Condition {
    pub comparator: Comparator,
    pub left: Operand,
    pub right: Operand,
}

impl Condition {
    pub fn new(comparator: Comparator, left: Operand, right: Operand) -> Self {
        Self {
            comparator,
            left,
            right,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.comparator, self.right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Compare(Comparator),
    And,
    Or,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "+"),
            Self::Sub => write!(f, "-"),
            Self::Mul => write!(f, "*"),
            Self::Div => write!(f, "/"),
            Self::Mod => write!(f, "%"),
            Self::Compare(comparator) => write!(f, "{comparator}"),
            Self::And => write!(f, "&&"),
            Self::Or => write!(f, "||"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOp {
    Neg,
    Not,
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Neg => "-",
            Self::Not => "!",
        })
    }
}

/// A named command sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    /// Anchors only exist to be spliced by a single [`Instruction::Link`].
    pub is_anchor: bool,
    pub body: Vec<Instruction>,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_anchor: false,
            body: Vec::new(),
        }
    }

    pub fn anchor(name: impl Into<String>) -> Self {
        Self {
            is_anchor: true,
            ..Self::new(name)
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let anchor = if self.is_anchor { " (anchor)" } else { "" };
        writeln!(f, "{}{}:", self.name, anchor)?;
        for instruction in &self.body {
            writeln!(f, "    {instruction}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Label(Label),
    Move {
        src: Operand,
        dst: Operand,
    },
    BinaryOp {
        op: BinOp,
        dst: Operand,
        left: Operand,
        right: Operand,
    },
    UnaryOp {
        op: UnOp,
        dst: Operand,
        operand: Operand,
    },
    /// Invoke `target`. With `fallthrough` the current sequence resumes
    /// afterwards, without it control never comes back.
    Jump {
        target: String,
        fallthrough: bool,
    },
    JumpIf {
        condition: Condition,
        target: String,
        fallthrough: bool,
    },
    JumpUnless {
        condition: Condition,
        target: String,
        fallthrough: bool,
    },
    Call {
        target: String,
    },
    /// Placeholder replaced by the body of `target` during link-merging.
    Link {
        target: String,
    },
    Return {
        value: Option<Operand>,
    },
    ReturnIf {
        condition: Condition,
        value: Option<Operand>,
    },
    /// Save the current value of a slot on the storage stack.
    Push(Operand),
    /// Restore a slot from the top of the storage stack.
    Pop(Operand),
    RawCommand(String),
}

impl Instruction {
    /// The label this instruction transfers control to, if any.
    pub fn invoked_label(&self) -> Option<&str> {
        match self {
            Self::Jump { target, .. }
            | Self::JumpIf { target, .. }
            | Self::JumpUnless { target, .. }
            | Self::Call { target } => Some(target),
            _ => None,
        }
    }
}

impl From<Label> for Instruction {
    fn from(label: Label) -> Self {
        Self::Label(label)
    }
}

fn fmt_jump(f: &mut fmt::Formatter<'_>, target: &str, fallthrough: bool) -> fmt::Result {
    if fallthrough {
        write!(f, "{target}")
    } else {
        write!(f, "{target} (tail)")
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label(label) if label.body.is_empty() => {
                let anchor = if label.is_anchor { " (anchor)" } else { "" };
                write!(f, "{}{}:", label.name, anchor)
            }
            Self::Label(label) => write!(f, "{}", label.to_string().trim_end()),
            Self::Move { src, dst } => write!(f, "{dst} = {src}"),
            Self::BinaryOp {
                op,
                dst,
                left,
                right,
            } => write!(f, "{dst} = {left} {op} {right}"),
            Self::UnaryOp { op, dst, operand } => write!(f, "{dst} = {op}{operand}"),
            Self::Jump {
                target,
                fallthrough,
            } => {
                write!(f, "jump ")?;
                fmt_jump(f, target, *fallthrough)
            }
            Self::JumpIf {
                condition,
                target,
                fallthrough,
            } => {
                write!(f, "jump if {condition} ")?;
                fmt_jump(f, target, *fallthrough)
            }
            Self::JumpUnless {
                condition,
                target,
                fallthrough,
            } => {
                write!(f, "jump unless {condition} ")?;
                fmt_jump(f, target, *fallthrough)
            }
            Self::Call { target } => write!(f, "call {target}"),
            Self::Link { target } => write!(f, "link {target}"),
            Self::Return { value } => match value {
                Some(value) => write!(f, "return {value}"),
                None => write!(f, "return"),
            },
            Self::ReturnIf { condition, value } => match value {
                Some(value) => write!(f, "return {value} if {condition}"),
                None => write!(f, "return if {condition}"),
            },
            Self::Push(operand) => write!(f, "push {operand}"),
            Self::Pop(operand) => write!(f, "pop {operand}"),
            Self::RawCommand(command) => write!(f, "/{command}"),
        }
    }
}

/// Renders a flat instruction stream, one instruction per line.
pub fn display_instructions(instructions: &[Instruction]) -> String {
    instructions.iter().join("\n")
}
