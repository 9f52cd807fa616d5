//! Early return propagation.
//!
//! A `return` command only leaves the sequence it runs in. Branches and loop
//! bodies are sequences of their own, so a return inside one sets the flag
//! register before leaving, and the sequence that invoked it checks the flag
//! right afterwards and leaves as well. The check repeats at every branch
//! boundary up to the function's own sequence. Calls clear the flag, which
//! stops the unwinding at the function boundary.
//!
//! All flag traffic goes through this module.

use crate::ir::{Comparator, Condition, Instruction, Operand};

/// Scoreboard holder of the flag. Code generators never produce `"0"`.
pub const FLAG_HOLDER: &str = "0";

/// Value a propagating return carries, whatever the function returns.
pub const SENTINEL: &str = "1";

pub fn flag() -> Operand {
    Operand::Register(FLAG_HOLDER.to_string())
}

pub fn sentinel() -> Operand {
    Operand::constant(SENTINEL)
}

/// Whether a condition value equals the sentinel.
pub fn holds(value: Operand) -> Condition {
    Condition::new(Comparator::Eq, value, sentinel())
}

/// The kind of sequence boundary an invocation crosses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// An if branch or loop, part of the current function.
    Branch,
    /// A user function call.
    Call,
}

/// The instruction that must directly follow an invocation across `boundary`.
pub fn after_invocation(boundary: Boundary) -> Instruction {
    match boundary {
        Boundary::Branch => Instruction::ReturnIf {
            condition: holds(flag()),
            value: Some(sentinel()),
        },
        Boundary::Call => reset(),
    }
}

pub fn reset() -> Instruction {
    Instruction::Move {
        src: Operand::constant("0"),
        dst: flag(),
    }
}

/// Leaves the current sequence and raises the flag.
pub fn early_return() -> Instruction {
    Instruction::Return {
        value: Some(sentinel()),
    }
}
