//! Arithmetic, comparisons and logic on scoreboard registers.

use crate::ir::{BinOp, Comparator, Condition, Operand, UnOp};

use super::{
    compiler::compile_move,
    context::{EmitContext, Severity},
};

/// A compiled condition, ready to guard a command with `execute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Test {
    /// The clause holds when the condition does not.
    pub negated: bool,
    pub clause: String,
}

impl Test {
    /// `execute if|unless <clause>`, testing the inverse when `invert` is set.
    pub fn execute(&self, invert: bool) -> String {
        let verb = if self.negated != invert {
            "unless"
        } else {
            "if"
        };
        format!("execute {verb} {}", self.clause)
    }
}

/// Turns a condition into an `execute` clause. Registers compared against
/// constants use a `matches` range, everything else is loaded into registers
/// and compared with each other.
pub(crate) fn compile_condition(
    ctx: &mut EmitContext,
    condition: &Condition,
    out: &mut Vec<String>,
) -> Option<Test> {
    let (comparator, negated) = match condition.comparator {
        Comparator::Ne => (Comparator::Eq, true),
        comparator => (comparator, false),
    };

    let clause = match (&condition.left, &condition.right) {
        (Operand::Register(code), right) if right.as_int().is_some() => {
            let value = right.as_int()?;
            format!("score {} matches {}", ctx.score(code), range(comparator, value))
        }
        (left, Operand::Register(code)) if left.as_int().is_some() => {
            let value = left.as_int()?;
            format!(
                "score {} matches {}",
                ctx.score(code),
                range(comparator.flipped(), value)
            )
        }
        (left, right) => {
            let left = materialize(ctx, left, out)?;
            let right = materialize(ctx, right, out)?;
            let op = match comparator {
                Comparator::Eq | Comparator::Ne => "=",
                Comparator::Lt => "<",
                Comparator::Le => "<=",
                Comparator::Gt => ">",
                Comparator::Ge => ">=",
            };
            format!("score {} {op} {}", ctx.score(&left), ctx.score(&right))
        }
    };

    Some(Test { negated, clause })
}

/// The `matches` range of values `x` with `x <comparator> value`.
fn range(comparator: Comparator, value: i64) -> String {
    match comparator {
        Comparator::Eq | Comparator::Ne => format!("{value}"),
        Comparator::Lt => format!("..{}", value - 1),
        Comparator::Le => format!("..{value}"),
        Comparator::Gt => format!("{}..", value + 1),
        Comparator::Ge => format!("{value}.."),
    }
}

/// The register holding `operand`, loading it into a scratch register if needed.
pub(crate) fn materialize(
    ctx: &mut EmitContext,
    operand: &Operand,
    out: &mut Vec<String>,
) -> Option<String> {
    match operand {
        Operand::Register(code) => Some(code.clone()),
        Operand::Constant(value) => match value.parse::<i32>() {
            Ok(value) => {
                let scratch = ctx.scratch();
                out.push(format!(
                    "scoreboard players set {} {value}",
                    ctx.score(&scratch)
                ));
                Some(scratch)
            }
            Err(_) => {
                ctx.diagnostic(
                    Severity::Error,
                    format!("constant {value} can't be loaded into a register"),
                    out,
                );
                None
            }
        },
        Operand::Structured(path) => {
            let scratch = ctx.scratch();
            out.push(format!(
                "execute store result score {} run data get {}",
                ctx.score(&scratch),
                ctx.storage(path)
            ));
            Some(scratch)
        }
    }
}

/// Copies `operand` away when it is the destination about to be overwritten.
fn detach(
    ctx: &mut EmitContext,
    operand: &Operand,
    dst: &Operand,
    out: &mut Vec<String>,
) -> Operand {
    if operand == dst {
        let scratch = Operand::Register(ctx.scratch());
        compile_move(ctx, operand, &scratch, out);
        scratch
    } else {
        operand.clone()
    }
}

fn register_destination<'o>(
    ctx: &mut EmitContext,
    dst: &'o Operand,
    what: &str,
    out: &mut Vec<String>,
) -> Option<&'o str> {
    match dst {
        Operand::Register(code) => Some(code),
        other => {
            ctx.diagnostic(
                Severity::Error,
                format!("{what} needs a register destination, found {other}"),
                out,
            );
            None
        }
    }
}

pub(crate) fn compile_binary(
    ctx: &mut EmitContext,
    op: BinOp,
    dst: &Operand,
    left: &Operand,
    right: &Operand,
    out: &mut Vec<String>,
) {
    match op {
        BinOp::Compare(comparator) => compile_comparison(ctx, comparator, dst, left, right, out),
        BinOp::And => {
            compile_arithmetic(ctx, BinOp::Mul, dst, left, right, out);
        }
        BinOp::Or => {
            if compile_arithmetic(ctx, BinOp::Add, dst, left, right, out) {
                if let Operand::Register(code) = dst {
                    let dst = ctx.score(code);
                    out.push(format!(
                        "execute if score {dst} matches 2.. run scoreboard players set {dst} 1"
                    ));
                }
            }
        }
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
            compile_arithmetic(ctx, op, dst, left, right, out);
        }
    }
}

/// `dst = left <op> right`. Returns whether anything besides a diagnostic was emitted.
fn compile_arithmetic(
    ctx: &mut EmitContext,
    op: BinOp,
    dst: &Operand,
    left: &Operand,
    right: &Operand,
    out: &mut Vec<String>,
) -> bool {
    let Some(dst_code) = register_destination(ctx, dst, "arithmetic", out) else {
        return false;
    };
    let right = detach(ctx, right, dst, out);
    compile_move(ctx, left, dst, out);
    apply(ctx, op, dst_code, &right, out)
}

/// `dst <op>= operand`, on a register already holding the left side.
fn apply(
    ctx: &mut EmitContext,
    op: BinOp,
    dst: &str,
    operand: &Operand,
    out: &mut Vec<String>,
) -> bool {
    let shortcut = match (op, operand.as_int()) {
        (BinOp::Add, Some(value)) if value >= 0 => Some(("add", value)),
        (BinOp::Add, Some(value)) => Some(("remove", -value)),
        (BinOp::Sub, Some(value)) if value >= 0 => Some(("remove", value)),
        (BinOp::Sub, Some(value)) => Some(("add", -value)),
        _ => None,
    };
    if let Some((verb, amount)) = shortcut.filter(|(_, amount)| *amount <= i64::from(i32::MAX)) {
        out.push(format!("scoreboard players {verb} {} {amount}", ctx.score(dst)));
        return true;
    }

    let symbol = match op {
        BinOp::Add => "+=",
        BinOp::Sub => "-=",
        BinOp::Mul => "*=",
        BinOp::Div => "/=",
        BinOp::Mod => "%=",
        other => {
            ctx.diagnostic(
                Severity::Error,
                format!("{other} is not an arithmetic operator"),
                out,
            );
            return false;
        }
    };
    let Some(register) = materialize(ctx, operand, out) else {
        return false;
    };
    out.push(format!(
        "scoreboard players operation {} {symbol} {}",
        ctx.score(dst),
        ctx.score(&register)
    ));
    true
}

/// `dst = left <comparator> right` as 0 or 1.
fn compile_comparison(
    ctx: &mut EmitContext,
    comparator: Comparator,
    dst: &Operand,
    left: &Operand,
    right: &Operand,
    out: &mut Vec<String>,
) {
    let Some(dst_code) = register_destination(ctx, dst, "comparison", out) else {
        return;
    };
    let left = detach(ctx, left, dst, out);
    let right = detach(ctx, right, dst, out);
    let Some(test) = compile_condition(ctx, &Condition::new(comparator, left, right), out) else {
        return;
    };

    let dst = ctx.score(dst_code);
    out.push(format!("scoreboard players set {dst} 0"));
    out.push(format!(
        "{} run scoreboard players set {dst} 1",
        test.execute(false)
    ));
}

/// `-x` is `0 - x`, `!x` is `1 - x`.
pub(crate) fn compile_unary(
    ctx: &mut EmitContext,
    op: UnOp,
    dst: &Operand,
    operand: &Operand,
    out: &mut Vec<String>,
) {
    let Some(dst_code) = register_destination(ctx, dst, "unary operator", out) else {
        return;
    };
    let operand = detach(ctx, operand, dst, out);
    let start = match op {
        UnOp::Neg => 0,
        UnOp::Not => 1,
    };
    out.push(format!(
        "scoreboard players set {} {start}",
        ctx.score(dst_code)
    ));
    apply(ctx, BinOp::Sub, dst_code, &operand, out);
}
