use tracing::{debug, instrument};

use crate::{
    ast::{
        common::Span,
        expressions::{self, Expression, ExpressionKind},
    },
    ir::{BinOp, Comparator, Instruction, Operand, UnOp},
    scope::types::Type,
};

use super::{IrBuilder, errors::LoweringError, functions::lower_fn_call};

/// Lowers `info`, appending the instructions computing it to `out`.
///
/// Returns the operand holding the value, or `None` for a void call.
#[instrument(level = "debug", skip_all)]
pub(crate) fn lower_expression(
    builder: &mut IrBuilder,
    info: &Expression,
    out: &mut Vec<Instruction>,
) -> Result<Option<Operand>, LoweringError> {
    let operand = match &info.kind {
        ExpressionKind::Literal(literal) => Operand::Constant(literal.to_constant()),
        ExpressionKind::Identifier(ident) => {
            let idx = builder.resolve(ident)?;
            builder.symbol_operand(idx, ident.span)?
        }
        ExpressionKind::Binary(lhs, op, rhs) => {
            lower_binary_op(builder, lhs, *op, rhs, &info.ty, info.span, out)?
        }
        ExpressionKind::Unary(op, value) => {
            lower_unary_op(builder, *op, value, &info.ty, info.span, out)?
        }
        ExpressionKind::Call(call) => return lower_fn_call(builder, call, out),
    };
    Ok(Some(operand))
}

/// Like [`lower_expression`], for places that need a value.
pub(crate) fn lower_value(
    builder: &mut IrBuilder,
    info: &Expression,
    out: &mut Vec<Instruction>,
) -> Result<Operand, LoweringError> {
    lower_expression(builder, info, out)?.ok_or_else(|| LoweringError::VoidValue {
        span: info.span,
        path: builder.get_file_path().clone(),
    })
}

fn lower_binary_op(
    builder: &mut IrBuilder,
    lhs: &Expression,
    op: expressions::BinaryOp,
    rhs: &Expression,
    ty: &Type,
    span: Span,
    out: &mut Vec<Instruction>,
) -> Result<Operand, LoweringError> {
    // Both sides are always evaluated, && and || do not short circuit.
    let mut left = lower_value(builder, lhs, out)?;
    let saved = contains_call(rhs) && !left.is_constant();
    if saved {
        left = save_across_calls(builder, lhs, left, out);
    }
    let right = lower_value(builder, rhs, out)?;
    if saved {
        out.push(Instruction::Pop(left.clone()));
    }

    let dst = builder.temp(ty, span)?;
    let op = binary_op(op);
    debug!("{dst} = {left} {op} {right}");
    out.push(Instruction::BinaryOp {
        op,
        dst: dst.clone(),
        left,
        right,
    });
    Ok(dst)
}

fn lower_unary_op(
    builder: &mut IrBuilder,
    op: expressions::UnaryOp,
    value: &Expression,
    ty: &Type,
    span: Span,
    out: &mut Vec<Instruction>,
) -> Result<Operand, LoweringError> {
    let operand = lower_value(builder, value, out)?;
    let dst = builder.temp(ty, span)?;
    let op = match op {
        expressions::UnaryOp::Neg => UnOp::Neg,
        expressions::UnaryOp::Not => UnOp::Not,
    };
    out.push(Instruction::UnaryOp {
        op,
        dst: dst.clone(),
        operand,
    });
    Ok(dst)
}

fn binary_op(op: expressions::BinaryOp) -> BinOp {
    use expressions::BinaryOp;

    match op {
        BinaryOp::Add => BinOp::Add,
        BinaryOp::Sub => BinOp::Sub,
        BinaryOp::Mul => BinOp::Mul,
        BinaryOp::Div => BinOp::Div,
        BinaryOp::Mod => BinOp::Mod,
        BinaryOp::Eq => BinOp::Compare(Comparator::Eq),
        BinaryOp::Ne => BinOp::Compare(Comparator::Ne),
        BinaryOp::Lt => BinOp::Compare(Comparator::Lt),
        BinaryOp::Le => BinOp::Compare(Comparator::Le),
        BinaryOp::Gt => BinOp::Compare(Comparator::Gt),
        BinaryOp::Ge => BinOp::Compare(Comparator::Ge),
        BinaryOp::And => BinOp::And,
        BinaryOp::Or => BinOp::Or,
    }
}

/// Keeps `value`, already computed from `info`, intact across the calls
/// lowered next. A variable is copied first, since a call may assign it. The
/// copy is then pushed, since a recursive call reuses the same slot. The
/// caller pops the returned operand once the calls are lowered.
pub(crate) fn save_across_calls(
    builder: &mut IrBuilder,
    info: &Expression,
    value: Operand,
    out: &mut Vec<Instruction>,
) -> Operand {
    let value = if matches!(info.kind, ExpressionKind::Identifier(_)) {
        let snapshot = builder.temp_like(&value);
        out.push(Instruction::Move {
            src: value,
            dst: snapshot.clone(),
        });
        snapshot
    } else {
        value
    };
    out.push(Instruction::Push(value.clone()));
    value
}

pub(crate) fn contains_call(info: &Expression) -> bool {
    match &info.kind {
        ExpressionKind::Call(_) => true,
        ExpressionKind::Binary(lhs, _, rhs) => contains_call(lhs) || contains_call(rhs),
        ExpressionKind::Unary(_, value) => contains_call(value),
        ExpressionKind::Literal(_) | ExpressionKind::Identifier(_) => false,
    }
}
