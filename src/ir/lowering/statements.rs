use tracing::{debug, instrument};

use crate::{
    ast::{
        expressions::{Expression, ExpressionKind, Literal},
        statements::{
            AssignStmt, Block, ForStmt, IfStmt, ReturnStmt, Statement, VariableDef, WhileStmt,
        },
    },
    ir::{Comparator, Condition, Instruction, Label, Operand},
    scope::{SymbolKind, types::Type},
};

use super::{
    IrBuilder,
    errors::LoweringError,
    expressions::{lower_expression, lower_value},
    fallthrough::{self, Boundary},
};

pub(crate) fn lower_statement(
    builder: &mut IrBuilder,
    info: &Statement,
) -> Result<Vec<Instruction>, LoweringError> {
    match info {
        Statement::VariableDef(info) => lower_variable_def(builder, info),
        Statement::Assign(info) => lower_assign(builder, info),
        Statement::Expression(info) => {
            let mut out = Vec::new();
            lower_expression(builder, info, &mut out)?;
            Ok(out)
        }
        Statement::If(info) => lower_if_statement(builder, info),
        Statement::While(info) => lower_while(builder, info),
        Statement::For(info) => lower_for(builder, info),
        Statement::Return(info) => lower_return(builder, info),
        Statement::Block(info) => lower_block(builder, info),
        Statement::Command(info) => Ok(vec![Instruction::RawCommand(info.command.clone())]),
    }
}

pub(crate) fn lower_block(
    builder: &mut IrBuilder,
    info: &Block,
) -> Result<Vec<Instruction>, LoweringError> {
    builder.with_scope(info.scope, |builder| {
        lower_statements(builder, &info.statements)
    })
}

fn lower_statements(
    builder: &mut IrBuilder,
    statements: &[Statement],
) -> Result<Vec<Instruction>, LoweringError> {
    let mut out = Vec::new();
    for statement in statements {
        out.extend(lower_statement(builder, statement)?);
    }
    Ok(out)
}

#[instrument(level = "debug", skip_all, fields(name = ?info.name.name))]
pub(crate) fn lower_variable_def(
    builder: &mut IrBuilder,
    info: &VariableDef,
) -> Result<Vec<Instruction>, LoweringError> {
    let idx = builder.resolve(&info.name)?;
    let dst = builder.symbol_operand(idx, info.name.span)?;

    let mut out = Vec::new();
    let src = match &info.value {
        Some(value) => lower_value(builder, value, &mut out)?,
        None => {
            let symbol = &builder.symbols[idx];
            let default = symbol.ty.default_value().ok_or_else(|| {
                LoweringError::UnresolvedType {
                    span: info.span,
                    name: symbol.name.clone(),
                    ty: symbol.ty.to_string(),
                    path: builder.get_file_path().clone(),
                }
            })?;
            Operand::constant(default)
        }
    };
    out.push(Instruction::Move { src, dst });
    Ok(out)
}

#[instrument(level = "debug", skip_all, fields(name = ?info.target.name))]
fn lower_assign(
    builder: &mut IrBuilder,
    info: &AssignStmt,
) -> Result<Vec<Instruction>, LoweringError> {
    let mut out = Vec::new();
    let src = lower_value(builder, &info.value, &mut out)?;
    let idx = builder.resolve(&info.target)?;
    let dst = builder.symbol_operand(idx, info.target.span)?;
    out.push(Instruction::Move { src, dst });
    Ok(out)
}

/// Branches become labels of their own, entered by conditional invocation:
///
/// ```text
/// push cond
/// jump if cond == 1 then_N
/// pop cond
/// jump unless cond == 1 else_N
/// return 1 if flag == 1
/// link endif_N
/// then_N: ...
/// else_N: ...
/// endif_N (anchor): <rest of the enclosing sequence>
/// ```
///
/// With an else branch, the condition is read again after `then_N` returns.
/// A recursive call inside `then_N` reuses the same slot, so the slot is
/// saved around the first jump.
#[instrument(level = "debug", skip_all)]
fn lower_if_statement(
    builder: &mut IrBuilder,
    info: &IfStmt,
) -> Result<Vec<Instruction>, LoweringError> {
    let mut out = Vec::new();
    let mut value = lower_value(builder, &info.condition, &mut out)?;
    if let ExpressionKind::Identifier(_) = info.condition.kind {
        // The then branch may assign the variable before the else check reads it.
        let snapshot = builder.temp_like(&value);
        out.push(Instruction::Move {
            src: value,
            dst: snapshot.clone(),
        });
        value = snapshot;
    }
    let condition = fallthrough::holds(value);

    let then_label = builder.next_label("then");
    let else_label = info
        .else_block
        .as_ref()
        .map(|_| builder.next_label("else"));
    let end_label = builder.next_label("endif");
    debug!("if lowers into {then_label:?}, {else_label:?}, {end_label:?}");

    let saved = else_label.is_some() && !condition.left.is_constant();
    if saved {
        out.push(Instruction::Push(condition.left.clone()));
    }
    out.push(Instruction::JumpIf {
        condition: condition.clone(),
        target: then_label.clone(),
        fallthrough: true,
    });
    if saved {
        out.push(Instruction::Pop(condition.left.clone()));
    }
    if let Some(else_label) = &else_label {
        out.push(Instruction::JumpUnless {
            condition,
            target: else_label.clone(),
            fallthrough: true,
        });
    }
    out.push(fallthrough::after_invocation(Boundary::Branch));
    out.push(Instruction::Link {
        target: end_label.clone(),
    });

    out.push(Label::new(then_label).into());
    out.extend(lower_block(builder, &info.then_block)?);

    if let (Some(else_label), Some(else_block)) = (else_label, &info.else_block) {
        out.push(Label::new(else_label).into());
        out.extend(lower_block(builder, else_block)?);
    }

    out.push(Label::anchor(end_label).into());
    Ok(out)
}

/// The loop is a label that checks the condition, runs the body and invokes
/// itself again:
///
/// ```text
/// jump loop_N
/// return 1 if flag == 1
/// link endloop_N
/// loop_N: <cond>; return if cond != 1; <body>; jump loop_N (tail)
/// endloop_N (anchor): <rest of the enclosing sequence>
/// ```
///
/// Leaving `loop_N` is the jump to the end of the loop: the code after the
/// loop runs in the enclosing sequence through the anchor.
///
/// A command sequence can't jump back to an earlier command of its own, so
/// the only way to repeat the body is to invoke `loop_N` again. The body
/// therefore lives in `loop_N` rather than in the enclosing sequence, and a
/// `return` in it leaves through the fallthrough flag like one in a branch.
#[instrument(level = "debug", skip_all)]
fn lower_while(
    builder: &mut IrBuilder,
    info: &WhileStmt,
) -> Result<Vec<Instruction>, LoweringError> {
    let start_label = builder.next_label("loop");
    let end_label = builder.next_label("endloop");
    debug!("while lowers into {start_label:?}, {end_label:?}");

    let mut out = vec![
        Instruction::Jump {
            target: start_label.clone(),
            fallthrough: true,
        },
        fallthrough::after_invocation(Boundary::Branch),
        Instruction::Link {
            target: end_label.clone(),
        },
        Label::new(start_label.clone()).into(),
    ];

    let value = lower_value(builder, &info.condition, &mut out)?;
    out.push(Instruction::ReturnIf {
        condition: Condition::new(Comparator::Ne, value, fallthrough::sentinel()),
        value: None,
    });
    out.extend(lower_block(builder, &info.body)?);
    out.push(Instruction::Jump {
        target: start_label,
        fallthrough: false,
    });

    out.push(Label::anchor(end_label).into());
    Ok(out)
}

/// Rewrites `for (init; cond; step) body` as `init; while (cond) { body; step; }`.
///
/// The initializer is flattened into the returned statements instead of being
/// wrapped in a block of its own.
pub fn desugar_for(info: &ForStmt) -> Vec<Statement> {
    let mut statements = Vec::new();
    match info.init.as_deref() {
        Some(Statement::Block(block)) if block.scope.is_none() => {
            statements.extend(block.statements.iter().cloned());
        }
        Some(init) => statements.push(init.clone()),
        None => {}
    }

    let mut body = info.body.clone();
    if let Some(step) = &info.step {
        body.statements.push((**step).clone());
    }

    let condition = info.condition.clone().unwrap_or_else(|| Expression {
        kind: ExpressionKind::Literal(Literal::Bool(true)),
        ty: Type::Bool,
        span: info.span,
    });

    statements.push(Statement::While(WhileStmt {
        condition,
        body,
        span: info.span,
    }));
    statements
}

#[instrument(level = "debug", skip_all)]
fn lower_for(builder: &mut IrBuilder, info: &ForStmt) -> Result<Vec<Instruction>, LoweringError> {
    let statements = desugar_for(info);
    builder.with_scope(info.scope, |builder| {
        lower_statements(builder, &statements)
    })
}

#[instrument(level = "debug", skip_all)]
fn lower_return(
    builder: &mut IrBuilder,
    info: &ReturnStmt,
) -> Result<Vec<Instruction>, LoweringError> {
    let function = builder
        .current_function
        .ok_or_else(|| LoweringError::ReturnOutsideFunction {
            span: info.span,
            path: builder.get_file_path().clone(),
        })?;

    let ret = match &builder.symbols[function].kind {
        SymbolKind::Function(function) => function.ret,
        _ => {
            return Err(LoweringError::InternalError(format!(
                "current function {function:?} is not a function symbol"
            )));
        }
    };

    let mut out = Vec::new();
    if let Some(value) = &info.value {
        let src = lower_value(builder, value, &mut out)?;
        let dst = builder.symbol_operand(ret, info.span)?;
        out.push(Instruction::Move { src, dst });
    }
    out.push(fallthrough::early_return());
    Ok(out)
}
