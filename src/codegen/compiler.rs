use tracing::{debug, instrument};

use crate::ir::{Instruction, Label, Operand, lowering::fallthrough::FLAG_HOLDER};

use super::{
    McFunction,
    calculation::{compile_binary, compile_condition, compile_unary},
    context::{EmitContext, Severity},
    errors::CodegenError,
};

/// Storage list saving registers across calls.
pub(crate) const REGISTER_STACK: &str = "_stack.register";
/// Storage list saving structured values across calls.
pub(crate) const STRUCTURED_STACK: &str = "_stack.structured";
/// Field of a structured stack entry holding the saved value.
const STACK_FIELD: &str = "value";

#[instrument(level = "debug", skip_all, fields(label = ?label.name))]
pub(crate) fn compile_label(
    ctx: &mut EmitContext,
    label: &Label,
) -> Result<McFunction, CodegenError> {
    ctx.current = label.name.clone();
    let mut commands = Vec::new();
    for instruction in &label.body {
        compile_instruction(ctx, instruction, &mut commands)?;
    }
    debug!("{} commands", commands.len());
    Ok(McFunction {
        name: label.name.clone(),
        commands,
    })
}

fn compile_instruction(
    ctx: &mut EmitContext,
    instruction: &Instruction,
    out: &mut Vec<String>,
) -> Result<(), CodegenError> {
    match instruction {
        Instruction::Label(label) => {
            return Err(CodegenError::NestedLabel {
                label: label.name.clone(),
                parent: ctx.current.clone(),
            });
        }
        Instruction::Link { target } => {
            return Err(CodegenError::UnmergedLink {
                label: ctx.current.clone(),
                target: target.clone(),
            });
        }
        Instruction::Move { src, dst } => compile_move(ctx, src, dst, out),
        Instruction::BinaryOp {
            op,
            dst,
            left,
            right,
        } => compile_binary(ctx, *op, dst, left, right, out),
        Instruction::UnaryOp { op, dst, operand } => compile_unary(ctx, *op, dst, operand, out),
        Instruction::Jump {
            target,
            fallthrough,
        } => compile_invoke(ctx, None, target, *fallthrough, out)?,
        Instruction::JumpIf {
            condition,
            target,
            fallthrough,
        }
        | Instruction::JumpUnless {
            condition,
            target,
            fallthrough,
        } => {
            let invert = matches!(instruction, Instruction::JumpUnless { .. });
            if let Some(test) = compile_condition(ctx, condition, out) {
                compile_invoke(ctx, Some(test.execute(invert)), target, *fallthrough, out)?;
            }
        }
        Instruction::Call { target } => compile_invoke(ctx, None, target, true, out)?,
        Instruction::Return { value } => {
            // Every early return raises the flag for the enclosing sequences.
            if let Some(value) = value {
                compile_move(ctx, value, &Operand::Register(FLAG_HOLDER.to_string()), out);
            }
            if let Some(command) = return_command(ctx, value.as_ref(), out) {
                out.push(command);
            }
        }
        Instruction::ReturnIf { condition, value } => {
            if let Some(test) = compile_condition(ctx, condition, out) {
                if let Some(command) = return_command(ctx, value.as_ref(), out) {
                    out.push(format!("{} run {command}", test.execute(false)));
                }
            }
        }
        Instruction::Push(operand) => compile_push(ctx, operand, out),
        Instruction::Pop(operand) => compile_pop(ctx, operand, out),
        Instruction::RawCommand(command) => out.push(command.clone()),
    }
    Ok(())
}

/// Copies `src` into `dst` for every source and destination storage class.
pub(crate) fn compile_move(
    ctx: &mut EmitContext,
    src: &Operand,
    dst: &Operand,
    out: &mut Vec<String>,
) {
    let command = match (src, dst) {
        (_, Operand::Constant(value)) => {
            ctx.diagnostic(
                Severity::Error,
                format!("can't move {src} into constant {value}"),
                out,
            );
            return;
        }
        (Operand::Constant(value), Operand::Register(dst)) => match value.parse::<i32>() {
            Ok(value) => format!("scoreboard players set {} {value}", ctx.score(dst)),
            Err(_) => {
                ctx.diagnostic(
                    Severity::Error,
                    format!("constant {value} doesn't fit register {dst}"),
                    out,
                );
                return;
            }
        },
        (Operand::Register(src), Operand::Register(dst)) => format!(
            "scoreboard players operation {} = {}",
            ctx.score(dst),
            ctx.score(src)
        ),
        (Operand::Structured(src), Operand::Register(dst)) => format!(
            "execute store result score {} run data get {}",
            ctx.score(dst),
            ctx.storage(src)
        ),
        (Operand::Constant(value), Operand::Structured(dst)) => {
            format!("data modify {} set value {value}", ctx.storage(dst))
        }
        (Operand::Register(src), Operand::Structured(dst)) => format!(
            "execute store result {} float 1 run scoreboard players get {}",
            ctx.storage(dst),
            ctx.score(src)
        ),
        (Operand::Structured(src), Operand::Structured(dst)) => format!(
            "data modify {} set from {}",
            ctx.storage(dst),
            ctx.storage(src)
        ),
    };
    out.push(command);
}

/// `function` resumes the current sequence afterwards, `return run function`
/// hands control over for good.
fn compile_invoke(
    ctx: &mut EmitContext,
    guard: Option<String>,
    target: &str,
    fallthrough: bool,
    out: &mut Vec<String>,
) -> Result<(), CodegenError> {
    if !ctx.has_label(target) {
        return Err(CodegenError::UnknownLabel {
            label: target.to_string(),
            from: ctx.current.clone(),
        });
    }

    let invoke = if fallthrough {
        format!("function {}", ctx.function(target))
    } else {
        format!("return run function {}", ctx.function(target))
    };
    out.push(match guard {
        Some(guard) => format!("{guard} run {invoke}"),
        None => invoke,
    });
    Ok(())
}

fn return_command(
    ctx: &mut EmitContext,
    value: Option<&Operand>,
    out: &mut Vec<String>,
) -> Option<String> {
    match value {
        None => Some("return 0".to_string()),
        Some(Operand::Register(code)) => Some(format!(
            "return run scoreboard players get {}",
            ctx.score(code)
        )),
        Some(Operand::Structured(path)) => {
            Some(format!("return run data get {}", ctx.storage(path)))
        }
        Some(Operand::Constant(value)) => match value.parse::<i32>() {
            Ok(value) => Some(format!("return {value}")),
            Err(_) => {
                ctx.diagnostic(
                    Severity::Error,
                    format!("can't return non integer constant {value}"),
                    out,
                );
                None
            }
        },
    }
}

fn compile_push(ctx: &mut EmitContext, operand: &Operand, out: &mut Vec<String>) {
    match operand {
        Operand::Register(code) => {
            let stack = ctx.storage(REGISTER_STACK);
            out.push(format!("data modify {stack} append value 0"));
            out.push(format!(
                "execute store result {stack}[-1] int 1 run scoreboard players get {}",
                ctx.score(code)
            ));
        }
        Operand::Structured(path) => {
            // Lists hold one tag type, so floats and strings are wrapped in
            // compounds. The empty compound keeps pushes and pops paired when
            // `path` is unset.
            let stack = ctx.storage(STRUCTURED_STACK);
            out.push(format!("data modify {stack} append value {{}}"));
            out.push(format!(
                "data modify {stack}[-1].{STACK_FIELD} set from {}",
                ctx.storage(path)
            ));
        }
        Operand::Constant(value) => ctx.diagnostic(
            Severity::Warning,
            format!("pushing constant {value} has no effect"),
            out,
        ),
    }
}

fn compile_pop(ctx: &mut EmitContext, operand: &Operand, out: &mut Vec<String>) {
    match operand {
        Operand::Register(code) => {
            let stack = ctx.storage(REGISTER_STACK);
            out.push(format!(
                "execute store result score {} run data get {stack}[-1]",
                ctx.score(code)
            ));
            out.push(format!("data remove {stack}[-1]"));
        }
        Operand::Structured(path) => {
            let stack = ctx.storage(STRUCTURED_STACK);
            out.push(format!(
                "data modify {} set from {stack}[-1].{STACK_FIELD}",
                ctx.storage(path)
            ));
            out.push(format!("data remove {stack}[-1]"));
        }
        Operand::Constant(value) => ctx.diagnostic(
            Severity::Error,
            format!("can't pop into constant {value}"),
            out,
        ),
    }
}
