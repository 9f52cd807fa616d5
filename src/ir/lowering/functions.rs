use std::sync::Arc;

use tracing::{debug, instrument};

use crate::{
    ast::{expressions::FnCallOp, functions::FunctionDef},
    ir::{Instruction, Label, Operand},
    library::{LibContext, LibraryFunction},
    scope::{FunctionImpl, FunctionSymbol, SymbolKind, types::Type},
};

use super::{
    IrBuilder,
    errors::LoweringError,
    expressions::{contains_call, lower_value, save_across_calls},
    fallthrough::{self, Boundary},
    statements::lower_block,
};

/// Lowers a function into its label, returning the label name and the instructions.
#[instrument(level = "debug", skip_all, fields(name = ?func.name.name))]
pub(crate) fn lower_func(
    builder: &mut IrBuilder,
    func: &FunctionDef,
) -> Result<(String, Vec<Instruction>), LoweringError> {
    debug!("lowering function");
    let symbols = builder.symbols;
    let idx = builder.resolve(&func.name)?;
    let symbol = &symbols[idx];

    if !matches!(
        symbol.kind,
        SymbolKind::Function(FunctionSymbol {
            implementation: FunctionImpl::User,
            ..
        })
    ) {
        return Err(LoweringError::NotAFunction {
            span: func.name.span,
            name: func.name.name.clone(),
            path: builder.get_file_path().clone(),
        });
    }

    builder.current_function = Some(idx);
    let body = builder.with_scope(Some(func.scope), |builder| lower_block(builder, &func.body));
    builder.current_function = None;

    let mut instructions = vec![Label::new(symbol.code.clone()).into(), fallthrough::reset()];
    instructions.extend(body?);

    Ok((symbol.code.clone(), instructions))
}

/// Lowers a call, returning the operand holding its result if it has one.
#[instrument(level = "debug", skip_all, fields(target = ?info.target.name))]
pub(crate) fn lower_fn_call(
    builder: &mut IrBuilder,
    info: &FnCallOp,
    out: &mut Vec<Instruction>,
) -> Result<Option<Operand>, LoweringError> {
    let symbols = builder.symbols;
    let idx = builder.resolve(&info.target)?;
    let symbol = &symbols[idx];

    let SymbolKind::Function(function) = &symbol.kind else {
        return Err(LoweringError::NotAFunction {
            span: info.target.span,
            name: info.target.name.clone(),
            path: builder.get_file_path().clone(),
        });
    };

    if info.args.len() != function.params.len() {
        return Err(LoweringError::CallParamCountMismatch {
            span: info.span,
            found: info.args.len(),
            needs: function.params.len(),
            path: builder.get_file_path().clone(),
        });
    }

    let mut args = Vec::with_capacity(info.args.len());
    let mut saved = Vec::new();
    for (position, arg) in info.args.iter().enumerate() {
        let mut value = lower_value(builder, arg, out)?;
        if !value.is_constant() && info.args[position + 1..].iter().any(contains_call) {
            value = save_across_calls(builder, arg, value, out);
            saved.push(value.clone());
        }
        args.push(value);
    }
    for value in saved.into_iter().rev() {
        out.push(Instruction::Pop(value));
    }

    match &function.implementation {
        FunctionImpl::Library(library) => lower_library_call(builder, library, info, &args, out),
        FunctionImpl::User => {
            let ret = &symbols[function.ret];
            let mut params = Vec::with_capacity(function.params.len());
            for param in &function.params {
                params.push(builder.symbol_operand(*param, info.span)?);
            }

            // Snapshot variables so writing one parameter can't change a later argument.
            let args: Vec<Operand> = args
                .into_iter()
                .map(|arg| match arg {
                    Operand::Constant(_) => arg,
                    _ => {
                        let snapshot = builder.temp_like(&arg);
                        out.push(Instruction::Move {
                            src: arg,
                            dst: snapshot.clone(),
                        });
                        snapshot
                    }
                })
                .collect();

            for (param, arg) in params.iter().zip(args) {
                out.push(Instruction::Push(param.clone()));
                out.push(Instruction::Move {
                    src: arg,
                    dst: param.clone(),
                });
            }
            out.push(Instruction::Call {
                target: symbol.code.clone(),
            });
            out.push(fallthrough::after_invocation(Boundary::Call));
            for param in params.iter().rev() {
                out.push(Instruction::Pop(param.clone()));
            }

            if ret.ty == Type::Void {
                return Ok(None);
            }
            let value = builder.symbol_operand(function.ret, info.span)?;
            let result = builder.temp(&ret.ty, info.span)?;
            out.push(Instruction::Move {
                src: value,
                dst: result.clone(),
            });
            Ok(Some(result))
        }
    }
}

/// Splices the commands of a library function in place of the call.
fn lower_library_call(
    builder: &mut IrBuilder,
    library: &Arc<dyn LibraryFunction>,
    info: &FnCallOp,
    args: &[Operand],
    out: &mut Vec<Instruction>,
) -> Result<Option<Operand>, LoweringError> {
    let ret_ty = library.return_type();
    let ret = if ret_ty == Type::Void {
        None
    } else {
        Some(builder.temp(&ret_ty, info.span)?)
    };

    let mut ctx = LibContext::new(builder.config);
    library
        .emit(&mut ctx, args, ret.as_ref())
        .map_err(|source| LoweringError::LibraryCall {
            span: info.span,
            name: library.name().to_string(),
            source,
            path: builder.get_file_path().clone(),
        })?;

    out.extend(ctx.into_commands().into_iter().map(Instruction::RawCommand));
    Ok(ret)
}
