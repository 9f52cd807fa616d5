use serde_json::{Value, json};

use crate::{ir::Operand, scope::types::Type};

use super::{LibContext, LibraryError, LibraryFunction, expect_args, unquote};

/// `print(value)`: shows a value to every player.
///
/// `value` takes an operand of any type. Scores, storage paths and constants
/// each map to their own text component.
#[derive(Debug, Clone, Copy)]
pub struct Print;

impl LibraryFunction for Print {
    fn name(&self) -> &'static str {
        "print"
    }

    fn params(&self) -> Vec<(&'static str, Type)> {
        // Only the arity is checked; the declared type is a placeholder.
        vec![("value", Type::Int)]
    }

    fn emit(
        &self,
        ctx: &mut LibContext<'_>,
        args: &[Operand],
        _ret: Option<&Operand>,
    ) -> Result<(), LibraryError> {
        expect_args(args, 1)?;
        let component = text_component(ctx, &args[0]);
        ctx.command(format!("tellraw @a {component}"));
        Ok(())
    }
}

fn text_component(ctx: &LibContext<'_>, operand: &Operand) -> Value {
    match operand {
        Operand::Constant(value) => json!({ "text": unquote(value) }),
        Operand::Register(code) => json!({
            "score": { "name": code, "objective": ctx.config.objective }
        }),
        Operand::Structured(code) => json!({ "nbt": code, "storage": ctx.config.storage }),
    }
}
