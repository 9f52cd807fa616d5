use crate::{ir::Operand, scope::types::Type};

use super::{LibContext, LibraryError, LibraryFunction, expect_args, unquote};

/// `function("ns:path")`: runs an arbitrary function by resource location.
#[derive(Debug, Clone, Copy)]
pub struct RunFunction;

impl LibraryFunction for RunFunction {
    fn name(&self) -> &'static str {
        "function"
    }

    fn params(&self) -> Vec<(&'static str, Type)> {
        vec![("location", Type::String)]
    }

    fn emit(
        &self,
        ctx: &mut LibContext<'_>,
        args: &[Operand],
        _ret: Option<&Operand>,
    ) -> Result<(), LibraryError> {
        expect_args(args, 1)?;
        match &args[0] {
            Operand::Constant(location) => {
                ctx.command(format!("function {}", unquote(location)));
                Ok(())
            }
            other => Err(LibraryError::ExpectedConstant {
                param: "location",
                found: other.to_string(),
            }),
        }
    }
}
