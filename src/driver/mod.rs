//! The whole pipeline: lowering, nesting, link-merging and emission.

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, instrument, trace};

use crate::{
    ast::Program,
    codegen::{Datapack, emit, errors::CodegenError},
    ir::{
        codes::CodeGenerators,
        display_instructions,
        lowering::{LoweringError, lower_program},
        passes::{PassError, merge_links, nest_instructions},
    },
    scope::SymbolTable,
};
use config::DatapackConfig;

pub mod config;

#[derive(Debug, Error, Clone)]
pub enum CompileError {
    #[error(transparent)]
    Lowering(#[from] LoweringError),
    #[error(transparent)]
    Pass(#[from] PassError),
    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

/// Compiles a resolved program. `codes` must be the generators the symbol
/// table was built with, so generated names never collide with symbol codes.
#[instrument(level = "debug", skip_all)]
pub fn compile_program(
    program: &Program,
    symbols: &SymbolTable,
    codes: &mut CodeGenerators,
    config: &DatapackConfig,
) -> Result<Datapack, CompileError> {
    let lowering_time = Instant::now();
    let lowered = lower_program(program, symbols, codes, config)?;
    let lowering_time = lowering_time.elapsed();
    trace!("lowered ir:\n{}", display_instructions(&lowered.instructions));

    let passes_time = Instant::now();
    let nested = nest_instructions(lowered.instructions)?;
    let merged = merge_links(nested)?;
    let passes_time = passes_time.elapsed();
    trace!("merged ir:\n{merged}");

    let datapack = emit(&merged, &lowered.entry_points, config, codes)?;

    debug!("Lowering time {:?}", lowering_time);
    debug!("Passes time {:?}", passes_time);
    Ok(datapack)
}
