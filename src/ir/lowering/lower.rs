use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::{
    ast::{Program, functions::Modifier},
    driver::config::DatapackConfig,
    ir::{Instruction, Label, codes::CodeGenerators},
    scope::SymbolTable,
};

use super::{
    IrBuilder, errors::LoweringError, functions::lower_func, statements::lower_variable_def,
};

/// Label initializing the objective and every global. Generated codes never
/// contain `_`, so it can't clash with one.
pub const GLOBAL_INIT_LABEL: &str = "global_init";

/// Labels the datapack runs on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntryPoints {
    pub load: Vec<String>,
    pub tick: Vec<String>,
    /// Custom function tags and their members.
    pub tags: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct LoweredProgram {
    /// Flat stream, ready for the nesting pass.
    pub instructions: Vec<Instruction>,
    pub entry_points: EntryPoints,
}

#[instrument(level = "debug", skip_all, fields(path = ?program.file_path))]
pub fn lower_program(
    program: &Program,
    symbols: &SymbolTable,
    codes: &mut CodeGenerators,
    config: &DatapackConfig,
) -> Result<LoweredProgram, LoweringError> {
    let mut builder = IrBuilder::new(
        symbols,
        codes,
        config,
        program.file_path.clone(),
        program.scope,
    );

    let mut instructions = vec![
        Label::new(GLOBAL_INIT_LABEL).into(),
        Instruction::RawCommand(format!(
            "scoreboard objectives add {} dummy",
            config.objective
        )),
    ];
    for global in &program.globals {
        instructions.extend(lower_variable_def(&mut builder, global)?);
    }

    let mut entry_points = EntryPoints {
        load: vec![GLOBAL_INIT_LABEL.to_string()],
        ..Default::default()
    };

    for func in &program.functions {
        let (label, body) = lower_func(&mut builder, func)?;
        for modifier in &func.modifiers {
            match modifier {
                Modifier::Load => entry_points.load.push(label.clone()),
                Modifier::Tick => entry_points.tick.push(label.clone()),
                Modifier::Tag(tag) => entry_points
                    .tags
                    .entry(tag.clone())
                    .or_default()
                    .push(label.clone()),
            }
        }
        instructions.extend(body);
    }

    debug!(
        "lowered {} functions into {} instructions",
        program.functions.len(),
        instructions.len()
    );
    Ok(LoweredProgram {
        instructions,
        entry_points,
    })
}
