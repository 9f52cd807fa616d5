use std::{collections::BTreeMap, time::Instant};

use serde::Serialize;
use tracing::{debug, instrument};

use crate::{
    driver::config::DatapackConfig,
    ir::{codes::CodeGenerators, lowering::EntryPoints, passes::NestedProgram},
};
use compiler::compile_label;
use context::EmitContext;
use errors::CodegenError;

mod calculation;
mod compiler;
mod context;
pub mod errors;

pub use context::{EmitDiagnostic, Severity};

/// One emitted command sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct McFunction {
    pub name: String,
    pub commands: Vec<String>,
}

/// Everything a packager needs to write the datapack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Datapack {
    pub namespace: String,
    pub objective: String,
    pub storage: String,
    pub functions: Vec<McFunction>,
    /// Resource locations run on load, in order.
    pub load: Vec<String>,
    /// Resource locations run every tick.
    pub tick: Vec<String>,
    pub tags: BTreeMap<String, Vec<String>>,
    pub diagnostics: Vec<EmitDiagnostic>,
}

impl Datapack {
    pub fn function(&self, name: &str) -> Option<&McFunction> {
        self.functions.iter().find(|function| function.name == name)
    }
}

/// Emits the commands of a nested program whose links are merged.
#[instrument(level = "debug", skip_all)]
pub fn emit(
    program: &NestedProgram,
    entry_points: &EntryPoints,
    config: &DatapackConfig,
    codes: &mut CodeGenerators,
) -> Result<Datapack, CodegenError> {
    let emit_time = Instant::now();

    if let Some(anchor) = program.labels.iter().find(|label| label.is_anchor) {
        return Err(CodegenError::AnchorInOutput {
            label: anchor.name.clone(),
        });
    }

    let labels = program.names().map(str::to_string).collect();
    let mut ctx = EmitContext::new(config, codes, labels);

    let mut functions = Vec::with_capacity(program.labels.len());
    for label in &program.labels {
        functions.push(compile_label(&mut ctx, label)?);
    }

    let resolve = |names: &[String], from: &str| -> Result<Vec<String>, CodegenError> {
        names
            .iter()
            .map(|name| {
                if ctx.has_label(name) {
                    Ok(ctx.function(name))
                } else {
                    Err(CodegenError::UnknownLabel {
                        label: name.clone(),
                        from: from.to_string(),
                    })
                }
            })
            .collect()
    };
    let load = resolve(&entry_points.load, "#minecraft:load")?;
    let tick = resolve(&entry_points.tick, "#minecraft:tick")?;
    let mut tags = BTreeMap::new();
    for (tag, names) in &entry_points.tags {
        tags.insert(tag.clone(), resolve(names, tag)?);
    }

    debug!(
        "emitted {} functions with {} diagnostics in {:?}",
        functions.len(),
        ctx.diagnostics.len(),
        emit_time.elapsed()
    );

    Ok(Datapack {
        namespace: config.namespace.clone(),
        objective: config.objective.clone(),
        storage: config.storage.clone(),
        functions,
        load,
        tick,
        tags,
        diagnostics: ctx.diagnostics,
    })
}
