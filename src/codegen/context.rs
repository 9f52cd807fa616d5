use std::{collections::HashSet, fmt};

use serde::Serialize;
use tracing::warn;

use crate::{driver::config::DatapackConfig, ir::codes::CodeGenerators};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
        })
    }
}

/// A command that could not be emitted, left as a comment in `function`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmitDiagnostic {
    pub function: String,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug)]
pub(crate) struct EmitContext<'a> {
    pub config: &'a DatapackConfig,
    codes: &'a mut CodeGenerators,
    labels: HashSet<String>,
    /// Label whose body is being emitted.
    pub current: String,
    pub diagnostics: Vec<EmitDiagnostic>,
}

impl<'a> EmitContext<'a> {
    pub fn new(
        config: &'a DatapackConfig,
        codes: &'a mut CodeGenerators,
        labels: HashSet<String>,
    ) -> Self {
        Self {
            config,
            codes,
            labels,
            current: String::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.contains(name)
    }

    /// `<holder> <objective>`
    pub fn score(&self, code: &str) -> String {
        format!("{code} {}", self.config.objective)
    }

    /// `storage <id> <path>`
    pub fn storage(&self, path: &str) -> String {
        format!("storage {} {path}", self.config.storage)
    }

    pub fn function(&self, label: &str) -> String {
        self.config.function_path(label)
    }

    /// A fresh scratch register.
    pub fn scratch(&mut self) -> String {
        self.codes.variables.next_code()
    }

    /// Leaves a comment in place of a command that can't be emitted.
    pub fn diagnostic(&mut self, severity: Severity, message: String, out: &mut Vec<String>) {
        warn!("{}: {} in {:?}", severity, message, self.current);
        out.push(format!("# {severity}: {message}"));
        self.diagnostics.push(EmitDiagnostic {
            function: self.current.clone(),
            severity,
            message,
        });
    }
}
