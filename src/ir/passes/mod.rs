//! Structural passes over lowered IR.

use std::fmt;

use thiserror::Error;

use super::Label;

pub mod link_merge;
pub mod nest;

pub use link_merge::merge_links;
pub use nest::nest_instructions;

/// Violations of the label structure. Any of these means an earlier stage
/// produced malformed IR.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PassError {
    #[error("instruction `{instruction}` appears before any label")]
    InstructionOutsideLabel { instruction: String },
    #[error("label {label:?} is defined more than once")]
    DuplicateLabel { label: String },
    #[error("label {label:?} already has a body in a flat instruction stream")]
    LabelAlreadyNested { label: String },
    #[error("label {label:?} links to missing label {target:?}")]
    MissingLinkTarget { label: String, target: String },
    #[error("anchor {target:?} is linked from both {first:?} and {second:?}")]
    LinkTargetReused {
        target: String,
        first: String,
        second: String,
    },
    #[error("anchor {label:?} is never linked")]
    UnlinkedAnchor { label: String },
    #[error("anchor {target:?} is invoked by `{instruction}` in {label:?}")]
    AnchorInvoked {
        label: String,
        target: String,
        instruction: String,
    },
    #[error("link cycle through {chain:?}")]
    LinkCycle { chain: Vec<String> },
}

/// Instructions grouped by label, in the order the labels first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NestedProgram {
    pub labels: Vec<Label>,
}

impl NestedProgram {
    pub fn get(&self, name: &str) -> Option<&Label> {
        self.labels.iter().find(|label| label.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|label| label.name.as_str())
    }
}

impl fmt::Display for NestedProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for label in &self.labels {
            write!(f, "{label}")?;
        }
        Ok(())
    }
}
