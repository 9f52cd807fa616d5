use thiserror::Error;

/// Structural problems found while emitting. Unsupported operand
/// combinations are not errors, they become diagnostics on the output.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodegenError {
    #[error("{from:?} invokes unknown label {label:?}")]
    UnknownLabel { label: String, from: String },
    #[error("{label:?} still links to {target:?}")]
    UnmergedLink { label: String, target: String },
    #[error("anchor {label:?} reached emission")]
    AnchorInOutput { label: String },
    #[error("label {label:?} is nested inside {parent:?}")]
    NestedLabel { label: String, parent: String },
}
