use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::ir::{Instruction, Label};

use super::{NestedProgram, PassError};

/// Groups a flat instruction stream into label bodies.
///
/// Every instruction is moved into the label most recently seen before it.
#[instrument(level = "debug", skip_all)]
pub fn nest_instructions(instructions: Vec<Instruction>) -> Result<NestedProgram, PassError> {
    let mut labels: Vec<Label> = Vec::new();
    let mut seen = HashSet::new();

    for instruction in instructions {
        match instruction {
            Instruction::Label(label) => {
                if !label.body.is_empty() {
                    return Err(PassError::LabelAlreadyNested { label: label.name });
                }
                if !seen.insert(label.name.clone()) {
                    return Err(PassError::DuplicateLabel { label: label.name });
                }
                labels.push(label);
            }
            instruction => match labels.last_mut() {
                Some(label) => label.body.push(instruction),
                None => {
                    return Err(PassError::InstructionOutsideLabel {
                        instruction: instruction.to_string(),
                    });
                }
            },
        }
    }

    debug!("nested into {} labels", labels.len());
    Ok(NestedProgram { labels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Operand;

    fn raw(text: &str) -> Instruction {
        Instruction::RawCommand(text.to_string())
    }

    #[test]
    fn groups_by_preceding_label() {
        let program = nest_instructions(vec![
            Label::new("a").into(),
            raw("1"),
            raw("2"),
            Label::anchor("b").into(),
            Label::new("c").into(),
            raw("3"),
        ])
        .unwrap();

        assert_eq!(program.names().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(program.labels[0].body, [raw("1"), raw("2")]);
        assert!(program.labels[1].body.is_empty());
        assert!(program.labels[1].is_anchor);
        assert_eq!(program.labels[2].body, [raw("3")]);
    }

    #[test]
    fn instruction_before_first_label() {
        let error = nest_instructions(vec![
            Instruction::Move {
                src: Operand::constant("1"),
                dst: Operand::Register("x".into()),
            },
            Label::new("a").into(),
        ])
        .unwrap_err();

        assert!(matches!(error, PassError::InstructionOutsideLabel { .. }));
    }

    #[test]
    fn duplicate_label() {
        let error =
            nest_instructions(vec![Label::new("a").into(), Label::new("a").into()]).unwrap_err();
        assert_eq!(error, PassError::DuplicateLabel { label: "a".into() });
    }

    #[test]
    fn already_nested_label() {
        let mut label = Label::new("a");
        label.body.push(raw("x"));
        let error = nest_instructions(vec![label.into()]).unwrap_err();
        assert_eq!(error, PassError::LabelAlreadyNested { label: "a".into() });
    }
}
