use std::collections::HashMap;

use tracing::{debug, instrument, trace};

use crate::ir::{Instruction, Label};

use super::{NestedProgram, PassError};

/// Replaces every [`Instruction::Link`] with the fully resolved body of its
/// target, then drops all anchor labels.
///
/// Link targets may themselves contain links; they are resolved depth first
/// and a cycle is an error. Output without links or anchors passes through
/// unchanged, so running this twice is the same as running it once.
#[instrument(level = "debug", skip_all)]
pub fn merge_links(program: NestedProgram) -> Result<NestedProgram, PassError> {
    let positions: HashMap<&str, usize> = program
        .labels
        .iter()
        .enumerate()
        .map(|(idx, label)| (label.name.as_str(), idx))
        .collect();

    validate(&program.labels, &positions)?;

    let mut resolver = Resolver {
        labels: &program.labels,
        positions: &positions,
        resolved: vec![None; program.labels.len()],
        stack: Vec::new(),
    };
    for idx in 0..program.labels.len() {
        resolver.resolve(idx)?;
    }
    let resolved = resolver.resolved;

    let labels: Vec<Label> = program
        .labels
        .iter()
        .zip(resolved)
        .filter(|(label, _)| !label.is_anchor)
        .map(|(label, body)| Label {
            name: label.name.clone(),
            is_anchor: false,
            body: body.unwrap_or_default(),
        })
        .collect();

    debug!(
        "merged links, {} of {} labels survive",
        labels.len(),
        positions.len()
    );
    Ok(NestedProgram { labels })
}

fn validate(labels: &[Label], positions: &HashMap<&str, usize>) -> Result<(), PassError> {
    let mut linked_from: HashMap<&str, &str> = HashMap::new();

    for label in labels {
        for instruction in &label.body {
            if let Instruction::Link { target } = instruction {
                if !positions.contains_key(target.as_str()) {
                    return Err(PassError::MissingLinkTarget {
                        label: label.name.clone(),
                        target: target.clone(),
                    });
                }
                if let Some(first) = linked_from.insert(target, &label.name) {
                    return Err(PassError::LinkTargetReused {
                        target: target.clone(),
                        first: first.to_string(),
                        second: label.name.clone(),
                    });
                }
            } else if let Some(target) = instruction.invoked_label() {
                let is_anchor = positions
                    .get(target)
                    .is_some_and(|&idx| labels[idx].is_anchor);
                if is_anchor {
                    return Err(PassError::AnchorInvoked {
                        label: label.name.clone(),
                        target: target.to_string(),
                        instruction: instruction.to_string(),
                    });
                }
            }
        }
    }

    if let Some(anchor) = labels
        .iter()
        .find(|label| label.is_anchor && !linked_from.contains_key(label.name.as_str()))
    {
        return Err(PassError::UnlinkedAnchor {
            label: anchor.name.clone(),
        });
    }

    Ok(())
}

struct Resolver<'a> {
    labels: &'a [Label],
    positions: &'a HashMap<&'a str, usize>,
    resolved: Vec<Option<Vec<Instruction>>>,
    /// Labels currently being resolved, outermost first.
    stack: Vec<usize>,
}

impl Resolver<'_> {
    fn resolve(&mut self, idx: usize) -> Result<(), PassError> {
        if self.resolved[idx].is_some() {
            return Ok(());
        }
        if let Some(start) = self.stack.iter().position(|&open| open == idx) {
            let mut chain: Vec<String> = self.stack[start..]
                .iter()
                .map(|&open| self.labels[open].name.clone())
                .collect();
            chain.push(self.labels[idx].name.clone());
            return Err(PassError::LinkCycle { chain });
        }

        self.stack.push(idx);
        let labels = self.labels;
        let label = &labels[idx];
        let mut body = Vec::with_capacity(label.body.len());
        for instruction in &label.body {
            match instruction {
                Instruction::Link { target } => {
                    let target_idx = *self.positions.get(target.as_str()).ok_or_else(|| {
                        PassError::MissingLinkTarget {
                            label: label.name.clone(),
                            target: target.clone(),
                        }
                    })?;
                    self.resolve(target_idx)?;
                    trace!("splicing {:?} into {:?}", target, label.name);
                    if let Some(spliced) = &self.resolved[target_idx] {
                        body.extend(spliced.iter().cloned());
                    }
                }
                instruction => body.push(instruction.clone()),
            }
        }
        self.stack.pop();
        self.resolved[idx] = Some(body);
        Ok(())
    }
}
