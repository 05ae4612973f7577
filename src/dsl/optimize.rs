//! Peephole optimizer.
//!
//! Merges neighbouring instructions of the same kind and, when asked,
//! replaces a print followed by a delete with the text that would remain on
//! screen. Passes repeat until the program stops shrinking.

use tracing::debug;

use super::error::CompileError;
use super::program::{Instruction, Program};

/// Upper bound on optimizer passes before giving up.
pub const MAX_PASSES: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizeOptions {
    /// Pre-apply deletes to the preceding print instead of animating them.
    pub flatten: bool,
}

impl Program {
    /// Optimize in place. On error the program is left untouched.
    pub fn optimize(&mut self, options: OptimizeOptions) -> Result<(), CompileError> {
        let optimized = optimize(&self.instructions, options)?;
        self.instructions = optimized;
        Ok(())
    }
}

/// Run [`optimize_pass`] until the instruction count stops decreasing.
pub fn optimize(
    instructions: &[Instruction],
    options: OptimizeOptions,
) -> Result<Vec<Instruction>, CompileError> {
    let mut current = optimize_pass(instructions, options)?;
    let mut previous_len = instructions.len();
    let mut passes = 1;

    while current.len() < previous_len {
        if passes >= MAX_PASSES {
            return Err(CompileError::OptimizerDivergence { passes });
        }
        previous_len = current.len();
        current = optimize_pass(&current, options)?;
        passes += 1;
    }

    debug!(
        before = instructions.len(),
        after = current.len(),
        passes,
        "optimized program"
    );
    Ok(current)
}

/// A single left-to-right merging pass.
pub fn optimize_pass(
    instructions: &[Instruction],
    options: OptimizeOptions,
) -> Result<Vec<Instruction>, CompileError> {
    let mut out = Vec::with_capacity(instructions.len());
    let mut iter = instructions.iter();
    let Some(first) = iter.next() else {
        return Ok(out);
    };

    let mut current = first.clone();
    for next in iter {
        let merged = match (&mut current, next) {
            (Instruction::Sleep(a), Instruction::Sleep(b)) => {
                *a = a.saturating_add(*b);
                true
            }
            (Instruction::Print(a), Instruction::Print(b)) => {
                a.push_str(b);
                true
            }
            (Instruction::Print(text), Instruction::Delete(count)) if options.flatten => {
                truncate_chars(text, *count)?;
                true
            }
            _ => false,
        };
        if !merged {
            out.push(std::mem::replace(&mut current, next.clone()));
        }
    }
    out.push(current);
    Ok(out)
}

/// Drop the last `count` characters of `text`.
fn truncate_chars(text: &mut String, count: usize) -> Result<(), CompileError> {
    let text_len = text.chars().count();
    if count > text_len {
        return Err(CompileError::InvalidFlatten { text_len, count });
    }
    let keep = text_len - count;
    let cut = text
        .char_indices()
        .nth(keep)
        .map_or(text.len(), |(index, _)| index);
    text.truncate(cut);
    Ok(())
}
