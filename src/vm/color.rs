//! Color stack: the active colors, with the reset code always at the bottom.

use crate::dsl::decorator::RESET;

use super::RunError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorStack {
    entries: Vec<String>,
}

impl ColorStack {
    pub fn new() -> Self {
        Self {
            entries: vec![RESET.to_string()],
        }
    }

    pub fn push(&mut self, code: impl Into<String>) {
        self.entries.push(code.into());
    }

    /// Remove the top color and return the one now exposed.
    ///
    /// The baseline entry can never be popped.
    pub fn pop(&mut self) -> Result<&str, RunError> {
        if self.entries.len() <= 1 {
            return Err(RunError::ColorStackUnderflow);
        }
        self.entries.pop();
        Ok(self.top())
    }

    pub fn top(&self) -> &str {
        self.entries.last().map_or(RESET, String::as_str)
    }

    /// Number of entries, including the baseline.
    #[cfg(test)]
    fn depth(&self) -> usize {
        self.entries.len()
    }
}

impl Default for ColorStack {
    fn default() -> Self {
        Self::new()
    }
}
