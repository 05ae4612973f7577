//! Program player. Executes instructions against any byte sink.
//!
//! Every character is flushed as soon as it is written so the typing effect
//! shows up on line-buffered terminals. All waits go through the cancel
//! token, so a cancelled run stops writing at the next character boundary.

pub mod color;

use std::io::{self, Write};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::cancel::{CancelToken, Cancelled};
use crate::dsl::program::{Instruction, Program};

pub use color::ColorStack;

/// Moves the cursor home and clears the screen.
pub const CLEAR_SCREEN: &str = "\x1b[H\x1b[2J";

/// Erases the character left of the cursor.
pub const ERASE: &str = "\x08 \x08";

#[derive(Debug, Error)]
pub enum RunError {
    #[error("popColor with no color pushed")]
    ColorStackUnderflow,

    #[error("writing output: {0}")]
    Write(#[from] io::Error),

    #[error("playback cancelled")]
    Cancelled,
}

impl RunError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunError::Cancelled)
    }
}

impl From<Cancelled> for RunError {
    fn from(_: Cancelled) -> Self {
        RunError::Cancelled
    }
}

/// Playback timing and display settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Pause after each typed or erased character.
    pub delay: Duration,
    /// Length of one `Sleep` beat.
    pub beat: Duration,
    /// Render spaces as line breaks, one word per line.
    pub list: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(100),
            beat: Duration::from_secs(1),
            list: false,
        }
    }
}

impl RunOptions {
    /// No delays at all. Useful for tests and dumps.
    pub fn instant() -> Self {
        Self {
            delay: Duration::ZERO,
            beat: Duration::ZERO,
            list: false,
        }
    }
}

pub struct Runner {
    options: RunOptions,
}

impl Runner {
    pub fn new(options: RunOptions) -> Self {
        Self { options }
    }

    /// Play `program` into `out`.
    pub fn run(
        &self,
        program: &Program,
        out: &mut impl Write,
        cancel: &CancelToken,
    ) -> Result<(), RunError> {
        debug!(instructions = program.len(), "playing program");
        let mut colors = ColorStack::new();
        for instruction in &program.instructions {
            cancel.check()?;
            self.step(instruction, out, &mut colors, cancel)?;
        }
        Ok(())
    }

    fn step(
        &self,
        instruction: &Instruction,
        out: &mut impl Write,
        colors: &mut ColorStack,
        cancel: &CancelToken,
    ) -> Result<(), RunError> {
        match instruction {
            Instruction::Print(text) => {
                let mut buf = [0u8; 4];
                for ch in text.chars() {
                    let ch = if self.options.list && ch == ' ' { '\n' } else { ch };
                    cancel.check()?;
                    emit(out, ch.encode_utf8(&mut buf))?;
                    cancel.sleep(self.options.delay)?;
                }
            }
            Instruction::Delete(count) => {
                for _ in 0..*count {
                    cancel.check()?;
                    emit(out, ERASE)?;
                    cancel.sleep(self.options.delay)?;
                }
            }
            Instruction::Sleep(beats) => {
                cancel.sleep(self.options.beat.saturating_mul(*beats))?;
            }
            Instruction::Clear => emit(out, CLEAR_SCREEN)?,
            Instruction::PushColor(code) => {
                emit(out, code)?;
                colors.push(code.as_str());
            }
            Instruction::PopColor => {
                let restored = colors.pop().map_err(|err| {
                    warn!("popColor on an empty color stack");
                    err
                })?;
                emit(out, restored)?;
            }
        }
        Ok(())
    }
}

fn emit(out: &mut impl Write, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    out.flush()
}
