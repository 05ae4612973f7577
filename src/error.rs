//! Top-level error type covering compilation, playback and plain I/O.

use std::io;

use thiserror::Error;

use crate::dsl::CompileError;
use crate::vm::RunError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether the failure was a requested cancellation rather than a fault.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Compile(err) => err.is_cancelled(),
            Error::Run(err) => err.is_cancelled(),
            Error::Io(_) => false,
        }
    }

    /// Whether playback itself was interrupted, as opposed to compiling or dumping.
    pub fn is_interrupted_playback(&self) -> bool {
        matches!(self, Error::Run(RunError::Cancelled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_recognised_from_either_stage() {
        assert!(Error::from(CompileError::Cancelled).is_cancelled());
        assert!(Error::from(RunError::Cancelled).is_cancelled());
        assert!(!Error::from(RunError::ColorStackUnderflow).is_cancelled());
        assert!(!Error::from(io::Error::other("x")).is_cancelled());
    }

    #[test]
    fn only_playback_cancellation_counts_as_interrupted_playback() {
        assert!(Error::from(RunError::Cancelled).is_interrupted_playback());
        assert!(!Error::from(CompileError::Cancelled).is_interrupted_playback());
        assert!(!Error::from(RunError::ColorStackUnderflow).is_interrupted_playback());
        assert!(!Error::from(io::Error::other("x")).is_interrupted_playback());
    }

    #[test]
    fn display_is_transparent() {
        let err = Error::from(CompileError::OptimizerDivergence { passes: 10 });
        assert_eq!(err.to_string(), "optimizer did not settle after 10 passes");
    }
}
