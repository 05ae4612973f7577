//! Markup compiler: source text → tokens → instructions → optimized program.

pub mod decorator;
pub mod error;
pub mod lexer;
pub mod optimize;
pub mod parser;
pub mod pipeline;
pub mod program;
pub mod token;

pub use error::{CompileError, Expected};
pub use optimize::OptimizeOptions;
pub use program::{Instruction, Program};
pub use token::{Token, TokenKind};

use std::io::{Cursor, Read};

use crate::cancel::CancelToken;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Run the peephole optimizer after parsing. `None` leaves the program as parsed.
    pub optimize: Option<OptimizeOptions>,
}

/// The markup compiler.
///
/// Lexing and parsing run concurrently through [`pipeline::compile`]; the
/// optimizer, when enabled, runs afterwards on the calling thread.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Compile everything readable from `input`.
    pub fn compile<R: Read + Send + 'static>(
        &self,
        input: R,
        cancel: &CancelToken,
    ) -> Result<Program, CompileError> {
        let mut program = pipeline::compile(input, cancel)?;
        if let Some(options) = self.options.optimize {
            cancel.check()?;
            program.optimize(options)?;
        }
        Ok(program)
    }

    /// Compile an in-memory source with no cancellation.
    pub fn compile_str(&self, source: &str) -> Result<Program, CompileError> {
        self.compile(Cursor::new(source.as_bytes().to_vec()), &CancelToken::never())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::cancel_pair;
    use Instruction::*;

    fn optimizing(flatten: bool) -> Compiler {
        Compiler::new(CompileOptions {
            optimize: Some(OptimizeOptions { flatten }),
        })
    }

    #[test]
    fn default_compiler_does_not_optimize() {
        let program = Compiler::default().compile_str("ab").unwrap();
        assert_eq!(program.instructions, vec![Print("a".into()), Print("b".into())]);
    }

    #[test]
    fn optimizer_merges_after_parse() {
        let program = optimizing(false).compile_str("ab{..}c").unwrap();
        assert_eq!(
            program.instructions,
            vec![Print("ab".into()), Sleep(2), Print("c".into())]
        );
    }

    #[test]
    fn flatten_applies_deletions() {
        let program = optimizing(true).compile_str("Hell[l]o").unwrap();
        assert_eq!(program.instructions, vec![Print("Hello".into())]);
    }

    #[test]
    fn empty_source_is_empty_program() {
        assert!(optimizing(true).compile_str("").unwrap().is_empty());
    }

    #[test]
    fn parse_errors_pass_through() {
        let err = optimizing(false).compile_str("@nope{x}").unwrap_err();
        assert!(matches!(err, CompileError::UnknownDecorator { .. }));
    }

    #[test]
    fn cancelled_compile() {
        let (canceller, token) = cancel_pair();
        canceller.cancel();
        let err = optimizing(false)
            .compile(Cursor::new(b"abc".to_vec()), &token)
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
