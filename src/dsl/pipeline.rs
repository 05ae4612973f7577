//! Lexer → parser pipeline.
//!
//! The lexer and parser run on their own threads, joined by a small bounded
//! token queue so the lexer stalls when the parser falls behind. Each unit
//! reports its exit on a status channel; the coordinator returns the first
//! failure, or [`CompileError::Cancelled`] as soon as the token fires.

use std::io::{self, BufReader, Read, Write};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use tracing::{debug, warn};

use super::error::CompileError;
use super::lexer::{Lexer, TokenSink};
use super::parser::{Parser, TokenSource};
use super::program::Program;
use super::token::{Token, TokenKind};
use crate::cancel::CancelToken;
use crate::error::Error;

/// Capacity of the lexer → parser token queue.
pub const TOKEN_QUEUE_CAPACITY: usize = 10;

/// Sending half of the token queue, as seen by the lexer.
pub struct ChannelSink {
    tokens: Sender<Token>,
    cancel: CancelToken,
    deadline: Receiver<Instant>,
}

impl ChannelSink {
    pub fn new(tokens: Sender<Token>, cancel: CancelToken) -> Self {
        let deadline = cancel.deadline_channel();
        Self {
            tokens,
            cancel,
            deadline,
        }
    }
}

impl TokenSink for ChannelSink {
    fn emit(&mut self, token: Token) -> Result<(), CompileError> {
        select! {
            send(self.tokens, token) -> sent => sent.map_err(|_| {
                CompileError::Read(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "token consumer hung up",
                ))
            }),
            recv(self.cancel.channel()) -> _ => Err(CompileError::Cancelled),
            recv(self.deadline) -> _ => Err(CompileError::Cancelled),
        }
    }
}

/// Receiving half of the token queue, as seen by the parser.
pub struct ChannelSource {
    tokens: Receiver<Token>,
    cancel: CancelToken,
    deadline: Receiver<Instant>,
}

impl ChannelSource {
    pub fn new(tokens: Receiver<Token>, cancel: CancelToken) -> Self {
        let deadline = cancel.deadline_channel();
        Self {
            tokens,
            cancel,
            deadline,
        }
    }
}

impl TokenSource for ChannelSource {
    fn next_token(&mut self) -> Result<Token, CompileError> {
        select! {
            recv(self.tokens) -> token => token.map_err(|_| {
                CompileError::Read(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "token stream closed before end of input",
                ))
            }),
            recv(self.cancel.channel()) -> _ => Err(CompileError::Cancelled),
            recv(self.deadline) -> _ => Err(CompileError::Cancelled),
        }
    }
}

enum Exit {
    Lexer(Result<(), CompileError>),
    Parser(Result<Program, CompileError>),
}

/// Spawn the lexer on its own thread, feeding `tokens`.
///
/// The exit report is sent before the token sender is dropped, so a consumer
/// that sees the queue close can rely on the lexer's own error arriving first.
fn spawn_lexer<R: Read + Send + 'static>(
    input: R,
    tokens: Sender<Token>,
    exits: Sender<Exit>,
    cancel: CancelToken,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("textly-lexer".into())
        .spawn(move || {
            let mut sink = ChannelSink::new(tokens, cancel);
            let result = Lexer::new(BufReader::new(input)).run(&mut sink);
            let _ = exits.send(Exit::Lexer(result));
            drop(sink);
        })
}

fn spawn_parser(
    tokens: Receiver<Token>,
    exits: Sender<Exit>,
    cancel: CancelToken,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("textly-parser".into())
        .spawn(move || {
            let mut parser = Parser::new(ChannelSource::new(tokens, cancel));
            let result = parser.parse();
            let _ = exits.send(Exit::Parser(result));
            drop(parser);
        })
}

fn join_unit(handle: JoinHandle<()>) {
    if let Err(panic) = handle.join() {
        std::panic::resume_unwind(panic);
    }
}

/// Lex and parse `input` concurrently.
///
/// The input is dropped (closing it) once the lexer finishes. On cancellation
/// this returns immediately; both units unblock on the same token and wind
/// down on their own.
pub fn compile<R: Read + Send + 'static>(
    input: R,
    cancel: &CancelToken,
) -> Result<Program, CompileError> {
    let (token_tx, token_rx) = bounded(TOKEN_QUEUE_CAPACITY);
    let (exit_tx, exit_rx) = unbounded();

    let lexer = spawn_lexer(input, token_tx, exit_tx.clone(), cancel.clone())
        .map_err(CompileError::Read)?;
    let parser = spawn_parser(token_rx, exit_tx, cancel.clone()).map_err(CompileError::Read)?;

    let deadline = cancel.deadline_channel();
    let mut program = None;
    let mut first_error = None;
    let mut pending = 2;

    while pending > 0 {
        select! {
            recv(exit_rx) -> exit => {
                let failure = match exit {
                    Ok(Exit::Lexer(Ok(()))) => {
                        debug!("lexer finished");
                        None
                    }
                    Ok(Exit::Parser(Ok(parsed))) => {
                        debug!(instructions = parsed.len(), "parser finished");
                        program = Some(parsed);
                        None
                    }
                    Ok(Exit::Lexer(Err(err))) | Ok(Exit::Parser(Err(err))) => Some(err),
                    // Both units are gone without reporting; joining below surfaces the panic.
                    Err(_) => {
                        pending = 1;
                        None
                    }
                };
                pending -= 1;
                if let Some(err) = failure {
                    if first_error.is_none() {
                        warn!(error = %err, "compilation failed");
                        first_error = Some(err);
                    }
                }
            },
            recv(cancel.channel()) -> _ => {
                debug!("compilation cancelled");
                return Err(CompileError::Cancelled);
            },
            recv(deadline) -> _ => {
                debug!("compilation deadline passed");
                return Err(CompileError::Cancelled);
            },
        }
    }

    join_unit(lexer);
    join_unit(parser);

    if cancel.is_cancelled() {
        return Err(CompileError::Cancelled);
    }
    match (first_error, program) {
        (Some(err), _) => Err(err),
        (None, Some(program)) => Ok(program),
        (None, None) => Err(CompileError::Read(io::Error::other(
            "parser exited without a result",
        ))),
    }
}

/// Stream the lexer's tokens to `out`, one dump line per token.
pub fn dump_tokens<R: Read + Send + 'static>(
    input: R,
    out: &mut impl Write,
    cancel: &CancelToken,
) -> Result<(), Error> {
    let (token_tx, token_rx) = bounded(TOKEN_QUEUE_CAPACITY);
    let (exit_tx, exit_rx) = unbounded();
    let lexer =
        spawn_lexer(input, token_tx, exit_tx, cancel.clone()).map_err(CompileError::Read)?;

    let mut source = ChannelSource::new(token_rx, cancel.clone());
    loop {
        let token = match source.next_token() {
            Ok(token) => token,
            // The queue closed early: the lexer's report says why.
            Err(CompileError::Read(_)) => break,
            Err(err) => return Err(err.into()),
        };
        writeln!(out, "{token}")?;
        if token.kind == TokenKind::Eof {
            break;
        }
    }
    out.flush()?;

    let report = exit_rx.recv();
    join_unit(lexer);
    match report {
        Ok(Exit::Lexer(Err(err))) => Err(err.into()),
        _ if cancel.is_cancelled() => Err(CompileError::Cancelled.into()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::cancel_pair;
    use crate::dsl::program::Instruction;
    use std::io::Cursor;
    use std::time::Duration;

    fn source(s: &str) -> Cursor<Vec<u8>> {
        Cursor::new(s.as_bytes().to_vec())
    }

    /// A reader that never yields data until the test is over.
    struct Stalled(Receiver<()>);

    impl Read for Stalled {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[test]
    fn compile_simple_text() {
        let program = compile(source("ab"), &CancelToken::never()).unwrap();
        assert_eq!(
            program.instructions,
            vec![Instruction::Print("a".into()), Instruction::Print("b".into())]
        );
    }

    #[test]
    fn compile_long_input_through_small_queue() {
        let text = "x".repeat(TOKEN_QUEUE_CAPACITY * 50);
        let program = compile(source(&text), &CancelToken::never()).unwrap();
        assert_eq!(program.len(), text.len());
    }

    #[test]
    fn compile_surfaces_parse_error() {
        let err = compile(source("[never closed"), &CancelToken::never()).unwrap_err();
        assert!(matches!(err, CompileError::UnterminatedBracket { .. }));
    }

    #[test]
    fn parse_error_early_in_long_input() {
        let text = format!("]{}", "y".repeat(1000));
        let err = compile(source(&text), &CancelToken::never()).unwrap_err();
        assert!(matches!(err, CompileError::UnexpectedToken { .. }));
    }

    #[test]
    fn compile_surfaces_read_error() {
        let bytes = vec![b'o', b'k', 0xFE];
        let err = compile(Cursor::new(bytes), &CancelToken::never()).unwrap_err();
        assert!(matches!(err, CompileError::Read(_)));
    }

    #[test]
    fn cancelled_before_start() {
        let (canceller, token) = cancel_pair();
        canceller.cancel();
        let err = compile(source("hello"), &token).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn cancel_unblocks_a_stalled_compile() {
        let (canceller, token) = cancel_pair();
        let (_hold, stall) = bounded::<()>(0);
        let handle = thread::spawn(move || compile(Stalled(stall), &token));
        thread::sleep(Duration::from_millis(30));
        canceller.cancel();
        let result = handle.join().unwrap();
        assert!(result.unwrap_err().is_cancelled());
    }

    #[test]
    fn deadline_cancels_a_stalled_compile() {
        let (_hold, stall) = bounded::<()>(0);
        let token = CancelToken::never().with_timeout(Duration::from_millis(20));
        let err = compile(Stalled(stall), &token).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn lexer_stalls_when_queue_is_full() {
        let (token_tx, token_rx) = bounded(TOKEN_QUEUE_CAPACITY);
        let (exit_tx, exit_rx) = unbounded();
        let (canceller, token) = cancel_pair();
        let lexer = spawn_lexer(source(&"z".repeat(100)), token_tx, exit_tx, token).unwrap();

        thread::sleep(Duration::from_millis(50));
        assert_eq!(token_rx.len(), TOKEN_QUEUE_CAPACITY);
        assert!(exit_rx.try_recv().is_err());

        // Taking one token frees exactly one slot.
        token_rx.recv().unwrap();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(token_rx.len(), TOKEN_QUEUE_CAPACITY);
        assert!(exit_rx.try_recv().is_err());

        canceller.cancel();
        join_unit(lexer);
        assert!(matches!(
            exit_rx.recv(),
            Ok(Exit::Lexer(Err(CompileError::Cancelled)))
        ));
    }

    #[test]
    fn dump_tokens_writes_one_line_each() {
        let mut out = Vec::new();
        dump_tokens(source("a\n["), &mut out, &CancelToken::never()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "CHAR   : \"a\" (Line=0, Col=0)\n\
             NEWLINE: \"\n\" (Line=0, Col=1)\n\
             [      : \"[\" (Line=1, Col=0)\n\
             EOF    : \"\" (Line=1, Col=1)\n"
        );
    }

    #[test]
    fn dump_tokens_reports_read_error() {
        let mut out = Vec::new();
        let err = dump_tokens(Cursor::new(vec![b'a', 0xFF]), &mut out, &CancelToken::never())
            .unwrap_err();
        assert!(matches!(err, Error::Compile(CompileError::Read(_))));
        assert_eq!(String::from_utf8(out).unwrap(), "CHAR   : \"a\" (Line=0, Col=0)\n");
    }
}
