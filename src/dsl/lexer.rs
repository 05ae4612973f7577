//! Lexer for the textly markup.
//!
//! Reads characters from any [`BufRead`] and streams [`Token`]s into a
//! [`TokenSink`], so the parser can start before the whole input has arrived.

use std::io::{self, BufRead};

use super::error::CompileError;
use super::token::{Token, TokenKind};

/// Destination for lexed tokens.
pub trait TokenSink {
    /// Accept the next token. Fails if the consumer is gone or the run was cancelled.
    fn emit(&mut self, token: Token) -> Result<(), CompileError>;
}

impl TokenSink for Vec<Token> {
    fn emit(&mut self, token: Token) -> Result<(), CompileError> {
        self.push(token);
        Ok(())
    }
}

/// UTF-8 character reader over a byte buffer.
pub struct CharReader<R> {
    inner: R,
}

impl<R: BufRead> CharReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Consume the next character. `Ok(None)` at end of stream.
    pub fn pop(&mut self) -> io::Result<Option<char>> {
        let Some(first) = self.next_byte()? else {
            return Ok(None);
        };
        let width = match first {
            0x00..=0x7F => return Ok(Some(first as char)),
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return Err(invalid_utf8()),
        };

        let mut buf = [first, 0, 0, 0];
        for slot in buf.iter_mut().take(width).skip(1) {
            *slot = self.next_byte()?.ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "truncated UTF-8 sequence")
            })?;
        }
        let text = std::str::from_utf8(&buf[..width]).map_err(|_| invalid_utf8())?;
        Ok(text.chars().next())
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = loop {
            match self.inner.fill_buf() {
                Ok(buf) => break buf.first().copied(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        if byte.is_some() {
            self.inner.consume(1);
        }
        Ok(byte)
    }
}

fn invalid_utf8() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "input is not valid UTF-8")
}

pub struct Lexer<R> {
    reader: CharReader<R>,
    line: usize,
    col: usize,
    escaped: bool,
    in_comment: bool,
}

impl<R: BufRead> Lexer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: CharReader::new(reader),
            line: 0,
            col: 0,
            escaped: false,
            in_comment: false,
        }
    }

    /// Lex the whole stream into `sink`, finishing with exactly one `Eof` token.
    pub fn run(&mut self, sink: &mut impl TokenSink) -> Result<(), CompileError> {
        loop {
            let Some(ch) = self.reader.pop().map_err(CompileError::Read)? else {
                return sink.emit(Token::eof(self.line, self.col));
            };

            let (line, col) = (self.line, self.col);
            self.col += 1;

            if ch == '\n' {
                // An escaped newline joins the two lines; a comment's newline is part of the comment.
                if !self.escaped && !self.in_comment {
                    sink.emit(Token::char(TokenKind::Newline, ch, line, col))?;
                }
                self.escaped = false;
                self.in_comment = false;
                self.line += 1;
                self.col = 0;
                continue;
            }

            if self.in_comment {
                continue;
            }

            if self.escaped {
                self.escaped = false;
                sink.emit(Token::char(TokenKind::Character, ch, line, col))?;
                continue;
            }

            let kind = match ch {
                '\\' => {
                    self.escaped = true;
                    continue;
                }
                '#' => {
                    self.in_comment = true;
                    continue;
                }
                '@' => TokenKind::Decorator,
                '{' => TokenKind::CommandStart,
                '}' => TokenKind::CommandClose,
                '[' => TokenKind::BracketStart,
                ']' => TokenKind::BracketClose,
                _ => TokenKind::Character,
            };
            sink.emit(Token::char(kind, ch, line, col))?;
        }
    }
}

impl<'a> Lexer<&'a [u8]> {
    /// Lex an in-memory source into a token vector.
    pub fn tokenize(source: &'a str) -> Result<Vec<Token>, CompileError> {
        let mut tokens = Vec::new();
        Lexer::new(source.as_bytes()).run(&mut tokens)?;
        Ok(tokens)
    }
}
