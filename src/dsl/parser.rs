//! Parser for the textly markup.
//!
//! Recursive descent over a token stream with one token of lookahead. The
//! grammar is small:
//!
//! ```text
//! program   := element* EOF
//! element   := CHAR | NEWLINE | '[' bracket ']' | '{' command '}' | '@' decorator
//! bracket   := (CHAR | '[' bracket ']' | '{' command '}')*
//! command   := ('.' | "clear" | CHAR)*
//! decorator := ('(' word (',' word)* ')' ws* | word) '{' element* '}'
//! ```

use super::decorator;
use super::error::{CompileError, Expected};
use super::program::{Instruction, Program};
use super::token::{Token, TokenKind};

/// Where the parser pulls tokens from.
pub trait TokenSource {
    /// Block until the next token is available.
    fn next_token(&mut self) -> Result<Token, CompileError>;
}

impl TokenSource for std::vec::IntoIter<Token> {
    fn next_token(&mut self) -> Result<Token, CompileError> {
        // An exhausted vector behaves like a stream that ended cleanly.
        Ok(self.next().unwrap_or_else(|| Token::eof(0, 0)))
    }
}

pub struct Parser<S> {
    source: S,
    peeked: Option<Token>,
}

impl Parser<std::vec::IntoIter<Token>> {
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self::new(tokens.into_iter())
    }
}

impl<S: TokenSource> Parser<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            peeked: None,
        }
    }

    /// Parse the whole stream. On error the partial instruction list is discarded.
    pub fn parse(&mut self) -> Result<Program, CompileError> {
        let mut instructions = Vec::new();
        loop {
            let token = self.pop()?;
            if token.kind == TokenKind::Eof {
                return Ok(Program::new(instructions));
            }
            self.parse_element(token, &mut instructions, Expected::Element)?;
        }
    }

    fn parse_element(
        &mut self,
        token: Token,
        out: &mut Vec<Instruction>,
        want: Expected,
    ) -> Result<(), CompileError> {
        match token.kind {
            TokenKind::Character | TokenKind::Newline => out.push(Instruction::Print(token.value)),
            TokenKind::BracketStart => self.parse_bracket(&token, out)?,
            TokenKind::CommandStart => self.parse_command(out)?,
            TokenKind::Decorator => self.parse_decorator(out)?,
            _ => return Err(CompileError::unexpected(token, want)),
        }
        Ok(())
    }

    /// Parse a `[...]` region: print its characters, then delete the ones at this level.
    ///
    /// Characters typed by nested brackets are already erased by their own
    /// `Delete`, so they do not count towards this bracket's total.
    fn parse_bracket(
        &mut self,
        open: &Token,
        out: &mut Vec<Instruction>,
    ) -> Result<(), CompileError> {
        let mut count = 0;
        loop {
            let token = self.pop()?;
            match token.kind {
                TokenKind::BracketClose => {
                    out.push(Instruction::Delete(count));
                    return Ok(());
                }
                TokenKind::Newline | TokenKind::Eof => {
                    return Err(CompileError::UnterminatedBracket {
                        line: open.line,
                        col: open.col,
                    });
                }
                TokenKind::Character => {
                    out.push(Instruction::Print(token.value));
                    count += 1;
                }
                TokenKind::BracketStart => self.parse_bracket(&token, out)?,
                TokenKind::CommandStart => self.parse_command(out)?,
                _ => {
                    return Err(CompileError::unexpected(
                        token,
                        Expected::Kind(TokenKind::BracketClose),
                    ))
                }
            }
        }
    }

    /// Parse a `{...}` command body. Unrecognized characters are skipped.
    fn parse_command(&mut self, out: &mut Vec<Instruction>) -> Result<(), CompileError> {
        loop {
            let token = self.pop()?;
            match token.kind {
                TokenKind::CommandClose => return Ok(()),
                TokenKind::Character if token.is_char('.') => out.push(Instruction::Sleep(1)),
                TokenKind::Character if token.is_char('c') => {
                    self.expect_word_rest("lear")?;
                    out.push(Instruction::Clear);
                }
                TokenKind::Character => {}
                _ => {
                    return Err(CompileError::unexpected(
                        token,
                        Expected::Kind(TokenKind::CommandClose),
                    ))
                }
            }
        }
    }

    fn expect_word_rest(&mut self, rest: &str) -> Result<(), CompileError> {
        for ch in rest.chars() {
            let token = self.pop()?;
            if !token.is_char(ch) {
                return Err(CompileError::unexpected(token, Expected::Char(ch)));
            }
        }
        Ok(())
    }

    /// Parse what follows `@`: one color word or a parenthesised list, then a body.
    fn parse_decorator(&mut self, out: &mut Vec<Instruction>) -> Result<(), CompileError> {
        let (kind, is_list) = {
            let next = self.peek()?;
            (next.kind, next.is_char('('))
        };
        if kind != TokenKind::Character {
            let got = self.pop()?;
            return Err(CompileError::unexpected(
                got,
                Expected::Kind(TokenKind::Character),
            ));
        }

        let mut codes = Vec::new();
        if is_list {
            self.pop()?;
            codes.push(self.parse_decorator_word()?);
            loop {
                let delim = self.pop()?;
                if delim.is_char(')') {
                    break;
                }
                if !delim.is_char(',') {
                    return Err(CompileError::unexpected(delim, Expected::ListDelimiter));
                }
                codes.push(self.parse_decorator_word()?);
            }
            self.skip_whitespace()?;
        } else {
            codes.push(self.parse_decorator_word()?);
        }

        let open = self.pop()?;
        if open.kind != TokenKind::CommandStart {
            return Err(CompileError::unexpected(
                open,
                Expected::Kind(TokenKind::CommandStart),
            ));
        }

        let pops = codes.len();
        out.extend(codes.into_iter().map(Instruction::PushColor));
        loop {
            let token = self.pop()?;
            match token.kind {
                TokenKind::CommandClose => break,
                TokenKind::Eof => {
                    return Err(CompileError::unexpected(
                        token,
                        Expected::Kind(TokenKind::CommandClose),
                    ))
                }
                _ => self.parse_element(token, out, Expected::Kind(TokenKind::CommandClose))?,
            }
        }
        out.extend(std::iter::repeat(Instruction::PopColor).take(pops));
        Ok(())
    }

    /// Read a decorator name up to `,`, `)` or `{` and resolve it to an escape code.
    fn parse_decorator_word(&mut self) -> Result<String, CompileError> {
        let (line, col) = {
            let next = self.peek()?;
            (next.line, next.col)
        };
        let mut name = String::new();
        loop {
            let (kind, at_delimiter) = {
                let next = self.peek()?;
                (next.kind, next.is_char(',') || next.is_char(')'))
            };
            match kind {
                TokenKind::CommandStart => break,
                TokenKind::Character if at_delimiter => break,
                TokenKind::Character => name.push_str(&self.pop()?.value),
                _ => {
                    let got = self.pop()?;
                    return Err(CompileError::unexpected(
                        got,
                        Expected::Kind(TokenKind::Character),
                    ));
                }
            }
        }

        match decorator::lookup(&name) {
            Some(code) => Ok(code.to_string()),
            None => Err(CompileError::UnknownDecorator { name, line, col }),
        }
    }

    fn skip_whitespace(&mut self) -> Result<(), CompileError> {
        loop {
            let blank = {
                let next = self.peek()?;
                next.kind == TokenKind::Character && next.value.chars().all(char::is_whitespace)
            };
            if !blank {
                return Ok(());
            }
            self.pop()?;
        }
    }

    fn peek(&mut self) -> Result<&Token, CompileError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.source.next_token()?,
        };
        Ok(self.peeked.insert(token))
    }

    fn pop(&mut self) -> Result<Token, CompileError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.source.next_token(),
        }
    }
}
