//! Token types for the textly lexer.

use std::fmt;

/// A token produced by the lexer.
///
/// Tokens are transient: the lexer hands each one to the parser exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub col: usize,
    /// The literal text for characters, newlines and delimiters; empty at end of input.
    pub value: String,
}

/// The kind of token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Character,
    BracketStart, // [
    BracketClose, // ]
    CommandStart, // {
    CommandClose, // }
    Decorator,    // @
    Newline,
    Eof,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            kind,
            line,
            col,
            value: value.into(),
        }
    }

    /// A single-character token. Used for characters and the unescaped delimiters.
    pub fn char(kind: TokenKind, ch: char, line: usize, col: usize) -> Self {
        Self::new(kind, ch.to_string(), line, col)
    }

    pub fn eof(line: usize, col: usize) -> Self {
        Self::new(TokenKind::Eof, String::new(), line, col)
    }

    /// Whether this is a character token carrying exactly `ch`.
    pub fn is_char(&self, ch: char) -> bool {
        self.kind == TokenKind::Character && self.value.chars().eq(std::iter::once(ch))
    }
}

impl TokenKind {
    /// Fixed-width label used by the token dump.
    pub fn label(self) -> &'static str {
        match self {
            TokenKind::Character => "CHAR   ",
            TokenKind::BracketStart => "[      ",
            TokenKind::BracketClose => "]      ",
            TokenKind::CommandStart => "{      ",
            TokenKind::CommandClose => "}      ",
            TokenKind::Decorator => "@      ",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Eof => "EOF    ",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label().trim_end())
    }
}

/// Token dump form: `KIND: "value" (Line=L, Col=C)`.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: \"{}\" (Line={}, Col={})",
            self.kind.label(),
            self.value,
            self.line,
            self.col
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_character_token() {
        let token = Token::char(TokenKind::Character, 'a', 2, 5);
        assert_eq!(token.to_string(), "CHAR   : \"a\" (Line=2, Col=5)");
    }

    #[test]
    fn dump_eof_token() {
        let token = Token::eof(0, 3);
        assert_eq!(token.to_string(), "EOF    : \"\" (Line=0, Col=3)");
    }

    #[test]
    fn labels_share_width() {
        for kind in [
            TokenKind::Character,
            TokenKind::BracketStart,
            TokenKind::BracketClose,
            TokenKind::CommandStart,
            TokenKind::CommandClose,
            TokenKind::Decorator,
            TokenKind::Newline,
            TokenKind::Eof,
        ] {
            assert_eq!(kind.label().len(), 7, "{kind:?}");
        }
    }

    #[test]
    fn kind_display_is_trimmed() {
        assert_eq!(TokenKind::Newline.to_string(), "NEWLINE");
        assert_eq!(TokenKind::CommandClose.to_string(), "}");
    }

    #[test]
    fn is_char_matches_single_character_only() {
        let dot = Token::char(TokenKind::Character, '.', 0, 0);
        assert!(dot.is_char('.'));
        assert!(!dot.is_char(','));

        let brace = Token::char(TokenKind::CommandClose, '}', 0, 0);
        assert!(!brace.is_char('}'));
    }
}
