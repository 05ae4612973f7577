//! Shared helpers for integration tests.

use std::io::{self, Write};

/// A one-line terminal: backspace moves the cursor left, anything else
/// overwrites the cell under the cursor.
#[derive(Debug, Default)]
pub struct MockTerminal {
    cells: Vec<char>,
    cursor: usize,
    raw: Vec<u8>,
}

impl MockTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    /// What is visible on screen, without trailing blanks.
    pub fn screen(&self) -> String {
        let text: String = self.cells.iter().collect();
        text.trim_end_matches(' ').to_string()
    }

    /// Every byte written, escapes included.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

impl Write for MockTerminal {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.raw.extend_from_slice(buf);
        let text = std::str::from_utf8(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        for ch in text.chars() {
            if ch == '\x08' {
                self.cursor = self.cursor.saturating_sub(1);
                continue;
            }
            while self.cursor >= self.cells.len() {
                self.cells.push(' ');
            }
            self.cells[self.cursor] = ch;
            self.cursor += 1;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
