//! Instruction set and compiled programs.
//!
//! The parser emits a flat list of [`Instruction`]s. Each opcode carries its
//! own argument type, so a `Delete` can never hold text. On disk the list is
//! stored as untyped `{opcode, arg}` YAML records and validated on the way back in.

use std::fmt;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use super::error::CompileError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Type out text one character at a time.
    Print(String),
    /// Backspace-erase this many characters.
    Delete(usize),
    /// Pause for this many beats.
    Sleep(u32),
    /// Clear the whole screen.
    Clear,
    /// Switch to a color, remembering the previous one.
    PushColor(String),
    /// Restore the color beneath the current one.
    PopColor,
}

impl Instruction {
    pub fn opcode(&self) -> &'static str {
        match self {
            Instruction::Print(_) => "print",
            Instruction::Delete(_) => "delete",
            Instruction::Sleep(_) => "sleep",
            Instruction::Clear => "clear",
            Instruction::PushColor(_) => "pushColor",
            Instruction::PopColor => "popColor",
        }
    }
}

/// Dump form: `opcode(argument)`, with newlines written as `\n`.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arg = match self {
            Instruction::Print(text) | Instruction::PushColor(text) => text.replace('\n', "\\n"),
            Instruction::Delete(count) => count.to_string(),
            Instruction::Sleep(beats) => beats.to_string(),
            Instruction::Clear | Instruction::PopColor => String::new(),
        };
        write!(f, "{}({})", self.opcode(), arg)
    }
}

/// A compiled, ordered instruction list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Write one `index: instruction` line per instruction.
    pub fn dump(&self, out: &mut impl Write) -> io::Result<()> {
        for (i, instruction) in self.instructions.iter().enumerate() {
            writeln!(out, "{i}: {instruction}")?;
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, CompileError> {
        let records: Vec<RawInstruction> = self.instructions.iter().map(Into::into).collect();
        Ok(serde_yaml::to_string(&records)?)
    }

    /// Decode a program written by [`Program::to_yaml`], validating every record.
    pub fn from_yaml(yaml: &str) -> Result<Self, CompileError> {
        let records: Vec<RawInstruction> = serde_yaml::from_str(yaml)?;
        let instructions = records
            .into_iter()
            .map(Instruction::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { instructions })
    }
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self::new(instructions)
    }
}

/// Wire form of an instruction: an opcode name and a loosely typed argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInstruction {
    pub opcode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg: Option<Value>,
}

impl From<&Instruction> for RawInstruction {
    fn from(instruction: &Instruction) -> Self {
        let arg = match instruction {
            Instruction::Print(text) | Instruction::PushColor(text) => {
                Some(Value::String(text.clone()))
            }
            Instruction::Delete(count) => Some(Value::from(*count as u64)),
            Instruction::Sleep(beats) => Some(Value::from(*beats)),
            Instruction::Clear | Instruction::PopColor => None,
        };
        Self {
            opcode: instruction.opcode().to_string(),
            arg,
        }
    }
}

impl TryFrom<RawInstruction> for Instruction {
    type Error = CompileError;

    fn try_from(raw: RawInstruction) -> Result<Self, Self::Error> {
        let RawInstruction { opcode, arg } = raw;
        let malformed = |reason: &str| CompileError::MalformedInstruction {
            opcode: opcode.clone(),
            reason: reason.to_string(),
        };

        match opcode.as_str() {
            "print" | "pushColor" => {
                let text = match arg {
                    Some(Value::String(text)) => text,
                    _ => return Err(malformed("expected a text argument")),
                };
                Ok(if opcode == "print" {
                    Instruction::Print(text)
                } else {
                    Instruction::PushColor(text)
                })
            }
            "delete" => {
                let count = arg
                    .as_ref()
                    .and_then(Value::as_u64)
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| malformed("expected a non-negative count"))?;
                Ok(Instruction::Delete(count))
            }
            "sleep" => {
                let beats = arg
                    .as_ref()
                    .and_then(Value::as_u64)
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| malformed("expected a non-negative beat count"))?;
                Ok(Instruction::Sleep(beats))
            }
            "clear" | "popColor" => {
                if !matches!(arg, None | Some(Value::Null)) {
                    return Err(malformed("takes no argument"));
                }
                Ok(if opcode == "clear" {
                    Instruction::Clear
                } else {
                    Instruction::PopColor
                })
            }
            _ => Err(CompileError::UnknownOpcode { opcode }),
        }
    }
}
