//! # Opcode Table
//!
//! The opcode word of an encoded instruction is the opcode's position in
//! [`OPCODE_TABLE`]. Every opcode declares exactly three ordered operand
//! slots, each typed [`OperandKind::Word`], [`OperandKind::Register`] or
//! [`OperandKind::Unused`].
//!
//! | Index | Opcode   | Slot 1    | Slot 2   | Slot 3 |
//! |-------|----------|-----------|----------|--------|
//! | 0     | add      | left      | right    | output |
//! | 1     | multiply | left      | right    | output |
//! | 2     | read     | address   | output   | -      |
//! | 3     | write    | address   | value    | -      |
//! | 4     | put      | value (w) | output   | -      |
//! | 5     | copy     | source    | output   | -      |
//! | 6     | call     | target    | link     | -      |
//! | 7     | halt     | -         | -        | -      |
//! | 8     | jump     | condition | target   | -      |

use crate::error::IsaError;
use crate::Word;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of one operand slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperandKind {
    /// Literal machine word
    Word,
    /// Register id (0-7)
    Register,
    /// Slot not used; encoded as 0
    Unused,
}

/// Instruction opcode
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// ADD: output = left + right
    Add = 0,
    /// MULTIPLY: output = left * right
    Multiply = 1,
    /// READ: output = mem[address]
    Read = 2,
    /// WRITE: mem[address] = value
    Write = 3,
    /// PUT: output = literal value
    Put = 4,
    /// COPY: output = source
    Copy = 5,
    /// CALL: link = next instruction address; jump to target
    Call = 6,
    /// HALT: stop the CPU
    Halt = 7,
    /// JUMP: if condition != 0, jump to target
    Jump = 8,
}

/// Fixed opcode table, indexed by the encoded opcode word
pub const OPCODE_TABLE: [Opcode; 9] = [
    Opcode::Add,
    Opcode::Multiply,
    Opcode::Read,
    Opcode::Write,
    Opcode::Put,
    Opcode::Copy,
    Opcode::Call,
    Opcode::Halt,
    Opcode::Jump,
];

impl Opcode {
    /// Look up an opcode by its encoded word
    pub fn from_word(word: Word) -> Result<Self, IsaError> {
        OPCODE_TABLE
            .get(word as usize)
            .copied()
            .ok_or(IsaError::UnknownOpcode { opcode: word })
    }

    #[inline]
    pub const fn to_word(self) -> Word {
        self as Word
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::Multiply => "multiply",
            Opcode::Read => "read",
            Opcode::Write => "write",
            Opcode::Put => "put",
            Opcode::Copy => "copy",
            Opcode::Call => "call",
            Opcode::Halt => "halt",
            Opcode::Jump => "jump",
        }
    }

    /// Ordered operand slot types
    pub fn signature(self) -> [OperandKind; 3] {
        use OperandKind::{Register as R, Unused as U, Word as W};

        match self {
            Opcode::Add | Opcode::Multiply => [R, R, R],
            Opcode::Read | Opcode::Write | Opcode::Copy | Opcode::Call | Opcode::Jump => [R, R, U],
            Opcode::Put => [W, R, U],
            Opcode::Halt => [U, U, U],
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
