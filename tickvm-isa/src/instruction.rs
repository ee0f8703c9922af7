//! tickvm Instruction Set
//!
//! Nine instruction kinds with up to three typed operands. Operand order
//! always follows [`Opcode::signature`].

use crate::error::IsaError;
use crate::opcode::{Opcode, OperandKind};
use crate::register::Register;
use crate::Word;
use serde::{Deserialize, Serialize};

/// Decoded instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    // ========== Arithmetic ==========
    /// ADD: output = left + right (wrapping)
    Add { left: Register, right: Register, output: Register },

    /// MULTIPLY: output = left * right (wrapping)
    Multiply { left: Register, right: Register, output: Register },

    // ========== Memory ==========
    /// READ: output = mem[address]
    Read { address: Register, output: Register },

    /// WRITE: mem[address] = value
    Write { address: Register, value: Register },

    // ========== Register ==========
    /// PUT: output = value
    Put { value: Word, output: Register },

    /// COPY: output = source
    Copy { source: Register, output: Register },

    // ========== Control ==========
    /// CALL: link = address of the next instruction; PC = target
    Call { target: Register, link: Register },

    /// HALT: stop execution
    Halt,

    /// JUMP: if condition != 0 { PC = target }
    Jump { condition: Register, target: Register },
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Add { .. } => Opcode::Add,
            Instruction::Multiply { .. } => Opcode::Multiply,
            Instruction::Read { .. } => Opcode::Read,
            Instruction::Write { .. } => Opcode::Write,
            Instruction::Put { .. } => Opcode::Put,
            Instruction::Copy { .. } => Opcode::Copy,
            Instruction::Call { .. } => Opcode::Call,
            Instruction::Halt => Opcode::Halt,
            Instruction::Jump { .. } => Opcode::Jump,
        }
    }

    /// Get instruction mnemonic
    pub fn mnemonic(&self) -> &'static str {
        self.opcode().mnemonic()
    }

    /// The three operand slots as words, unused slots as 0
    pub fn operands(&self) -> [Word; 3] {
        match *self {
            Instruction::Add { left, right, output }
            | Instruction::Multiply { left, right, output } => {
                [left.to_word(), right.to_word(), output.to_word()]
            }
            Instruction::Read { address, output } => [address.to_word(), output.to_word(), 0],
            Instruction::Write { address, value } => [address.to_word(), value.to_word(), 0],
            Instruction::Put { value, output } => [value, output.to_word(), 0],
            Instruction::Copy { source, output } => [source.to_word(), output.to_word(), 0],
            Instruction::Call { target, link } => [target.to_word(), link.to_word(), 0],
            Instruction::Halt => [0, 0, 0],
            Instruction::Jump { condition, target } => [condition.to_word(), target.to_word(), 0],
        }
    }

    /// Build an instruction from an opcode and its operand words.
    ///
    /// Only the slots the opcode declares are inspected; register slots
    /// must hold a valid register id.
    pub fn from_operands(opcode: Opcode, operands: [Word; 3]) -> Result<Self, IsaError> {
        let [a, b, c] = operands;
        let reg = Register::from_word;

        let instr = match opcode {
            Opcode::Add => Instruction::Add { left: reg(a)?, right: reg(b)?, output: reg(c)? },
            Opcode::Multiply => {
                Instruction::Multiply { left: reg(a)?, right: reg(b)?, output: reg(c)? }
            }
            Opcode::Read => Instruction::Read { address: reg(a)?, output: reg(b)? },
            Opcode::Write => Instruction::Write { address: reg(a)?, value: reg(b)? },
            Opcode::Put => Instruction::Put { value: a, output: reg(b)? },
            Opcode::Copy => Instruction::Copy { source: reg(a)?, output: reg(b)? },
            Opcode::Call => Instruction::Call { target: reg(a)?, link: reg(b)? },
            Opcode::Halt => Instruction::Halt,
            Opcode::Jump => Instruction::Jump { condition: reg(a)?, target: reg(b)? },
        };

        Ok(instr)
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operands = self.operands();
        let mut first = true;

        f.write_str(self.mnemonic())?;
        for (kind, word) in self.opcode().signature().iter().zip(operands) {
            let sep = if first { " " } else { ", " };
            match kind {
                OperandKind::Word => write!(f, "{}{}", sep, word)?,
                OperandKind::Register => write!(f, "{}r{}", sep, word)?,
                OperandKind::Unused => continue,
            }
            first = false;
        }
        Ok(())
    }
}
