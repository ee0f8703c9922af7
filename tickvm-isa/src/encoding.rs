//! # Instruction Encoding
//!
//! Every instruction occupies exactly [`INSTRUCTION_WORDS`] words:
//!
//! ```text
//! word 0: opcode index (position in OPCODE_TABLE)
//! word 1: operand slot 1
//! word 2: operand slot 2
//! word 3: operand slot 3
//! ```
//!
//! Unused slots are encoded as 0 and ignored on decode.

use crate::error::{IsaError, Result};
use crate::instruction::Instruction;
use crate::opcode::Opcode;
use crate::{Word, INSTRUCTION_WORDS};

/// Encode one instruction
pub fn encode(instr: &Instruction) -> [Word; INSTRUCTION_WORDS] {
    let [a, b, c] = instr.operands();
    [instr.opcode().to_word(), a, b, c]
}

/// Encode a sequence of instructions into a flat word stream
pub fn encode_all(instrs: &[Instruction]) -> Vec<Word> {
    instrs.iter().flat_map(encode).collect()
}

/// Decode the instruction held in the first four words of `words`
pub fn decode(words: &[Word]) -> Result<Instruction> {
    if words.len() < INSTRUCTION_WORDS {
        return Err(IsaError::Truncated {
            expected: INSTRUCTION_WORDS,
            found: words.len(),
        });
    }

    let opcode = Opcode::from_word(words[0])?;
    Instruction::from_operands(opcode, [words[1], words[2], words[3]])
}

/// Decode the instruction starting at word `offset` of `memory`
pub fn decode_at(memory: &[Word], offset: usize) -> Result<Instruction> {
    let words = memory.get(offset..).unwrap_or(&[]);
    decode(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Register;

    #[test]
    fn test_encode_put() {
        let put = Instruction::Put { value: 5, output: Register::R0 };
        assert_eq!(encode(&put), [4, 5, 0, 0]);
    }

    #[test]
    fn test_encode_halt_is_opcode_only() {
        assert_eq!(encode(&Instruction::Halt), [7, 0, 0, 0]);
    }

    #[test]
    fn test_decode_add() {
        let instr = decode(&[0, 0, 1, 2]).unwrap();
        assert_eq!(
            instr,
            Instruction::Add {
                left: Register::R0,
                right: Register::R1,
                output: Register::R2
            }
        );
    }

    #[test]
    fn test_decode_unknown_opcode() {
        let err = decode(&[42, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, IsaError::UnknownOpcode { opcode: 42 }));
    }

    #[test]
    fn test_decode_truncated() {
        let err = decode(&[4, 5]).unwrap_err();
        assert!(matches!(err, IsaError::Truncated { expected: 4, found: 2 }));
    }

    #[test]
    fn test_decode_at_offset() {
        let memory = encode_all(&[
            Instruction::Put { value: 9, output: Register::R1 },
            Instruction::Halt,
        ]);
        assert_eq!(memory.len(), 8);
        assert_eq!(decode_at(&memory, 4).unwrap(), Instruction::Halt);
        assert!(decode_at(&memory, 6).is_err());
        assert!(decode_at(&memory, 100).is_err());
    }
}
