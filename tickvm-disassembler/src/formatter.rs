//! Instruction formatting to listing text

use tickvm_isa::{Instruction, Word, INSTRUCTION_WORDS};

/// Format instruction as assembly text
pub fn format(instr: &Instruction) -> String {
    instr.to_string()
}

/// Raw encoded words as fixed-width hex
pub fn format_words(words: &[Word; INSTRUCTION_WORDS]) -> String {
    words
        .iter()
        .map(|w| format!("{:08X}", w))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickvm_isa::Register;

    #[test]
    fn test_format_register_instructions() {
        let add = Instruction::Add {
            left: Register::R1,
            right: Register::R2,
            output: Register::R3,
        };
        assert_eq!(format(&add), "add r1, r2, r3");

        let read = Instruction::Read { address: Register::R1, output: Register::R0 };
        assert_eq!(format(&read), "read r1, r0");

        let jump = Instruction::Jump { condition: Register::R4, target: Register::R0 };
        assert_eq!(format(&jump), "jump r4, r0");
    }

    #[test]
    fn test_format_put_shows_literal() {
        let put = Instruction::Put { value: 1337, output: Register::R6 };
        assert_eq!(format(&put), "put 1337, r6");
    }

    #[test]
    fn test_format_words() {
        assert_eq!(format_words(&[4, 255, 0, 0]), "00000004 000000FF 00000000 00000000");
    }
}
