//! Main disassembler logic

use crate::error::{DisassemblerError, Result};
use crate::formatter::{format, format_words};
use std::collections::BTreeMap;
use tickvm_isa::{decode_at, Address, Executable, Instruction, IsaError, Word, INSTRUCTION_WORDS};

/// One decoded (or undecodable) instruction slot
#[derive(Debug)]
pub struct ListingLine {
    pub address: Address,
    pub words: [Word; INSTRUCTION_WORDS],
    pub instruction: std::result::Result<Instruction, IsaError>,
    /// Labels whose span starts at this instruction
    pub labels: Vec<String>,
}

/// Listing builder over a linked executable
pub struct Disassembler<'a> {
    executable: &'a Executable,
    code_size: Option<usize>,
    labels: BTreeMap<usize, Vec<String>>,
}

impl<'a> Disassembler<'a> {
    pub fn new(executable: &'a Executable) -> Self {
        Self {
            executable,
            code_size: None,
            labels: BTreeMap::new(),
        }
    }

    /// Words of the instruction segment; defaults to the whole image
    pub fn code_size(mut self, words: usize) -> Self {
        self.code_size = Some(words);
        self
    }

    /// Annotate instruction indices with label names
    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        for (name, index) in labels {
            self.labels.entry(index).or_default().push(name.into());
        }
        self
    }

    pub fn lines(&self) -> Result<Vec<ListingLine>> {
        let memory = &self.executable.memory;
        let code_size = match self.code_size {
            Some(size) if size > memory.len() => {
                return Err(DisassemblerError::CodeSizeOutOfRange {
                    code_size: size,
                    image: memory.len(),
                })
            }
            Some(size) if size % INSTRUCTION_WORDS != 0 => {
                return Err(DisassemblerError::Misaligned(size))
            }
            Some(size) => size,
            // a trailing partial instruction is listed as truncated
            None => memory.len(),
        };

        let code = &memory[..code_size];
        let lines = code
            .chunks(INSTRUCTION_WORDS)
            .enumerate()
            .map(|(index, chunk)| {
                let offset = index * INSTRUCTION_WORDS;
                let mut words = [0; INSTRUCTION_WORDS];
                words[..chunk.len()].copy_from_slice(chunk);

                ListingLine {
                    address: offset as Address,
                    words,
                    instruction: decode_at(code, offset),
                    labels: self.labels.get(&index).cloned().unwrap_or_default(),
                }
            })
            .collect();

        Ok(lines)
    }

    pub fn render(&self) -> Result<String> {
        let lines = self.lines()?;
        let mut output = String::new();

        output.push_str("; tickvm disassembly\n");
        output.push_str(&format!("; start: {}\n", self.executable.start));
        output.push_str(&format!(
            "; {} instructions, {} words\n\n",
            lines.len(),
            self.executable.memory.len()
        ));

        for line in &lines {
            for label in &line.labels {
                output.push_str(&format!("{}:\n", label));
            }
            output.push_str(&format!("{:>6}:  {}  ", line.address, format_words(&line.words)));
            match &line.instruction {
                Ok(instr) => output.push_str(&format(instr)),
                Err(e) => output.push_str(&format!("; ERROR: {}", e)),
            }
            output.push('\n');
        }

        Ok(output)
    }
}

/// Listing of the first `code_size` words of `executable`
pub fn disassemble(executable: &Executable, code_size: usize) -> Result<String> {
    Disassembler::new(executable).code_size(code_size).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickvm_isa::{encode_all, Register};

    fn sample() -> Executable {
        let mut memory = encode_all(&[
            Instruction::Put { value: 5, output: Register::R0 },
            Instruction::Halt,
        ]);
        // data segment
        memory.extend_from_slice(&[42, 43]);
        Executable::new(memory)
    }

    #[test]
    fn test_disassemble_simple() {
        let asm = disassemble(&sample(), 8).unwrap();
        assert!(asm.contains("put 5, r0"));
        assert!(asm.contains("halt"));
        assert!(asm.contains("; 2 instructions, 10 words"));
        assert!(!asm.contains("ERROR"));
    }

    #[test]
    fn test_whole_image_lists_truncated_tail() {
        let exe = sample();
        let lines = Disassembler::new(&exe).lines().unwrap();
        assert_eq!(lines.len(), 3);
        assert!(matches!(
            lines[2].instruction,
            Err(IsaError::Truncated { expected: 4, found: 2 })
        ));
        assert_eq!(lines[2].words, [42, 43, 0, 0]);
    }

    #[test]
    fn test_unknown_opcode_is_error_line() {
        let exe = Executable::new(vec![99, 0, 0, 0, 7, 0, 0, 0]);
        let asm = Disassembler::new(&exe).render().unwrap();
        assert!(asm.contains("; ERROR: Unknown opcode: 99"));
        assert!(asm.contains("halt"));
    }

    #[test]
    fn test_labels() {
        let exe = sample();
        let asm = Disassembler::new(&exe)
            .code_size(8)
            .labels([("entry", 0), ("done", 1)])
            .render()
            .unwrap();

        let entry = asm.find("entry:").unwrap();
        let put = asm.find("put 5").unwrap();
        let done = asm.find("done:").unwrap();
        let halt = asm.find("halt").unwrap();
        assert!(entry < put && put < done && done < halt);
    }

    #[test]
    fn test_code_size_checks() {
        let exe = sample();
        assert!(matches!(
            disassemble(&exe, 12),
            Err(DisassemblerError::CodeSizeOutOfRange { .. })
        ));
        assert!(matches!(disassemble(&exe, 6), Err(DisassemblerError::Misaligned(6))));
    }
}
