//! Disassembler errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisassemblerError {
    #[error("Code size {code_size} exceeds image of {image} words")]
    CodeSizeOutOfRange { code_size: usize, image: usize },

    #[error("Code size {0} is not a whole number of instructions")]
    Misaligned(usize),
}

pub type Result<T> = std::result::Result<T, DisassemblerError>;
