//! # Error Types for the tickvm instruction set

use crate::Word;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IsaError {
    // Instruction errors
    #[error("Unknown opcode: {opcode}")]
    UnknownOpcode { opcode: Word },

    #[error("Invalid register id: {0} (valid range: 0-7)")]
    InvalidRegister(Word),

    #[error("Truncated instruction: expected {expected} words, found {found}")]
    Truncated { expected: usize, found: usize },

    // Executable format errors
    #[error("Executable serialization failed: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Invalid executable: {0}")]
    InvalidExecutable(String),
}

pub type Result<T> = std::result::Result<T, IsaError>;
