//! Hardware error types

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tickvm_isa::{Address, Word};

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum HardwareError {
    // Runtime faults, stored in the halted CPU
    #[error("Unknown opcode {opcode} at address {address}")]
    UnknownOpcode { address: Address, opcode: Word },

    #[error("Invalid instruction at address {address}: {reason}")]
    InvalidInstruction { address: Address, reason: String },

    #[error("Memory fault: address {address} out of range")]
    MemoryFault { address: Address },

    // Loading
    #[error("Image of {image} words does not fit in addressable memory ({capacity} words)")]
    ImageTooLarge { image: usize, capacity: usize },

    #[error("Invalid executable: {0}")]
    InvalidExecutable(String),
}

pub type Result<T> = std::result::Result<T, HardwareError>;
