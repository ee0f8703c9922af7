//! # Executable Image
//!
//! The linked artifact loaded into the machine:
//!
//! ```text
//! address 0                program_size          free_memory_start
//! | encoded instructions    | data segment         | stack / heap ...
//! ```
//!
//! Execution begins at `start` with every general-purpose register set to
//! the matching entry of `registers`.

use crate::error::{IsaError, Result};
use crate::register::NUM_REGISTERS;
use crate::{Address, Word};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Executable {
    /// Word address where the CPU begins fetching
    pub start: Address,

    /// Flat memory image: instructions followed by data
    pub memory: Vec<Word>,

    /// Initial general-purpose register values
    pub registers: [Word; NUM_REGISTERS],
}

impl Executable {
    /// Image starting at address 0 with all registers cleared
    pub fn new(memory: Vec<Word>) -> Self {
        Self {
            start: 0,
            memory,
            registers: [0; NUM_REGISTERS],
        }
    }

    /// Size of the image in words
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Check that the entry point lies inside the image
    pub fn validate(&self) -> Result<()> {
        if self.start as usize >= self.memory.len() {
            return Err(IsaError::InvalidExecutable(format!(
                "start address {} outside image of {} words",
                self.start,
                self.memory.len()
            )));
        }
        Ok(())
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let executable: Self = bincode::deserialize(bytes)?;
        executable.validate()?;
        Ok(executable)
    }

    /// SHA-256 over start, registers and memory (little-endian words)
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.start.to_le_bytes());
        for reg in &self.registers {
            hasher.update(reg.to_le_bytes());
        }
        for word in &self.memory {
            hasher.update(word.to_le_bytes());
        }
        hasher.finalize().into()
    }
}
