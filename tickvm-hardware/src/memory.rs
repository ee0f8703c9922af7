//! # Memory unit
//!
//! Backing word array plus the `{mode, address, value}` handshake:
//!
//! ```text
//! requester              memory (next tick)         requester
//! Idle --request--> ReadRequested  --> Complete --acknowledge--> Idle
//!                   WriteRequested --> Complete
//!                   (out of range) --> Faulted
//! ```
//!
//! The requester writes the request and resets the unit to idle after
//! consuming the result, so one round trip costs at least two ticks.

use serde::{Deserialize, Serialize};
use tickvm_isa::{Address, Word};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemoryMode {
    Idle,
    ReadRequested,
    WriteRequested,
    Complete,
    /// Last request addressed a word outside the array
    Faulted,
}

impl MemoryMode {
    /// Numeric handshake code
    pub fn code(self) -> Word {
        match self {
            MemoryMode::Idle => 0,
            MemoryMode::ReadRequested => 1,
            MemoryMode::WriteRequested => 2,
            MemoryMode::Complete => 3,
            MemoryMode::Faulted => 4,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Memory {
    contents: Vec<Word>,
    mode: MemoryMode,
    address: Address,
    value: Word,
}

impl Memory {
    /// Zeroed memory of `size` words
    pub fn new(size: usize) -> Self {
        Self {
            contents: vec![0; size],
            mode: MemoryMode::Idle,
            address: 0,
            value: 0,
        }
    }

    /// Zero everything, then copy `image` to address 0
    pub fn load(&mut self, image: &[Word]) {
        self.contents.fill(0);
        let len = image.len().min(self.contents.len());
        self.contents[..len].copy_from_slice(&image[..len]);

        self.mode = MemoryMode::Idle;
        self.address = 0;
        self.value = 0;
    }

    pub fn mode(&self) -> MemoryMode {
        self.mode
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn value(&self) -> Word {
        self.value
    }

    pub fn contents(&self) -> &[Word] {
        &self.contents
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn is_idle(&self) -> bool {
        self.mode == MemoryMode::Idle
    }

    /// Direct read for inspection; bypasses the handshake
    pub fn peek(&self, address: Address) -> Option<Word> {
        self.contents.get(address as usize).copied()
    }

    // ========== Handshake (requester side) ==========

    pub fn request_read(&mut self, address: Address) {
        self.address = address;
        self.mode = MemoryMode::ReadRequested;
    }

    pub fn request_write(&mut self, address: Address, value: Word) {
        self.address = address;
        self.value = value;
        self.mode = MemoryMode::WriteRequested;
    }

    /// Consume a completed result and return the unit to idle
    pub fn acknowledge(&mut self) -> Word {
        self.mode = MemoryMode::Idle;
        self.value
    }

    // ========== Clock ==========

    pub fn tick(&mut self) {
        self.mode = match self.mode {
            MemoryMode::ReadRequested => match self.contents.get(self.address as usize) {
                Some(&word) => {
                    self.value = word;
                    MemoryMode::Complete
                }
                None => MemoryMode::Faulted,
            },
            MemoryMode::WriteRequested => match self.contents.get_mut(self.address as usize) {
                Some(slot) => {
                    *slot = self.value;
                    MemoryMode::Complete
                }
                None => MemoryMode::Faulted,
            },
            mode @ (MemoryMode::Idle | MemoryMode::Complete | MemoryMode::Faulted) => mode,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_round_trip() {
        let mut memory = Memory::new(16);
        memory.load(&[10, 20, 30]);

        memory.request_read(2);
        assert_eq!(memory.mode().code(), 1);

        memory.tick();
        assert_eq!(memory.mode(), MemoryMode::Complete);
        assert_eq!(memory.acknowledge(), 30);
        assert!(memory.is_idle());
    }

    #[test]
    fn test_write_only_writes() {
        let mut memory = Memory::new(16);
        memory.request_write(8, 1337);
        memory.tick();

        assert_eq!(memory.mode(), MemoryMode::Complete);
        assert_eq!(memory.peek(8), Some(1337));
        memory.acknowledge();
        assert!(memory.is_idle());
    }

    #[test]
    fn test_read_does_not_write() {
        let mut memory = Memory::new(4);
        memory.load(&[1, 2, 3, 4]);
        memory.request_write(0, 99);
        memory.tick();
        memory.acknowledge();

        memory.request_read(1);
        memory.tick();
        assert_eq!(memory.acknowledge(), 2);
        assert_eq!(memory.contents(), &[99, 2, 3, 4]);
    }

    #[test]
    fn test_completed_result_waits_for_requester() {
        let mut memory = Memory::new(4);
        memory.request_read(0);
        memory.tick();
        memory.tick();
        assert_eq!(memory.mode(), MemoryMode::Complete);
    }

    #[test]
    fn test_out_of_range_faults() {
        let mut memory = Memory::new(4);
        memory.request_read(4);
        memory.tick();
        assert_eq!(memory.mode(), MemoryMode::Faulted);
        assert_eq!(memory.address(), 4);

        memory.tick();
        assert_eq!(memory.mode(), MemoryMode::Faulted);
    }

    #[test]
    fn test_load_truncates_and_clears() {
        let mut memory = Memory::new(2);
        memory.load(&[1, 2, 3]);
        assert_eq!(memory.contents(), &[1, 2]);

        memory.load(&[5]);
        assert_eq!(memory.contents(), &[5, 0]);
    }
}
