//! # Instruction cache
//!
//! One line of [`CACHE_LINE_WORDS`] words. A fill reads the line word by
//! word through the memory handshake:
//!
//! ```text
//! FillRequested --memory idle: issue read(address + index)--> Filling
//! Filling --memory complete: store word--> FillRequested (index + 1)
//!                                      --> Idle (after the last word)
//! ```
//!
//! Each word costs two ticks, so a full line takes 16.

use crate::memory::{Memory, MemoryMode};
use serde::{Deserialize, Serialize};
use tickvm_isa::{Address, Word, CACHE_LINE_WORDS, INSTRUCTION_WORDS};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheState {
    Idle,
    FillRequested,
    Filling,
    /// Memory faulted during a fill
    Faulted,
}

impl CacheState {
    /// Numeric handshake code
    pub fn code(self) -> Word {
        match self {
            CacheState::Idle => 0,
            CacheState::FillRequested => 1,
            CacheState::Filling => 2,
            CacheState::Faulted => 3,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Cache {
    address: Address,
    state: CacheState,
    index: usize,
    lines: [Word; CACHE_LINE_WORDS],
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache {
    pub fn new() -> Self {
        Self {
            address: 0,
            state: CacheState::Idle,
            index: 0,
            lines: [0; CACHE_LINE_WORDS],
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn lines(&self) -> &[Word; CACHE_LINE_WORDS] {
        &self.lines
    }

    pub fn is_idle(&self) -> bool {
        self.state == CacheState::Idle
    }

    /// Start refilling the line from `address`
    pub fn request_fill(&mut self, address: Address) {
        self.address = address;
        self.index = 0;
        self.state = CacheState::FillRequested;
    }

    /// The four words of the instruction at word `offset` within the line
    pub fn instruction(&self, offset: usize) -> [Word; INSTRUCTION_WORDS] {
        let mut words = [0; INSTRUCTION_WORDS];
        for (i, word) in words.iter_mut().enumerate() {
            *word = self.lines[(offset + i) % CACHE_LINE_WORDS];
        }
        words
    }

    pub fn tick(&mut self, memory: &mut Memory) {
        match self.state {
            CacheState::Idle | CacheState::Faulted => {}
            CacheState::FillRequested => {
                if memory.is_idle() {
                    memory.request_read(self.address.wrapping_add(self.index as Address));
                    self.state = CacheState::Filling;
                }
            }
            CacheState::Filling => match memory.mode() {
                MemoryMode::Complete => {
                    self.lines[self.index] = memory.acknowledge();
                    if self.index == CACHE_LINE_WORDS - 1 {
                        self.index = 0;
                        self.state = CacheState::Idle;
                    } else {
                        self.index += 1;
                        self.state = CacheState::FillRequested;
                    }
                }
                MemoryMode::Faulted => {
                    tracing::warn!("cache fill faulted at address {}", memory.address());
                    self.state = CacheState::Faulted;
                }
                MemoryMode::Idle | MemoryMode::ReadRequested | MemoryMode::WriteRequested => {}
            },
        }
    }
}
