//! # tickvm Instruction Set
//!
//! Fixed-width instruction set for an 8-register word machine.
//!
//! ## Key Features
//! - One machine word is an unsigned 32-bit integer (arithmetic wraps)
//! - 8 general-purpose registers (r0-r7)
//! - 9 instructions, each encoded as exactly 4 words:
//!   `[opcode, slot1, slot2, slot3]`, unused slots encoded as 0
//! - Instructions are fetched through an 8-word cache line (2 instructions)
//! - The linked [`Executable`] image is instructions followed by data

pub mod register;
pub mod opcode;
pub mod instruction;
pub mod encoding;
pub mod executable;
pub mod error;

pub use register::{Register, NUM_REGISTERS};
pub use opcode::{Opcode, OperandKind, OPCODE_TABLE};
pub use instruction::Instruction;
pub use encoding::{decode, decode_at, encode, encode_all};
pub use executable::Executable;
pub use error::{IsaError, Result};

/// Machine word
pub type Word = u32;

/// Word address into memory
pub type Address = u32;

/// Words per encoded instruction
pub const INSTRUCTION_WORDS: usize = 4;

/// Words per instruction cache line
pub const CACHE_LINE_WORDS: usize = 8;

/// Instructions resident in one cache line
pub const INSTRUCTIONS_PER_LINE: usize = CACHE_LINE_WORDS / INSTRUCTION_WORDS;

/// Default runtime stack region size in words
pub const DEFAULT_STACK_SIZE: Word = 128;
