//! # tickvm Disassembler
//!
//! Render the instruction segment of an [`Executable`](tickvm_isa::Executable)
//! as a listing for display. Purely read-only; undecodable words become
//! explicit error lines instead of aborting the listing.
//!
//! ## Example
//!
//! ```rust
//! use tickvm_disassembler::Disassembler;
//! use tickvm_isa::{encode_all, Executable, Instruction, Register};
//!
//! let exe = Executable::new(encode_all(&[
//!     Instruction::Put { value: 5, output: Register::R0 },
//!     Instruction::Halt,
//! ]));
//!
//! let listing = Disassembler::new(&exe).render().unwrap();
//! assert!(listing.contains("put 5, r0"));
//! ```

pub mod error;
pub mod formatter;
pub mod disassembler;

pub use error::{DisassemblerError, Result};
pub use disassembler::{disassemble, Disassembler, ListingLine};
pub use formatter::{format, format_words};
