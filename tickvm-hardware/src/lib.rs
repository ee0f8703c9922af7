//! # tickvm Virtual Hardware
//!
//! Clock-driven simulation of three units exchanging work through
//! handshake registers:
//!
//! - [`Memory`]: word array with a request/response handshake
//! - [`Cache`]: one 8-word instruction line filled word by word from memory
//! - [`Cpu`]: fetches through the cache and executes decoded instructions
//!
//! Every [`Clock::tick`] runs memory, then cache, then CPU, exactly once.
//!
//! ## Example
//!
//! ```rust
//! use tickvm_hardware::{Machine, MachineConfig, StopReason, HaltReason};
//! use tickvm_isa::{encode_all, Executable, Instruction, Register};
//!
//! let image = encode_all(&[
//!     Instruction::Put { value: 5, output: Register::R0 },
//!     Instruction::Halt,
//! ]);
//!
//! let mut machine = Machine::new(MachineConfig::default());
//! machine.load(&Executable::new(image)).unwrap();
//! let result = machine.run();
//!
//! assert_eq!(result.stop_reason, StopReason::Halted(HaltReason::Halt));
//! assert_eq!(machine.cpu().register(Register::R0), 5);
//! ```

pub mod error;
pub mod memory;
pub mod cache;
pub mod cpu;
pub mod clock;
pub mod machine;

pub use error::{HardwareError, Result};
pub use memory::{Memory, MemoryMode};
pub use cache::{Cache, CacheState};
pub use cpu::{Cpu, CpuState, HaltReason, InstructionState};
pub use clock::Clock;
pub use machine::{ExecutionResult, Machine, MachineConfig, Snapshot, StopReason};
