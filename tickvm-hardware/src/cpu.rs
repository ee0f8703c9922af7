//! # CPU
//!
//! ```text
//! Halted
//! RequestLine --cache idle: request fill at instruction_address--> AwaitLine
//! AwaitLine   --cache idle--> Execute
//! Execute     --retire, offset 0--> Execute (offset 4)
//!             --retire, offset 4--> RequestLine (instruction_address + 8)
//!             --jump / call--> RequestLine (instruction_address = target)
//!             --halt / fault--> Halted
//! ```
//!
//! Register instructions retire in the tick they execute. `read` and
//! `write` step through [`InstructionState`] across ticks using the memory
//! handshake and retire only once memory reports completion.

use crate::cache::{Cache, CacheState};
use crate::error::HardwareError;
use crate::memory::{Memory, MemoryMode};
use serde::{Deserialize, Serialize};
use tickvm_isa::{
    Address, Instruction, Opcode, Register, Word, CACHE_LINE_WORDS, INSTRUCTION_WORDS, NUM_REGISTERS,
};

/// Offset of the last instruction slot in a cache line
const LAST_SLOT: usize = CACHE_LINE_WORDS - INSTRUCTION_WORDS;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CpuState {
    Halted,
    RequestLine,
    AwaitLine,
    Execute,
}

impl CpuState {
    pub fn code(self) -> Word {
        match self {
            CpuState::Halted => 0,
            CpuState::RequestLine => 1,
            CpuState::AwaitLine => 2,
            CpuState::Execute => 3,
        }
    }
}

/// Progress of a multi-cycle memory instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstructionState {
    NotStarted,
    Issue,
    AwaitCompletion,
}

impl InstructionState {
    pub fn code(self) -> Word {
        match self {
            InstructionState::NotStarted => 0,
            InstructionState::Issue => 1,
            InstructionState::AwaitCompletion => 2,
        }
    }
}

/// Why the CPU stopped
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaltReason {
    /// Executed `halt`
    Halt,
    Fault(HardwareError),
}

/// Result of executing the current instruction for one tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Retired,
    Stalled,
    Jumped(Address),
    Halted,
}

/// Memory side of a `read` / `write`
#[derive(Clone, Copy, Debug)]
enum Access {
    Read { address: Address, output: Register },
    Write { address: Address, value: Word },
}

#[derive(Clone, Debug)]
pub struct Cpu {
    instruction_address: Address,
    instruction_cache_offset: usize,
    state: CpuState,
    instruction_state: InstructionState,
    general_purpose: [Word; NUM_REGISTERS],
    halt_reason: Option<HaltReason>,
    retired: u64,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// Halted CPU with cleared registers
    pub fn new() -> Self {
        Self {
            instruction_address: 0,
            instruction_cache_offset: 0,
            state: CpuState::Halted,
            instruction_state: InstructionState::NotStarted,
            general_purpose: [0; NUM_REGISTERS],
            halt_reason: None,
            retired: 0,
        }
    }

    /// Begin fetching at `start` with the given register file
    pub fn start(&mut self, start: Address, registers: [Word; NUM_REGISTERS]) {
        *self = Self::new();
        self.instruction_address = start;
        self.general_purpose = registers;
        self.state = CpuState::RequestLine;
    }

    pub fn state(&self) -> CpuState {
        self.state
    }

    pub fn instruction_state(&self) -> InstructionState {
        self.instruction_state
    }

    pub fn instruction_address(&self) -> Address {
        self.instruction_address
    }

    pub fn instruction_cache_offset(&self) -> usize {
        self.instruction_cache_offset
    }

    /// Word address of the instruction being executed or fetched
    pub fn current_address(&self) -> Address {
        self.instruction_address
            .wrapping_add(self.instruction_cache_offset as Address)
    }

    pub fn register(&self, register: Register) -> Word {
        self.general_purpose[register.index()]
    }

    pub fn registers(&self) -> &[Word; NUM_REGISTERS] {
        &self.general_purpose
    }

    pub fn halt_reason(&self) -> Option<&HaltReason> {
        self.halt_reason.as_ref()
    }

    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Instructions retired since [`Cpu::start`]
    pub fn retired(&self) -> u64 {
        self.retired
    }

    /// Next tick begins a fresh instruction
    pub fn at_instruction_boundary(&self) -> bool {
        self.state == CpuState::Execute && self.instruction_state == InstructionState::NotStarted
    }

    pub fn tick(&mut self, cache: &mut Cache, memory: &mut Memory) {
        match self.state {
            CpuState::Halted => {}
            CpuState::RequestLine => {
                if cache.is_idle() {
                    cache.request_fill(self.instruction_address);
                    self.state = CpuState::AwaitLine;
                }
            }
            CpuState::AwaitLine => match cache.state() {
                CacheState::Idle => self.state = CpuState::Execute,
                CacheState::Faulted => self.fault(HardwareError::MemoryFault {
                    address: memory.address(),
                }),
                CacheState::FillRequested | CacheState::Filling => {}
            },
            CpuState::Execute => self.execute(cache, memory),
        }
    }

    fn execute(&mut self, cache: &Cache, memory: &mut Memory) {
        let address = self.current_address();
        let instruction = match self.decode(cache, address) {
            Ok(instruction) => instruction,
            Err(err) => return self.fault(err),
        };

        match self.run(instruction, address, memory) {
            Outcome::Stalled => {}
            Outcome::Halted => {
                self.retired += 1;
                self.state = CpuState::Halted;
                self.halt_reason = Some(HaltReason::Halt);
                tracing::debug!("halt at address {} after {} instructions", address, self.retired);
            }
            Outcome::Jumped(target) => {
                self.retire(address, instruction);
                self.instruction_address = target;
                self.instruction_cache_offset = 0;
                self.state = CpuState::RequestLine;
            }
            Outcome::Retired => {
                self.retire(address, instruction);
                if self.instruction_cache_offset == LAST_SLOT {
                    self.instruction_cache_offset = 0;
                    self.instruction_address = self
                        .instruction_address
                        .wrapping_add(CACHE_LINE_WORDS as Address);
                    self.state = CpuState::RequestLine;
                } else {
                    self.instruction_cache_offset += INSTRUCTION_WORDS;
                }
            }
        }
    }

    fn decode(&self, cache: &Cache, address: Address) -> Result<Instruction, HardwareError> {
        let [opcode, a, b, c] = cache.instruction(self.instruction_cache_offset);
        let opcode = Opcode::from_word(opcode)
            .map_err(|_| HardwareError::UnknownOpcode { address, opcode })?;

        Instruction::from_operands(opcode, [a, b, c]).map_err(|err| {
            HardwareError::InvalidInstruction {
                address,
                reason: err.to_string(),
            }
        })
    }

    fn run(&mut self, instruction: Instruction, address: Address, memory: &mut Memory) -> Outcome {
        let regs = &mut self.general_purpose;

        match instruction {
            Instruction::Add { left, right, output } => {
                regs[output.index()] = regs[left.index()].wrapping_add(regs[right.index()]);
                Outcome::Retired
            }
            Instruction::Multiply { left, right, output } => {
                regs[output.index()] = regs[left.index()].wrapping_mul(regs[right.index()]);
                Outcome::Retired
            }
            Instruction::Put { value, output } => {
                regs[output.index()] = value;
                Outcome::Retired
            }
            Instruction::Copy { source, output } => {
                regs[output.index()] = regs[source.index()];
                Outcome::Retired
            }
            Instruction::Call { target, link } => {
                let target = regs[target.index()];
                regs[link.index()] = address.wrapping_add(INSTRUCTION_WORDS as Address);
                Outcome::Jumped(target)
            }
            Instruction::Jump { condition, target } => {
                if regs[condition.index()] != 0 {
                    Outcome::Jumped(regs[target.index()])
                } else {
                    Outcome::Retired
                }
            }
            Instruction::Halt => Outcome::Halted,
            Instruction::Read { address, output } => {
                let access = Access::Read { address: regs[address.index()], output };
                self.access(access, memory)
            }
            Instruction::Write { address, value } => {
                let access = Access::Write {
                    address: regs[address.index()],
                    value: regs[value.index()],
                };
                self.access(access, memory)
            }
        }
    }

    fn access(&mut self, access: Access, memory: &mut Memory) -> Outcome {
        // a fresh instruction issues in the same tick
        if self.instruction_state == InstructionState::NotStarted {
            self.instruction_state = InstructionState::Issue;
        }

        match self.instruction_state {
            InstructionState::NotStarted | InstructionState::Issue => {
                if memory.is_idle() {
                    match access {
                        Access::Read { address, .. } => memory.request_read(address),
                        Access::Write { address, value } => memory.request_write(address, value),
                    }
                    self.instruction_state = InstructionState::AwaitCompletion;
                }
                Outcome::Stalled
            }
            InstructionState::AwaitCompletion => match memory.mode() {
                MemoryMode::Complete => {
                    let value = memory.acknowledge();
                    if let Access::Read { output, .. } = access {
                        self.general_purpose[output.index()] = value;
                    }
                    self.instruction_state = InstructionState::NotStarted;
                    Outcome::Retired
                }
                MemoryMode::Faulted => {
                    self.instruction_state = InstructionState::NotStarted;
                    self.fault(HardwareError::MemoryFault { address: memory.address() });
                    Outcome::Stalled
                }
                MemoryMode::Idle | MemoryMode::ReadRequested | MemoryMode::WriteRequested => {
                    Outcome::Stalled
                }
            },
        }
    }

    fn retire(&mut self, address: Address, instruction: Instruction) {
        self.retired += 1;
        tracing::trace!("retired {:>6}: {}", address, instruction);
    }

    fn fault(&mut self, err: HardwareError) {
        tracing::warn!("cpu fault: {}", err);
        self.state = CpuState::Halted;
        self.halt_reason = Some(HaltReason::Fault(err));
    }
}
