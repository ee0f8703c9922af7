//! Machine: loader and tick driver for the three hardware units.

use crate::cache::Cache;
use crate::clock::Clock;
use crate::cpu::{Cpu, CpuState, HaltReason};
use crate::error::{HardwareError, Result};
use crate::memory::Memory;
use serde::{Deserialize, Serialize};
use tickvm_isa::{Address, Executable, Word, CACHE_LINE_WORDS, INSTRUCTION_WORDS, NUM_REGISTERS};

/// Machine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Minimum memory size in words
    pub memory_words: usize,

    /// Words reserved past the loaded image
    pub stack_words: usize,

    /// Tick budget for [`Machine::run`] and friends
    pub max_ticks: u64,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            memory_words: 1024,
            stack_words: tickvm_isa::DEFAULT_STACK_SIZE as usize,
            max_ticks: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    Halted(HaltReason),
    /// `max_ticks` spent without halting
    TickLimit,
    /// About to execute the instruction at this index; see
    /// [`Machine::run_until`] for when a breakpoint is skipped
    Breakpoint(usize),
    /// One instruction retired
    Stepped,
}

/// Execution result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Ticks spent in this call
    pub ticks: u64,

    /// Instructions retired in this call
    pub instructions: u64,

    pub stop_reason: StopReason,
}

impl ExecutionResult {
    pub fn fault(&self) -> Option<&HardwareError> {
        match &self.stop_reason {
            StopReason::Halted(HaltReason::Fault(err)) => Some(err),
            _ => None,
        }
    }
}

/// Serializable view of the machine for debuggers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub instruction_address: Address,
    pub cpu_state: CpuState,
    pub halt_reason: Option<HaltReason>,
    pub registers: [Word; NUM_REGISTERS],
    pub memory: Vec<Word>,
}

pub struct Machine {
    config: MachineConfig,
    clock: Clock,
    memory: Memory,
    cache: Cache,
    cpu: Cpu,
}

impl Machine {
    /// Idle machine with zeroed memory and a halted CPU
    pub fn new(config: MachineConfig) -> Self {
        let memory = Memory::new(config.memory_words);
        Self {
            config,
            clock: Clock::new(),
            memory,
            cache: Cache::new(),
            cpu: Cpu::new(),
        }
    }

    /// Reset every unit, copy the image to address 0 and start the CPU
    pub fn load(&mut self, executable: &Executable) -> Result<()> {
        executable
            .validate()
            .map_err(|err| HardwareError::InvalidExecutable(err.to_string()))?;

        let image = executable.len();
        let required = image.div_ceil(CACHE_LINE_WORDS) * CACHE_LINE_WORDS + self.config.stack_words;
        let capacity = Address::MAX as usize;
        if required > capacity {
            return Err(HardwareError::ImageTooLarge { image, capacity });
        }

        self.memory = Memory::new(self.config.memory_words.max(required));
        self.memory.load(&executable.memory);
        self.cache = Cache::new();
        self.cpu.start(executable.start, executable.registers);
        self.clock.reset();

        tracing::debug!(
            "loaded {} word image into {} words of memory, start={}",
            image,
            self.memory.len(),
            executable.start
        );
        Ok(())
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn is_halted(&self) -> bool {
        self.cpu.is_halted()
    }

    /// Index of the current instruction (word address / 4)
    pub fn current_instruction(&self) -> usize {
        self.cpu.current_address() as usize / INSTRUCTION_WORDS
    }

    /// Advance every unit by one cycle
    pub fn tick(&mut self) {
        self.clock.tick(&mut self.memory, &mut self.cache, &mut self.cpu);
    }

    /// Tick until one instruction retires, the CPU halts, or the tick
    /// budget runs out
    pub fn step_instruction(&mut self) -> ExecutionResult {
        let retired = self.cpu.retired();
        self.drive(|machine| machine.cpu.retired() > retired)
    }

    /// Tick until the CPU halts or the tick budget runs out
    pub fn run(&mut self) -> ExecutionResult {
        self.drive(|_| false)
    }

    /// Like [`Machine::run`], but stop before executing any instruction
    /// whose index is in `breakpoints`. An instruction the CPU is already
    /// stopped at (e.g. the last breakpoint hit) does not trigger again
    /// until it has been executed; a freshly loaded machine stops at its
    /// entry instruction if that index is listed.
    pub fn run_until(&mut self, breakpoints: &[usize]) -> ExecutionResult {
        let start = self.cpu.retired();
        let resumed_at = self
            .cpu
            .at_instruction_boundary()
            .then(|| self.current_instruction());

        let mut result = self.drive(|machine| {
            let index = machine.current_instruction();
            let moved = machine.cpu.retired() > start || resumed_at != Some(index);
            moved && machine.cpu.at_instruction_boundary() && breakpoints.contains(&index)
        });

        if result.stop_reason == StopReason::Stepped {
            result.stop_reason = StopReason::Breakpoint(self.current_instruction());
        }
        result
    }

    /// Tick until halted, out of budget, or `stop` returns true after a tick
    fn drive(&mut self, mut stop: impl FnMut(&Self) -> bool) -> ExecutionResult {
        let start_tick = self.clock.cycle();
        let start_retired = self.cpu.retired();

        let stop_reason = loop {
            if let Some(reason) = self.halt_reason() {
                break StopReason::Halted(reason);
            }
            if self.clock.cycle() - start_tick >= self.config.max_ticks {
                break StopReason::TickLimit;
            }

            self.tick();

            if !self.cpu.is_halted() && stop(self) {
                break StopReason::Stepped;
            }
        };

        ExecutionResult {
            ticks: self.clock.cycle() - start_tick,
            instructions: self.cpu.retired() - start_retired,
            stop_reason,
        }
    }

    fn halt_reason(&self) -> Option<HaltReason> {
        if !self.cpu.is_halted() {
            return None;
        }
        // a machine that was never loaded reports a plain halt
        Some(self.cpu.halt_reason().cloned().unwrap_or(HaltReason::Halt))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.clock.cycle(),
            instruction_address: self.cpu.current_address(),
            cpu_state: self.cpu.state(),
            halt_reason: self.cpu.halt_reason().cloned(),
            registers: *self.cpu.registers(),
            memory: self.memory.contents().to_vec(),
        }
    }
}
