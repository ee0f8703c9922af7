//! Shared synchronous clock.

use crate::cache::Cache;
use crate::cpu::Cpu;
use crate::memory::Memory;

/// Drives every unit once per cycle in fixed order: memory, cache, CPU.
///
/// Each unit observes handshake values as left by the units that ran
/// before it, so producers always tick before their consumers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Clock {
    cycle: u64,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cycles elapsed since the last reset
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn reset(&mut self) {
        self.cycle = 0;
    }

    pub fn tick(&mut self, memory: &mut Memory, cache: &mut Cache, cpu: &mut Cpu) {
        memory.tick();
        cache.tick(memory);
        cpu.tick(cache, memory);
        self.cycle += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheState;
    use crate::memory::MemoryMode;

    #[test]
    fn test_tick_counts_cycles() {
        let mut clock = Clock::new();
        let mut memory = Memory::new(8);
        let mut cache = Cache::new();
        let mut cpu = Cpu::new();

        for _ in 0..3 {
            clock.tick(&mut memory, &mut cache, &mut cpu);
        }
        assert_eq!(clock.cycle(), 3);

        clock.reset();
        assert_eq!(clock.cycle(), 0);
    }

    #[test]
    fn test_memory_completes_before_cache_observes() {
        let mut clock = Clock::new();
        let mut memory = Memory::new(16);
        memory.load(&[11]);
        let mut cache = Cache::new();
        let mut cpu = Cpu::new();

        cache.request_fill(0);
        clock.tick(&mut memory, &mut cache, &mut cpu);
        assert_eq!(cache.state(), CacheState::Filling);
        assert_eq!(memory.mode(), MemoryMode::ReadRequested);

        // memory answers and the cache consumes within the same cycle
        clock.tick(&mut memory, &mut cache, &mut cpu);
        assert_eq!(cache.lines()[0], 11);
        assert_eq!(cache.state(), CacheState::FillRequested);
        assert!(memory.is_idle());
    }
}
