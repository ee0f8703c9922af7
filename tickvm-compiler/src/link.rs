//! # Linker
//!
//! Two phases over a [`GeneratedProgram`]:
//!
//! 1. Collect: build the [`SymbolTable`] from spans, register bindings,
//!    data block offsets and the fixed layout constants.
//! 2. Resolve: replace every reference with its value, encode instructions
//!    and append the data segment.
//!
//! ```text
//! 0              program_size        free_memory_start
//! | instructions | data blocks ...   | stack (stack_size words)
//! ```

use crate::codegen::GeneratedProgram;
use crate::error::{CompileError, Result};
use crate::il::{Argument, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tickvm_isa::{encode_all, Executable, Instruction, Word, DEFAULT_STACK_SIZE, INSTRUCTION_WORDS};

/// Linker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkerConfig {
    /// Words reserved for the runtime stack after `free_memory_start`
    pub stack_size: Word,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

/// Insertion-ordered symbol table; built once, read-only afterwards
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    entries: Vec<(Symbol, Word)>,
    index: HashMap<Symbol, usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: Symbol, value: Word) -> Result<()> {
        if self.index.contains_key(&id) {
            return Err(CompileError::DuplicateSymbol(id));
        }
        self.index.insert(id.clone(), self.entries.len());
        self.entries.push((id, value));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Word> {
        self.index.get(id).map(|&i| self.entries[i].1)
    }

    /// Literal passes through, reference is looked up
    pub fn resolve(&self, arg: &Argument) -> Result<Word> {
        match arg {
            Argument::Literal(value) => Ok(*value),
            Argument::Reference(id) => self
                .get(id.as_str())
                .ok_or_else(|| CompileError::UnresolvedSymbol(id.clone())),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, Word)> {
        self.entries.iter().map(|(id, value)| (id, *value))
    }
}

/// Sizes and boundaries of the linked image, in words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLayout {
    pub program_size: Word,
    pub data_size: Word,
    pub free_memory_start: Word,
    pub stack_size: Word,
}

/// Output of [`link`]
#[derive(Debug, Clone)]
pub struct Linked {
    pub executable: Executable,
    pub instructions: Vec<Instruction>,
    pub symbols: SymbolTable,
    pub layout: MemoryLayout,
}

pub fn link(program: &GeneratedProgram, config: &LinkerConfig) -> Result<Linked> {
    let (symbols, layout) = collect(program, config)?;

    let mut instructions = Vec::with_capacity(program.instructions.len());
    for instr in &program.instructions {
        let mut words = [0; 3];
        for (word, arg) in words.iter_mut().zip(&instr.operands) {
            *word = symbols.resolve(arg)?;
        }
        instructions.push(Instruction::from_operands(instr.opcode, words)?);
    }

    let mut memory = encode_all(&instructions);
    for block in &program.data {
        for arg in &block.contents {
            memory.push(symbols.resolve(arg)?);
        }
    }

    tracing::debug!(
        "linked: program_size={}, data_size={}, free_memory_start={}, {} symbols",
        layout.program_size,
        layout.data_size,
        layout.free_memory_start,
        symbols.len()
    );

    Ok(Linked {
        executable: Executable::new(memory),
        instructions,
        symbols,
        layout,
    })
}

fn collect(program: &GeneratedProgram, config: &LinkerConfig) -> Result<(SymbolTable, MemoryLayout)> {
    let mut symbols = SymbolTable::new();

    for span in &program.spans {
        let start = span.start as Word;
        symbols.insert(span.id.clone(), start)?;
        symbols.insert(span.id.derive("start"), start)?;
        symbols.insert(span.id.derive("end"), span.end as Word)?;
        symbols.insert(span.id.derive("address"), start * INSTRUCTION_WORDS as Word)?;
    }

    for binding in &program.bindings {
        symbols.insert(binding.id.clone(), binding.register.to_word())?;
    }

    let program_size = (program.instructions.len() * INSTRUCTION_WORDS) as Word;
    let mut offset = program_size;
    for block in &program.data {
        let size = block.contents.len() as Word;
        symbols.insert(block.id.clone(), offset)?;
        symbols.insert(block.id.derive("size"), size)?;
        offset += size;
    }

    let layout = MemoryLayout {
        program_size,
        data_size: offset - program_size,
        free_memory_start: offset,
        stack_size: config.stack_size,
    };

    symbols.insert("program_size".into(), layout.program_size)?;
    symbols.insert("free_memory_start".into(), layout.free_memory_start)?;
    symbols.insert("stack_size".into(), layout.stack_size)?;

    Ok((symbols, layout))
}
