//! # Code Generator
//!
//! One depth-first walk over the IL tree:
//!
//! - `BorrowRegister` pops a register from the free pool, binds it for the
//!   body, and pushes it back afterwards (strict LIFO, no aliasing)
//! - `Instruction` is appended to the flat stream
//! - `Label` records a `[start, end)` span around its body
//! - `Island` is queued and flattened after the current block
//! - `Data` is collected for the linker's data segment
//!
//! The root block and every island end in an implicit `halt`.

use crate::error::{CompileError, Result};
use crate::il::{Argument, Node, Symbol};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tickvm_isa::{Opcode, Register, NUM_REGISTERS};

/// Instruction whose operands may still be symbolic
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolicInstruction {
    pub opcode: Opcode,
    pub operands: [Argument; 3],
}

impl SymbolicInstruction {
    fn halt() -> Self {
        Self {
            opcode: Opcode::Halt,
            operands: [Argument::unused(), Argument::unused(), Argument::unused()],
        }
    }
}

/// Debug range of instruction indices attributed to a label
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub id: Symbol,
    pub start: usize,
    pub end: usize,
}

/// Symbolic id bound to a concrete register
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub id: Symbol,
    pub register: Register,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataBlock {
    pub id: Symbol,
    pub contents: Vec<Argument>,
}

/// Output of [`generate`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedProgram {
    /// Flat instruction stream: root block, then islands
    pub instructions: Vec<SymbolicInstruction>,
    /// Label spans in completion order
    pub spans: Vec<Span>,
    /// Register bindings in acquisition order
    pub bindings: Vec<Binding>,
    /// Data blocks in declaration order
    pub data: Vec<DataBlock>,
    /// Instruction range of the root block and of each island, halt included
    pub blocks: Vec<Range<usize>>,
    /// Most registers bound at once
    pub peak_registers: usize,
}

/// Flatten an IL tree
pub fn generate(root: &Node) -> Result<GeneratedProgram> {
    Generator::new().run(root)
}

struct Generator<'a> {
    free: Vec<Register>,
    pending: Vec<&'a Node>,
    program: GeneratedProgram,
}

impl<'a> Generator<'a> {
    fn new() -> Self {
        // popped from the back: r0 is handed out first
        let free = Register::ALL.iter().rev().copied().collect();

        Self {
            free,
            pending: Vec::new(),
            program: GeneratedProgram::default(),
        }
    }

    fn run(mut self, root: &'a Node) -> Result<GeneratedProgram> {
        self.block(root)?;

        // most recently queued island first
        while let Some(island) = self.pending.pop() {
            self.block(island)?;
        }

        tracing::debug!(
            "generated {} instructions in {} blocks, {} data blocks, {} spans",
            self.program.instructions.len(),
            self.program.blocks.len(),
            self.program.data.len(),
            self.program.spans.len()
        );

        Ok(self.program)
    }

    fn block(&mut self, node: &'a Node) -> Result<()> {
        let start = self.program.instructions.len();
        self.walk(node)?;
        self.program.instructions.push(SymbolicInstruction::halt());
        self.program.blocks.push(start..self.program.instructions.len());
        Ok(())
    }

    fn walk(&mut self, node: &'a Node) -> Result<()> {
        match node {
            Node::Instruction { opcode, operands } => {
                self.program.instructions.push(SymbolicInstruction {
                    opcode: *opcode,
                    operands: operands.clone(),
                });
            }
            Node::List(nodes) => {
                for node in nodes {
                    self.walk(node)?;
                }
            }
            Node::Label { id, body } => {
                let start = self.program.instructions.len();
                self.walk(body)?;
                self.program.spans.push(Span {
                    id: id.clone(),
                    start,
                    end: self.program.instructions.len(),
                });
            }
            Node::BorrowRegister { id, body } => {
                let register = self
                    .free
                    .pop()
                    .ok_or_else(|| CompileError::RegisterExhausted { id: id.clone() })?;

                let live = NUM_REGISTERS - self.free.len();
                self.program.peak_registers = self.program.peak_registers.max(live);
                tracing::trace!("borrow {} -> {} ({} live)", id, register, live);

                self.program.bindings.push(Binding { id: id.clone(), register });
                self.walk(body)?;

                tracing::trace!("release {} <- {}", id, register);
                self.free.push(register);
            }
            Node::Island(body) => {
                self.pending.push(body);
            }
            Node::Data { id, contents } => {
                self.program.data.push(DataBlock {
                    id: id.clone(),
                    contents: contents.clone(),
                });
            }
        }

        Ok(())
    }
}
