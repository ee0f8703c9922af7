//! # Intermediate Language
//!
//! A tree of sequencing, labeling, scoped register borrowing, deferred
//! blocks ("islands") and static data. Operands are either literal words or
//! symbolic references resolved by the linker, so addresses and registers
//! that are not yet known can be emitted now.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use tickvm_isa::{Opcode, Register, Word};

/// Symbolic id: a label, register binding, data block or linker constant
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `self:suffix`, used for derived linker entries such as `id:start`
    pub fn derive(&self, suffix: &str) -> Symbol {
        Symbol(format!("{}:{}", self.0, suffix))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Symbol {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Instruction or data operand
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Argument {
    Literal(Word),
    Reference(Symbol),
}

impl Argument {
    pub fn literal(value: Word) -> Self {
        Argument::Literal(value)
    }

    pub fn reference(id: impl Into<Symbol>) -> Self {
        Argument::Reference(id.into())
    }

    /// A fixed register, bypassing allocation
    pub fn register(register: Register) -> Self {
        Argument::Literal(register.to_word())
    }

    /// Filler for an unused operand slot
    pub fn unused() -> Self {
        Argument::Literal(0)
    }
}

impl From<Register> for Argument {
    fn from(register: Register) -> Self {
        Argument::register(register)
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Literal(value) => write!(f, "{}", value),
            Argument::Reference(id) => write!(f, "@{}", id),
        }
    }
}

/// IL tree node
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    /// One machine instruction; operands follow [`Opcode::signature`]
    Instruction { opcode: Opcode, operands: [Argument; 3] },

    /// Children in order, occupying a contiguous instruction range
    List(Vec<Node>),

    /// Debug span around `body`; no runtime effect
    Label { id: Symbol, body: Box<Node> },

    /// Bind `id` to a free register for the duration of `body`
    BorrowRegister { id: Symbol, body: Box<Node> },

    /// Deferred block, flattened after the main stream
    Island(Box<Node>),

    /// Static words placed in the data segment
    Data { id: Symbol, contents: Vec<Argument> },
}

impl Node {
    pub fn instruction(opcode: Opcode, operands: [Argument; 3]) -> Node {
        Node::Instruction { opcode, operands }
    }

    pub fn add(left: Argument, right: Argument, output: Argument) -> Node {
        Node::instruction(Opcode::Add, [left, right, output])
    }

    pub fn multiply(left: Argument, right: Argument, output: Argument) -> Node {
        Node::instruction(Opcode::Multiply, [left, right, output])
    }

    pub fn read(address: Argument, output: Argument) -> Node {
        Node::instruction(Opcode::Read, [address, output, Argument::unused()])
    }

    pub fn write(address: Argument, value: Argument) -> Node {
        Node::instruction(Opcode::Write, [address, value, Argument::unused()])
    }

    pub fn put(value: Argument, output: Argument) -> Node {
        Node::instruction(Opcode::Put, [value, output, Argument::unused()])
    }

    pub fn copy(source: Argument, output: Argument) -> Node {
        Node::instruction(Opcode::Copy, [source, output, Argument::unused()])
    }

    pub fn call(target: Argument, link: Argument) -> Node {
        Node::instruction(Opcode::Call, [target, link, Argument::unused()])
    }

    pub fn halt() -> Node {
        Node::instruction(Opcode::Halt, [Argument::unused(), Argument::unused(), Argument::unused()])
    }

    pub fn jump(condition: Argument, target: Argument) -> Node {
        Node::instruction(Opcode::Jump, [condition, target, Argument::unused()])
    }

    pub fn list(nodes: Vec<Node>) -> Node {
        Node::List(nodes)
    }

    pub fn label(id: impl Into<Symbol>, body: Node) -> Node {
        Node::Label { id: id.into(), body: Box::new(body) }
    }

    pub fn borrow_register(id: impl Into<Symbol>, body: Node) -> Node {
        Node::BorrowRegister { id: id.into(), body: Box::new(body) }
    }

    pub fn island(body: Node) -> Node {
        Node::Island(Box::new(body))
    }

    pub fn data(id: impl Into<Symbol>, contents: Vec<Argument>) -> Node {
        Node::Data { id: id.into(), contents }
    }
}

/// Source of fresh, compilation-unique symbolic ids.
///
/// Owned by one compilation, so repeated or concurrent compilations
/// produce the same ids for the same input.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `namespace:N` with N unique within this generator
    pub fn fresh(&mut self, namespace: &str) -> Symbol {
        let id = Symbol(format!("{}:{}", namespace, self.next));
        self.next += 1;
        id
    }

    /// Borrow one register for the node built by `body`
    pub fn with_register(&mut self, body: impl FnOnce(&mut Self, Argument) -> Node) -> Node {
        let id = self.fresh("borrow");
        let node = body(self, Argument::Reference(id.clone()));
        Node::borrow_register(id, node)
    }

    /// Borrow `count` registers at once; the first is the outermost binding
    pub fn with_registers(
        &mut self,
        count: usize,
        body: impl FnOnce(&mut Self, &[Argument]) -> Node,
    ) -> Node {
        let ids: Vec<Symbol> = (0..count).map(|_| self.fresh("borrow")).collect();
        let args: Vec<Argument> = ids.iter().cloned().map(Argument::Reference).collect();

        let mut node = body(self, &args);
        for id in ids.into_iter().rev() {
            node = Node::borrow_register(id, node);
        }
        node
    }
}
