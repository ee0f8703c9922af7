//! tickvm Compiler
//!
//! Lower a program tree to IL, flatten the IL into a symbolic instruction
//! stream, and link it into a flat [`Executable`](tickvm_isa::Executable).
//!
//! ```text
//! Program --lower--> IL Node --generate--> GeneratedProgram --link--> Executable
//! ```
//!
//! ## Example
//!
//! ```rust
//! use tickvm_compiler::{compile_il, LinkerConfig, Node, Argument, IdGenerator};
//! use tickvm_isa::Register;
//!
//! let mut ids = IdGenerator::new();
//! let root = ids.with_registers(2, |_, regs| Node::list(vec![
//!     Node::put(Argument::literal(5), regs[0].clone()),
//!     Node::put(Argument::literal(7), regs[1].clone()),
//!     Node::add(regs[0].clone(), regs[1].clone(), Argument::register(Register::R2)),
//! ]));
//!
//! let compilation = compile_il(root, &LinkerConfig::default()).unwrap();
//! assert_eq!(compilation.executable.memory.len(), 4 * 4);
//! ```

pub mod error;
pub mod il;
pub mod layout;
pub mod codegen;
pub mod link;
pub mod ast;
pub mod lower;
pub mod compile;

pub use error::{CompileError, Result};
pub use il::{Argument, IdGenerator, Node, Symbol};
pub use layout::StructDefinition;
pub use codegen::{generate, Binding, DataBlock, GeneratedProgram, Span, SymbolicInstruction};
pub use link::{link, Linked, LinkerConfig, MemoryLayout, SymbolTable};
pub use ast::{BinaryOp, Expression, ExpressionKind, Program, Statement, StatementKind};
pub use lower::{lower, Lowered, GLOBALS};
pub use compile::{compile, compile_il, Compilation, CompileDebug};
