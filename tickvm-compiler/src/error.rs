//! Compiler errors

use crate::il::Symbol;
use thiserror::Error;
use tickvm_isa::IsaError;

#[derive(Debug, Error)]
pub enum CompileError {
    // Generation
    #[error("Register exhausted: no free register for binding '{id}'")]
    RegisterExhausted { id: Symbol },

    // Linking
    #[error("Unresolved symbol: {0}")]
    UnresolvedSymbol(Symbol),

    #[error("Duplicate symbol: {0}")]
    DuplicateSymbol(Symbol),

    // Layout
    #[error("Duplicate field '{field}' in struct '{name}'")]
    DuplicateField { name: String, field: String },

    #[error("Unknown field '{field}' in struct '{name}'")]
    UnknownField { name: String, field: String },

    // Lowering
    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),

    /// A resolved operand is not valid for its slot
    #[error("Invalid operand: {0}")]
    Isa(#[from] IsaError),
}

pub type Result<T> = std::result::Result<T, CompileError>;
