//! Compile pipeline: lower, generate, link.

use crate::ast::Program;
use crate::codegen::{generate, GeneratedProgram, Span};
use crate::error::Result;
use crate::il::{IdGenerator, Node};
use crate::layout::StructDefinition;
use crate::link::{link, LinkerConfig, MemoryLayout, SymbolTable};
use crate::lower::{lower, GLOBALS};
use tickvm_isa::{Executable, Instruction, Word};

/// Everything a debugger or visualizer may want to display
#[derive(Debug, Clone)]
pub struct CompileDebug {
    pub il: Node,
    pub generated: GeneratedProgram,
    /// Resolved instructions, index = address / 4
    pub instructions: Vec<Instruction>,
    pub symbols: SymbolTable,
    pub layout: MemoryLayout,
    /// Globals layout when compiled from a program tree
    pub globals: Option<StructDefinition>,
}

#[derive(Debug, Clone)]
pub struct Compilation {
    pub executable: Executable,
    pub debug: CompileDebug,
}

impl Compilation {
    pub fn symbol(&self, id: &str) -> Option<Word> {
        self.debug.symbols.get(id)
    }

    pub fn spans(&self) -> &[Span] {
        &self.debug.generated.spans
    }

    /// Absolute address of a top-level variable
    pub fn global_address(&self, name: &str) -> Option<Word> {
        let globals = self.debug.globals.as_ref()?;
        let offset = globals.offset(name).ok()?;
        Some(self.symbol(GLOBALS)? + offset as Word)
    }
}

pub fn compile(program: &Program, config: &LinkerConfig) -> Result<Compilation> {
    let mut ids = IdGenerator::new();
    let lowered = lower(program, &mut ids)?;

    let mut compilation = compile_il(lowered.root, config)?;
    compilation.debug.globals = Some(lowered.globals);
    Ok(compilation)
}

pub fn compile_il(root: Node, config: &LinkerConfig) -> Result<Compilation> {
    let generated = generate(&root)?;
    let linked = link(&generated, config)?;

    Ok(Compilation {
        executable: linked.executable,
        debug: CompileDebug {
            il: root,
            generated,
            instructions: linked.instructions,
            symbols: linked.symbols,
            layout: linked.layout,
            globals: None,
        },
    })
}
