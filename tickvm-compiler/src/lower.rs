//! # Lowering: program tree to IL
//!
//! Storage is fully static:
//!
//! - top-level declarations live in the `globals` data block
//! - every function owns one frame data block
//!   `[return address, result, parameters..., locals...]` and one
//!   descriptor block `[entry address, frame address]`; a function value
//!   is its descriptor address
//! - a function body is an island; its result is the value of its last
//!   expression statement
//!
//! Calling convention, per call site:
//!
//! 1. evaluate the callee (a descriptor) and stage each argument in the
//!    call site's `args` block
//! 2. spill the caller's live partial results to the call site's `save`
//!    block, after the callee frame address in its first word
//! 3. copy the staged arguments into the callee frame
//! 4. `call entry, r7`; the callee stores r7 to its frame and returns with
//!    an unconditional `jump`
//! 5. restore the spilled registers and read the frame's result slot
//!
//! Frames are not reentrant; there are no conditionals, so a recursive
//! call could never terminate anyway.

use crate::ast::{BinaryOp, Expression, ExpressionKind, Program, Statement, StatementKind};
use crate::error::{CompileError, Result};
use crate::il::{Argument, IdGenerator, Node, Symbol};
use crate::layout::StructDefinition;
use tickvm_isa::{Register, Word};

/// Data block holding top-level declarations
pub const GLOBALS: &str = "globals";

/// Receives the return address on `call`
const LINK_REGISTER: Register = Register::R7;

// frame fields
const RETURN_FIELD: &str = "$return";
const RESULT_FIELD: &str = "$result";
const FRAME_RETURN: usize = 0;
const FRAME_RESULT: usize = 1;
const FRAME_ARGUMENTS: usize = 2;

// descriptor fields
const DESCRIPTOR_ENTRY: usize = 0;
const DESCRIPTOR_FRAME: usize = 1;

// call site save block: callee frame address, then spilled registers
const SAVE_FRAME: usize = 0;
const SAVE_SPILLS: usize = 1;

/// Output of [`lower`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lowered {
    pub root: Node,
    pub globals: StructDefinition,
}

pub fn lower(program: &Program, ids: &mut IdGenerator) -> Result<Lowered> {
    let globals = StructDefinition::new(GLOBALS, declared_names(&program.statements))?;

    let mut lowering = Lowering {
        ids,
        scopes: vec![Scope {
            data: Symbol::new(GLOBALS),
            layout: globals.clone(),
            function: false,
        }],
        live: Vec::new(),
    };

    let mut nodes = vec![Node::data(GLOBALS, globals.words(&[])?)];
    for statement in &program.statements {
        nodes.push(lowering.statement(statement)?);
    }

    tracing::debug!(
        "lowered {} statements, {} globals",
        program.statements.len(),
        globals.size()
    );

    Ok(Lowered {
        root: Node::label("program", Node::list(nodes)),
        globals,
    })
}

/// Names declared directly in `statements`, first occurrence order
fn declared_names(statements: &[Statement]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for statement in statements {
        if let StatementKind::Declaration { name, .. } = &statement.kind {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
    }
    names
}

struct Scope {
    data: Symbol,
    layout: StructDefinition,
    function: bool,
}

/// One word inside a data block
#[derive(Clone)]
struct Slot {
    data: Symbol,
    offset: usize,
}

impl Slot {
    fn new(data: &Symbol, offset: usize) -> Self {
        Self { data: data.clone(), offset }
    }
}

struct Lowering<'i> {
    ids: &'i mut IdGenerator,
    scopes: Vec<Scope>,
    /// Registers holding partial results that must survive a call
    live: Vec<Argument>,
}

impl<'i> Lowering<'i> {
    fn with_register(
        &mut self,
        body: impl FnOnce(&mut Self, Argument) -> Result<Node>,
    ) -> Result<Node> {
        let id = self.ids.fresh("borrow");
        let node = body(self, Argument::Reference(id.clone()))?;
        Ok(Node::borrow_register(id, node))
    }

    fn labeled(id: &Option<String>, node: Node) -> Node {
        match id {
            Some(id) => Node::label(format!("ast:{}", id), node),
            None => node,
        }
    }

    fn resolve(&self, name: &str) -> Result<Slot> {
        for scope in self.scopes.iter().rev() {
            if scope.layout.contains(name) {
                return Ok(Slot::new(&scope.data, scope.layout.offset(name)?));
            }
        }
        Err(CompileError::UndefinedVariable(name.to_string()))
    }

    fn result_slot(&self) -> Option<Slot> {
        self.scopes
            .last()
            .filter(|scope| scope.function)
            .map(|scope| Slot::new(&scope.data, FRAME_RESULT))
    }

    // ========== Memory access ==========

    fn address_of(&mut self, slot: &Slot, dest: Argument) -> Result<Node> {
        let base = Node::put(Argument::Reference(slot.data.clone()), dest.clone());
        if slot.offset == 0 {
            return Ok(base);
        }
        self.with_register(|_, tmp| {
            Ok(Node::list(vec![
                base,
                Node::put(Argument::literal(slot.offset as Word), tmp.clone()),
                Node::add(dest.clone(), tmp, dest),
            ]))
        })
    }

    fn load(&mut self, slot: &Slot, dest: Argument) -> Result<Node> {
        let address = self.address_of(slot, dest.clone())?;
        Ok(Node::list(vec![address, Node::read(dest.clone(), dest)]))
    }

    fn store(&mut self, slot: &Slot, value: Argument) -> Result<Node> {
        self.with_register(|this, address| {
            Ok(Node::list(vec![
                this.address_of(slot, address.clone())?,
                Node::write(address, value),
            ]))
        })
    }

    /// dest = mem[base + offset]; `base` and `dest` may be the same register
    fn read_field(&mut self, base: Argument, offset: usize, dest: Argument) -> Result<Node> {
        if offset == 0 {
            return Ok(Node::read(base, dest));
        }
        self.with_register(|_, tmp| {
            Ok(Node::list(vec![
                Node::put(Argument::literal(offset as Word), tmp.clone()),
                Node::add(base, tmp, dest.clone()),
                Node::read(dest.clone(), dest),
            ]))
        })
    }

    // ========== Statements ==========

    fn statement(&mut self, statement: &Statement) -> Result<Node> {
        let node = match &statement.kind {
            StatementKind::Declaration { name, value } => {
                let slot = self.resolve(name)?;
                self.with_register(|this, dest| {
                    Ok(Node::list(vec![
                        this.expression(value, dest.clone())?,
                        this.store(&slot, dest)?,
                    ]))
                })?
            }
            StatementKind::Expression(expression) => self.with_register(|this, dest| {
                let mut nodes = vec![this.expression(expression, dest.clone())?];
                if let Some(slot) = this.result_slot() {
                    nodes.push(this.store(&slot, dest)?);
                }
                Ok(Node::list(nodes))
            })?,
        };

        Ok(Self::labeled(&statement.id, node))
    }

    // ========== Expressions ==========

    fn expression(&mut self, expression: &Expression, dest: Argument) -> Result<Node> {
        let node = match &expression.kind {
            ExpressionKind::Number(value) => Node::put(Argument::literal(*value), dest),
            ExpressionKind::String(value) => self.string(value, dest),
            ExpressionKind::Identifier(name) => {
                let slot = self.resolve(name)?;
                self.load(&slot, dest)?
            }
            ExpressionKind::Binary { op, left, right } => self.binary(*op, left, right, dest)?,
            ExpressionKind::Call { callee, arguments } => self.call(callee, arguments, dest)?,
            ExpressionKind::Function { parameters, body } => {
                self.function(parameters, body, dest)?
            }
        };

        Ok(Self::labeled(&expression.id, node))
    }

    /// `[length, chars...]` in the data segment; the value is its address
    fn string(&mut self, value: &str, dest: Argument) -> Node {
        let id = self.ids.fresh("str");

        let mut contents = vec![Argument::literal(value.chars().count() as Word)];
        contents.extend(value.chars().map(|c| Argument::literal(c as Word)));

        Node::list(vec![
            Node::data(id.clone(), contents),
            Node::put(Argument::Reference(id), dest),
        ])
    }

    fn binary(
        &mut self,
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
        dest: Argument,
    ) -> Result<Node> {
        let lhs = self.expression(left, dest.clone())?;

        self.live.push(dest.clone());
        let rhs = self.with_register(|this, tmp| {
            let value = this.expression(right, tmp.clone())?;
            let combine = match op {
                BinaryOp::Add => Node::add(dest.clone(), tmp, dest.clone()),
                BinaryOp::Multiply => Node::multiply(dest.clone(), tmp, dest.clone()),
            };
            Ok(Node::list(vec![value, combine]))
        });
        self.live.pop();

        Ok(Node::list(vec![lhs, rhs?]))
    }

    fn call(&mut self, callee: &Expression, arguments: &[Expression], dest: Argument) -> Result<Node> {
        let site = self.ids.fresh("call");
        let args_block = site.derive("args");
        let save_block = site.derive("save");

        let saved = self.live.clone();
        // offset 0 stores without a scratch register
        let frame_slot = Slot::new(&save_block, SAVE_FRAME);
        let spill_slot = |offset: usize| Slot::new(&save_block, SAVE_SPILLS + offset);

        // `dest` holds the descriptor, then the entry address, until the result arrives
        let target = dest.clone();
        let mut nodes = vec![
            Node::data(args_block.clone(), vec![Argument::literal(0); arguments.len()]),
            Node::data(save_block.clone(), vec![Argument::literal(0); SAVE_SPILLS + saved.len()]),
            self.expression(callee, target.clone())?,
        ];

        self.live.push(target.clone());
        let staged = self.stage_arguments(arguments, &args_block);
        self.live.pop();
        nodes.push(staged?);

        for (offset, register) in saved.iter().enumerate() {
            nodes.push(self.store(&spill_slot(offset), register.clone())?);
        }

        nodes.push(self.with_register(|this, frame| {
            let mut nodes = vec![
                this.read_field(target.clone(), DESCRIPTOR_FRAME, frame.clone())?,
                this.store(&frame_slot, frame.clone())?,
            ];
            for offset in 0..arguments.len() {
                nodes.push(this.with_register(|this, value| {
                    let staged = this.load(&Slot::new(&args_block, offset), value.clone())?;
                    let copy = this.with_register(|_, address| {
                        Ok(Node::list(vec![
                            Node::put(
                                Argument::literal((FRAME_ARGUMENTS + offset) as Word),
                                address.clone(),
                            ),
                            Node::add(frame.clone(), address.clone(), address.clone()),
                            Node::write(address, value),
                        ]))
                    })?;
                    Ok(Node::list(vec![staged, copy]))
                })?);
            }
            Ok(Node::list(nodes))
        })?);

        nodes.push(self.read_field(target.clone(), DESCRIPTOR_ENTRY, target.clone())?);
        nodes.push(Node::call(target, Argument::register(LINK_REGISTER)));

        for (offset, register) in saved.iter().enumerate() {
            nodes.push(self.load(&spill_slot(offset), register.clone())?);
        }
        nodes.push(self.load(&frame_slot, dest.clone())?);
        nodes.push(self.read_field(dest.clone(), FRAME_RESULT, dest)?);

        Ok(Node::list(nodes))
    }

    fn stage_arguments(&mut self, arguments: &[Expression], block: &Symbol) -> Result<Node> {
        let mut nodes = Vec::with_capacity(arguments.len());
        for (offset, argument) in arguments.iter().enumerate() {
            nodes.push(self.with_register(|this, value| {
                Ok(Node::list(vec![
                    this.expression(argument, value.clone())?,
                    this.store(&Slot::new(block, offset), value)?,
                ]))
            })?);
        }
        Ok(Node::list(nodes))
    }

    fn function(&mut self, parameters: &[String], body: &[Statement], dest: Argument) -> Result<Node> {
        let id = self.ids.fresh("fn");
        let entry = id.derive("body");
        let frame = id.derive("frame");
        let descriptor = id.derive("descriptor");

        let mut fields = vec![RETURN_FIELD.to_string(), RESULT_FIELD.to_string()];
        fields.extend(parameters.iter().cloned());
        for local in declared_names(body) {
            if !fields.contains(&local) {
                fields.push(local);
            }
        }
        let layout = StructDefinition::new(frame.as_str(), fields)?;
        let frame_words = layout.words(&[])?;

        self.scopes.push(Scope {
            data: frame.clone(),
            layout,
            function: true,
        });
        let outer_live = std::mem::take(&mut self.live);
        let lowered = self.function_body(&frame, body);
        self.live = outer_live;
        self.scopes.pop();

        Ok(Node::list(vec![
            Node::data(frame.clone(), frame_words),
            Node::data(
                descriptor.clone(),
                vec![
                    Argument::Reference(entry.derive("address")),
                    Argument::Reference(frame),
                ],
            ),
            Node::island(Node::label(entry, lowered?)),
            Node::put(Argument::Reference(descriptor), dest),
        ]))
    }

    fn function_body(&mut self, frame: &Symbol, body: &[Statement]) -> Result<Node> {
        let return_slot = Slot::new(frame, FRAME_RETURN);

        let mut nodes = vec![self.store(&return_slot, Argument::register(LINK_REGISTER))?];
        for statement in body {
            nodes.push(self.statement(statement)?);
        }

        nodes.push(self.with_register(|this, address| {
            let load = this.load(&return_slot, address.clone())?;
            let jump = this.with_register(|_, condition| {
                Ok(Node::list(vec![
                    Node::put(Argument::literal(1), condition.clone()),
                    Node::jump(condition, address),
                ]))
            })?;
            Ok(Node::list(vec![load, jump]))
        })?);

        Ok(Node::list(nodes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::generate;

    fn lower_program(statements: Vec<Statement>) -> Result<Lowered> {
        lower(&Program::new(statements), &mut IdGenerator::new())
    }

    #[test]
    fn test_globals_layout() {
        let lowered = lower_program(vec![
            Statement::declaration("a", Expression::number(1)),
            Statement::declaration("b", Expression::number(2)),
            Statement::declaration("a", Expression::number(3)),
        ])
        .unwrap();

        assert_eq!(lowered.globals.fields(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_undefined_variable() {
        let err = lower_program(vec![Statement::expression(Expression::identifier("nope"))])
            .unwrap_err();
        assert!(matches!(err, CompileError::UndefinedVariable(ref name) if name == "nope"));
    }

    #[test]
    fn test_duplicate_parameter() {
        let f = Expression::function(["x", "x"], vec![]);
        let err = lower_program(vec![Statement::declaration("f", f)]).unwrap_err();
        assert!(matches!(err, CompileError::DuplicateField { .. }));
    }

    #[test]
    fn test_string_becomes_length_prefixed_data() {
        let lowered =
            lower_program(vec![Statement::declaration("s", Expression::string("hi"))]).unwrap();
        let program = generate(&lowered.root).unwrap();

        let block = program.data.iter().find(|d| d.id.as_str().starts_with("str:")).unwrap();
        assert_eq!(
            block.contents,
            vec![Argument::literal(2), Argument::literal('h' as Word), Argument::literal('i' as Word)]
        );
    }

    #[test]
    fn test_node_ids_become_spans() {
        let statement = Statement::declaration("x", Expression::number(4).with_id("2")).with_id("1");
        let lowered = lower_program(vec![statement]).unwrap();
        let program = generate(&lowered.root).unwrap();

        let ids: Vec<&str> = program.spans.iter().map(|s| s.id.as_str()).collect();
        assert!(ids.contains(&"ast:1"));
        assert!(ids.contains(&"ast:2"));
        assert!(ids.contains(&"program"));
    }

    #[test]
    fn test_function_produces_island_and_blocks() {
        let double = Expression::function(
            ["x"],
            vec![Statement::expression(Expression::add(
                Expression::identifier("x"),
                Expression::identifier("x"),
            ))],
        );
        let lowered = lower_program(vec![Statement::declaration("double", double)]).unwrap();
        let program = generate(&lowered.root).unwrap();

        // root block plus the function body
        assert_eq!(program.blocks.len(), 2);

        let frame = program.data.iter().find(|d| d.id.as_str() == "fn:1:frame").unwrap();
        // return, result, x
        assert_eq!(frame.contents.len(), 3);

        let descriptor = program.data.iter().find(|d| d.id.as_str() == "fn:1:descriptor").unwrap();
        assert_eq!(
            descriptor.contents,
            vec![
                Argument::reference("fn:1:body:address"),
                Argument::reference("fn:1:frame"),
            ]
        );
    }

    #[test]
    fn test_function_body_sees_parameters_and_globals() {
        let f = Expression::function(
            ["x"],
            vec![Statement::expression(Expression::add(
                Expression::identifier("x"),
                Expression::identifier("g"),
            ))],
        );
        let lowered = lower_program(vec![
            Statement::declaration("g", Expression::number(1)),
            Statement::declaration("f", f),
        ]);
        assert!(lowered.is_ok());
    }

    #[test]
    fn test_parameters_are_not_visible_outside() {
        let f = Expression::function(["x"], vec![]);
        let err = lower_program(vec![
            Statement::declaration("f", f),
            Statement::expression(Expression::identifier("x")),
        ])
        .unwrap_err();
        assert!(matches!(err, CompileError::UndefinedVariable(_)));
    }

    #[test]
    fn test_call_spills_live_registers() {
        let f = Expression::function(["x"], vec![Statement::expression(Expression::identifier("x"))]);
        let sum = Expression::add(
            Expression::number(1),
            Expression::call(Expression::identifier("f"), vec![Expression::number(2)]),
        );
        let lowered = lower_program(vec![
            Statement::declaration("f", f),
            Statement::declaration("y", sum),
        ])
        .unwrap();
        let program = generate(&lowered.root).unwrap();

        let save = program
            .data
            .iter()
            .find(|d| d.id.as_str().ends_with(":save"))
            .unwrap();
        // one live partial result plus the callee frame address
        assert_eq!(save.contents.len(), 2);
        assert!(program.peak_registers <= tickvm_isa::NUM_REGISTERS);
    }

    #[test]
    fn test_call_under_deep_nesting_fits_registers() {
        let id = Expression::function(["x"], vec![Statement::expression(Expression::identifier("x"))]);
        // 1 + (2 + (3 + (4 + id(5))))
        let nested = (1..5).rev().fold(
            Expression::call(Expression::identifier("id"), vec![Expression::number(5)]),
            |acc, n| Expression::add(Expression::number(n), acc),
        );
        let lowered = lower_program(vec![
            Statement::declaration("id", id),
            Statement::declaration("y", nested),
        ])
        .unwrap();
        let program = generate(&lowered.root).unwrap();

        assert_eq!(program.peak_registers, tickvm_isa::NUM_REGISTERS);
        let save = program
            .data
            .iter()
            .find(|d| d.id.as_str().ends_with(":save"))
            .unwrap();
        // frame address plus four partial sums
        assert_eq!(save.contents.len(), 5);
    }
}
