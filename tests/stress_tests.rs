//! Stress tests: long programs, long runs and register pressure.

use tickvm_compiler::{compile, CompileError, Expression, LinkerConfig, Program, Statement};
use tickvm_hardware::{HaltReason, Machine, MachineConfig, StopReason};
use tickvm_isa::{encode_all, Executable, Instruction, Register, Word};

fn machine_for(executable: &Executable, max_ticks: u64) -> Machine {
    let mut machine = Machine::new(MachineConfig {
        max_ticks,
        ..MachineConfig::default()
    });
    machine.load(executable).unwrap();
    machine
}

// ============================================================================
// Large programs
// ============================================================================

#[test]
fn test_long_straight_line() {
    let mut program = vec![Instruction::Put { value: 1, output: Register::R1 }];
    program.extend((0..1000).map(|_| Instruction::Add {
        left: Register::R0,
        right: Register::R1,
        output: Register::R0,
    }));
    program.push(Instruction::Halt);

    let mut machine = machine_for(&Executable::new(encode_all(&program)), 1_000_000);
    let result = machine.run();

    assert_eq!(result.stop_reason, StopReason::Halted(HaltReason::Halt));
    assert_eq!(result.instructions, 1002);
    assert_eq!(machine.cpu().register(Register::R0), 1000);
}

#[test]
fn test_long_sum_expression() {
    // ((1 + 2) + 3) + ... stays within two registers
    let sum = (2..=100).fold(Expression::number(1), |acc, n| {
        Expression::add(acc, Expression::number(n))
    });
    let program = Program::new(vec![Statement::declaration("total", sum)]);
    let compilation = compile(&program, &LinkerConfig::default()).unwrap();

    let mut machine = machine_for(&compilation.executable, 1_000_000);
    assert_eq!(
        machine.run().stop_reason,
        StopReason::Halted(HaltReason::Halt)
    );

    let total = compilation.global_address("total").unwrap();
    assert_eq!(machine.memory().peek(total), Some(5050));
}

#[test]
fn test_many_calls() {
    let inc = Expression::function(
        ["x"],
        vec![Statement::expression(Expression::add(
            Expression::identifier("x"),
            Expression::number(1),
        ))],
    );
    let calls = (0..50).fold(Expression::number(0), |acc, _| {
        Expression::add(
            acc,
            Expression::call(Expression::identifier("inc"), vec![Expression::number(1)]),
        )
    });
    let program = Program::new(vec![
        Statement::declaration("inc", inc),
        Statement::declaration("total", calls),
    ]);
    let compilation = compile(&program, &LinkerConfig::default()).unwrap();

    let mut machine = machine_for(&compilation.executable, 10_000_000);
    assert_eq!(
        machine.run().stop_reason,
        StopReason::Halted(HaltReason::Halt)
    );

    let total = compilation.global_address("total").unwrap();
    assert_eq!(machine.memory().peek(total), Some(100));
}

// ============================================================================
// Register pressure
// ============================================================================

#[test]
fn test_deep_right_nesting_exhausts_registers() {
    // 1 + (2 + (3 + ...)) holds one partial result per level
    let nested = (1..20).rev().fold(Expression::number(20), |acc, n| {
        Expression::add(Expression::number(n), acc)
    });
    let program = Program::new(vec![Statement::declaration("x", nested)]);

    let err = compile(&program, &LinkerConfig::default()).unwrap_err();
    assert!(matches!(err, CompileError::RegisterExhausted { .. }));
}

#[test]
fn test_shallow_right_nesting_fits() {
    let nested = (1..4).rev().fold(Expression::number(4), |acc, n| {
        Expression::multiply(Expression::number(n), acc)
    });
    let program = Program::new(vec![Statement::declaration("x", nested)]);
    let compilation = compile(&program, &LinkerConfig::default()).unwrap();

    let mut machine = machine_for(&compilation.executable, 1_000_000);
    machine.run();
    let x = compilation.global_address("x").unwrap();
    assert_eq!(machine.memory().peek(x), Some(24));
}

// ============================================================================
// Tick budget
// ============================================================================

#[test]
fn test_tick_limit_enforced() {
    let program = encode_all(&[
        Instruction::Put { value: 1, output: Register::R0 },
        Instruction::Put { value: 8, output: Register::R1 },
        Instruction::Add { left: Register::R2, right: Register::R0, output: Register::R2 },
        Instruction::Jump { condition: Register::R0, target: Register::R1 },
    ]);
    let mut machine = machine_for(&Executable::new(program), 10_000);

    let result = machine.run();
    assert_eq!(result.stop_reason, StopReason::TickLimit);
    assert_eq!(result.ticks, 10_000);
    assert!(machine.cpu().register(Register::R2) > 0);

    // the budget applies per call
    let result = machine.run();
    assert_eq!(result.stop_reason, StopReason::TickLimit);
    assert_eq!(machine.clock().cycle(), 20_000);
}

#[test]
fn test_sparse_memory_writes() {
    let mut program = Vec::new();
    // well past the code, inside the default 1024 words
    let addresses: Vec<Word> = (0..10).map(|i| 150 + 80 * i).collect();
    for &address in &addresses {
        program.push(Instruction::Put { value: address, output: Register::R0 });
        program.push(Instruction::Put { value: address + 1, output: Register::R1 });
        program.push(Instruction::Write { address: Register::R0, value: Register::R1 });
    }
    program.push(Instruction::Halt);

    let mut machine = machine_for(&Executable::new(encode_all(&program)), 1_000_000);
    machine.run();

    for address in addresses {
        assert_eq!(machine.memory().peek(address), Some(address + 1));
    }
}
