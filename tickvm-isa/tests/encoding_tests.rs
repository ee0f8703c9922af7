//! Encoding properties across the whole instruction set

use proptest::prelude::*;
use tickvm_isa::*;

fn arb_register() -> impl Strategy<Value = Register> {
    (0usize..NUM_REGISTERS).prop_map(|i| Register::from_index(i).unwrap())
}

fn arb_instruction() -> impl Strategy<Value = Instruction> {
    prop_oneof![
        (arb_register(), arb_register(), arb_register())
            .prop_map(|(left, right, output)| Instruction::Add { left, right, output }),
        (arb_register(), arb_register(), arb_register())
            .prop_map(|(left, right, output)| Instruction::Multiply { left, right, output }),
        (arb_register(), arb_register())
            .prop_map(|(address, output)| Instruction::Read { address, output }),
        (arb_register(), arb_register())
            .prop_map(|(address, value)| Instruction::Write { address, value }),
        (any::<Word>(), arb_register())
            .prop_map(|(value, output)| Instruction::Put { value, output }),
        (arb_register(), arb_register())
            .prop_map(|(source, output)| Instruction::Copy { source, output }),
        (arb_register(), arb_register())
            .prop_map(|(target, link)| Instruction::Call { target, link }),
        Just(Instruction::Halt),
        (arb_register(), arb_register())
            .prop_map(|(condition, target)| Instruction::Jump { condition, target }),
    ]
}

proptest! {
    #[test]
    fn test_decode_inverts_encode(instr in arb_instruction()) {
        let words = encode(&instr);
        prop_assert_eq!(words.len(), INSTRUCTION_WORDS);
        prop_assert_eq!(decode(&words).unwrap(), instr);
    }

    #[test]
    fn test_unused_slots_encode_as_zero(instr in arb_instruction()) {
        let words = encode(&instr);
        for (slot, kind) in instr.opcode().signature().iter().enumerate() {
            if *kind == OperandKind::Unused {
                prop_assert_eq!(words[slot + 1], 0);
            }
        }
    }

    #[test]
    fn test_out_of_table_opcodes_fail(opcode in (OPCODE_TABLE.len() as Word)..) {
        let result = decode(&[opcode, 0, 0, 0]);
        prop_assert!(
            matches!(result, Err(IsaError::UnknownOpcode { opcode: o }) if o == opcode),
            "expected unknown opcode error"
        );
    }
}

#[test]
fn test_stream_decodes_in_order() {
    let program = vec![
        Instruction::Put { value: 1337, output: Register::R0 },
        Instruction::Put { value: 8, output: Register::R1 },
        Instruction::Write { address: Register::R1, value: Register::R0 },
        Instruction::Read { address: Register::R1, output: Register::R2 },
        Instruction::Halt,
    ];

    let words = encode_all(&program);
    assert_eq!(words.len(), program.len() * INSTRUCTION_WORDS);

    let decoded: Vec<Instruction> = words
        .chunks(INSTRUCTION_WORDS)
        .map(|chunk| decode(chunk).unwrap())
        .collect();
    assert_eq!(decoded, program);
}

#[test]
fn test_register_slot_out_of_range() {
    // put with a register id of 8 in the output slot
    let err = decode(&[Opcode::Put.to_word(), 5, 8, 0]).unwrap_err();
    assert!(matches!(err, IsaError::InvalidRegister(8)));
}
