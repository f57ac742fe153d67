//! End-to-end assemble-and-run coverage for the dialect's headline
//! behaviors, each grounded in one of the example programs the original
//! implementation's own test suite exercised.

use vcpu::{Cpu, Engine};

fn run(source: &str) -> (Cpu, vcpu::RunOutcome) {
    let program = vasm::assemble(source).expect("assembly should succeed");
    let mut cpu = Cpu::new();
    Engine::load(&mut cpu, &program);
    let mut engine = Engine::new(cpu, program);
    let outcome = engine.run(false);
    (engine.cpu, outcome)
}

#[test]
fn arithmetic_chain_computes_expected_register() {
    let source = "\
main:
    addi x1, x0, 5
    addi x2, x0, 10
    add x3, x1, x2
";
    let (cpu, outcome) = run(source);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(cpu.registers.read_index(3), 15);
}

#[test]
fn li_expands_to_eight_bytes_for_large_immediate_and_loads_exact_value() {
    let source = "\
main:
    li x1, 0xDEADBEEF
    ebreak
";
    let program = vasm::assemble(source).unwrap();
    let seq = program.instructions.get(&vcpu::constants::CODE_BASE).unwrap();
    assert_eq!(seq.len(), 2);

    let mut cpu = Cpu::new();
    Engine::load(&mut cpu, &program);
    let mut engine = Engine::new(cpu, program);
    engine.run(false);
    assert_eq!(engine.cpu.registers.read_index(1), 0xDEADBEEF);
}

#[test]
fn store_then_load_round_trips_through_memory() {
    let source = "\
main:
    li x1, 0x4000
    li x2, 1234
    sw x2, 0(x1)
    lw x3, 0(x1)
";
    let (cpu, outcome) = run(source);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(cpu.registers.read_index(3), 1234);
}

#[test]
fn loop_with_bne_terminates_and_sums_correctly() {
    let source = "\
main:
    addi x1, x0, 0
    addi x2, x0, 0
loop:
    addi x1, x1, 1
    add x2, x2, x1
    addi x3, x0, 5
    bne x1, x3, loop
";
    let (cpu, outcome) = run(source);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(cpu.registers.read_index(1), 5);
    assert_eq!(cpu.registers.read_index(2), 1 + 2 + 3 + 4 + 5);
}

#[test]
fn assert_passes_silently_when_true() {
    let source = "\
main:
    addi x1, x0, 5
    addi x2, x0, 5
    @assert eq(x1, x2)
    ebreak
";
    let (_, outcome) = run(source);
    assert_eq!(outcome.exit_code(), 0);
}

#[test]
fn assert_failure_halts_with_its_source_expression_as_the_message() {
    let source = "\
main:
    addi x1, x0, 5
    addi x2, x0, 6
    @assert eq(x1, x2)
";
    let (_, outcome) = run(source);
    assert_eq!(outcome.exit_code(), 1);
    match outcome {
        vcpu::RunOutcome::Halted(reason) => {
            assert!(reason.is_assertion_failure());
            assert!(format!("{}", reason).contains("eq(x1, x2)"));
        }
        other => panic!("expected a halt, got {:?}", other),
    }
}

#[test]
fn string_directive_and_syscall_four_prints_then_exits_cleanly() {
    let source = "\
.data
msg: .string \"AB\"
.text
main:
    la a0, msg
    addi a7, x0, 4
    ecall
    addi a7, x0, 10
    ecall
";
    let (_, outcome) = run(source);
    assert_eq!(outcome.exit_code(), 0);
}

#[test]
fn mul_is_accepted_by_the_assembler_but_halts_at_runtime() {
    let source = "\
main:
    mul x3, x1, x2
";
    let (_, outcome) = run(source);
    assert_eq!(outcome.exit_code(), 1);
}

#[test]
fn stack_guard_only_fires_for_textual_sp_not_numeric_x2() {
    let source = "\
main:
    addi x2, x2, -100000
";
    let (_, outcome) = run(source);
    assert_eq!(outcome.exit_code(), 0);
}

#[test]
fn stack_guard_fires_for_textual_sp_overflow() {
    // addi's immediate is a 12-bit field, so a huge decrement like -100000
    // truncates harmlessly; to actually cross the guard boundary, sp is
    // parked just above the limit first and nudged down from there.
    let source = format!(
        "main:\n    li sp, {}\n    addi sp, sp, -4\n",
        vcpu::constants::STACK_LIMIT + 2
    );
    let (_, outcome) = run(&source);
    assert_eq!(outcome.exit_code(), 1);
}
