//! Single-threaded, strictly sequential execution engine: fetch at PC,
//! dispatch the decoded sequence, advance PC, enforce stack guards.

use log::trace;

use crate::cpu::Cpu;
use crate::error::RuntimeHalt;
use crate::memory::Storage;
use crate::program::Program;

/// How a run came to an end.
#[derive(Debug)]
pub enum RunOutcome {
    /// PC fell outside the code region with no jump pending - the ordinary
    /// way a program ends.
    NaturalEnd,
    /// The CPU halted with the given reason (an error, `ebreak`, or an
    /// `ecall` exit).
    Halted(RuntimeHalt),
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::NaturalEnd => 0,
            RunOutcome::Halted(reason) => reason.exit_code(),
        }
    }
}

/// Owns the CPU and the program image for the lifetime of a run.
pub struct Engine {
    pub cpu: Cpu,
    pub program: Program,
}

impl Engine {
    pub fn new(cpu: Cpu, program: Program) -> Engine {
        Engine { cpu, program }
    }

    /// Loads the program's entry address and data image into a freshly
    /// reset CPU, ready for `run`.
    pub fn load(cpu: &mut Cpu, program: &Program) {
        cpu.reset();
        cpu.pc = program.entry_address;
        for (&addr, &byte) in &program.data {
            // Data bytes come from a validated assembler output; an
            // out-of-range address here is an internal consistency bug,
            // not a user-facing runtime condition.
            cpu.memory
                .write_byte(addr, byte)
                .expect("assembler produced a data address outside of memory");
        }
    }

    /// Runs until the CPU halts or the program runs off the end of its code
    /// region with no pending jump.
    pub fn run(&mut self, trace_steps: bool) -> RunOutcome {
        loop {
            if self.cpu.halted {
                return RunOutcome::Halted(
                    self.cpu
                        .halt_reason
                        .clone()
                        .expect("halted CPU always carries a halt reason"),
                );
            }
            if trace_steps {
                println!("Trace: PC=0x{:08X}", self.cpu.pc);
            }
            trace!("stepping at pc=0x{:08x}", self.cpu.pc);
            self.step();
            if !self.cpu.halted && !self.program.instructions.contains_key(&self.cpu.pc) {
                return RunOutcome::NaturalEnd;
            }
        }
    }

    /// One step of the algorithm in SPEC_FULL.md §4.6: fetch the sequence at
    /// PC, execute each instruction tracking the latest jump target, adopt
    /// the jump target or fall through, then, unconditionally, whether or
    /// not the sequence already halted the CPU, enforce the stack guard if
    /// any executed instruction carried the `use_sp` tag.
    pub fn step(&mut self) {
        let pc = self.cpu.pc;
        let seq = match self.program.instructions.get(&pc) {
            Some(seq) => seq.clone(),
            None => {
                self.halt_with(RuntimeHalt::NoInstruction { pc });
                return;
            }
        };

        let fallthrough = pc.wrapping_add(4 * seq.len() as u32);
        let mut jump_pc = None;
        let mut any_use_sp = false;

        for instr in &seq {
            any_use_sp |= instr.tags.use_sp;
            match instr.execute(&mut self.cpu) {
                Ok(Some(target)) => jump_pc = Some(target),
                Ok(None) => {}
                Err(e) => self.halt_with(e),
            }
            if self.cpu.halted {
                break;
            }
        }

        self.cpu.pc = jump_pc.unwrap_or(fallthrough);

        if any_use_sp {
            if let Err(e) = self.cpu.check_stack_bounds() {
                self.halt_with(e);
            }
        }
    }

    fn halt_with(&mut self, reason: RuntimeHalt) {
        if !matches!(reason, RuntimeHalt::EcallExit) {
            println!("{}", reason);
        }
        self.cpu.halt(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::{Instruction, Kind, Tags};

    fn seq(kind: Kind) -> Vec<Instruction> {
        vec![Instruction::new(kind, Tags::default())]
    }

    #[test]
    fn runs_off_the_end_cleanly() {
        let mut program = Program::default();
        program
            .instructions
            .insert(0, seq(Kind::Addi { rd: 1, rs1: 0, imm: 5 }));
        let mut cpu = Cpu::new();
        Engine::load(&mut cpu, &program);
        let mut engine = Engine::new(cpu, program);
        let outcome = engine.run(false);
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(engine.cpu.registers.read_index(1), 5);
    }

    #[test]
    fn missing_instruction_at_entry_is_an_error() {
        let program = Program::default();
        let mut cpu = Cpu::new();
        Engine::load(&mut cpu, &program);
        let mut engine = Engine::new(cpu, program);
        let outcome = engine.run(false);
        assert_eq!(outcome.exit_code(), 1);
    }

    #[test]
    fn stack_guard_halts_when_sp_leaves_bounds() {
        let mut program = Program::default();
        let mut tags = Tags::default();
        tags.use_sp = true;
        program.instructions.insert(
            0,
            vec![Instruction::new(
                Kind::Addi { rd: 2, rs1: 2, imm: 1 },
                tags,
            )],
        );
        let mut cpu = Cpu::new();
        Engine::load(&mut cpu, &program);
        let mut engine = Engine::new(cpu, program);
        let outcome = engine.run(false);
        assert_eq!(outcome.exit_code(), 1);
    }

    #[test]
    fn numeric_sp_alias_without_tag_does_not_trigger_guard() {
        let mut program = Program::default();
        program.instructions.insert(
            0,
            seq(Kind::Addi { rd: 2, rs1: 2, imm: 1 }),
        );
        let mut cpu = Cpu::new();
        Engine::load(&mut cpu, &program);
        let mut engine = Engine::new(cpu, program);
        let outcome = engine.run(false);
        assert_eq!(outcome.exit_code(), 0);
    }
}
