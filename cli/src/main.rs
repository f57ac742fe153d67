//! The `vex` command-line front end: assembles a source file and runs it
//! to completion, reporting the resulting exit code the way the engine's
//! own halt reasons are reported on stdout/stderr.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Assemble and run a program against the RV32I-subset emulator.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Assembly source file to assemble and run.
    source: PathBuf,

    /// Print "Trace: PC=0x..." before every step.
    #[arg(short, long)]
    trace: bool,

    /// Memory size in bytes given to the emulated machine.
    #[arg(short, long, default_value_t = vcpu::constants::MEMORY_SIZE)]
    memory: usize,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let source = match fs::read_to_string(&cli.source) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("error: could not read {}: {}", cli.source.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let program = match vasm::assemble(&source) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("assembly error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "assembled {} code line(s), {} data byte(s), entry 0x{:08X}",
        program.instructions.len(),
        program.data.len(),
        program.entry_address
    );

    let mut cpu = vcpu::Cpu::with_memory_size(cli.memory);
    vcpu::Engine::load(&mut cpu, &program);
    let mut engine = vcpu::Engine::new(cpu, program);
    let outcome = engine.run(cli.trace);

    let code = outcome.exit_code();
    log::debug!("run finished with exit code {}", code);
    if code == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
