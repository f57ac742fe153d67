//! The closed runtime error taxonomy.
//!
//! Every error kind here sets the CPU's `halted` latch; none are retried or
//! recovered locally. The engine turns the `Display` text into the one-line
//! diagnostic printed to stdout and maps the kind to a process exit code.

use thiserror::Error;

/// Failure modes of [`crate::memory::Storage`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("Memory Error: out of bounds access at address 0x{addr:08X} (size {size})")]
    OutOfBounds { addr: u32, size: u8 },
    #[error("Memory Error: unknown type tag '{0}'")]
    UnknownTypeTag(String),
}

/// Failure modes of register-file access by numeric index or ABI alias.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegisterError {
    #[error("unknown register '{0}'")]
    UnknownAlias(String),
    #[error("register index {0} out of range")]
    IndexOutOfRange(usize),
}

/// Every way a single execution step can come to a halt.
///
/// Variants correspond one-to-one with SPEC_FULL.md's closed error taxonomy
/// (`MemoryError`, `StackError`, `InstructionError`, `SyscallError`,
/// `AssertionFailure`, `EbreakHalt`, `EcallExit`); `ParseError` lives in the
/// `asm` crate since it is raised before execution ever starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeHalt {
    #[error("{0}")]
    Memory(#[from] MemoryError),

    #[error("Runtime Error: Stack Overflow (sp=0x{sp:08X})")]
    StackOverflow { sp: u32 },

    #[error("Runtime Error: Stack Underflow (sp=0x{sp:08X})")]
    StackUnderflow { sp: u32 },

    #[error("Runtime Error: No instruction at PC=0x{pc:08X}")]
    NoInstruction { pc: u32 },

    #[error("Runtime Error: Unknown syscall: {0}")]
    UnknownSyscall(u32),

    #[error("[ASSERTION FAILED] {0}")]
    AssertionFailed(String),

    #[error("[System] EBREAK")]
    Ebreak,

    #[error("[System] Exit")]
    EcallExit,

    /// A mnemonic the parser accepts but that carries no architectural
    /// semantics (`mul`), or any other internal condition that in the
    /// original implementation this crate is grounded on surfaced as an
    /// uncaught exception rather than a named error kind.
    #[error("Runtime Error: {0}")]
    Unsupported(String),
}

impl RuntimeHalt {
    /// Process exit code this halt reason maps to, per the CLI contract.
    ///
    /// Natural termination and an explicit `ecall` exit (and `ebreak`,
    /// treated as an orderly debugger-style stop rather than an error) map
    /// to `0`; every other halt reason is an error condition and maps to
    /// `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            RuntimeHalt::EcallExit | RuntimeHalt::Ebreak => 0,
            _ => 1,
        }
    }

    /// Whether this halt reason is specifically an assertion failure.
    pub fn is_assertion_failure(&self) -> bool {
        matches!(self, RuntimeHalt::AssertionFailed(_))
    }
}
