//! `vasm` - the assembler/linker for the RV32I-subset dialect emulated by
//! `vcpu`.
//!
//! A source file is plain text: one instruction, directive, label, or
//! meta-line per source line. Comments start with `#`. Mnemonics and
//! register names are case-insensitive; labels are case-sensitive and
//! match `[A-Za-z_.][A-Za-z0-9_]*:`, and may cascade (`a: b: addi x0, x0, 0`).
//!
//! Two segments are available: `.text` (code, based at
//! [`vcpu::constants::CODE_BASE`]) and `.data` (based at
//! [`vcpu::constants::DATA_BASE`]), selected by the matching directive and
//! populated with `.word` and `.string`. The base instruction set plus a
//! pseudo-instruction catalog (`li`, `la`, `call`, `mv`, branch-with-zero
//! forms, …) are recognized; see [`pseudo`] for the full expansion table.
//!
//! A small expression sublanguage drives the `@print`, `@print_mem`, and
//! `@assert` meta-instructions; see [`expr_parser`].
//!
//! The crate's only real entry point is [`assemble`], which turns a whole
//! source file into a [`vcpu::Program`] ready to hand to
//! [`vcpu::engine::Engine::load`].

pub mod assembler;
pub mod decode;
pub mod error;
pub mod expr_parser;
pub mod int_lit;
pub mod lexer;
pub mod pseudo;

pub use assembler::assemble;
pub use error::ParseError;
