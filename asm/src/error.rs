//! The assembly-time error taxonomy. Unlike `vcpu::error::RuntimeHalt`,
//! these always abort the run before a single instruction executes.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: unknown mnemonic '{mnemonic}'")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("line {line}: bad operand '{operand}'")]
    BadOperand { line: usize, operand: String },

    #[error("line {line}: {source}")]
    UnknownRegister {
        line: usize,
        #[source]
        source: vcpu::error::RegisterError,
    },

    #[error("line {line}: undefined label '{label}'")]
    UndefinedLabel { line: usize, label: String },

    #[error("line {line}: invalid immediate '{text}'")]
    InvalidImmediate { line: usize, text: String },

    #[error("line {line}: invalid expression: {reason}")]
    InvalidExpression { line: usize, reason: String },

    #[error(
        "code segment collision with data segment at address 0x{addr:08X} (data base 0x{data_base:08X})"
    )]
    SegmentCollision { addr: u32, data_base: u32 },

    #[error("line {line}: '{directive}' used outside of '.data'")]
    DirectiveOutsideData { line: usize, directive: String },

    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },

    #[error("line {line}: malformed label '{label}'")]
    MalformedLabel { line: usize, label: String },
}
