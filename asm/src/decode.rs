//! Decoding of real (non-pseudo) mnemonics into [`Kind`]s, plus shared
//! helpers used by both this module and [`crate::pseudo`].

use std::collections::HashMap;

use vcpu::instruction::Kind;

use crate::error::ParseError;
use crate::int_lit::parse_int_literal;

/// Resolves a register operand, wrapping [`vcpu::register::resolve`]'s
/// error with the source line it occurred on.
pub fn reg(op: &str, line: usize) -> Result<usize, ParseError> {
    vcpu::register::resolve(op).map_err(|source| ParseError::UnknownRegister { line, source })
}

fn imm12(op: &str, line: usize) -> Result<u32, ParseError> {
    parse_int_literal(op)
        .map(|n| (n as u32) & 0xFFF)
        .ok_or_else(|| ParseError::InvalidImmediate {
            line,
            text: op.to_string(),
        })
}

fn shamt(op: &str, line: usize) -> Result<u32, ParseError> {
    parse_int_literal(op)
        .map(|n| (n as u32) & 0x1F)
        .ok_or_else(|| ParseError::InvalidImmediate {
            line,
            text: op.to_string(),
        })
}

/// Decodes `rd, imm(rs1)`-style load addressing, accepting both the
/// paren form (already split into two tokens by the lexer) and a bare
/// `rd, rs1` pair with an implicit zero offset.
fn load_operands(operands: &[String], line: usize) -> Result<(usize, usize, u32), ParseError> {
    match operands {
        [rd, imm, rs1] => Ok((reg(rd, line)?, reg(rs1, line)?, imm12(imm, line)?)),
        [rd, rs1] => Ok((reg(rd, line)?, reg(rs1, line)?, 0)),
        _ => Err(ParseError::BadOperand {
            line,
            operand: operands.join(" "),
        }),
    }
}

fn store_operands(operands: &[String], line: usize) -> Result<(usize, usize, u32), ParseError> {
    match operands {
        [rs2, imm, rs1] => Ok((reg(rs1, line)?, reg(rs2, line)?, imm12(imm, line)?)),
        [rs2, rs1] => Ok((reg(rs1, line)?, reg(rs2, line)?, 0)),
        _ => Err(ParseError::BadOperand {
            line,
            operand: operands.join(" "),
        }),
    }
}

fn branch_target(
    op: &str,
    addr: u32,
    labels: &HashMap<String, u32>,
    line: usize,
) -> Result<u32, ParseError> {
    if let Some(n) = parse_int_literal(op) {
        return Ok((n as u32) & 0xFFF);
    }
    match labels.get(op) {
        Some(&target) => Ok(((target as i64 - addr as i64) as u32) & 0xFFF),
        None => Err(ParseError::UndefinedLabel {
            line,
            label: op.to_string(),
        }),
    }
}

/// Decodes a real (non-pseudo) mnemonic. Called from [`crate::pseudo::decode`]
/// as the fallback once every pseudo-instruction name has been ruled out.
pub fn decode_real(
    m: &str,
    operands: &[String],
    addr: u32,
    labels: &HashMap<String, u32>,
    line: usize,
) -> Result<Vec<Kind>, ParseError> {
    let r = |op: &str| reg(op, line);

    let kind = match m {
        "add" => Kind::Add { rd: r(&operands[0])?, rs1: r(&operands[1])?, rs2: r(&operands[2])? },
        "sub" => Kind::Sub { rd: r(&operands[0])?, rs1: r(&operands[1])?, rs2: r(&operands[2])? },
        "sll" => Kind::Sll { rd: r(&operands[0])?, rs1: r(&operands[1])?, rs2: r(&operands[2])? },
        "srl" => Kind::Srl { rd: r(&operands[0])?, rs1: r(&operands[1])?, rs2: r(&operands[2])? },
        "sra" => Kind::Sra { rd: r(&operands[0])?, rs1: r(&operands[1])?, rs2: r(&operands[2])? },
        "slt" => Kind::Slt { rd: r(&operands[0])?, rs1: r(&operands[1])?, rs2: r(&operands[2])? },
        "sltu" => Kind::Sltu { rd: r(&operands[0])?, rs1: r(&operands[1])?, rs2: r(&operands[2])? },
        "xor" => Kind::Xor { rd: r(&operands[0])?, rs1: r(&operands[1])?, rs2: r(&operands[2])? },
        "or" => Kind::Or { rd: r(&operands[0])?, rs1: r(&operands[1])?, rs2: r(&operands[2])? },
        "and" => Kind::And { rd: r(&operands[0])?, rs1: r(&operands[1])?, rs2: r(&operands[2])? },
        "mul" => Kind::Mul { rd: r(&operands[0])?, rs1: r(&operands[1])?, rs2: r(&operands[2])? },

        "addi" => Kind::Addi { rd: r(&operands[0])?, rs1: r(&operands[1])?, imm: imm12(&operands[2], line)? },
        "slti" => Kind::Slti { rd: r(&operands[0])?, rs1: r(&operands[1])?, imm: imm12(&operands[2], line)? },
        "sltiu" => Kind::Sltiu { rd: r(&operands[0])?, rs1: r(&operands[1])?, imm: imm12(&operands[2], line)? },
        "xori" => Kind::Xori { rd: r(&operands[0])?, rs1: r(&operands[1])?, imm: imm12(&operands[2], line)? },
        "ori" => Kind::Ori { rd: r(&operands[0])?, rs1: r(&operands[1])?, imm: imm12(&operands[2], line)? },
        "andi" => Kind::Andi { rd: r(&operands[0])?, rs1: r(&operands[1])?, imm: imm12(&operands[2], line)? },
        "slli" => Kind::Slli { rd: r(&operands[0])?, rs1: r(&operands[1])?, imm: shamt(&operands[2], line)? },
        "srli" => Kind::Srli { rd: r(&operands[0])?, rs1: r(&operands[1])?, imm: shamt(&operands[2], line)? },
        "srai" => Kind::Srai { rd: r(&operands[0])?, rs1: r(&operands[1])?, imm: shamt(&operands[2], line)? },

        "lw" => {
            let (rd, rs1, imm) = load_operands(operands, line)?;
            Kind::Lw { rd, rs1, imm }
        }
        "lh" => {
            let (rd, rs1, imm) = load_operands(operands, line)?;
            Kind::Lh { rd, rs1, imm }
        }
        "lhu" => {
            let (rd, rs1, imm) = load_operands(operands, line)?;
            Kind::Lhu { rd, rs1, imm }
        }
        "lb" => {
            let (rd, rs1, imm) = load_operands(operands, line)?;
            Kind::Lb { rd, rs1, imm }
        }
        "lbu" => {
            let (rd, rs1, imm) = load_operands(operands, line)?;
            Kind::Lbu { rd, rs1, imm }
        }

        "sw" => {
            let (rs1, rs2, imm) = store_operands(operands, line)?;
            Kind::Sw { rs1, rs2, imm }
        }
        "sh" => {
            let (rs1, rs2, imm) = store_operands(operands, line)?;
            Kind::Sh { rs1, rs2, imm }
        }
        "sb" => {
            let (rs1, rs2, imm) = store_operands(operands, line)?;
            Kind::Sb { rs1, rs2, imm }
        }

        "beq" | "bne" | "blt" | "bge" | "bltu" | "bgeu" => {
            let rs1 = r(&operands[0])?;
            let rs2 = r(&operands[1])?;
            let imm = branch_target(&operands[2], addr, labels, line)?;
            match m {
                "beq" => Kind::Beq { rs1, rs2, imm },
                "bne" => Kind::Bne { rs1, rs2, imm },
                "blt" => Kind::Blt { rs1, rs2, imm },
                "bge" => Kind::Bge { rs1, rs2, imm },
                "bltu" => Kind::Bltu { rs1, rs2, imm },
                "bgeu" => Kind::Bgeu { rs1, rs2, imm },
                _ => unreachable!(),
            }
        }

        "lui" => Kind::Lui { rd: r(&operands[0])?, imm: imm20(&operands[1], line)? },
        "auipc" => Kind::Auipc { rd: r(&operands[0])?, imm: imm20(&operands[1], line)? },

        "jal" => {
            let rd = if operands.len() == 2 { r(&operands[0])? } else { 1 };
            let target_op = operands.last().ok_or_else(|| ParseError::BadOperand {
                line,
                operand: String::new(),
            })?;
            let imm = if let Some(n) = parse_int_literal(target_op) {
                (n as u32) & 0xF_FFFF
            } else {
                match labels.get(target_op) {
                    Some(&target) => ((target as i64 - addr as i64) as u32) & 0xF_FFFF,
                    None => {
                        return Err(ParseError::UndefinedLabel {
                            line,
                            label: target_op.to_string(),
                        })
                    }
                }
            };
            Kind::Jal { rd, imm }
        }
        "jalr" => {
            let (rd, rs1, imm) = match operands {
                // Two trailing operands are accepted in either order: the
                // standard `rd, rs1, imm` form or the paren form
                // `rd, imm(rs1)` (already split into two tokens by the
                // lexer). Whichever of the two parses as an integer
                // literal is the immediate; the other is the register.
                [rd, a, b] if parse_int_literal(b).is_some() => (r(rd)?, r(a)?, imm12(b, line)?),
                [rd, a, b] if parse_int_literal(a).is_some() => (r(rd)?, r(b)?, imm12(a, line)?),
                [rd, rs1] => (r(rd)?, r(rs1)?, 0),
                [rs1] => (1, r(rs1)?, 0),
                _ => {
                    return Err(ParseError::BadOperand {
                        line,
                        operand: operands.join(" "),
                    })
                }
            };
            Kind::Jalr { rd, rs1, imm }
        }

        "fence" => Kind::Fence,
        "ebreak" => Kind::Ebreak,
        "ecall" => Kind::Ecall,

        other => {
            return Err(ParseError::UnknownMnemonic {
                line,
                mnemonic: other.to_string(),
            })
        }
    };
    Ok(vec![kind])
}

fn imm20(op: &str, line: usize) -> Result<u32, ParseError> {
    parse_int_literal(op)
        .map(|n| (n as u32) & 0xF_FFFF)
        .ok_or_else(|| ParseError::InvalidImmediate {
            line,
            text: op.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> HashMap<String, u32> {
        let mut m = HashMap::new();
        m.insert("loop".to_string(), 0x10);
        m
    }

    #[test]
    fn decodes_r_type() {
        let kinds = decode_real(
            "add",
            &["x1".into(), "x2".into(), "x3".into()],
            0,
            &labels(),
            1,
        )
        .unwrap();
        assert_eq!(kinds, vec![Kind::Add { rd: 1, rs1: 2, rs2: 3 }]);
    }

    #[test]
    fn decodes_paren_load_addressing() {
        let kinds = decode_real(
            "lw",
            &["x3".into(), "4".into(), "x1".into()],
            0,
            &labels(),
            1,
        )
        .unwrap();
        assert_eq!(kinds, vec![Kind::Lw { rd: 3, rs1: 1, imm: 4 }]);
    }

    #[test]
    fn branch_to_label_is_pc_relative() {
        let kinds = decode_real(
            "beq",
            &["x1".into(), "x2".into(), "loop".into()],
            0x20,
            &labels(),
            1,
        )
        .unwrap();
        let expected = ((0x10i64 - 0x20i64) as u32) & 0xFFF;
        assert_eq!(kinds, vec![Kind::Beq { rs1: 1, rs2: 2, imm: expected }]);
    }

    #[test]
    fn unknown_mnemonic_is_an_error() {
        assert!(decode_real("frobnicate", &[], 0, &labels(), 1).is_err());
    }

    #[test]
    fn jal_defaults_rd_to_ra() {
        let kinds = decode_real("jal", &["loop".into()], 0x20, &labels(), 1).unwrap();
        match &kinds[0] {
            Kind::Jal { rd, .. } => assert_eq!(*rd, 1),
            _ => panic!("expected Jal"),
        }
    }

    #[test]
    fn jalr_accepts_both_standard_and_paren_operand_order() {
        let standard = decode_real(
            "jalr",
            &["x1".into(), "x2".into(), "8".into()],
            0,
            &labels(),
            1,
        )
        .unwrap();
        assert_eq!(standard, vec![Kind::Jalr { rd: 1, rs1: 2, imm: 8 }]);

        let paren = decode_real(
            "jalr",
            &["x1".into(), "8".into(), "x2".into()],
            0,
            &labels(),
            1,
        )
        .unwrap();
        assert_eq!(paren, vec![Kind::Jalr { rd: 1, rs1: 2, imm: 8 }]);
    }
}
