//! The two-pass assembler/linker driver: pass 1 walks the source computing
//! segment cursors, label addresses, and pseudo-instruction expansion
//! sizes; pass 2 re-walks the same lines decoding each into concrete
//! [`vcpu::instruction::Instruction`] sequences now that every label is
//! resolved. Grounded in the original implementation's two-pass
//! `_first_pass`/`_second_pass` structure.

use std::collections::HashMap;

use vcpu::constants::{CODE_BASE, DATA_BASE};
use vcpu::instruction::{Instruction, Kind, Tags};
use vcpu::memory::TypeTag;
use vcpu::program::Program;
use vcpu::register;

use crate::error::ParseError;
use crate::expr_parser::parse_expression;
use crate::int_lit::parse_int_literal;
use crate::lexer::{parse_string_literal, split_labels, split_mnemonic, split_operands, strip_comment};
use crate::pseudo;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Segment {
    Text,
    Data,
}

enum LineBody {
    Code { mnemonic: String, operand_text: String, raw: String },
    Meta { text: String },
    Word { values: Vec<String> },
    Str { bytes: Vec<u8> },
}

struct Line {
    line_no: usize,
    addr: u32,
    body: LineBody,
}

/// Assembles a full source file into a [`Program`] ready for
/// [`vcpu::engine::Engine::load`].
pub fn assemble(source: &str) -> Result<Program, ParseError> {
    let (lines, labels) = pass1(source)?;
    pass2(lines, labels)
}

fn pass1(source: &str) -> Result<(Vec<Line>, HashMap<String, u32>), ParseError> {
    let mut segment = Segment::Text;
    let mut code_cursor = CODE_BASE;
    let mut data_cursor = DATA_BASE;
    let mut labels = HashMap::new();
    let mut lines = Vec::new();

    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = idx + 1;
        let stripped = strip_comment(raw_line);
        if stripped.is_empty() {
            continue;
        }
        let (line_labels, rest) = split_labels(stripped);
        for label in line_labels {
            let addr = match segment {
                Segment::Text => code_cursor,
                Segment::Data => data_cursor,
            };
            labels.insert(label, addr);
        }
        if rest.is_empty() {
            continue;
        }

        let (head, tail) = split_mnemonic(&rest);
        let head_lower = head.to_ascii_lowercase();
        match head_lower.as_str() {
            ".text" => {
                segment = Segment::Text;
                continue;
            }
            ".data" => {
                segment = Segment::Data;
                continue;
            }
            ".word" => {
                if segment != Segment::Data {
                    return Err(ParseError::DirectiveOutsideData {
                        line: line_no,
                        directive: ".word".to_string(),
                    });
                }
                let values: Vec<String> = split_operands(&tail);
                let addr = data_cursor;
                data_cursor = data_cursor.wrapping_add(4 * values.len() as u32);
                lines.push(Line {
                    line_no,
                    addr,
                    body: LineBody::Word { values },
                });
                continue;
            }
            ".string" => {
                if segment != Segment::Data {
                    return Err(ParseError::DirectiveOutsideData {
                        line: line_no,
                        directive: ".string".to_string(),
                    });
                }
                let mut bytes = parse_string_literal(tail.trim(), line_no)?;
                bytes.push(0);
                let addr = data_cursor;
                data_cursor = data_cursor.wrapping_add(bytes.len() as u32);
                lines.push(Line {
                    line_no,
                    addr,
                    body: LineBody::Str { bytes },
                });
                continue;
            }
            _ => {}
        }

        if let Some(text) = rest.strip_prefix('@') {
            let addr = code_cursor;
            code_cursor = code_cursor.wrapping_add(4);
            check_collision(code_cursor, line_no)?;
            lines.push(Line {
                line_no,
                addr,
                body: LineBody::Meta {
                    text: text.trim().to_string(),
                },
            });
            continue;
        }

        let operands = split_operands(&tail);
        let size = pseudo::expansion_size(&head_lower, &operands, line_no)?;
        let addr = code_cursor;
        code_cursor = code_cursor.wrapping_add(size);
        check_collision(code_cursor, line_no)?;
        lines.push(Line {
            line_no,
            addr,
            body: LineBody::Code {
                mnemonic: head_lower,
                operand_text: tail,
                raw: rest,
            },
        });
    }

    Ok((lines, labels))
}

fn check_collision(code_cursor: u32, line_no: usize) -> Result<(), ParseError> {
    if code_cursor >= DATA_BASE {
        let err = ParseError::SegmentCollision {
            addr: code_cursor,
            data_base: DATA_BASE,
        };
        log::error!("line {}: {}", line_no, err);
        return Err(err);
    }
    Ok(())
}

fn pass2(lines: Vec<Line>, labels: HashMap<String, u32>) -> Result<Program, ParseError> {
    let mut program = Program::default();

    for line in &lines {
        match &line.body {
            LineBody::Code { mnemonic, operand_text, raw } => {
                let operands = split_operands(operand_text);
                let kinds = pseudo::decode(mnemonic, &operands, line.addr, &labels, line.line_no)?;
                let tags = Tags::from_source_line(raw);
                let seq = kinds.into_iter().map(|k| Instruction::new(k, tags)).collect();
                program.instructions.insert(line.addr, seq);
            }
            LineBody::Meta { text } => {
                let kind = parse_meta(text, line.line_no)?;
                program
                    .instructions
                    .insert(line.addr, vec![Instruction::new(kind, Tags::default())]);
            }
            LineBody::Word { values } => {
                let mut addr = line.addr;
                for v in values {
                    let n = resolve_data_value(v, &labels, line.line_no)?;
                    for byte in (n as u32).to_le_bytes() {
                        program.data.insert(addr, byte);
                        addr = addr.wrapping_add(1);
                    }
                }
            }
            LineBody::Str { bytes } => {
                let mut addr = line.addr;
                for &b in bytes {
                    program.data.insert(addr, b);
                    addr = addr.wrapping_add(1);
                }
            }
        }
    }

    fill_gaps(&mut program);
    program.entry_address = labels.get("main").copied().unwrap_or(CODE_BASE);
    Ok(program)
}

fn resolve_data_value(text: &str, labels: &HashMap<String, u32>, line: usize) -> Result<i64, ParseError> {
    if let Some(n) = parse_int_literal(text) {
        return Ok(n);
    }
    labels
        .get(text)
        .map(|&a| a as i64)
        .ok_or_else(|| ParseError::UndefinedLabel {
            line,
            label: text.to_string(),
        })
}

/// Fills every address between the lowest and highest occupied code
/// address that has no decoded instruction with a canonical no-op, so
/// `instructions[pc]` is defined across the whole reachable code range.
fn fill_gaps(program: &mut Program) {
    let addrs: Vec<u32> = program
        .instructions
        .keys()
        .copied()
        .filter(|&a| a < DATA_BASE)
        .collect();
    let lo = match addrs.iter().min() {
        Some(&a) => a,
        None => return,
    };
    let hi = *addrs.iter().max().expect("non-empty since lo was found");
    let nop = Instruction::new(Kind::Addi { rd: 0, rs1: 0, imm: 0 }, Tags::default());
    let mut addr = lo;
    while addr <= hi {
        program.instructions.entry(addr).or_insert_with(|| vec![nop.clone()]);
        addr = addr.wrapping_add(4);
    }
}

fn parse_meta(text: &str, line: usize) -> Result<Kind, ParseError> {
    let (keyword, rest) = split_mnemonic(text);
    let rest = rest.trim();
    match keyword.to_ascii_lowercase().as_str() {
        "print" => parse_print(rest, line),
        "print_mem" => parse_print_mem(rest, line),
        "assert" => {
            let expr = parse_expression(rest, line)?;
            Ok(Kind::Assert {
                source: rest.to_string(),
                expr,
            })
        }
        other => Err(ParseError::UnknownMnemonic {
            line,
            mnemonic: format!("@{}", other),
        }),
    }
}

fn is_bare_identifier(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_print(text: &str, line: usize) -> Result<Kind, ParseError> {
    if is_bare_identifier(text) {
        if text.eq_ignore_ascii_case("pc") {
            return Ok(Kind::PrintRegister {
                name: text.to_string(),
                index: None,
            });
        }
        if let Ok(idx) = register::resolve(text) {
            return Ok(Kind::PrintRegister {
                name: text.to_string(),
                index: Some(idx),
            });
        }
    }
    let expr = parse_expression(text, line)?;
    Ok(Kind::PrintExpression {
        source: text.to_string(),
        expr,
    })
}

fn parse_print_mem(text: &str, line: usize) -> Result<Kind, ParseError> {
    let tokens = split_operands(text);
    if tokens.len() < 2 || tokens.len() > 3 {
        return Err(ParseError::BadOperand {
            line,
            operand: text.to_string(),
        });
    }
    let addr = parse_int_literal(&tokens[0]).ok_or_else(|| ParseError::InvalidImmediate {
        line,
        text: tokens[0].clone(),
    })?;
    let tag: TypeTag = tokens[1]
        .parse()
        .map_err(|_| ParseError::BadOperand {
            line,
            operand: tokens[1].clone(),
        })?;
    let count = match tokens.get(2) {
        Some(c) => parse_int_literal(c).ok_or_else(|| ParseError::InvalidImmediate {
            line,
            text: c.clone(),
        })?,
        None => 1,
    };
    Ok(Kind::PrintMem {
        addr: addr as u32,
        tag,
        count: count as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_simple_arithmetic() {
        let source = "\
main:
    addi x1, x0, 5
    addi x2, x0, 10
    add x3, x1, x2
";
        let program = assemble(source).unwrap();
        assert_eq!(program.entry_address, CODE_BASE);
        assert_eq!(program.instructions.len(), 3);
    }

    #[test]
    fn li_expands_to_two_words_for_large_immediates() {
        let source = "li x1, 0xDEADBEEF\n";
        let program = assemble(source).unwrap();
        let seq = program.instructions.get(&CODE_BASE).unwrap();
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn data_segment_collision_is_fatal() {
        let mut source = String::new();
        for _ in 0..(vcpu::constants::DATA_BASE / 4 + 1) {
            source.push_str("addi x0, x0, 0\n");
        }
        assert!(assemble(&source).is_err());
    }

    #[test]
    fn string_directive_null_terminates() {
        let source = ".data\nmsg: .string \"AB\"\n.text\nnop\n";
        let program = assemble(source).unwrap();
        assert_eq!(program.data.get(&DATA_BASE), Some(&b'A'));
        assert_eq!(program.data.get(&(DATA_BASE + 1)), Some(&b'B'));
        assert_eq!(program.data.get(&(DATA_BASE + 2)), Some(&0));
    }

    #[test]
    fn undefined_label_is_an_error() {
        let source = "beq x1, x2, nowhere\n";
        assert!(assemble(source).is_err());
    }

    #[test]
    fn print_mem_requires_literal_address() {
        assert!(parse_print_mem("x1 u8", 1).is_err());
        assert!(parse_print_mem("0x4000 u8", 1).is_ok());
    }

    #[test]
    fn assert_parses_full_expression_as_source() {
        let kind = parse_meta("assert eq(x1, x2)", 1).unwrap();
        match kind {
            Kind::Assert { source, .. } => assert_eq!(source, "eq(x1, x2)"),
            _ => panic!("expected Assert"),
        }
    }
}
