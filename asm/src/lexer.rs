//! Line-oriented lexical layer: comment stripping, cascading-label capture,
//! and operand tokenization. Grounded directly in the regex/string-split
//! approach of the original implementation this dialect was distilled from,
//! rather than a grammar/PEG parser.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ParseError;

static LABEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Za-z_.][A-Za-z0-9_]*):(.*)$").unwrap());

/// Discards everything from the first `#` onward, then trims.
pub fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => line[..idx].trim(),
        None => line.trim(),
    }
}

/// Peels off zero or more cascading `label:` prefixes from the front of a
/// (comment-stripped) line, returning the labels in order and the
/// remaining text.
pub fn split_labels(mut line: &str) -> (Vec<String>, String) {
    let mut labels = Vec::new();
    loop {
        let trimmed = line.trim_start();
        match LABEL_RE.captures(trimmed) {
            Some(caps) => {
                labels.push(caps[1].to_string());
                line = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            }
            None => {
                line = trimmed;
                break;
            }
        }
    }
    (labels, line.trim().to_string())
}

/// Splits a line's operand portion (mnemonic already consumed) into tokens
/// on whitespace, commas, and parentheses, dropping the parentheses
/// themselves but keeping what they delimited as separate tokens, so
/// `4(x1)` becomes `["4", "x1"]`, matching `jalr rd, imm(rs1)` addressing.
pub fn split_operands(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c == ',' || c == '(' || c == ')')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Splits a full instruction/meta line into its leading mnemonic (or meta
/// keyword) and the remaining raw operand text.
pub fn split_mnemonic(text: &str) -> (String, String) {
    match text.find(|c: char| c.is_whitespace()) {
        Some(idx) => (text[..idx].to_string(), text[idx..].trim().to_string()),
        None => (text.to_string(), String::new()),
    }
}

/// Parses a UTF-8 string literal (`"..."`) with the standard escapes
/// `\n \t \\ \" \0` and `\xNN` hex escapes, per `.string`'s contract.
pub fn parse_string_literal(raw: &str, line_no: usize) -> Result<Vec<u8>, ParseError> {
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or(ParseError::UnterminatedString { line: line_no })?;

    let mut bytes = Vec::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => bytes.push(b'\n'),
            Some('t') => bytes.push(b'\t'),
            Some('\\') => bytes.push(b'\\'),
            Some('"') => bytes.push(b'"'),
            Some('0') => bytes.push(0),
            Some('x') => {
                let hi = chars.next();
                let lo = chars.next();
                let hex: String = [hi, lo].into_iter().flatten().collect();
                let byte = u8::from_str_radix(&hex, 16)
                    .map_err(|_| ParseError::UnterminatedString { line: line_no })?;
                bytes.push(byte);
            }
            _ => return Err(ParseError::UnterminatedString { line: line_no }),
        }
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_comment() {
        assert_eq!(strip_comment("add x1, x2, x3 # sum it up"), "add x1, x2, x3");
    }

    #[test]
    fn cascading_labels_peel_off_in_order() {
        let (labels, rest) = split_labels("foo: bar: addi x1, x0, 1");
        assert_eq!(labels, vec!["foo", "bar"]);
        assert_eq!(rest, "addi x1, x0, 1");
    }

    #[test]
    fn paren_addressing_splits_into_two_tokens() {
        assert_eq!(split_operands("x3, 4(x1)"), vec!["x3", "4", "x1"]);
    }

    #[test]
    fn string_literal_processes_escapes() {
        let bytes = parse_string_literal(r#""A\nB""#, 1).unwrap();
        assert_eq!(bytes, vec![b'A', b'\n', b'B']);
    }
}
