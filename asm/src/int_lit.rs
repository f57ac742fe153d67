//! Integer literal parsing: decimal, `0x` hex, `0b` binary, optionally
//! negative. Simpler than the ancestor `vasm::int_util` module's generic
//! `GetUnsigned`/`NumCastTrunc` machinery - this dialect only ever needs
//! `i64`-range literals that are later masked into 32-bit fields, so the
//! generic width/signedness traits that machinery existed for have no job
//! here.

/// Parses a literal like `42`, `-17`, `0xDEAD`, `0b1010`. Returns `None` if
/// `text` is not a recognized integer literal (the caller treats that as a
/// label reference instead).
pub fn parse_int_literal(text: &str) -> Option<i64> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, text),
    };
    if rest.is_empty() {
        return None;
    }

    let magnitude = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()?
    } else {
        rest.parse::<i64>().ok()?
    };

    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_and_negative() {
        assert_eq!(parse_int_literal("42"), Some(42));
        assert_eq!(parse_int_literal("-17"), Some(-17));
    }

    #[test]
    fn hex_and_binary() {
        assert_eq!(parse_int_literal("0xDEADBEEF"), Some(0xDEADBEEFu32 as i64));
        assert_eq!(parse_int_literal("0b1010"), Some(10));
    }

    #[test]
    fn not_a_literal_is_none() {
        assert_eq!(parse_int_literal("loop"), None);
        assert_eq!(parse_int_literal(""), None);
    }
}
