//! The 32-slot register file with x0 hardwired to zero and ABI-alias
//! resolution, matching the RISC-V calling-convention alias table.

use crate::constants::REGISTER_COUNT;
use crate::error::RegisterError;

/// Resolves a register name or numeric string (`"x5"`, `"a0"`, `"sp"`, `"5"`)
/// to its numeric index. Matching is case-insensitive.
pub fn resolve(key: &str) -> Result<usize, RegisterError> {
    let lower = key.to_ascii_lowercase();

    if let Some(rest) = lower.strip_prefix('x') {
        if let Ok(idx) = rest.parse::<usize>() {
            return checked_index(idx, key);
        }
    }
    if let Ok(idx) = lower.parse::<usize>() {
        return checked_index(idx, key);
    }

    let idx = match lower.as_str() {
        "zero" => 0,
        "ra" => 1,
        "sp" => 2,
        "gp" => 3,
        "tp" => 4,
        "t0" => 5,
        "t1" => 6,
        "t2" => 7,
        "s0" | "fp" => 8,
        "s1" => 9,
        "a0" => 10,
        "a1" => 11,
        "a2" => 12,
        "a3" => 13,
        "a4" => 14,
        "a5" => 15,
        "a6" => 16,
        "a7" => 17,
        "s2" => 18,
        "s3" => 19,
        "s4" => 20,
        "s5" => 21,
        "s6" => 22,
        "s7" => 23,
        "s8" => 24,
        "s9" => 25,
        "s10" => 26,
        "s11" => 27,
        "t3" => 28,
        "t4" => 29,
        "t5" => 30,
        "t6" => 31,
        _ => return Err(RegisterError::UnknownAlias(key.to_string())),
    };
    Ok(idx)
}

fn checked_index(idx: usize, key: &str) -> Result<usize, RegisterError> {
    if idx < REGISTER_COUNT {
        Ok(idx)
    } else {
        Err(RegisterError::UnknownAlias(key.to_string()))
    }
}

/// Whether `key` textually refers to the stack pointer. Grounds the
/// `use_sp` tagging heuristic: it reacts only to the literal alias `sp`
/// appearing in source, never to a numeric `x2`/`2`.
pub fn names_stack_pointer(key: &str) -> bool {
    key.eq_ignore_ascii_case("sp")
}

/// 32 general-purpose registers. Index 0 always reads 0; writes to it are
/// silently discarded.
#[derive(Clone, Debug)]
pub struct RegisterFile {
    slots: [u32; REGISTER_COUNT],
}

impl RegisterFile {
    pub fn new() -> RegisterFile {
        RegisterFile {
            slots: [0; REGISTER_COUNT],
        }
    }

    pub fn read_index(&self, index: usize) -> u32 {
        if index == 0 {
            0
        } else {
            self.slots[index]
        }
    }

    pub fn write_index(&mut self, index: usize, value: u32) {
        if index != 0 {
            self.slots[index] = value;
        }
    }

    pub fn read(&self, key: &str) -> Result<u32, RegisterError> {
        resolve(key).map(|idx| self.read_index(idx))
    }

    pub fn write(&mut self, key: &str, value: u32) -> Result<(), RegisterError> {
        let idx = resolve(key)?;
        self.write_index(idx, value);
        Ok(())
    }
}

impl Default for RegisterFile {
    fn default() -> RegisterFile {
        RegisterFile::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x0_always_reads_zero() {
        let mut regs = RegisterFile::new();
        regs.write_index(0, 0xFFFF_FFFF);
        assert_eq!(regs.read_index(0), 0);
    }

    #[test]
    fn alias_resolution_matches_numeric_index() {
        assert_eq!(resolve("sp").unwrap(), 2);
        assert_eq!(resolve("x2").unwrap(), 2);
        assert_eq!(resolve("2").unwrap(), 2);
        assert_eq!(resolve("SP").unwrap(), 2);
    }

    #[test]
    fn fp_aliases_s0() {
        assert_eq!(resolve("fp").unwrap(), resolve("s0").unwrap());
    }

    #[test]
    fn unknown_alias_is_an_error() {
        assert!(resolve("bogus").is_err());
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        assert!(resolve("x32").is_err());
    }

    #[test]
    fn use_sp_heuristic_is_textual() {
        assert!(names_stack_pointer("sp"));
        assert!(!names_stack_pointer("x2"));
        assert!(!names_stack_pointer("2"));
    }
}
