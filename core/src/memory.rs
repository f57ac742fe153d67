//! Byte-addressable, bounds-checked, little-endian memory.
//!
//! `Storage` is the capability; `Memory` is the only implementation this
//! crate ships, a flat `Vec<u8>`. Multi-byte access goes through
//! `byteorder::LittleEndian` directly on borrowed slices rather than through
//! manual shift-and-mask loops.

use byteorder::{ByteOrder, LittleEndian};
use std::fmt;
use std::str::FromStr;

use crate::error::MemoryError;

/// Width-and-signedness tag recognized by `read_typed`/`write_typed` and by
/// `@print_mem`'s `TYPE` operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeTag {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
}

impl TypeTag {
    /// Size in bytes of a value carrying this tag.
    pub fn size(self) -> usize {
        match self {
            TypeTag::U8 | TypeTag::I8 => 1,
            TypeTag::U16 | TypeTag::I16 => 2,
            TypeTag::U32 | TypeTag::I32 => 4,
        }
    }

    /// Whether reads of this tag should be sign-extended.
    pub fn signed(self) -> bool {
        matches!(self, TypeTag::I8 | TypeTag::I16 | TypeTag::I32)
    }
}

impl FromStr for TypeTag {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "u8" => Ok(TypeTag::U8),
            "i8" => Ok(TypeTag::I8),
            "u16" => Ok(TypeTag::U16),
            "i16" => Ok(TypeTag::I16),
            "u32" => Ok(TypeTag::U32),
            "i32" => Ok(TypeTag::I32),
            other => Err(MemoryError::UnknownTypeTag(other.to_string())),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TypeTag::U8 => "u8",
            TypeTag::I8 => "i8",
            TypeTag::U16 => "u16",
            TypeTag::I16 => "i16",
            TypeTag::U32 => "u32",
            TypeTag::I32 => "i32",
        };
        f.write_str(name)
    }
}

/// A decoded value produced by a typed memory read: either the unsigned
/// width-masked word or its sign-extended interpretation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypedValue {
    Unsigned(u32),
    Signed(i32),
}

impl TypedValue {
    /// The value reinterpreted as a raw unsigned 32-bit word, for further
    /// arithmetic in the expression evaluator.
    pub fn as_u32(self) -> u32 {
        match self {
            TypedValue::Unsigned(v) => v,
            TypedValue::Signed(v) => v as u32,
        }
    }
}

/// Capability: a fixed-length byte array with typed, little-endian,
/// bounds-checked access.
pub trait Storage {
    /// Total addressable length in bytes.
    fn length(&self) -> usize;

    fn borrow_slice(&self, addr: u32, size: usize) -> Result<&[u8], MemoryError>;
    fn borrow_slice_mut(&mut self, addr: u32, size: usize) -> Result<&mut [u8], MemoryError>;

    fn check_range(&self, addr: u32, size: usize) -> Result<(), MemoryError> {
        let end = addr as usize + size;
        if size == 0 || end > self.length() {
            Err(MemoryError::OutOfBounds {
                addr,
                size: size as u8,
            })
        } else {
            Ok(())
        }
    }

    fn read_byte(&self, addr: u32) -> Result<u8, MemoryError> {
        Ok(self.borrow_slice(addr, 1)?[0])
    }

    fn write_byte(&mut self, addr: u32, value: u8) -> Result<(), MemoryError> {
        self.borrow_slice_mut(addr, 1)?[0] = value;
        Ok(())
    }

    /// Little-endian read of `size` bytes (1, 2 or 4). When `signed`, the
    /// top bit of the `size`-byte value sign-extends into the returned
    /// `i32`; otherwise the value is returned unsigned.
    fn read(&self, addr: u32, size: usize, signed: bool) -> Result<TypedValue, MemoryError> {
        let slice = self.borrow_slice(addr, size)?;
        let unsigned = LittleEndian::read_uint(slice, size) as u32;
        if signed {
            let bits = (size * 8) as u32;
            let sign_bit = 1u32 << (bits - 1);
            let value = if unsigned & sign_bit != 0 {
                unsigned as i64 - (1i64 << bits)
            } else {
                unsigned as i64
            };
            Ok(TypedValue::Signed(value as i32))
        } else {
            Ok(TypedValue::Unsigned(unsigned))
        }
    }

    /// Little-endian write of the low `size` bytes of `value`.
    fn write(&mut self, addr: u32, size: usize, value: u32) -> Result<(), MemoryError> {
        let slice = self.borrow_slice_mut(addr, size)?;
        LittleEndian::write_uint(slice, value as u64, size);
        Ok(())
    }

    fn read_typed(&self, addr: u32, tag: TypeTag) -> Result<TypedValue, MemoryError> {
        self.read(addr, tag.size(), tag.signed())
    }

    fn write_typed(&mut self, addr: u32, tag: TypeTag, value: u32) -> Result<(), MemoryError> {
        self.write(addr, tag.size(), value)
    }
}

/// A flat byte array implementing [`Storage`].
#[derive(Clone, Debug)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    pub fn new(size: usize) -> Memory {
        Memory { data: vec![0; size] }
    }
}

impl Default for Memory {
    fn default() -> Memory {
        Memory::new(crate::constants::MEMORY_SIZE)
    }
}

impl Storage for Memory {
    fn length(&self) -> usize {
        self.data.len()
    }

    fn borrow_slice(&self, addr: u32, size: usize) -> Result<&[u8], MemoryError> {
        self.check_range(addr, size)?;
        let start = addr as usize;
        Ok(&self.data[start..start + size])
    }

    fn borrow_slice_mut(&mut self, addr: u32, size: usize) -> Result<&mut [u8], MemoryError> {
        self.check_range(addr, size)?;
        let start = addr as usize;
        Ok(&mut self.data[start..start + size])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_round_trip() {
        let mut mem = Memory::new(16);
        mem.write_byte(3, 0xAB).unwrap();
        assert_eq!(mem.read_byte(3).unwrap(), 0xAB);
    }

    #[test]
    fn word_is_little_endian() {
        let mut mem = Memory::new(16);
        mem.write(100, 4, 0xCAFEBABE).unwrap();
        assert_eq!(mem.read_byte(100).unwrap(), 0xBE);
        assert_eq!(mem.read_byte(101).unwrap(), 0xBA);
        assert_eq!(mem.read_byte(102).unwrap(), 0xFE);
        assert_eq!(mem.read_byte(103).unwrap(), 0xCA);
    }

    #[test]
    fn unsigned_write_then_read_matches_mask() {
        let mut mem = Memory::new(16);
        mem.write(0, 2, 0x1_FFFF).unwrap();
        assert_eq!(mem.read(0, 2, false).unwrap().as_u32(), 0xFFFF);
    }

    #[test]
    fn signed_read_sign_extends() {
        let mut mem = Memory::new(16);
        mem.write(0, 1, 0xFF).unwrap();
        match mem.read(0, 1, true).unwrap() {
            TypedValue::Signed(v) => assert_eq!(v, -1),
            TypedValue::Unsigned(_) => panic!("expected signed value"),
        }
    }

    #[test]
    fn out_of_bounds_is_an_error() {
        let mem = Memory::new(4);
        assert!(mem.read(2, 4, false).is_err());
    }

    #[test]
    fn typed_round_trip() {
        let mut mem = Memory::new(16);
        mem.write_typed(0, TypeTag::U16, 0xBEEF).unwrap();
        assert_eq!(mem.read_typed(0, TypeTag::U16).unwrap().as_u32(), 0xBEEF);
    }

    #[test]
    fn unknown_type_tag_is_rejected() {
        assert!("f32".parse::<TypeTag>().is_err());
    }
}
