//! Fixed layout parameters of the architectural state.

/// Number of general-purpose registers, x0..x31.
pub const REGISTER_COUNT: usize = 32;

/// Default memory size in bytes.
pub const MEMORY_SIZE: usize = 0x1_0000;

/// Base address of the code segment. Grows upward.
pub const CODE_BASE: u32 = 0x0000;

/// Base address of the data segment. Grows upward.
pub const DATA_BASE: u32 = 0x4000;

/// Size in bytes of a decoded instruction slot.
pub const WORD_BYTES: u32 = 4;

/// Top of the stack; `sp` starts here and grows downward.
pub const STACK_BASE: u32 = MEMORY_SIZE as u32;

/// Lowest address the stack is allowed to reach; half of memory.
pub const STACK_LIMIT: u32 = (MEMORY_SIZE / 2) as u32;
