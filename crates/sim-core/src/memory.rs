//! 64K memory image with a write-protected ROM region.

use std::fmt;

use crate::Bus;

/// Size of the address space in bytes.
pub const MEMORY_SIZE: usize = 0x1_0000;

/// First address above the ROM. Bus writes below this are discarded.
pub const ROM_END: u16 = 0x4000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    InvalidSize(usize),
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSize(size) => write!(
                f,
                "invalid memory image size: {size} bytes (expected {MEMORY_SIZE})"
            ),
        }
    }
}

impl std::error::Error for MemoryError {}

/// A flat 64K memory image.
///
/// Addresses `0x0000..0x4000` are ROM: writes through [`Bus::write`] never
/// reach the buffer. [`Memory::poke`] and [`Memory::load`] bypass the
/// protection and are meant for building the initial image.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    data: Box<[u8; MEMORY_SIZE]>,
}

impl Memory {
    /// Create a zero-filled image.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Box::new([0; MEMORY_SIZE]),
        }
    }

    /// Create an image filled with one byte value.
    #[must_use]
    pub fn filled(value: u8) -> Self {
        Self {
            data: Box::new([value; MEMORY_SIZE]),
        }
    }

    /// Read a byte without going through the bus.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.data[usize::from(address)]
    }

    /// Write a byte, ignoring ROM protection.
    pub fn poke(&mut self, address: u16, value: u8) {
        self.data[usize::from(address)] = value;
    }

    /// Copy `bytes` into the image starting at `address`, ignoring ROM
    /// protection. Wraps at the top of the address space.
    pub fn load(&mut self, address: u16, bytes: &[u8]) {
        let mut addr = address;
        for &b in bytes {
            self.poke(addr, b);
            addr = addr.wrapping_add(1);
        }
    }

    /// The whole image.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..]
    }

    /// A range of the image, wrapping at the top of the address space.
    #[must_use]
    pub fn slice(&self, address: u16, len: usize) -> Vec<u8> {
        (0..len)
            .map(|i| self.peek(address.wrapping_add(i as u16)))
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memory").finish_non_exhaustive()
    }
}

impl Bus for Memory {
    fn read(&self, address: u16) -> u8 {
        self.peek(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        if address >= ROM_END {
            self.poke(address, value);
        }
    }
}

impl TryFrom<&[u8]> for Memory {
    type Error = MemoryError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let data: Box<[u8; MEMORY_SIZE]> = bytes
            .to_vec()
            .into_boxed_slice()
            .try_into()
            .map_err(|_| MemoryError::InvalidSize(bytes.len()))?;
        Ok(Self { data })
    }
}

impl From<Box<[u8; MEMORY_SIZE]>> for Memory {
    fn from(data: Box<[u8; MEMORY_SIZE]>) -> Self {
        Self { data }
    }
}
