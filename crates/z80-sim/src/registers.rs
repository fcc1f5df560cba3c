//! Z80 register file.
//!
//! 24 byte-wide slots plus PC and the T-state counter. Register pairs are
//! always two adjacent slots, high byte first, so a pair is addressed by the
//! index of its high slot.

use std::fmt;

use crate::error::SimError;

pub const A: usize = 0;
pub const F: usize = 1;
pub const B: usize = 2;
pub const C: usize = 3;
pub const D: usize = 4;
pub const E: usize = 5;
pub const H: usize = 6;
pub const L: usize = 7;
pub const IXH: usize = 8;
pub const IXL: usize = 9;
pub const IYH: usize = 10;
pub const IYL: usize = 11;
pub const SPH: usize = 12;
pub const SPL: usize = 13;
pub const I: usize = 14;
pub const R: usize = 15;
pub const A_ALT: usize = 16;
pub const F_ALT: usize = 17;
pub const B_ALT: usize = 18;
pub const C_ALT: usize = 19;
pub const D_ALT: usize = 20;
pub const E_ALT: usize = 21;
pub const H_ALT: usize = 22;
pub const L_ALT: usize = 23;

/// Number of byte-wide slots.
pub const SLOTS: usize = 24;

/// Where a register name points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// A single byte slot.
    Byte(usize),
    /// A pair, by its high slot.
    Pair(usize),
    Pc,
    Tstates,
}

/// Canonical names. Lookup is case-insensitive, and every shadow register
/// also answers to a trailing apostrophe (`A'`, `BC'`).
const NAMES: &[(&str, Location)] = &[
    ("A", Location::Byte(A)),
    ("F", Location::Byte(F)),
    ("B", Location::Byte(B)),
    ("C", Location::Byte(C)),
    ("D", Location::Byte(D)),
    ("E", Location::Byte(E)),
    ("H", Location::Byte(H)),
    ("L", Location::Byte(L)),
    ("IXh", Location::Byte(IXH)),
    ("IXl", Location::Byte(IXL)),
    ("IYh", Location::Byte(IYH)),
    ("IYl", Location::Byte(IYL)),
    ("I", Location::Byte(I)),
    ("R", Location::Byte(R)),
    ("^A", Location::Byte(A_ALT)),
    ("^F", Location::Byte(F_ALT)),
    ("^B", Location::Byte(B_ALT)),
    ("^C", Location::Byte(C_ALT)),
    ("^D", Location::Byte(D_ALT)),
    ("^E", Location::Byte(E_ALT)),
    ("^H", Location::Byte(H_ALT)),
    ("^L", Location::Byte(L_ALT)),
    ("AF", Location::Pair(A)),
    ("BC", Location::Pair(B)),
    ("DE", Location::Pair(D)),
    ("HL", Location::Pair(H)),
    ("IX", Location::Pair(IXH)),
    ("IY", Location::Pair(IYH)),
    ("SP", Location::Pair(SPH)),
    ("^AF", Location::Pair(A_ALT)),
    ("^BC", Location::Pair(B_ALT)),
    ("^DE", Location::Pair(D_ALT)),
    ("^HL", Location::Pair(H_ALT)),
    ("PC", Location::Pc),
    ("T", Location::Tstates),
];

/// Resolve a register name.
pub fn locate(name: &str) -> Result<Location, SimError> {
    let key = match name.strip_suffix('\'') {
        Some(base) if !base.is_empty() && !base.starts_with('^') => format!("^{base}"),
        _ => name.to_string(),
    };
    NAMES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(&key))
        .map(|&(_, loc)| loc)
        .ok_or_else(|| SimError::UnknownRegister(name.to_string()))
}

/// Every canonical name, in table order.
pub fn names() -> impl Iterator<Item = &'static str> {
    NAMES.iter().map(|&(n, _)| n)
}

/// All CPU registers plus the running T-state count.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct RegisterFile {
    slots: [u8; SLOTS],
    pub pc: u16,
    pub t: u64,
}

impl RegisterFile {
    /// All registers zero, apart from SP which starts at 0xFFFF.
    #[must_use]
    pub fn new() -> Self {
        let mut regs = Self::default();
        regs.set_pair(SPH, 0xFFFF);
        regs
    }

    #[inline]
    #[must_use]
    pub fn get(&self, slot: usize) -> u8 {
        self.slots[slot]
    }

    #[inline]
    pub fn set(&mut self, slot: usize, value: u8) {
        self.slots[slot] = value;
    }

    /// Pair whose high byte lives in `hi`.
    #[inline]
    #[must_use]
    pub fn pair(&self, hi: usize) -> u16 {
        u16::from(self.slots[hi]) << 8 | u16::from(self.slots[hi + 1])
    }

    #[inline]
    pub fn set_pair(&mut self, hi: usize, value: u16) {
        self.slots[hi] = (value >> 8) as u8;
        self.slots[hi + 1] = value as u8;
    }

    #[must_use]
    pub fn a(&self) -> u8 {
        self.slots[A]
    }

    #[must_use]
    pub fn f(&self) -> u8 {
        self.slots[F]
    }

    #[must_use]
    pub fn bc(&self) -> u16 {
        self.pair(B)
    }

    #[must_use]
    pub fn de(&self) -> u16 {
        self.pair(D)
    }

    #[must_use]
    pub fn hl(&self) -> u16 {
        self.pair(H)
    }

    #[must_use]
    pub fn ix(&self) -> u16 {
        self.pair(IXH)
    }

    #[must_use]
    pub fn iy(&self) -> u16 {
        self.pair(IYH)
    }

    #[must_use]
    pub fn sp(&self) -> u16 {
        self.pair(SPH)
    }

    /// Read through a resolved name.
    #[must_use]
    pub fn read(&self, loc: Location) -> u64 {
        match loc {
            Location::Byte(slot) => u64::from(self.get(slot)),
            Location::Pair(hi) => u64::from(self.pair(hi)),
            Location::Pc => u64::from(self.pc),
            Location::Tstates => self.t,
        }
    }

    /// Write through a resolved name. Bytes take `value % 256`, pairs and PC
    /// take `value % 65536`.
    pub fn write(&mut self, loc: Location, value: u64) {
        match loc {
            Location::Byte(slot) => self.set(slot, value as u8),
            Location::Pair(hi) => self.set_pair(hi, value as u16),
            Location::Pc => self.pc = value as u16,
            Location::Tstates => self.t = value,
        }
    }

    /// Swap the slot ranges `a..a+len` and `b..b+len`.
    pub(crate) fn swap(&mut self, a: usize, b: usize, len: usize) {
        for i in 0..len {
            self.slots.swap(a + i, b + i);
        }
    }
}

impl fmt::Debug for RegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AF={:04X} BC={:04X} DE={:04X} HL={:04X} IX={:04X} IY={:04X} SP={:04X} \
             PC={:04X} I={:02X} R={:02X} AF'={:04X} BC'={:04X} DE'={:04X} HL'={:04X} T={}",
            self.pair(A),
            self.bc(),
            self.de(),
            self.hl(),
            self.ix(),
            self.iy(),
            self.sp(),
            self.pc,
            self.get(I),
            self.get(R),
            self.pair(A_ALT),
            self.pair(B_ALT),
            self.pair(D_ALT),
            self.pair(H_ALT),
            self.t,
        )
    }
}
