//! F register bits and the per-byte S/Z/5/3/P lookup.

pub const SF: u8 = 0x80;
pub const ZF: u8 = 0x40;
/// Undocumented bit 5.
pub const YF: u8 = 0x20;
pub const HF: u8 = 0x10;
/// Undocumented bit 3.
pub const XF: u8 = 0x08;
/// Parity or overflow, depending on the instruction.
pub const PF: u8 = 0x04;
pub const NF: u8 = 0x02;
pub const CF: u8 = 0x01;

/// Sign, zero, bits 5 and 3, and even parity for every byte value. Built at
/// compile time; the ALU formulas and the handlers both read it.
pub const SZ53P: [u8; 256] = build_sz53p();

const fn build_sz53p() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < table.len() {
        let v = i as u8;
        let mut f = v & (SF | YF | XF);
        if v == 0 {
            f |= ZF;
        }
        if v.count_ones().is_multiple_of(2) {
            f |= PF;
        }
        table[i] = f;
        i += 1;
    }
    table
}

/// True when `value` has an even number of set bits.
#[inline]
#[must_use]
pub const fn parity(value: u8) -> bool {
    SZ53P[value as usize] & PF != 0
}

/// S, Z, 5 and 3 of a result.
#[inline]
#[must_use]
pub const fn sz53(value: u8) -> u8 {
    SZ53P[value as usize] & !PF
}

/// S, Z, 5, 3 and parity of a result.
#[inline]
#[must_use]
pub const fn sz53p(value: u8) -> u8 {
    SZ53P[value as usize]
}
